use serde::{Deserialize, Serialize};

/// Capacity hints for encoding rows into a table.
///
/// Hints only pre-size builder storage; builders still grow past them on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    /// Number of rows to reserve room for in every column.
    pub row_capacity: usize,
    /// Number of element values to reserve room for in every list column.
    pub list_value_capacity: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            row_capacity: 1024,
            list_value_capacity: 4096,
        }
    }
}

impl EncoderConfig {
    /// Parses a configuration from JSON. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn we_can_parse_a_partial_config() {
        let config = EncoderConfig::from_json_str(r#"{"row_capacity": 3}"#).unwrap();
        assert_eq!(
            config,
            EncoderConfig {
                row_capacity: 3,
                ..EncoderConfig::default()
            }
        );
        assert_eq!(
            EncoderConfig::from_json_str("{}").unwrap(),
            EncoderConfig::default()
        );
    }

    #[test]
    fn we_cannot_parse_unknown_fields() {
        assert!(EncoderConfig::from_json_str(r#"{"capacity": 3}"#).is_err());
    }
}
