use log::debug;
use row_columnar::{ColumnType, Schema, SchemaError};
use snafu::Snafu;

use crate::{map_type, UnknownType};

/// Errors that can occur when building a [`Schema`] from type names.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum TypeMapperError {
    /// A type name has no dtype.
    #[snafu(display("{source}"))]
    Unknown {
        /// The mapping failure.
        source: UnknownType,
    },
    /// The mapped columns do not form a valid schema.
    #[snafu(display("invalid schema: {source}"))]
    Schema {
        /// Error encountered by schema construction.
        source: SchemaError,
    },
}

impl From<UnknownType> for TypeMapperError {
    fn from(source: UnknownType) -> Self {
        TypeMapperError::Unknown { source }
    }
}

impl From<SchemaError> for TypeMapperError {
    fn from(source: SchemaError) -> Self {
        TypeMapperError::Schema { source }
    }
}

/// Builds a schema of primitive columns from `(field name, type name)` pairs, in order.
///
/// Stops at the first unknown type name; no schema is produced in that case.
pub fn schema_from_type_names<'a>(
    fields: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<Schema, TypeMapperError> {
    let columns = fields
        .into_iter()
        .map(|(field_name, type_name)| {
            map_type(type_name, field_name)
                .map(|dtype| (field_name, ColumnType::Primitive(dtype)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let schema = Schema::try_from_iter(columns)?;
    debug!("mapped schema {schema}");
    Ok(schema)
}
