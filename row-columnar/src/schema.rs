use std::fmt;

use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use indexmap::map::Iter;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::dtype::ColumnType;
use crate::map::IndexMap;

/// Ordered, named, typed description of a table's columns.
///
/// Column names are unique. Equality is positional: two schemas with the same columns in a
/// different order are different schemas.
#[derive(Clone, Debug, Default)]
pub struct Schema(
    /// Column types keyed by name, in column order.
    IndexMap<String, ColumnType>,
);

// Serialized as an ordered sequence of `[name, type]` pairs.
impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

// Deserialization goes through [`Schema::try_from_iter`] to preserve the uniqueness guarantee.
impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let columns = Vec::<(String, ColumnType)>::deserialize(deserializer)?;

        Schema::try_from_iter(columns).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when constructing a [`Schema`].
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum SchemaError {
    /// Column names must be unique within a schema.
    #[snafu(display("duplicate column name {name:?}"))]
    DuplicateColumn {
        /// The repeated column name.
        name: String,
    },
    /// Arrow type has no column type counterpart.
    #[snafu(display("column {name:?} has unsupported arrow type {data_type}"))]
    UnsupportedType {
        /// Name of the offending column.
        name: String,
        /// The arrow type that was encountered.
        data_type: DataType,
    },
}

impl Schema {
    /// Create a new [`Schema`] from an ordered iterator of column names and types.
    pub fn try_from_iter<N: Into<String>>(
        iter: impl IntoIterator<Item = (N, ColumnType)>,
    ) -> Result<Schema, SchemaError> {
        let mut columns = IndexMap::default();
        for (name, column_type) in iter {
            let name = name.into();
            if columns.contains_key(&name) {
                return Err(SchemaError::DuplicateColumn { name });
            }
            columns.insert(name, column_type);
        }
        Ok(Schema(columns))
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the type of the named column.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.0.get(name).copied()
    }

    /// Returns the position of the named column.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.get_index_of(name)
    }

    /// Returns the name and type of the column at `index`.
    pub fn field(&self, index: usize) -> Option<(&str, ColumnType)> {
        self.0
            .get_index(index)
            .map(|(name, column_type)| (name.as_str(), *column_type))
    }

    /// Returns a borrowing iterator over all name-type pairs, in column order.
    pub fn iter(&self) -> Iter<String, ColumnType> {
        self.0.iter()
    }

    /// Returns the equivalent arrow schema. Every field is non-nullable.
    pub fn to_arrow(&self) -> ArrowSchema {
        ArrowSchema::new(
            self.iter()
                .map(|(name, column_type)| Field::new(name, column_type.to_arrow(), false))
                .collect::<Vec<_>>(),
        )
    }
}

// `IndexMap` equality ignores order, column order is significant here.
impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (position, (name, column_type)) in self.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {column_type}")?;
        }
        f.write_str("]")
    }
}

impl TryFrom<&ArrowSchema> for Schema {
    type Error = SchemaError;
    fn try_from(schema: &ArrowSchema) -> Result<Self, Self::Error> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                ColumnType::from_arrow(field.data_type())
                    .map(|column_type| (field.name().clone(), column_type))
                    .ok_or_else(|| SchemaError::UnsupportedType {
                        name: field.name().clone(),
                        data_type: field.data_type().clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Schema::try_from_iter(columns)
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a String, &'a ColumnType);
    type IntoIter = Iter<'a, String, ColumnType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
