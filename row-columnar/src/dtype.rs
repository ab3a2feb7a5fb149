use std::fmt;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, TimeUnit};
use serde::{Deserialize, Serialize};

/// Element type of a column, as exposed to row sources.
///
/// Each variant has exactly one physical arrow representation, see [`Dtype::to_arrow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dtype {
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Str,
    /// Timestamp in milliseconds since the unix epoch, without a time zone.
    Time,
    /// Date in days since the unix epoch.
    Date,
}

impl Dtype {
    /// All dtypes, in declaration order.
    pub const ALL: [Dtype; 10] = [
        Dtype::Int8,
        Dtype::Int16,
        Dtype::Int32,
        Dtype::Int64,
        Dtype::Float32,
        Dtype::Float64,
        Dtype::Bool,
        Dtype::Str,
        Dtype::Time,
        Dtype::Date,
    ];

    /// Returns the arrow data type backing columns of this dtype.
    pub fn to_arrow(self) -> DataType {
        match self {
            Dtype::Int8 => DataType::Int8,
            Dtype::Int16 => DataType::Int16,
            Dtype::Int32 => DataType::Int32,
            Dtype::Int64 => DataType::Int64,
            Dtype::Float32 => DataType::Float32,
            Dtype::Float64 => DataType::Float64,
            Dtype::Bool => DataType::Boolean,
            Dtype::Str => DataType::Utf8,
            Dtype::Time => DataType::Timestamp(TimeUnit::Millisecond, None),
            Dtype::Date => DataType::Date32,
        }
    }

    /// Returns the dtype for an arrow data type, if there is one.
    pub fn from_arrow(data_type: &DataType) -> Option<Dtype> {
        match data_type {
            DataType::Int8 => Some(Dtype::Int8),
            DataType::Int16 => Some(Dtype::Int16),
            DataType::Int32 => Some(Dtype::Int32),
            DataType::Int64 => Some(Dtype::Int64),
            DataType::Float32 => Some(Dtype::Float32),
            DataType::Float64 => Some(Dtype::Float64),
            DataType::Boolean => Some(Dtype::Bool),
            DataType::Utf8 => Some(Dtype::Str),
            DataType::Timestamp(TimeUnit::Millisecond, None) => Some(Dtype::Time),
            DataType::Date32 => Some(Dtype::Date),
            _ => None,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dtype::Int8 => "INT8",
            Dtype::Int16 => "INT16",
            Dtype::Int32 => "INT32",
            Dtype::Int64 => "INT64",
            Dtype::Float32 => "FLOAT32",
            Dtype::Float64 => "FLOAT64",
            Dtype::Bool => "BOOL",
            Dtype::Str => "STR",
            Dtype::Time => "TIME",
            Dtype::Date => "DATE",
        };
        f.write_str(name)
    }
}

/// Logical type of a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// One scalar per row.
    Primitive(Dtype),
    /// A variable-length sequence of scalars per row.
    List(Dtype),
}

impl ColumnType {
    /// Returns the element dtype, for both primitive and list columns.
    pub fn dtype(self) -> Dtype {
        match self {
            ColumnType::Primitive(dtype) | ColumnType::List(dtype) => dtype,
        }
    }

    /// Returns the arrow data type backing columns of this type.
    ///
    /// List elements live in a non-nullable child field named `item`.
    pub fn to_arrow(self) -> DataType {
        match self {
            ColumnType::Primitive(dtype) => dtype.to_arrow(),
            ColumnType::List(dtype) => DataType::List(list_item_field(dtype)),
        }
    }

    /// Returns the column type for an arrow data type, if there is one.
    ///
    /// The name and nullability of a list child field are not part of the column type.
    pub fn from_arrow(data_type: &DataType) -> Option<ColumnType> {
        match data_type {
            DataType::List(field) => Dtype::from_arrow(field.data_type()).map(ColumnType::List),
            data_type => Dtype::from_arrow(data_type).map(ColumnType::Primitive),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Primitive(dtype) => write!(f, "{dtype}"),
            ColumnType::List(dtype) => write!(f, "LIST<{dtype}>"),
        }
    }
}

/// Child field used by every list column built by this crate.
pub(crate) fn list_item_field(dtype: Dtype) -> Arc<Field> {
    Arc::new(Field::new_list_field(dtype.to_arrow(), false))
}
