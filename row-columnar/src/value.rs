use serde::{Deserialize, Serialize};

use crate::dtype::{ColumnType, Dtype};

/// A single typed field value of a [`Row`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 8-bit signed integer.
    Int8(i8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Str(String),
    /// Milliseconds since the unix epoch.
    Time(i64),
    /// Days since the unix epoch.
    Date(i32),
    /// Variable-length sequence of scalars sharing one dtype.
    List(Vec<Value>),
}

impl Value {
    /// Returns the dtype of a scalar value, or `None` for lists.
    pub fn dtype(&self) -> Option<Dtype> {
        match self {
            Value::Int8(_) => Some(Dtype::Int8),
            Value::Int16(_) => Some(Dtype::Int16),
            Value::Int32(_) => Some(Dtype::Int32),
            Value::Int64(_) => Some(Dtype::Int64),
            Value::Float32(_) => Some(Dtype::Float32),
            Value::Float64(_) => Some(Dtype::Float64),
            Value::Bool(_) => Some(Dtype::Bool),
            Value::Str(_) => Some(Dtype::Str),
            Value::Time(_) => Some(Dtype::Time),
            Value::Date(_) => Some(Dtype::Date),
            Value::List(_) => None,
        }
    }

    /// Returns `true` if this value can be stored in a column of `column_type` as-is.
    ///
    /// No coercion is considered: an `Int32` never matches an `INT64` column.
    pub fn matches(&self, column_type: ColumnType) -> bool {
        match (self, column_type) {
            (Value::List(values), ColumnType::List(dtype)) => {
                values.iter().all(|value| value.dtype() == Some(dtype))
            }
            (value, ColumnType::Primitive(dtype)) => value.dtype() == Some(dtype),
            _ => false,
        }
    }

    /// Short name of the value's kind, used in error messages.
    pub(crate) fn kind(&self) -> String {
        match self {
            Value::List(values) => match values.first().and_then(Value::dtype) {
                Some(dtype) => format!("LIST<{dtype}>"),
                None => "LIST".to_string(),
            },
            value => value
                .dtype()
                .map(|dtype| dtype.to_string())
                .unwrap_or_default(),
        }
    }
}

macro_rules! impl_value_from {
    ($($native:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$native> for Value {
                fn from(value: $native) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_value_from!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    bool => Bool,
    String => Str,
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

/// An ordered tuple of field values, positionally matching a [`crate::Schema`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row(
    /// Field values, in column order.
    Vec<Value>,
);

impl Row {
    /// Creates a row from its values.
    pub fn new(values: Vec<Value>) -> Self {
        Row(values)
    }

    /// Returns the number of fields in this row.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value at `position`, if any.
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.0.get(position)
    }

    /// Returns the values of this row.
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Consumes the row, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row(values)
    }
}

impl FromIterator<Value> for Row {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Row(iter.into_iter().collect())
    }
}
