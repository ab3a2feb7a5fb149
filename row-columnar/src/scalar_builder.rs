use arrow::array::ArrayRef;
use snafu::ensure;

use crate::builder::{
    BooleanColumnBuilder,
    BuilderError,
    BuilderFinalizedSnafu,
    BuilderState,
    ColumnBuilder,
    DateColumnBuilder,
    Float32ColumnBuilder,
    Float64ColumnBuilder,
    Int16ColumnBuilder,
    Int32ColumnBuilder,
    Int64ColumnBuilder,
    Int8ColumnBuilder,
    StringColumnBuilder,
    TimeColumnBuilder,
};
use crate::dtype::Dtype;
use crate::value::Value;

/// Column builder whose element type is chosen at runtime from a [`Dtype`].
///
/// Accepts [`Value`]s and rejects any value of another dtype; nothing is coerced.
#[derive(Debug)]
pub enum ScalarColumnBuilder {
    /// `INT8` builder.
    Int8(Int8ColumnBuilder),
    /// `INT16` builder.
    Int16(Int16ColumnBuilder),
    /// `INT32` builder.
    Int32(Int32ColumnBuilder),
    /// `INT64` builder.
    Int64(Int64ColumnBuilder),
    /// `FLOAT32` builder.
    Float32(Float32ColumnBuilder),
    /// `FLOAT64` builder.
    Float64(Float64ColumnBuilder),
    /// `BOOL` builder.
    Bool(BooleanColumnBuilder),
    /// `STR` builder.
    Str(StringColumnBuilder),
    /// `TIME` builder.
    Time(TimeColumnBuilder),
    /// `DATE` builder.
    Date(DateColumnBuilder),
}

/// Expands `$body` once per variant with `$builder` bound to the inner builder.
macro_rules! for_each_builder {
    ($self:expr, $builder:ident => $body:expr) => {
        match $self {
            ScalarColumnBuilder::Int8($builder) => $body,
            ScalarColumnBuilder::Int16($builder) => $body,
            ScalarColumnBuilder::Int32($builder) => $body,
            ScalarColumnBuilder::Int64($builder) => $body,
            ScalarColumnBuilder::Float32($builder) => $body,
            ScalarColumnBuilder::Float64($builder) => $body,
            ScalarColumnBuilder::Bool($builder) => $body,
            ScalarColumnBuilder::Str($builder) => $body,
            ScalarColumnBuilder::Time($builder) => $body,
            ScalarColumnBuilder::Date($builder) => $body,
        }
    };
}

impl ScalarColumnBuilder {
    /// Creates an empty builder for `dtype`.
    pub fn new(dtype: Dtype) -> Self {
        match dtype {
            Dtype::Int8 => ScalarColumnBuilder::Int8(Int8ColumnBuilder::new()),
            Dtype::Int16 => ScalarColumnBuilder::Int16(Int16ColumnBuilder::new()),
            Dtype::Int32 => ScalarColumnBuilder::Int32(Int32ColumnBuilder::new()),
            Dtype::Int64 => ScalarColumnBuilder::Int64(Int64ColumnBuilder::new()),
            Dtype::Float32 => ScalarColumnBuilder::Float32(Float32ColumnBuilder::new()),
            Dtype::Float64 => ScalarColumnBuilder::Float64(Float64ColumnBuilder::new()),
            Dtype::Bool => ScalarColumnBuilder::Bool(BooleanColumnBuilder::new()),
            Dtype::Str => ScalarColumnBuilder::Str(StringColumnBuilder::new()),
            Dtype::Time => ScalarColumnBuilder::Time(TimeColumnBuilder::new()),
            Dtype::Date => ScalarColumnBuilder::Date(DateColumnBuilder::new()),
        }
    }

    /// Creates an empty builder for `dtype` with room for `capacity` values.
    pub fn with_capacity(dtype: Dtype, capacity: usize) -> Result<Self, BuilderError> {
        Ok(match dtype {
            Dtype::Int8 => ScalarColumnBuilder::Int8(Int8ColumnBuilder::with_capacity(capacity)?),
            Dtype::Int16 => {
                ScalarColumnBuilder::Int16(Int16ColumnBuilder::with_capacity(capacity)?)
            }
            Dtype::Int32 => {
                ScalarColumnBuilder::Int32(Int32ColumnBuilder::with_capacity(capacity)?)
            }
            Dtype::Int64 => {
                ScalarColumnBuilder::Int64(Int64ColumnBuilder::with_capacity(capacity)?)
            }
            Dtype::Float32 => {
                ScalarColumnBuilder::Float32(Float32ColumnBuilder::with_capacity(capacity)?)
            }
            Dtype::Float64 => {
                ScalarColumnBuilder::Float64(Float64ColumnBuilder::with_capacity(capacity)?)
            }
            Dtype::Bool => {
                ScalarColumnBuilder::Bool(BooleanColumnBuilder::with_capacity(capacity)?)
            }
            Dtype::Str => ScalarColumnBuilder::Str(StringColumnBuilder::with_capacity(capacity)?),
            Dtype::Time => ScalarColumnBuilder::Time(TimeColumnBuilder::with_capacity(capacity)?),
            Dtype::Date => ScalarColumnBuilder::Date(DateColumnBuilder::with_capacity(capacity)?),
        })
    }

    /// Returns the dtype this builder accepts.
    pub fn dtype(&self) -> Dtype {
        match self {
            ScalarColumnBuilder::Int8(_) => Dtype::Int8,
            ScalarColumnBuilder::Int16(_) => Dtype::Int16,
            ScalarColumnBuilder::Int32(_) => Dtype::Int32,
            ScalarColumnBuilder::Int64(_) => Dtype::Int64,
            ScalarColumnBuilder::Float32(_) => Dtype::Float32,
            ScalarColumnBuilder::Float64(_) => Dtype::Float64,
            ScalarColumnBuilder::Bool(_) => Dtype::Bool,
            ScalarColumnBuilder::Str(_) => Dtype::Str,
            ScalarColumnBuilder::Time(_) => Dtype::Time,
            ScalarColumnBuilder::Date(_) => Dtype::Date,
        }
    }
}

impl ColumnBuilder for ScalarColumnBuilder {
    type Value = Value;

    fn append(&mut self, value: Value) -> Result<(), BuilderError> {
        ensure!(self.state() != BuilderState::Finished, BuilderFinalizedSnafu);

        match (self, value) {
            (ScalarColumnBuilder::Int8(builder), Value::Int8(value)) => builder.append(value),
            (ScalarColumnBuilder::Int16(builder), Value::Int16(value)) => builder.append(value),
            (ScalarColumnBuilder::Int32(builder), Value::Int32(value)) => builder.append(value),
            (ScalarColumnBuilder::Int64(builder), Value::Int64(value)) => builder.append(value),
            (ScalarColumnBuilder::Float32(builder), Value::Float32(value)) => {
                builder.append(value)
            }
            (ScalarColumnBuilder::Float64(builder), Value::Float64(value)) => {
                builder.append(value)
            }
            (ScalarColumnBuilder::Bool(builder), Value::Bool(value)) => builder.append(value),
            (ScalarColumnBuilder::Str(builder), Value::Str(value)) => builder.append(value),
            (ScalarColumnBuilder::Time(builder), Value::Time(value)) => builder.append(value),
            (ScalarColumnBuilder::Date(builder), Value::Date(value)) => builder.append(value),
            (builder, value) => Err(BuilderError::TypeMismatch {
                expected: builder.dtype(),
                found: value.kind(),
            }),
        }
    }

    fn len(&self) -> usize {
        for_each_builder!(self, builder => builder.len())
    }

    fn state(&self) -> BuilderState {
        for_each_builder!(self, builder => builder.state())
    }

    fn finish_array(&mut self) -> Result<ArrayRef, BuilderError> {
        for_each_builder!(self, builder => builder.finish_array())
    }
}
