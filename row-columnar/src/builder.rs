use std::collections::TryReserveError;
use std::marker::PhantomData;
use std::mem;
use std::sync::Arc;

use arrow::array::{ArrayRef, ArrowPrimitiveType, BooleanArray, PrimitiveArray, StringArray};
use arrow::buffer::ScalarBuffer;
use arrow::datatypes::{
    Date32Type,
    Float32Type,
    Float64Type,
    Int16Type,
    Int32Type,
    Int64Type,
    Int8Type,
    TimestampMillisecondType,
};
use arrow::error::ArrowError;
use snafu::{ensure, ResultExt, Snafu};

use crate::dtype::Dtype;

/// Errors that can occur while appending to or finishing a builder.
///
/// None of these are recoverable for the in-flight build: the caller should drop the builder
/// rather than keep appending to it.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BuilderError {
    /// The backing storage could not grow.
    #[snafu(display("failed to grow builder storage: {source}"))]
    Allocation {
        /// Error reported by the allocator.
        source: TryReserveError,
    },
    /// The builder was used after `finish`.
    #[snafu(display("builder was already finished"))]
    BuilderFinalized,
    /// A dynamically-typed value did not match the builder's dtype.
    #[snafu(display("expected a {expected} value, found {found}"))]
    TypeMismatch {
        /// Dtype of the builder.
        expected: Dtype,
        /// Kind of the rejected value.
        found: String,
    },
    /// A list builder was given a child that already holds values or was finished.
    #[snafu(display("list child builder must be empty, found it {state:?}"))]
    ChildNotEmpty {
        /// State of the rejected child.
        state: BuilderState,
    },
    /// A list element was appended before any entry was started.
    #[snafu(display("list value appended before any entry was started"))]
    NoOpenEntry,
    /// The list child grew past what an `i32` offset can address.
    #[snafu(display("list child length {length} does not fit in an i32 offset"))]
    OffsetOverflow {
        /// Length of the child at the failed boundary.
        length: usize,
    },
    /// Arrow rejected the finished buffers.
    #[snafu(display("arrow rejected the finished buffers: {source}"))]
    Arrow {
        /// Error encountered by arrow.
        source: ArrowError,
    },
}

/// Lifecycle of a single-use builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing has been appended yet.
    Empty,
    /// At least one value has been appended.
    Building,
    /// `finish` was called, the builder is spent.
    Finished,
}

/// Incrementally accumulates values and finishes into one immutable arrow array.
///
/// Builders are single-use: after `finish_array` every further call fails with
/// [`BuilderError::BuilderFinalized`].
pub trait ColumnBuilder {
    /// Type of value accepted by [`ColumnBuilder::append`].
    type Value;

    /// Appends one value.
    fn append(&mut self, value: Self::Value) -> Result<(), BuilderError>;

    /// Returns the number of values appended so far.
    fn len(&self) -> usize;

    /// Returns `true` if nothing has been appended.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current lifecycle state.
    fn state(&self) -> BuilderState;

    /// Finishes the builder into a type-erased arrow array.
    fn finish_array(&mut self) -> Result<ArrayRef, BuilderError>;
}

/// Growable storage shared by every builder, guarding the finished state.
#[derive(Debug)]
pub(crate) struct BuilderBuffer<T> {
    /// Values appended so far.
    values: Vec<T>,
    /// Set once the values were moved out.
    finished: bool,
}

impl<T> BuilderBuffer<T> {
    /// Creates an empty buffer without allocating.
    pub(crate) fn new() -> Self {
        BuilderBuffer {
            values: Vec::new(),
            finished: false,
        }
    }

    /// Creates an empty buffer with room for `capacity` values.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self, BuilderError> {
        let mut values = Vec::new();
        values.try_reserve(capacity).context(AllocationSnafu)?;
        Ok(BuilderBuffer {
            values,
            finished: false,
        })
    }

    /// Returns the number of values appended so far.
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was appended.
    pub(crate) fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the lifecycle state derived from the values and the finished flag.
    pub(crate) fn state(&self) -> BuilderState {
        match (self.finished, self.values.is_empty()) {
            (true, _) => BuilderState::Finished,
            (false, true) => BuilderState::Empty,
            (false, false) => BuilderState::Building,
        }
    }

    /// Appends one value, growing the storage fallibly.
    pub(crate) fn push(&mut self, value: T) -> Result<(), BuilderError> {
        ensure!(!self.finished, BuilderFinalizedSnafu);
        self.values.try_reserve(1).context(AllocationSnafu)?;
        self.values.push(value);
        Ok(())
    }

    /// Moves the values out, marking the buffer as finished.
    pub(crate) fn take(&mut self) -> Result<Vec<T>, BuilderError> {
        ensure!(!self.finished, BuilderFinalizedSnafu);
        self.finished = true;
        Ok(mem::take(&mut self.values))
    }
}

/// Builder for any arrow primitive type: integers, floats, timestamps and dates.
#[derive(Debug)]
pub struct PrimitiveColumnBuilder<T: ArrowPrimitiveType> {
    /// Native values appended so far.
    buffer: BuilderBuffer<T::Native>,
    /// Arrow type the values are finished into.
    _type: PhantomData<T>,
}

impl<T: ArrowPrimitiveType> PrimitiveColumnBuilder<T> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        PrimitiveColumnBuilder {
            buffer: BuilderBuffer::new(),
            _type: PhantomData,
        }
    }

    /// Creates an empty builder with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Result<Self, BuilderError> {
        Ok(PrimitiveColumnBuilder {
            buffer: BuilderBuffer::with_capacity(capacity)?,
            _type: PhantomData,
        })
    }

    /// Finishes into a typed primitive array, moving the buffer without copying.
    pub fn finish(&mut self) -> Result<PrimitiveArray<T>, BuilderError> {
        let values = self.buffer.take()?;
        PrimitiveArray::<T>::try_new(ScalarBuffer::from(values), None).context(ArrowSnafu)
    }
}

impl<T: ArrowPrimitiveType> Default for PrimitiveColumnBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ArrowPrimitiveType> ColumnBuilder for PrimitiveColumnBuilder<T> {
    type Value = T::Native;

    fn append(&mut self, value: T::Native) -> Result<(), BuilderError> {
        self.buffer.push(value)
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn state(&self) -> BuilderState {
        self.buffer.state()
    }

    fn finish_array(&mut self) -> Result<ArrayRef, BuilderError> {
        Ok(Arc::new(self.finish()?))
    }
}

/// Builder for `INT8` columns.
pub type Int8ColumnBuilder = PrimitiveColumnBuilder<Int8Type>;
/// Builder for `INT16` columns.
pub type Int16ColumnBuilder = PrimitiveColumnBuilder<Int16Type>;
/// Builder for `INT32` columns.
pub type Int32ColumnBuilder = PrimitiveColumnBuilder<Int32Type>;
/// Builder for `INT64` columns.
pub type Int64ColumnBuilder = PrimitiveColumnBuilder<Int64Type>;
/// Builder for `FLOAT32` columns.
pub type Float32ColumnBuilder = PrimitiveColumnBuilder<Float32Type>;
/// Builder for `FLOAT64` columns.
pub type Float64ColumnBuilder = PrimitiveColumnBuilder<Float64Type>;
/// Builder for `TIME` columns, in milliseconds since the unix epoch.
pub type TimeColumnBuilder = PrimitiveColumnBuilder<TimestampMillisecondType>;
/// Builder for `DATE` columns, in days since the unix epoch.
pub type DateColumnBuilder = PrimitiveColumnBuilder<Date32Type>;

/// Builder for `BOOL` columns.
#[derive(Debug)]
pub struct BooleanColumnBuilder {
    /// Values appended so far.
    buffer: BuilderBuffer<bool>,
}

impl BooleanColumnBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        BooleanColumnBuilder {
            buffer: BuilderBuffer::new(),
        }
    }

    /// Creates an empty builder with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Result<Self, BuilderError> {
        Ok(BooleanColumnBuilder {
            buffer: BuilderBuffer::with_capacity(capacity)?,
        })
    }

    /// Finishes into a bit-packed boolean array.
    pub fn finish(&mut self) -> Result<BooleanArray, BuilderError> {
        Ok(BooleanArray::from(self.buffer.take()?))
    }
}

impl Default for BooleanColumnBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnBuilder for BooleanColumnBuilder {
    type Value = bool;

    fn append(&mut self, value: bool) -> Result<(), BuilderError> {
        self.buffer.push(value)
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn state(&self) -> BuilderState {
        self.buffer.state()
    }

    fn finish_array(&mut self) -> Result<ArrayRef, BuilderError> {
        Ok(Arc::new(self.finish()?))
    }
}

/// Builder for `STR` columns.
#[derive(Debug)]
pub struct StringColumnBuilder {
    /// Values appended so far.
    buffer: BuilderBuffer<String>,
}

impl StringColumnBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        StringColumnBuilder {
            buffer: BuilderBuffer::new(),
        }
    }

    /// Creates an empty builder with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Result<Self, BuilderError> {
        Ok(StringColumnBuilder {
            buffer: BuilderBuffer::with_capacity(capacity)?,
        })
    }

    /// Finishes into a utf-8 string array.
    pub fn finish(&mut self) -> Result<StringArray, BuilderError> {
        Ok(StringArray::from(self.buffer.take()?))
    }
}

impl Default for StringColumnBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnBuilder for StringColumnBuilder {
    type Value = String;

    fn append(&mut self, value: String) -> Result<(), BuilderError> {
        self.buffer.push(value)
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn state(&self) -> BuilderState {
        self.buffer.state()
    }

    fn finish_array(&mut self) -> Result<ArrayRef, BuilderError> {
        Ok(Arc::new(self.finish()?))
    }
}
