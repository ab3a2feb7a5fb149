//! Raw-buffer access to list columns.
//!
//! Arrow arrays may be zero-copy slices over larger buffers, and two access paths exist for their
//! contents. Typed accessors such as [`arrow::array::ListArray::value_offsets`] and
//! [`ArrayData::buffer`] already skip the slice's base offset. Raw buffers from
//! [`ArrayData::buffers`] do not, so every index into them must add [`ArrayData::offset`] once.
//! [`RawListView`] is the only place in this crate that reads raw buffers.

use std::marker::PhantomData;

use arrow::array::{ArrayData, ArrowPrimitiveType};
use arrow::datatypes::DataType;
use snafu::{ensure, Snafu};

/// Errors that can occur when viewing list data through its raw buffers.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum RawListError {
    /// The array data is not a list.
    #[snafu(display("expected list data, found {data_type}"))]
    NotAList {
        /// Data type that was encountered.
        data_type: DataType,
    },
    /// The list child has another element type than requested.
    #[snafu(display("expected list elements of type {expected}, found {actual}"))]
    ElementTypeMismatch {
        /// Requested element type.
        expected: DataType,
        /// Actual element type.
        actual: DataType,
    },
    /// The list data carries nulls.
    #[snafu(display("list data with nulls is not supported"))]
    UnsupportedNull,
    /// The list data does not have the buffers arrow requires.
    #[snafu(display("list data is missing its offsets or values buffer"))]
    MissingBuffer,
    /// The offsets decrease or point past the child values.
    #[snafu(display("list offsets are decreasing or exceed the {child_len} child values"))]
    InvalidOffsets {
        /// Logical length of the child.
        child_len: usize,
    },
}

/// Read-only view over the buffers of a non-nullable list of primitives.
#[derive(Debug, Clone, Copy)]
pub struct RawListView<'a, T: ArrowPrimitiveType> {
    /// One boundary per entry plus the closing one, already relative to the list's slice.
    offsets: &'a [i32],
    /// The child's whole values buffer, starting before the child's slice.
    values: &'a [T::Native],
    /// Base offset of the child slice within `values`.
    values_offset: usize,
    /// Arrow type of the elements.
    _type: PhantomData<T>,
}

impl<'a, T: ArrowPrimitiveType> RawListView<'a, T> {
    /// Creates a view over `data`, which must be `List<T>` data without nulls.
    pub fn try_new(data: &'a ArrayData) -> Result<Self, RawListError> {
        ensure!(
            matches!(data.data_type(), DataType::List(_)),
            NotAListSnafu {
                data_type: data.data_type().clone(),
            }
        );
        let child = data.child_data().first().ok_or(RawListError::MissingBuffer)?;
        ensure!(
            child.data_type() == &T::DATA_TYPE,
            ElementTypeMismatchSnafu {
                expected: T::DATA_TYPE,
                actual: child.data_type().clone(),
            }
        );
        ensure!(
            data.null_count() == 0 && child.null_count() == 0,
            UnsupportedNullSnafu
        );
        ensure!(
            !data.buffers().is_empty() && !child.buffers().is_empty(),
            MissingBufferSnafu
        );

        // `buffer` applies the list's own offset.
        let offsets = data
            .buffer::<i32>(0)
            .get(..data.len() + 1)
            .ok_or(RawListError::MissingBuffer)?;
        // Raw child buffer: the child's offset is applied in `entry`.
        let values = child.buffers()[0].typed_data::<T::Native>();

        // Every entry must lie within the child's logical values.
        let child_len = child.len();
        ensure!(
            child.offset() + child_len <= values.len()
                && offsets.first().is_some_and(|start| *start >= 0)
                && offsets.windows(2).all(|pair| pair[0] <= pair[1])
                && offsets
                    .last()
                    .is_some_and(|end| usize::try_from(*end).is_ok_and(|end| end <= child_len)),
            InvalidOffsetsSnafu { child_len }
        );

        Ok(RawListView {
            offsets,
            values,
            values_offset: child.offset(),
            _type: PhantomData,
        })
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Returns `true` if the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the base offset of the child slice within its raw values buffer.
    pub fn values_offset(&self) -> usize {
        self.values_offset
    }

    /// Returns the elements of entry `index`, or `None` past the end.
    pub fn entry(&self, index: usize) -> Option<&'a [T::Native]> {
        let start = usize::try_from(*self.offsets.get(index)?).ok()?;
        let end = usize::try_from(*self.offsets.get(index + 1)?).ok()?;
        self.values
            .get(self.values_offset + start..self.values_offset + end)
    }

    /// Returns an iterator over all entries.
    pub fn iter(&self) -> impl Iterator<Item = &'a [T::Native]> + '_ {
        (0..self.len()).map(|index| {
            self.entry(index)
                .expect("entry bounds are validated when the view is created")
        })
    }
}
