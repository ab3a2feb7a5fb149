use std::sync::Arc;

use arrow::array::{Array, ListArray};
use arrow::buffer::{OffsetBuffer, ScalarBuffer};
use arrow::datatypes::Field;
use log::debug;
use snafu::{ensure, ResultExt};

use crate::builder::{
    AllocationSnafu,
    ArrowSnafu,
    BuilderBuffer,
    BuilderError,
    BuilderFinalizedSnafu,
    BuilderState,
    ColumnBuilder,
    ChildNotEmptySnafu,
    NoOpenEntrySnafu,
};

/// Builder for variable-length list columns.
///
/// Owns one child builder holding the flattened element values. Every row begins with
/// [`ListBuilder::start_entry`], which records the child's current length as the row's start
/// boundary; the row's elements (possibly none) then go through [`ListBuilder::append_value`].
/// On finish the child's final length closes the last row, so the resulting offsets always start
/// at zero, never decrease, and end at the number of child values.
#[derive(Debug)]
pub struct ListBuilder<B> {
    /// Builder of the flattened element values.
    child: B,
    /// Start boundary of every entry, closed on finish.
    offsets: BuilderBuffer<i32>,
}

/// A child that already holds values would make the first offset non-zero.
fn ensure_empty_child<B: ColumnBuilder>(child: &B) -> Result<(), BuilderError> {
    let state = child.state();
    ensure!(state == BuilderState::Empty, ChildNotEmptySnafu { state });
    Ok(())
}

impl<B: ColumnBuilder> ListBuilder<B> {
    /// Creates a list builder around `child`, which must be [`BuilderState::Empty`].
    pub fn new(child: B) -> Result<Self, BuilderError> {
        ensure_empty_child(&child)?;
        Ok(ListBuilder {
            child,
            offsets: BuilderBuffer::new(),
        })
    }

    /// Creates a list builder with room for `capacity` entries.
    ///
    /// `child` must be [`BuilderState::Empty`].
    pub fn with_capacity(child: B, capacity: usize) -> Result<Self, BuilderError> {
        ensure_empty_child(&child)?;
        Ok(ListBuilder {
            child,
            offsets: BuilderBuffer::with_capacity(capacity.saturating_add(1))?,
        })
    }

    /// Starts a new entry at the child's current length.
    pub fn start_entry(&mut self) -> Result<(), BuilderError> {
        let length = self.child.len();
        let boundary =
            i32::try_from(length).map_err(|_| BuilderError::OffsetOverflow { length })?;
        self.offsets.push(boundary)
    }

    /// Appends one element to the current entry.
    pub fn append_value(&mut self, value: B::Value) -> Result<(), BuilderError> {
        ensure!(
            self.offsets.state() != BuilderState::Finished,
            BuilderFinalizedSnafu
        );
        ensure!(!self.offsets.is_empty(), NoOpenEntrySnafu);
        self.child.append(value)
    }

    /// Starts a new entry and appends all of `values` to it.
    pub fn append_entry(
        &mut self,
        values: impl IntoIterator<Item = B::Value>,
    ) -> Result<(), BuilderError> {
        self.start_entry()?;
        values
            .into_iter()
            .try_for_each(|value| self.append_value(value))
    }

    /// Returns the number of entries started so far.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns `true` if no entry was started.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Returns the number of element values across all entries.
    pub fn values_len(&self) -> usize {
        self.child.len()
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> BuilderState {
        self.offsets.state()
    }

    /// Returns the child builder holding the element values.
    pub fn child(&self) -> &B {
        &self.child
    }

    /// Finishes the offsets and the child into a [`ListArray`].
    pub fn finish(&mut self) -> Result<ListArray, BuilderError> {
        let length = self.child.len();
        let end = i32::try_from(length).map_err(|_| BuilderError::OffsetOverflow { length })?;

        let mut offsets = self.offsets.take()?;
        offsets.try_reserve(1).context(AllocationSnafu)?;
        offsets.push(end);

        let values = self.child.finish_array()?;
        let item = Arc::new(Field::new_list_field(values.data_type().clone(), false));
        let entries = offsets.len() - 1;

        let list = ListArray::try_new(
            item,
            OffsetBuffer::new(ScalarBuffer::from(offsets)),
            values,
            None,
        )
        .context(ArrowSnafu)?;

        debug!("finished list column with {entries} entries and {length} values");
        Ok(list)
    }
}

impl<B: ColumnBuilder> ColumnBuilder for ListBuilder<B> {
    type Value = Vec<B::Value>;

    fn append(&mut self, values: Vec<B::Value>) -> Result<(), BuilderError> {
        self.append_entry(values)
    }

    fn len(&self) -> usize {
        self.offsets.len()
    }

    fn state(&self) -> BuilderState {
        self.offsets.state()
    }

    fn finish_array(&mut self) -> Result<arrow::array::ArrayRef, BuilderError> {
        Ok(Arc::new(self.finish()?))
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{AsArray, Float64Array};
    use arrow::datatypes::{DataType, Float64Type};

    use super::*;
    use crate::builder::{Float64ColumnBuilder, StringColumnBuilder};

    fn assert_offsets_invariant(list: &ListArray) {
        let offsets = list.value_offsets();
        assert_eq!(offsets.first(), Some(&0));
        assert!(offsets.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(*offsets.last().unwrap() as usize, list.values().len());
    }

    #[test]
    fn we_can_build_the_cost_components_column() {
        let mut builder = ListBuilder::new(Float64ColumnBuilder::new()).unwrap();
        for row in [vec![1.0], vec![1.0, 2.0], vec![1.0, 2.0, 3.0]] {
            builder.start_entry().unwrap();
            for value in row {
                builder.append_value(value).unwrap();
            }
        }
        assert_eq!(builder.len(), 3);
        assert_eq!(builder.values_len(), 6);

        let list = builder.finish().unwrap();
        assert_eq!(list.value_offsets(), &[0, 1, 3, 6]);
        assert_eq!(list.value_length(0), 1);
        assert_eq!(list.value_length(1), 2);
        assert_eq!(list.value_length(2), 3);
        assert_eq!(
            list.values().as_primitive::<Float64Type>(),
            &Float64Array::from(vec![1.0, 1.0, 2.0, 1.0, 2.0, 3.0])
        );
        assert_offsets_invariant(&list);
    }

    #[test]
    fn we_can_build_empty_entries() {
        let mut builder = ListBuilder::new(Float64ColumnBuilder::new()).unwrap();
        builder.append_entry([]).unwrap();
        builder.append_entry([4.0, 5.0]).unwrap();
        builder.append_entry([]).unwrap();

        let list = builder.finish().unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.value_offsets(), &[0, 0, 2, 2]);
        assert!(list.is_valid(0));
        assert_offsets_invariant(&list);
    }

    #[test]
    fn finishing_an_empty_list_builder_yields_a_single_zero_offset() {
        let mut builder = ListBuilder::new(StringColumnBuilder::new()).unwrap();
        assert_eq!(builder.state(), BuilderState::Empty);

        let list = builder.finish().unwrap();
        assert_eq!(list.len(), 0);
        assert_eq!(list.value_offsets(), &[0]);
        assert_eq!(
            list.data_type(),
            &DataType::List(Arc::new(Field::new_list_field(DataType::Utf8, false)))
        );
        assert_offsets_invariant(&list);
    }

    #[test]
    fn we_cannot_append_values_before_starting_an_entry() {
        let mut builder = ListBuilder::new(Float64ColumnBuilder::new()).unwrap();
        assert!(matches!(
            builder.append_value(1.0),
            Err(BuilderError::NoOpenEntry)
        ));
        assert_eq!(builder.values_len(), 0);
    }

    #[test]
    fn we_cannot_wrap_a_child_builder_that_is_not_empty() {
        let mut child = Float64ColumnBuilder::new();
        child.append(9.0).unwrap();
        child.append(9.0).unwrap();
        assert!(matches!(
            ListBuilder::new(child),
            Err(BuilderError::ChildNotEmpty {
                state: BuilderState::Building
            })
        ));

        let mut child = Float64ColumnBuilder::new();
        child.finish().unwrap();
        assert!(matches!(
            ListBuilder::with_capacity(child, 4),
            Err(BuilderError::ChildNotEmpty {
                state: BuilderState::Finished
            })
        ));
    }

    #[test]
    fn we_cannot_use_a_list_builder_after_finish() {
        let mut builder = ListBuilder::with_capacity(Float64ColumnBuilder::new(), 1).unwrap();
        builder.append_entry([1.0]).unwrap();
        builder.finish().unwrap();
        assert_eq!(builder.state(), BuilderState::Finished);

        assert!(matches!(
            builder.start_entry(),
            Err(BuilderError::BuilderFinalized)
        ));
        assert!(matches!(
            builder.append_value(2.0),
            Err(BuilderError::BuilderFinalized)
        ));
        assert!(matches!(
            builder.finish(),
            Err(BuilderError::BuilderFinalized)
        ));
    }

    #[test]
    fn list_builders_are_column_builders() {
        let mut builder = ListBuilder::new(Float64ColumnBuilder::new()).unwrap();
        ColumnBuilder::append(&mut builder, vec![1.0, 2.0]).unwrap();
        ColumnBuilder::append(&mut builder, vec![]).unwrap();
        assert_eq!(ColumnBuilder::len(&builder), 2);

        let array = builder.finish_array().unwrap();
        let list = array.as_list::<i32>();
        assert_eq!(list.value_offsets(), &[0, 2, 2]);
    }
}
