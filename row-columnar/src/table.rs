use std::sync::Arc;

use arrow::array::{Array, ArrayRef, ListArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use log::debug;
use snafu::Snafu;

use crate::dtype::ColumnType;
use crate::schema::{Schema, SchemaError};

/// Immutable columnar table: one arrow array per column, all sharing one row count, paired with
/// the [`Schema`] describing them in order.
///
/// Tables are only created through [`Table::assemble`] or `TryFrom<RecordBatch>`, both of which
/// validate every invariant. There is no mutation path afterwards, so a table can be shared
/// freely between readers.
#[derive(Clone, Debug)]
pub struct Table {
    /// Names and types of the columns, in order.
    schema: Schema,
    /// The arrays, in schema order.
    batch: RecordBatch,
}

/// Errors that can occur when assembling a [`Table`].
#[derive(Debug, Snafu)]
pub enum AssembleError {
    /// [`Table`] must at least have one column.
    #[snafu(display("table must at least have one column"))]
    NoColumns,
    /// [`Table`] cannot have columns of differing lengths.
    #[snafu(display(
        "column {name:?} has {actual} rows, expected {expected} like the first column"
    ))]
    SchemaMismatch {
        /// Name of the first column whose length differs.
        name: String,
        /// Row count of the first column.
        expected: usize,
        /// Row count of the offending column.
        actual: usize,
    },
    /// Column names must be unique.
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
    /// Columns must not contain nulls.
    #[snafu(display("column {name:?} contains nulls, which are not supported"))]
    UnsupportedNull {
        /// Name of the offending column.
        name: String,
    },
    /// Arrow rejected the assembled batch.
    ///
    /// Note: this shouldn't happen since every arrow requirement is checked beforehand.
    #[snafu(display("arrow rejected the assembled batch: {source}"))]
    Arrow {
        /// Error encountered by arrow.
        source: ArrowError,
    },
}

impl From<SchemaError> for AssembleError {
    fn from(error: SchemaError) -> Self {
        match error {
            SchemaError::DuplicateColumn { name } => AssembleError::DuplicateColumn { name },
            SchemaError::UnsupportedType { name, data_type } => {
                AssembleError::UnsupportedType { name, data_type }
            }
        }
    }
}

/// Returns `true` if the array, or the elements of a list array, contain nulls.
fn has_nulls(array: &dyn Array) -> bool {
    if array.null_count() > 0 {
        return true;
    }
    match array.data_type() {
        DataType::List(_) => array
            .as_any()
            .downcast_ref::<ListArray>()
            .is_some_and(|list| list.values().null_count() > 0),
        _ => false,
    }
}

impl Table {
    /// Assembles finished arrays into a table, in the given column order.
    ///
    /// All-or-nothing: on any failure no table is produced.
    pub fn assemble<N: Into<String>>(
        fields: impl IntoIterator<Item = (N, ArrayRef)>,
    ) -> Result<Table, AssembleError> {
        let fields = fields
            .into_iter()
            .map(|(name, array)| (name.into(), array))
            .collect::<Vec<(String, ArrayRef)>>();

        let num_rows = fields
            .first()
            .map(|(_, array)| array.len())
            .ok_or(AssembleError::NoColumns)?;

        if let Some((name, array)) = fields.iter().find(|(_, array)| array.len() != num_rows) {
            return Err(AssembleError::SchemaMismatch {
                name: name.clone(),
                expected: num_rows,
                actual: array.len(),
            });
        }

        let schema = Schema::try_from_iter(
            fields
                .iter()
                .map(|(name, array)| {
                    ColumnType::from_arrow(array.data_type())
                        .map(|column_type| (name.clone(), column_type))
                        .ok_or_else(|| AssembleError::UnsupportedType {
                            name: name.clone(),
                            data_type: array.data_type().clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
        )?;

        if let Some((name, _)) = fields.iter().find(|(_, array)| has_nulls(array.as_ref())) {
            return Err(AssembleError::UnsupportedNull { name: name.clone() });
        }

        // Fields take the arrays' own types so list child fields match exactly.
        let arrow_schema = Arc::new(ArrowSchema::new(
            fields
                .iter()
                .map(|(name, array)| Field::new(name, array.data_type().clone(), false))
                .collect::<Vec<_>>(),
        ));
        let columns = fields.into_iter().map(|(_, array)| array).collect();
        let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
        let batch = RecordBatch::try_new_with_options(arrow_schema, columns, &options)
            .map_err(|source| AssembleError::Arrow { source })?;

        debug!(
            "assembled table with {} columns and {num_rows} rows",
            schema.num_columns()
        );
        Ok(Table { schema, batch })
    }

    /// Returns the schema of this table.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the number of columns in this table.
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Returns the number of rows in this table.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Returns the array at column position `index`.
    pub fn column(&self, index: usize) -> Option<&ArrayRef> {
        self.batch.columns().get(index)
    }

    /// Returns the array of the named column.
    pub fn column_by_name(&self, name: &str) -> Option<&ArrayRef> {
        self.schema
            .index_of(name)
            .and_then(|index| self.column(index))
    }

    /// Returns all arrays, in column order.
    pub fn columns(&self) -> &[ArrayRef] {
        self.batch.columns()
    }

    /// Returns the underlying arrow batch.
    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Returns a zero-copy view of `length` rows starting at `offset`.
    ///
    /// Returns `None` if the range exceeds the table.
    pub fn slice(&self, offset: usize, length: usize) -> Option<Table> {
        let end = offset.checked_add(length)?;
        if end > self.num_rows() {
            return None;
        }
        Some(Table {
            schema: self.schema.clone(),
            batch: self.batch.slice(offset, length),
        })
    }
}

impl TryFrom<RecordBatch> for Table {
    type Error = AssembleError;
    fn try_from(batch: RecordBatch) -> Result<Self, Self::Error> {
        Table::assemble(
            batch
                .schema()
                .fields()
                .iter()
                .map(|field| field.name().clone())
                .zip(batch.columns().iter().cloned()),
        )
    }
}

impl From<Table> for RecordBatch {
    fn from(table: Table) -> Self {
        table.batch
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.batch.columns() == other.batch.columns()
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{BooleanArray, Float32Array, Int64Array, StringArray, UInt64Array};

    use super::*;
    use crate::builder::{ColumnBuilder, Float64ColumnBuilder, Int64ColumnBuilder};
    use crate::dtype::Dtype;
    use crate::list_builder::ListBuilder;

    fn int64s(values: Vec<i64>) -> ArrayRef {
        Arc::new(Int64Array::from(values))
    }

    fn strings(values: &[&str]) -> ArrayRef {
        Arc::new(StringArray::from(values.to_vec()))
    }

    #[test]
    fn we_can_assemble_a_table_from_finished_builders() {
        let mut ids = Int64ColumnBuilder::new();
        let mut components = ListBuilder::new(Float64ColumnBuilder::new()).unwrap();
        for id in 0..4 {
            ids.append(id).unwrap();
            components.append_entry((0..id).map(|i| i as f64)).unwrap();
        }

        let table = Table::assemble([
            ("id", ids.finish_array().unwrap()),
            ("cost_components", components.finish_array().unwrap()),
        ])
        .unwrap();

        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.num_rows(), 4);
        assert_eq!(
            table.schema(),
            &Schema::try_from_iter([
                ("id", ColumnType::Primitive(Dtype::Int64)),
                ("cost_components", ColumnType::List(Dtype::Float64)),
            ])
            .unwrap()
        );
        assert_eq!(table.column_by_name("id"), table.column(0));
        assert!(table.column_by_name("missing").is_none());
    }

    #[test]
    fn we_can_assemble_a_table_with_zero_rows() {
        let table = Table::assemble([("id", int64s(vec![])), ("name", strings(&[]))]).unwrap();
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.num_columns(), 2);
    }

    #[test]
    fn we_cannot_assemble_table_with_no_columns() {
        assert!(matches!(
            Table::assemble(Vec::<(String, ArrayRef)>::new()),
            Err(AssembleError::NoColumns)
        ));
    }

    #[test]
    fn we_cannot_assemble_table_with_columns_of_differing_lengths() {
        let result = Table::assemble([
            ("id", int64s(vec![1, 2, 3])),
            ("name", strings(&["lorem", "ipsum"])),
        ]);
        assert!(matches!(
            result,
            Err(AssembleError::SchemaMismatch { ref name, expected: 3, actual: 2 }) if name == "name"
        ));

        let result = Table::assemble([
            ("id", int64s(vec![1, 2])),
            ("name", strings(&["lorem", "ipsum", "dolor"])),
        ]);
        assert!(matches!(result, Err(AssembleError::SchemaMismatch { .. })));

        let result = Table::assemble([
            ("id", int64s(vec![1, 2, 3])),
            ("name", strings(&["lorem", "ipsum", "dolor"])),
            ("flag", Arc::new(BooleanArray::from(vec![true, false])) as ArrayRef),
        ]);
        assert!(matches!(result, Err(AssembleError::SchemaMismatch { .. })));
    }

    #[test]
    fn we_cannot_assemble_table_with_duplicate_names() {
        assert!(matches!(
            Table::assemble([("id", int64s(vec![1])), ("id", int64s(vec![2]))]),
            Err(AssembleError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn we_cannot_assemble_table_with_unsupported_or_null_columns() {
        let unsigned: ArrayRef = Arc::new(UInt64Array::from(vec![1_u64]));
        assert!(matches!(
            Table::assemble([("unsigned", unsigned)]),
            Err(AssembleError::UnsupportedType { .. })
        ));

        let nullable: ArrayRef = Arc::new(Float32Array::from(vec![Some(1.0), None]));
        assert!(matches!(
            Table::assemble([("nullable", nullable)]),
            Err(AssembleError::UnsupportedNull { ref name }) if name == "nullable"
        ));
    }

    #[test]
    fn we_can_convert_table_to_and_from_record_batch() {
        let table =
            Table::assemble([("id", int64s(vec![1, 2, 3])), ("name", strings(&["a", "b", "c"]))])
                .unwrap();

        let batch = RecordBatch::from(table.clone());
        assert_eq!(batch.num_rows(), 3);
        assert!(batch.schema().fields().iter().all(|field| !field.is_nullable()));
        assert_eq!(Table::try_from(batch).unwrap(), table);
    }

    #[test]
    fn we_cannot_convert_record_batch_with_duplicate_names() {
        let batch = RecordBatch::try_from_iter([
            ("duplicate", int64s(vec![1, 2, 3])),
            ("duplicate", strings(&["a", "b", "c"])),
        ])
        .unwrap();
        assert!(matches!(
            Table::try_from(batch),
            Err(AssembleError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn we_can_slice_a_table_without_copying() {
        let table = Table::assemble([("id", int64s(vec![10, 20, 30, 40]))]).unwrap();

        let slice = table.slice(1, 2).unwrap();
        assert_eq!(slice.num_rows(), 2);
        assert_eq!(slice.schema(), table.schema());
        assert_eq!(
            slice.column(0).unwrap().as_ref(),
            &Int64Array::from(vec![20, 30]) as &dyn Array
        );

        assert!(table.slice(0, 4).is_some());
        assert!(table.slice(4, 0).is_some());
        assert!(table.slice(3, 2).is_none());
        assert!(table.slice(usize::MAX, 2).is_none());
    }
}
