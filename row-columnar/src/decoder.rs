use arrow::array::{
    Array,
    ArrayRef,
    BooleanArray,
    Date32Array,
    Float32Array,
    Float64Array,
    Int16Array,
    Int32Array,
    Int64Array,
    Int8Array,
    ListArray,
    StringArray,
    TimestampMillisecondArray,
};
use log::{debug, trace};
use snafu::{ensure, Snafu};

use crate::dtype::{ColumnType, Dtype};
use crate::schema::Schema;
use crate::table::Table;
use crate::value::{Row, Value};

/// Errors that can occur when decoding a [`Table`] back into rows.
#[derive(Debug, Snafu)]
pub enum DecodeError {
    /// The table's schema differs from the expected schema.
    #[snafu(display("table schema {actual} does not match expected schema {expected}"))]
    InvalidSchema {
        /// Schema the caller expected.
        expected: Schema,
        /// Schema the table actually has.
        actual: Schema,
    },
    /// Requested row does not exist.
    #[snafu(display("row {index} is out of bounds for a table of {num_rows} rows"))]
    RowOutOfBounds {
        /// Requested row.
        index: usize,
        /// Number of rows in the table.
        num_rows: usize,
    },
    /// Unexpected mismatch between schema and data
    ///
    /// Note: this shouldn't happen due to table validation.
    #[snafu(display("unexpected mismatch between schema and data"))]
    UnexpectedSchemaDataMismatch,
}

/// Checks that `table` has exactly the `expected` schema: same names, same types, same order.
pub fn validate_schema(table: &Table, expected: &Schema) -> Result<(), DecodeError> {
    ensure!(
        table.schema() == expected,
        InvalidSchemaSnafu {
            expected: expected.clone(),
            actual: table.schema().clone(),
        }
    );
    Ok(())
}

/// Typed, borrowed access to the values of one primitive array.
#[derive(Debug, Clone, Copy)]
enum ScalarReader<'a> {
    /// `INT8` values.
    Int8(&'a Int8Array),
    /// `INT16` values.
    Int16(&'a Int16Array),
    /// `INT32` values.
    Int32(&'a Int32Array),
    /// `INT64` values.
    Int64(&'a Int64Array),
    /// `FLOAT32` values.
    Float32(&'a Float32Array),
    /// `FLOAT64` values.
    Float64(&'a Float64Array),
    /// `BOOL` values.
    Bool(&'a BooleanArray),
    /// `STR` values.
    Str(&'a StringArray),
    /// `TIME` values.
    Time(&'a TimestampMillisecondArray),
    /// `DATE` values.
    Date(&'a Date32Array),
}

/// Downcasts `array` to the concrete array type of a dtype.
fn downcast<T: Array + 'static>(array: &dyn Array) -> Result<&T, DecodeError> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or(DecodeError::UnexpectedSchemaDataMismatch)
}

impl<'a> ScalarReader<'a> {
    /// Downcasts `array` to the array type of `dtype`.
    fn try_new(array: &'a dyn Array, dtype: Dtype) -> Result<Self, DecodeError> {
        Ok(match dtype {
            Dtype::Int8 => ScalarReader::Int8(downcast(array)?),
            Dtype::Int16 => ScalarReader::Int16(downcast(array)?),
            Dtype::Int32 => ScalarReader::Int32(downcast(array)?),
            Dtype::Int64 => ScalarReader::Int64(downcast(array)?),
            Dtype::Float32 => ScalarReader::Float32(downcast(array)?),
            Dtype::Float64 => ScalarReader::Float64(downcast(array)?),
            Dtype::Bool => ScalarReader::Bool(downcast(array)?),
            Dtype::Str => ScalarReader::Str(downcast(array)?),
            Dtype::Time => ScalarReader::Time(downcast(array)?),
            Dtype::Date => ScalarReader::Date(downcast(array)?),
        })
    }

    /// Reads the value at logical `index`. Typed arrays apply their own slice offset.
    fn value(&self, index: usize) -> Value {
        match self {
            ScalarReader::Int8(array) => Value::Int8(array.value(index)),
            ScalarReader::Int16(array) => Value::Int16(array.value(index)),
            ScalarReader::Int32(array) => Value::Int32(array.value(index)),
            ScalarReader::Int64(array) => Value::Int64(array.value(index)),
            ScalarReader::Float32(array) => Value::Float32(array.value(index)),
            ScalarReader::Float64(array) => Value::Float64(array.value(index)),
            ScalarReader::Bool(array) => Value::Bool(array.value(index)),
            ScalarReader::Str(array) => Value::Str(array.value(index).to_string()),
            ScalarReader::Time(array) => Value::Time(array.value(index)),
            ScalarReader::Date(array) => Value::Date(array.value(index)),
        }
    }
}

/// Reader for one column of a table.
#[derive(Debug, Clone, Copy)]
enum ColumnReader<'a> {
    /// One scalar per row.
    Primitive(ScalarReader<'a>),
    /// One entry of `values` per row, bounded by the list offsets.
    List {
        /// The list array, possibly a slice.
        list: &'a ListArray,
        /// Reader over the list's child values.
        values: ScalarReader<'a>,
    },
}

impl<'a> ColumnReader<'a> {
    /// Prepares a reader for `array` as a column of `column_type`.
    fn try_new(array: &'a ArrayRef, column_type: ColumnType) -> Result<Self, DecodeError> {
        match column_type {
            ColumnType::Primitive(dtype) => {
                ScalarReader::try_new(array.as_ref(), dtype).map(ColumnReader::Primitive)
            }
            ColumnType::List(dtype) => {
                let list = downcast::<ListArray>(array.as_ref())?;
                let values = ScalarReader::try_new(list.values().as_ref(), dtype)?;
                Ok(ColumnReader::List { list, values })
            }
        }
    }

    /// Reads the value of row `index`.
    fn value(&self, index: usize) -> Value {
        match self {
            ColumnReader::Primitive(reader) => reader.value(index),
            ColumnReader::List { list, values } => {
                // `value_offsets` is already relative to this slice of the list, and its entries
                // index the child logically, so no base offset is added here.
                let offsets = list.value_offsets();
                let start = offsets[index] as usize;
                let end = offsets[index + 1] as usize;
                Value::List((start..end).map(|position| values.value(position)).collect())
            }
        }
    }
}

/// Decodes rows out of a table whose schema was validated up front.
#[derive(Debug)]
pub struct TableDecoder<'a> {
    /// The validated table.
    table: &'a Table,
    /// One reader per column, in schema order.
    columns: Vec<ColumnReader<'a>>,
}

impl<'a> TableDecoder<'a> {
    /// Validates `table` against `expected` and prepares typed readers for every column.
    pub fn try_new(table: &'a Table, expected: &Schema) -> Result<Self, DecodeError> {
        validate_schema(table, expected)?;

        let columns = table
            .schema()
            .iter()
            .zip(table.columns())
            .map(|((_, column_type), array)| ColumnReader::try_new(array, *column_type))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TableDecoder { table, columns })
    }

    /// Returns the number of rows available.
    pub fn num_rows(&self) -> usize {
        self.table.num_rows()
    }

    /// Reconstructs the row at `index`.
    pub fn decode_row(&self, index: usize) -> Result<Row, DecodeError> {
        let num_rows = self.num_rows();
        ensure!(index < num_rows, RowOutOfBoundsSnafu { index, num_rows });

        let row = self
            .columns
            .iter()
            .map(|column| column.value(index))
            .collect::<Row>();
        trace!("decoded row {index}: {row:?}");
        Ok(row)
    }

    /// Returns an iterator over all rows, in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.num_rows()).map(|index| {
            self.columns
                .iter()
                .map(|column| column.value(index))
                .collect()
        })
    }

    /// Decodes every row, in insertion order.
    pub fn decode_all(&self) -> Vec<Row> {
        let rows = self.rows().collect::<Vec<_>>();
        debug!("decoded {} rows", rows.len());
        rows
    }
}

/// Validates `table` against `expected` and decodes the row at `index`.
pub fn decode_row(table: &Table, expected: &Schema, index: usize) -> Result<Row, DecodeError> {
    TableDecoder::try_new(table, expected)?.decode_row(index)
}

/// Validates `table` against `expected` and decodes all of its rows.
pub fn decode_table(table: &Table, expected: &Schema) -> Result<Vec<Row>, DecodeError> {
    Ok(TableDecoder::try_new(table, expected)?.decode_all())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::{ColumnBuilder, Float64ColumnBuilder, Int64ColumnBuilder};
    use crate::list_builder::ListBuilder;

    fn cost_schema() -> Schema {
        Schema::try_from_iter([
            ("id", ColumnType::Primitive(Dtype::Int64)),
            ("cost", ColumnType::Primitive(Dtype::Float64)),
            ("cost_components", ColumnType::List(Dtype::Float64)),
        ])
        .unwrap()
    }

    fn cost_table(rows: &[(i64, f64, Vec<f64>)]) -> Table {
        let mut ids = Int64ColumnBuilder::new();
        let mut costs = Float64ColumnBuilder::new();
        let mut components = ListBuilder::new(Float64ColumnBuilder::new()).unwrap();
        for (id, cost, cost_components) in rows {
            ids.append(*id).unwrap();
            costs.append(*cost).unwrap();
            components.append_entry(cost_components.iter().copied()).unwrap();
        }
        Table::assemble([
            ("id", ids.finish_array().unwrap()),
            ("cost", costs.finish_array().unwrap()),
            ("cost_components", components.finish_array().unwrap()),
        ])
        .unwrap()
    }

    fn row(id: i64, cost: f64, components: Vec<f64>) -> Row {
        Row::new(vec![
            Value::Int64(id),
            Value::Float64(cost),
            Value::from(components),
        ])
    }

    #[test]
    fn we_can_decode_each_row() {
        let table = cost_table(&[(1, 1.0, vec![1.0]), (2, 2.0, vec![])]);
        let decoder = TableDecoder::try_new(&table, &cost_schema()).unwrap();

        assert_eq!(decoder.decode_row(0).unwrap(), row(1, 1.0, vec![1.0]));
        assert_eq!(decoder.decode_row(1).unwrap(), row(2, 2.0, vec![]));
        assert!(matches!(
            decoder.decode_row(2),
            Err(DecodeError::RowOutOfBounds {
                index: 2,
                num_rows: 2
            })
        ));
    }

    #[test]
    fn we_cannot_decode_with_a_different_schema() {
        let table = cost_table(&[(1, 1.0, vec![1.0])]);

        let renamed = Schema::try_from_iter([
            ("id", ColumnType::Primitive(Dtype::Int64)),
            ("price", ColumnType::Primitive(Dtype::Float64)),
            ("cost_components", ColumnType::List(Dtype::Float64)),
        ])
        .unwrap();
        let retyped = Schema::try_from_iter([
            ("id", ColumnType::Primitive(Dtype::Int32)),
            ("cost", ColumnType::Primitive(Dtype::Float64)),
            ("cost_components", ColumnType::List(Dtype::Float64)),
        ])
        .unwrap();
        let reordered = Schema::try_from_iter([
            ("cost", ColumnType::Primitive(Dtype::Float64)),
            ("id", ColumnType::Primitive(Dtype::Int64)),
            ("cost_components", ColumnType::List(Dtype::Float64)),
        ])
        .unwrap();
        let missing = Schema::try_from_iter([
            ("id", ColumnType::Primitive(Dtype::Int64)),
            ("cost", ColumnType::Primitive(Dtype::Float64)),
        ])
        .unwrap();
        let extra = Schema::try_from_iter([
            ("id", ColumnType::Primitive(Dtype::Int64)),
            ("cost", ColumnType::Primitive(Dtype::Float64)),
            ("cost_components", ColumnType::List(Dtype::Float64)),
            ("note", ColumnType::Primitive(Dtype::Str)),
        ])
        .unwrap();
        let scalar_components = Schema::try_from_iter([
            ("id", ColumnType::Primitive(Dtype::Int64)),
            ("cost", ColumnType::Primitive(Dtype::Float64)),
            ("cost_components", ColumnType::Primitive(Dtype::Float64)),
        ])
        .unwrap();

        for expected in [renamed, retyped, reordered, missing, extra, scalar_components] {
            assert!(matches!(
                validate_schema(&table, &expected),
                Err(DecodeError::InvalidSchema { .. })
            ));
            assert!(matches!(
                decode_table(&table, &expected),
                Err(DecodeError::InvalidSchema { .. })
            ));
            assert!(matches!(
                decode_row(&table, &expected, 0),
                Err(DecodeError::InvalidSchema { .. })
            ));
        }
        assert!(validate_schema(&table, &cost_schema()).is_ok());
    }

    #[test]
    fn we_can_decode_a_table_with_zero_rows() {
        let table = cost_table(&[]);
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.schema(), &cost_schema());
        assert!(decode_table(&table, &cost_schema()).unwrap().is_empty());
    }

    #[test]
    fn decoding_a_sliced_table_applies_the_slice_offset_once() {
        let rows = [
            (1, 1.0, vec![1.0]),
            (2, 2.0, vec![1.0, 2.0]),
            (3, 3.0, vec![]),
            (4, 4.0, vec![1.0, 2.0, 3.0, 4.0]),
            (5, 5.0, vec![5.0]),
        ];
        let table = cost_table(&rows);
        let expected = rows
            .iter()
            .map(|(id, cost, components)| row(*id, *cost, components.clone()))
            .collect::<Vec<_>>();

        for offset in 0..rows.len() {
            for length in 0..=(rows.len() - offset) {
                let slice = table.slice(offset, length).unwrap();
                assert_eq!(
                    decode_table(&slice, &cost_schema()).unwrap(),
                    expected[offset..offset + length]
                );
            }
        }
    }

    #[test]
    fn we_can_decode_list_columns_whose_child_is_a_slice() {
        use arrow::buffer::{OffsetBuffer, ScalarBuffer};
        use arrow::datatypes::Field;

        // The child array starts two values into a larger buffer.
        let backing = Float64Array::from(vec![-1.0, -2.0, 10.0, 20.0, 30.0, -3.0]);
        let child: ArrayRef = Arc::new(backing.slice(2, 3));
        let list = ListArray::new(
            Arc::new(Field::new_list_field(arrow::datatypes::DataType::Float64, false)),
            OffsetBuffer::new(ScalarBuffer::from(vec![0, 2, 3])),
            child,
            None,
        );
        let table = Table::assemble([("values", Arc::new(list) as ArrayRef)]).unwrap();
        let schema =
            Schema::try_from_iter([("values", ColumnType::List(Dtype::Float64))]).unwrap();

        assert_eq!(
            decode_table(&table, &schema).unwrap(),
            vec![
                Row::new(vec![Value::from(vec![10.0, 20.0])]),
                Row::new(vec![Value::from(vec![30.0])]),
            ]
        );
    }
}
