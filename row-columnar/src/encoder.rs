use log::{debug, trace};
use snafu::{ensure, ResultExt, Snafu};

use crate::builder::{BuilderError, ColumnBuilder};
use crate::config::EncoderConfig;
use crate::dtype::ColumnType;
use crate::list_builder::ListBuilder;
use crate::scalar_builder::ScalarColumnBuilder;
use crate::schema::Schema;
use crate::table::{AssembleError, Table};
use crate::value::{Row, Value};

/// Errors that can occur when encoding rows into a [`Table`].
#[derive(Debug, Snafu)]
pub enum EncodeError {
    /// Row has a different number of fields than the schema has columns.
    #[snafu(display("row has {actual} fields, schema has {expected} columns"))]
    ArityMismatch {
        /// Number of columns in the schema.
        expected: usize,
        /// Number of fields in the row.
        actual: usize,
    },
    /// A field's value does not have its column's type.
    #[snafu(display("column {name:?} expects {expected}, found {found}"))]
    TypeMismatch {
        /// Name of the column.
        name: String,
        /// Type of the column.
        expected: ColumnType,
        /// Kind of the rejected value.
        found: String,
    },
    /// A builder failed; the encoder is unusable afterwards.
    #[snafu(display("failed to build column: {source}"))]
    Builder {
        /// Error encountered by the builder.
        source: BuilderError,
    },
    /// An earlier builder failure left columns of uneven length.
    #[snafu(display("encoder was aborted by an earlier builder failure"))]
    Aborted,
    /// The finished columns could not be assembled.
    #[snafu(display("failed to assemble table: {source}"))]
    Assemble {
        /// Error encountered by the assembler.
        source: AssembleError,
    },
}

/// Builder for one column of the encoded table.
#[derive(Debug)]
enum FieldBuilder {
    /// Builder of a primitive column.
    Primitive(ScalarColumnBuilder),
    /// Builder of a list column.
    List(ListBuilder<ScalarColumnBuilder>),
}

impl FieldBuilder {
    /// Creates the builder for a column of `column_type`, pre-sized by `config`.
    fn try_new(column_type: ColumnType, config: &EncoderConfig) -> Result<Self, BuilderError> {
        Ok(match column_type {
            ColumnType::Primitive(dtype) => FieldBuilder::Primitive(
                ScalarColumnBuilder::with_capacity(dtype, config.row_capacity)?,
            ),
            ColumnType::List(dtype) => FieldBuilder::List(ListBuilder::with_capacity(
                ScalarColumnBuilder::with_capacity(dtype, config.list_value_capacity)?,
                config.row_capacity,
            )?),
        })
    }

    /// Appends one field value. List columns only accept [`Value::List`].
    fn append(&mut self, value: Value) -> Result<(), BuilderError> {
        match (self, value) {
            (FieldBuilder::List(builder), Value::List(values)) => builder.append_entry(values),
            (FieldBuilder::Primitive(builder), value) => builder.append(value),
            (FieldBuilder::List(builder), value) => Err(BuilderError::TypeMismatch {
                expected: builder.child().dtype(),
                found: value.kind(),
            }),
        }
    }

    /// Finishes the column into an arrow array.
    fn finish(&mut self) -> Result<arrow::array::ArrayRef, BuilderError> {
        match self {
            FieldBuilder::Primitive(builder) => builder.finish_array(),
            FieldBuilder::List(builder) => builder.finish_array(),
        }
    }
}

/// Encodes rows of a fixed [`Schema`] into a columnar [`Table`].
///
/// Rows are validated as a whole before anything is appended, so a rejected row leaves the
/// encoder unchanged and the caller may continue with corrected input. A builder failure, on the
/// other hand, aborts the encoder.
#[derive(Debug)]
pub struct RowEncoder {
    /// Schema every row is validated against.
    schema: Schema,
    /// One builder per column, in schema order.
    builders: Vec<FieldBuilder>,
    /// Number of rows appended.
    num_rows: usize,
    /// Set once a builder failed mid-row.
    aborted: bool,
}

impl RowEncoder {
    /// Creates an encoder with one builder per column of `schema`.
    pub fn new(schema: &Schema, config: &EncoderConfig) -> Result<Self, EncodeError> {
        let builders = schema
            .iter()
            .map(|(_, column_type)| FieldBuilder::try_new(*column_type, config))
            .collect::<Result<Vec<_>, _>>()
            .context(BuilderSnafu)?;

        Ok(RowEncoder {
            schema: schema.clone(),
            builders,
            num_rows: 0,
            aborted: false,
        })
    }

    /// Returns the schema rows are encoded with.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the number of rows pushed so far.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Checks arity and the type of every field, without coercion.
    fn validate_row(&self, row: &Row) -> Result<(), EncodeError> {
        ensure!(
            row.len() == self.schema.num_columns(),
            ArityMismatchSnafu {
                expected: self.schema.num_columns(),
                actual: row.len(),
            }
        );

        match self
            .schema
            .iter()
            .zip(row.values())
            .find(|((_, column_type), value)| !value.matches(**column_type))
        {
            Some(((name, column_type), value)) => Err(EncodeError::TypeMismatch {
                name: name.clone(),
                expected: *column_type,
                found: value.kind(),
            }),
            None => Ok(()),
        }
    }

    /// Appends one row.
    pub fn push_row(&mut self, row: Row) -> Result<(), EncodeError> {
        ensure!(!self.aborted, AbortedSnafu);
        self.validate_row(&row)?;

        let result = self
            .builders
            .iter_mut()
            .zip(row.into_values())
            .try_for_each(|(builder, value)| builder.append(value));
        if let Err(source) = result {
            self.aborted = true;
            return Err(EncodeError::Builder { source });
        }

        trace!("encoded row {}", self.num_rows);
        self.num_rows += 1;
        Ok(())
    }

    /// Finishes every column and assembles the table.
    pub fn finish(mut self) -> Result<Table, EncodeError> {
        ensure!(!self.aborted, AbortedSnafu);

        let arrays = self
            .builders
            .iter_mut()
            .map(FieldBuilder::finish)
            .collect::<Result<Vec<_>, _>>()
            .context(BuilderSnafu)?;

        let table = Table::assemble(
            self.schema
                .iter()
                .map(|(name, _)| name.clone())
                .zip(arrays),
        )
        .context(AssembleSnafu)?;

        debug!("encoded {} rows into a table", self.num_rows);
        Ok(table)
    }
}

/// Encodes all `rows` with `schema` into a table.
pub fn encode_rows(
    schema: &Schema,
    rows: impl IntoIterator<Item = Row>,
    config: &EncoderConfig,
) -> Result<Table, EncodeError> {
    let mut encoder = RowEncoder::new(schema, config)?;
    rows.into_iter()
        .try_for_each(|row| encoder.push_row(row))?;
    encoder.finish()
}
