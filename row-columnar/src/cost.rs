//! Typed conversion for the `(id, cost, cost_components)` record layout.
//!
//! This path drives the typed builders directly rather than going through [`crate::Value`], and
//! decodes straight from the arrow buffers into [`CostRow`]s.

use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray};
use arrow::datatypes::{Float64Type, Int64Type};
use log::debug;
use snafu::{ResultExt, Snafu};

use crate::builder::{BuilderError, ColumnBuilder, Float64ColumnBuilder, Int64ColumnBuilder};
use crate::decoder::{validate_schema, DecodeError};
use crate::dtype::{ColumnType, Dtype};
use crate::list_builder::ListBuilder;
use crate::schema::Schema;
use crate::table::{AssembleError, Table};

/// Name of the identifier column.
pub const ID_COLUMN: &str = "id";
/// Name of the total cost column.
pub const COST_COLUMN: &str = "cost";
/// Name of the per-component cost list column.
pub const COST_COMPONENTS_COLUMN: &str = "cost_components";

/// One record with a variable number of cost components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostRow {
    /// Record identifier.
    pub id: i64,
    /// Total cost.
    pub cost: f64,
    /// Individual cost components, possibly none.
    pub cost_components: Vec<f64>,
}

impl CostRow {
    /// Creates a row.
    pub fn new(id: i64, cost: f64, cost_components: Vec<f64>) -> Self {
        CostRow {
            id,
            cost,
            cost_components,
        }
    }
}

/// Errors that can occur when encoding [`CostRow`]s.
#[derive(Debug, Snafu)]
pub enum CostTableError {
    /// A builder failed.
    #[snafu(display("failed to build cost column: {source}"))]
    Build {
        /// Error encountered by the builder.
        source: BuilderError,
    },
    /// The finished columns could not be assembled.
    #[snafu(display("failed to assemble cost table: {source}"))]
    Assemble {
        /// Error encountered by the assembler.
        source: AssembleError,
    },
}

/// Returns the schema of a cost table.
pub fn cost_schema() -> Schema {
    Schema::try_from_iter([
        (ID_COLUMN, ColumnType::Primitive(Dtype::Int64)),
        (COST_COLUMN, ColumnType::Primitive(Dtype::Float64)),
        (COST_COMPONENTS_COLUMN, ColumnType::List(Dtype::Float64)),
    ])
    .expect("cost column names are distinct")
}

/// Builds the three cost columns from `rows`, preserving their order.
pub fn encode_cost_rows<'a>(
    rows: impl IntoIterator<Item = &'a CostRow>,
) -> Result<Table, CostTableError> {
    let mut ids = Int64ColumnBuilder::new();
    let mut costs = Float64ColumnBuilder::new();
    let mut components = ListBuilder::new(Float64ColumnBuilder::new()).context(BuildSnafu)?;

    for row in rows {
        ids.append(row.id).context(BuildSnafu)?;
        costs.append(row.cost).context(BuildSnafu)?;
        components.start_entry().context(BuildSnafu)?;
        for component in &row.cost_components {
            components.append_value(*component).context(BuildSnafu)?;
        }
    }

    let columns: [(&str, ArrayRef); 3] = [
        (ID_COLUMN, Arc::new(ids.finish().context(BuildSnafu)?)),
        (COST_COLUMN, Arc::new(costs.finish().context(BuildSnafu)?)),
        (
            COST_COMPONENTS_COLUMN,
            Arc::new(components.finish().context(BuildSnafu)?),
        ),
    ];
    Table::assemble(columns).context(AssembleSnafu)
}

/// Validates `table` as a cost table and decodes all of its rows.
pub fn decode_cost_rows(table: &Table) -> Result<Vec<CostRow>, DecodeError> {
    validate_schema(table, &cost_schema())?;

    let column = |index: usize| {
        table
            .column(index)
            .ok_or(DecodeError::UnexpectedSchemaDataMismatch)
    };
    let ids = column(0)?
        .as_primitive_opt::<Int64Type>()
        .ok_or(DecodeError::UnexpectedSchemaDataMismatch)?;
    let costs = column(1)?
        .as_primitive_opt::<Float64Type>()
        .ok_or(DecodeError::UnexpectedSchemaDataMismatch)?;
    let components = column(2)?
        .as_list_opt::<i32>()
        .ok_or(DecodeError::UnexpectedSchemaDataMismatch)?;
    let component_values = components
        .values()
        .as_primitive_opt::<Float64Type>()
        .ok_or(DecodeError::UnexpectedSchemaDataMismatch)?
        .values();

    let rows = ids
        .values()
        .iter()
        .zip(costs.values().iter())
        .zip(components.value_offsets().windows(2))
        .map(|((id, cost), bounds)| {
            CostRow::new(
                *id,
                *cost,
                component_values[bounds[0] as usize..bounds[1] as usize].to_vec(),
            )
        })
        .collect::<Vec<_>>();

    debug!("decoded {} cost rows", rows.len());
    Ok(rows)
}
