#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod map;

mod dtype;
pub use dtype::{ColumnType, Dtype};

mod value;
pub use value::{Row, Value};

mod schema;
pub use schema::{Schema, SchemaError};

mod builder;
pub use builder::{
    BooleanColumnBuilder,
    BuilderError,
    BuilderState,
    ColumnBuilder,
    DateColumnBuilder,
    Float32ColumnBuilder,
    Float64ColumnBuilder,
    Int16ColumnBuilder,
    Int32ColumnBuilder,
    Int64ColumnBuilder,
    Int8ColumnBuilder,
    PrimitiveColumnBuilder,
    StringColumnBuilder,
    TimeColumnBuilder,
};

mod list_builder;
pub use list_builder::ListBuilder;

mod scalar_builder;
pub use scalar_builder::ScalarColumnBuilder;

mod table;
pub use table::{AssembleError, Table};

mod decoder;
pub use decoder::{decode_row, decode_table, validate_schema, DecodeError, TableDecoder};

pub mod raw_list;

mod config;
pub use config::EncoderConfig;

mod encoder;
pub use encoder::{encode_rows, EncodeError, RowEncoder};

pub mod cost;
