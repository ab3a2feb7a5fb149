//! Maps type names reported by a row source to [`row_columnar::Dtype`]s.
//!
//! Row sources describe their fields with the names of their own scalar types (`int`, `float64`,
//! `datetime64`, ...). This crate resolves those names before any column is built, and refuses
//! names it does not know instead of guessing a type.
#![warn(missing_docs)]

mod type_name_conversion;
pub use type_name_conversion::{map_type, UnknownType, TYPE_NAMES};

mod schema_from_type_names;
pub use schema_from_type_names::{schema_from_type_names, TypeMapperError};
