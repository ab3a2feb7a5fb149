use row_columnar::Dtype;
use snafu::{OptionExt, Snafu};

/// Error that occurs when encountering a type name with no [`Dtype`].
///
/// This is a configuration error: a schema built around it would silently mis-type a column, so
/// callers must abort schema construction rather than substitute a default.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(display("unknown type {type_name:?} for field {field_name:?}"))]
pub struct UnknownType {
    /// The unrecognized type name.
    pub type_name: String,
    /// The field the type name was given for.
    pub field_name: String,
}

/// Every recognized type name with its dtype. Lookups are exact and case-sensitive.
///
/// Names cover builtin scalars (`int`, `float`, `str`, `bool`, `datetime`, `date`), fixed-width
/// numeric array types, and dataframe timestamps. `float16` and `float128` have no native
/// counterpart and map to the nearest supported precision.
pub const TYPE_NAMES: [(&str, Dtype); 18] = [
    ("int", Dtype::Int64),
    ("int8", Dtype::Int8),
    ("int16", Dtype::Int16),
    ("int32", Dtype::Int32),
    ("int64", Dtype::Int64),
    ("float", Dtype::Float64),
    ("float16", Dtype::Float32),
    ("float32", Dtype::Float32),
    ("float64", Dtype::Float64),
    ("float128", Dtype::Float64),
    ("str", Dtype::Str),
    ("bool", Dtype::Bool),
    ("bool_", Dtype::Bool),
    ("bool8", Dtype::Bool),
    ("datetime", Dtype::Time),
    ("datetime64", Dtype::Time),
    ("Timestamp", Dtype::Time),
    ("date", Dtype::Date),
];

/// Maps the type name reported for `field_name` to its [`Dtype`].
pub fn map_type(type_name: &str, field_name: &str) -> Result<Dtype, UnknownType> {
    TYPE_NAMES
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, dtype)| *dtype)
        .context(UnknownTypeSnafu {
            type_name,
            field_name,
        })
}
