//! Column validators: per-cell type, range, pattern and check-digit rules

pub mod check_digits;
mod column;

pub use column::{
    validate_cell, CheckScheme, ColumnSpec, ColumnType, TextPattern, TypedValue,
    ValidationFailure,
};
