//! Caller input validation for the listing query.
//!
//! Raw filter and page texts are parsed here, before anything touches the
//! store.

use std::{error::Error, fmt};

pub mod filter;
pub mod page;

pub use filter::{CompiledFilter, Filter};
pub use page::Page;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidJson(String),
    NotAnObject,
    InvalidPath(String),
    UnknownOperator(String),
    MixedOperators(String),
    InvalidOperand {
        operator: String,
        expected: &'static str,
    },
    InvalidPage(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(message) => write!(f, "Invalid filter query: {message}"),
            Self::NotAnObject => write!(f, "Invalid filter query: expected a JSON object"),
            Self::InvalidPath(path) => write!(f, "Invalid filter field path: {path:?}"),
            Self::UnknownOperator(operator) => write!(f, "Unknown filter operator: {operator}"),
            Self::MixedOperators(path) => {
                write!(f, "Cannot mix operators and plain fields under {path:?}")
            }
            Self::InvalidOperand { operator, expected } => {
                write!(f, "Operator {operator} expects {expected}")
            }
            Self::InvalidPage(value) => write!(f, "Invalid page: {value:?}"),
        }
    }
}

impl Error for ValidationError {}
