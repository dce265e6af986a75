use thiserror::Error;

use crate::{evaluator::RuntimeError, parser::ParseError};

/// Any error a query can raise.
///
/// Parsing is all-or-nothing, so a `Parse` error means nothing was evaluated.
/// A `Runtime` error aborts the whole query; no partial result is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed query text
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Operation-level failure during evaluation
    #[error(" error : {0}")]
    Runtime(#[from] RuntimeError),

    /// Anything else, e.g. a hand-built AST with commands in impossible positions
    #[error(" error : {0}")]
    Generic(String),
}

impl Error {
    pub fn generic(message: impl Into<String>) -> Self {
        Error::Generic(message.into())
    }
}
