pub mod ast;
pub mod convert;
pub mod cursor;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod output;
pub mod parser;
pub mod transform;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Command, Function, IteratorSpec, Operand, PipedStatement, Query, SelectorKey, Statement};
pub use cursor::Cursor;
pub use error::Error;
pub use evaluator::{Evaluator, ModifierSite, RuntimeContext, RuntimeError};
pub use functions::{FunctionKind, FunctionRegistry, FunctionSpec, Invocation};
pub use output::{JsonPrinter, to_json, to_json_pretty};
pub use parser::{ParseError, ParseErrorKind, Parser, parse};
pub use transform::{Path, PathSegment, WorkingCopy};
pub use value::{Value, ValueKind};

/// Parse `query` and evaluate it against `document`.
///
/// ```
/// use jpio::{FunctionRegistry, run_query};
/// use jpio::convert::json_to_value;
/// use serde_json::json;
///
/// let doc = json_to_value(json!({"version": {"major": 1}}));
/// let result = run_query(&doc, ".version.major", &FunctionRegistry::default()).unwrap();
/// assert_eq!(result, jpio::Value::Integer(1));
/// ```
pub fn run_query(document: &Value, query: &str, functions: &FunctionRegistry) -> Result<Value, Error> {
    let query = parse(query)?;
    Evaluator::new(functions).eval_query(&query, document)
}
