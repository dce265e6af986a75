//! Execute one query against JSON input

use super::CliError;
use crate::{
    Evaluator, FunctionRegistry, JsonPrinter, Value, convert::json_to_value, parse,
};

/// Options for a single run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The query to execute; empty returns the document
    pub query: String,
    /// JSON input text
    pub input: Option<String>,
    /// Pretty-print containers
    pub pretty: bool,
    /// Print list elements on separate lines
    pub split: bool,
}

impl RunOptions {
    pub fn printer(&self) -> JsonPrinter {
        JsonPrinter::new(self.pretty).split_lists(self.split)
    }
}

/// Parse JSON text into a document
pub fn load_document(text: &str) -> Result<Value, CliError> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    Ok(json_to_value(json))
}

/// Run the query and return the lines to print
pub fn execute_run(
    options: &RunOptions,
    functions: &FunctionRegistry,
) -> Result<Vec<String>, CliError> {
    let text = options.input.as_ref().ok_or(CliError::NoInput)?;

    let query = parse(&options.query)?;
    let document = load_document(text)?;

    let result = Evaluator::new(functions).eval_query(&query, &document)?;
    Ok(options.printer().render_lines(&result))
}
