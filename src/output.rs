//! Rendering of query results as text.
//!
//! Containers are encoded as JSON through `serde_json`, keeping the document's
//! key order. Pretty output indents with four spaces. Scalars can be printed
//! raw, so a string result prints without its quotes.
//!
//! # Examples
//!
//! ```
//! use jpio::Value;
//! use jpio::output::{JsonPrinter, to_json};
//!
//! let list = Value::Array(vec![Value::from("a"), Value::Integer(1)]);
//! assert_eq!(to_json(&list), r#"["a",1]"#);
//!
//! let printer = JsonPrinter::new(false).split_lists(true);
//! assert_eq!(printer.render_lines(&list), vec!["a", "1"]);
//! ```

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::{convert::value_to_json, value::Value};

const INDENT: &[u8] = b"    ";

/// Renders results the way the command line prints them.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPrinter {
    pretty: bool,
    split: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter {
            pretty,
            split: false,
        }
    }

    /// Print each element of a list result on its own line
    pub fn split_lists(mut self, split: bool) -> Self {
        self.split = split;
        self
    }

    /// One value; strings, numbers, booleans and null print raw
    pub fn render(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::String(s) => s.clone(),
            other => self.encode(other),
        }
    }

    /// Output lines for a result; more than one only for split lists
    pub fn render_lines(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Array(items) if self.split => items.iter().map(|item| self.render(item)).collect(),
            other => vec![self.render(other)],
        }
    }

    fn encode(&self, value: &Value) -> String {
        if self.pretty {
            to_json_pretty(value)
        } else {
            to_json(value)
        }
    }
}

/// Compact JSON text for a value.
pub fn to_json(value: &Value) -> String {
    value_to_json(value.clone()).to_string()
}

/// JSON text indented by four spaces per level.
pub fn to_json_pretty(value: &Value) -> String {
    let json = value_to_json(value.clone());
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(INDENT));

    // serializing a serde_json::Value into memory cannot fail
    if json.serialize(&mut serializer).is_err() {
        return json.to_string();
    }
    String::from_utf8(buffer).unwrap_or_else(|_| json.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::json_to_value;
    use serde_json::json;

    #[test]
    fn test_compact_keeps_key_order() {
        let value = json_to_value(json!({"b": 1, "a": [true, null]}));
        assert_eq!(to_json(&value), r#"{"b":1,"a":[true,null]}"#);
    }

    #[test]
    fn test_pretty_uses_four_spaces() {
        let value = json_to_value(json!({"a": [1]}));
        assert_eq!(to_json_pretty(&value), "{\n    \"a\": [\n        1\n    ]\n}");
    }

    #[test]
    fn test_scalars_print_raw() {
        let printer = JsonPrinter::new(true);
        assert_eq!(printer.render(&Value::from("hello world")), "hello world");
        assert_eq!(printer.render(&Value::Integer(3)), "3");
        assert_eq!(printer.render(&Value::Float(2.5)), "2.5");
        assert_eq!(printer.render(&Value::Boolean(false)), "false");
        assert_eq!(printer.render(&Value::Null), "null");
    }

    #[test]
    fn test_split_only_affects_lists() {
        let printer = JsonPrinter::new(false).split_lists(true);
        let list = json_to_value(json!([{"a": 1}, "x"]));
        assert_eq!(printer.render_lines(&list), vec![r#"{"a":1}"#, "x"]);

        let object = json_to_value(json!({"a": [1, 2]}));
        assert_eq!(printer.render_lines(&object), vec![r#"{"a":[1,2]}"#]);

        let unsplit = JsonPrinter::new(false);
        assert_eq!(unsplit.render_lines(&list), vec![r#"[{"a":1},"x"]"#]);
    }
}
