//! Interactive query loop over one loaded document

use std::io::{BufRead, Write};

use super::CliError;
use crate::{Evaluator, FunctionRegistry, JsonPrinter, Value, parse};

const PROMPT: &str = "Enter query:";

/// Read queries line by line until EOF or `exit`.
///
/// Results go to `out`. A failing query prints its diagnostic to `err` and
/// the loop carries on with the next line; only IO failures end it early.
pub fn run_interactive<R: BufRead, W: Write, E: Write>(
    document: &Value,
    functions: &FunctionRegistry,
    printer: JsonPrinter,
    input: R,
    out: &mut W,
    err: &mut E,
) -> Result<(), CliError> {
    let evaluator = Evaluator::new(functions);
    let mut lines = input.lines();

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let query = line.trim_end_matches(['\r', '\n']);
        if query == "exit" {
            break;
        }

        let result = parse(query)
            .map_err(crate::Error::from)
            .and_then(|parsed| evaluator.eval_query(&parsed, document));

        match result {
            Ok(value) => {
                writeln!(out)?;
                for rendered in printer.render_lines(&value) {
                    writeln!(out, "{}", rendered)?;
                }
            }
            Err(e) => {
                writeln!(out)?;
                writeln!(err, "{}", e)?;
            }
        }
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::json_to_value;
    use serde_json::json;

    fn session(script: &str) -> (String, String) {
        let document = json_to_value(json!({"name": "jpio", "tags": ["b", "a"]}));
        let mut out = Vec::new();
        let mut err = Vec::new();
        run_interactive(
            &document,
            &FunctionRegistry::default(),
            JsonPrinter::new(false),
            script.as_bytes(),
            &mut out,
            &mut err,
        )
        .unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn test_queries_run_against_the_loaded_document() {
        let (out, err) = session(".tags#sort()\n.tags\n");
        assert!(out.contains(r#"{"name":"jpio","tags":["a","b"]}"#));
        // the first query does not change the document the second one sees
        assert!(out.contains(r#"["b","a"]"#));
        assert!(err.is_empty());
    }

    #[test]
    fn test_errors_do_not_stop_the_loop() {
        let (out, err) = session(".missing\n.name\nexit\n.tags\n");
        assert!(err.contains("unable to find key missing"));
        assert!(out.contains("jpio"));
        assert!(!out.contains(r#"["b","a"]"#));
    }
}
