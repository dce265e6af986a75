//! Function listing for `--list-functions`

use crate::{FunctionKind, FunctionRegistry};

/// One entry per registered function: name, description, then its usages
pub fn list_functions(functions: &FunctionRegistry) -> String {
    let mut out = String::from("FUNCTIONS\n\n");

    for spec in functions.iter() {
        let kind = match spec.kind {
            FunctionKind::Modifier => "modifier",
            FunctionKind::Producer => "producer",
        };
        let accepts: Vec<&str> = spec.accepted_kinds().iter().map(|k| k.name()).collect();

        out.push_str(&format!("    {} : {}\n", spec.name, spec.description));
        out.push_str(&format!("          {} on {}\n", kind, accepts.join(", ")));
        for usage in &spec.usages {
            out.push_str(&format!("          {}\n", usage));
        }
    }
    out
}
