use std::fmt;

use crate::ast::Query;
use crate::value::{Value, float_text};

/// Key used by a selector.
///
/// Untyped tokens are coerced integer-first, so `.1` is `Integer(1)` and
/// `.f(1.5)` is `Float(1.5)`. Objects are addressed by the key's text; arrays
/// only accept `Integer`.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorKey {
    String(String),
    Integer(i64),
    Float(f64),
}

impl SelectorKey {
    /// Text used when the key addresses an object
    pub fn as_object_key(&self) -> String {
        match self {
            SelectorKey::String(s) => s.clone(),
            SelectorKey::Integer(n) => n.to_string(),
            SelectorKey::Float(n) => float_text(*n),
        }
    }
}

impl fmt::Display for SelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_object_key())
    }
}

/// What an iterator addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorSpec {
    /// `.[*]` - every element of an array or every entry of an object
    Wildcard,

    /// `.[a:b]`, `.[a:]`, `.[:b]` - half-open slice of an array
    ///
    /// Negative bounds count from the end of the array.
    Range { start: Option<i64>, end: Option<i64> },
}

/// A value that is either written literally or computed by a nested query.
///
/// Used for assignment right-hand sides, function arguments and list
/// construction elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Literal value
    ///
    /// # Examples
    /// ```text
    /// 5  hello  s(5)  j({"a":1})
    /// ```
    Literal(Value),

    /// Parenthesized sub-query
    ///
    /// # Examples
    /// ```text
    /// (.author)
    /// (.version|.major)
    /// ```
    Query(Query),
}

/// One `#name(args)` call inside a function chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub args: Vec<Operand>,
}

/// A single command of a statement.
///
/// Commands are applied left to right. `Assignment`, `FunctionChain` and
/// `ListConstruction` are terminal: the parser only accepts them as the last
/// command of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Descend into a container by key or index
    ///
    /// # Examples
    /// ```text
    /// .version
    /// .books.[0]
    /// .f(1.5)
    /// ```
    Selector(SelectorKey),

    /// Address several elements at once
    ///
    /// # Examples
    /// ```text
    /// .[*]
    /// .[1:3]
    /// ```
    Iterator(IteratorSpec),

    /// Write a value at the target key of the current value
    ///
    /// # Examples
    /// ```text
    /// .version.minor=3
    /// .books.[*].date=(.author)
    /// ```
    Assignment { target: SelectorKey, value: Operand },

    /// Apply named functions in order
    ///
    /// # Example
    /// ```text
    /// .data#sort()#rsort(value)
    /// ```
    FunctionChain(Vec<Function>),

    /// Build a list from literal values and sub-queries
    ///
    /// # Example
    /// ```text
    /// [(.version.major), 1, s(two)]
    /// ```
    ListConstruction(Vec<Operand>),
}

impl Command {
    /// Name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Command::Selector(_) => "Selector",
            Command::Iterator(_) => "Iterator",
            Command::Assignment { .. } => "Assignment",
            Command::FunctionChain(_) => "FunctionChain",
            Command::ListConstruction(_) => "ListConstruction",
        }
    }

    /// Whether nothing may follow this command inside its statement
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Command::Assignment { .. } | Command::FunctionChain(_) | Command::ListConstruction(_)
        )
    }

    /// Whether evaluating a statement ending in this command needs a working copy
    pub fn needs_working_copy(&self) -> bool {
        matches!(self, Command::Assignment { .. } | Command::FunctionChain(_))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Selector(key) => write!(f, "({}:{})", self.name(), key),
            Command::Iterator(IteratorSpec::Wildcard) => write!(f, "({}:*)", self.name()),
            Command::Iterator(IteratorSpec::Range { start, end }) => {
                let bound = |b: &Option<i64>| b.map(|n| n.to_string()).unwrap_or_default();
                write!(f, "({}:{}:{})", self.name(), bound(start), bound(end))
            }
            Command::Assignment { target, .. } => write!(f, "({}:{})", self.name(), target),
            Command::FunctionChain(functions) => {
                let names: Vec<&str> = functions.iter().map(|func| func.name.as_str()).collect();
                write!(f, "({}:{})", self.name(), names.join("#"))
            }
            Command::ListConstruction(items) => write!(f, "({}:{})", self.name(), items.len()),
        }
    }
}
