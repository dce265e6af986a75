use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::{
    ast::{Command, Function, IteratorSpec, Operand, Query, SelectorKey, Statement},
    error::Error,
    functions::{FunctionRegistry, Invocation},
    transform::{Path, PathSegment, WorkingCopy, describe_path, resolve_index, slice_bounds},
    value::{Value, ValueKind},
};

/// Where a mutation was found in a position that only allows reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierSite {
    AssignmentValue,
    FunctionArgument,
    ListElement,
}

impl fmt::Display for ModifierSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierSite::AssignmentValue => {
                f.write_str("right hand side of assignment cannot be a modifier statement")
            }
            ModifierSite::FunctionArgument => f.write_str("function argument cannot be a modifier"),
            ModifierSite::ListElement => f.write_str("list element cannot be a modifier"),
        }
    }
}

/// Errors that can occur during query evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Object has no such key
    #[error("Runtime Error : unable to find key {0}")]
    KeyNotFound(String),

    /// Array index outside the array
    #[error("Runtime Error : Index out of bound {index} (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    /// Non-integer key used on an array
    #[error("Runtime Error : Unable to access list index with {0}")]
    InvalidIndex(String),

    /// Selection from a value that is not a container
    #[error("Runtime Error : selecting from type {kind} using key {key} is not allowed")]
    InvalidSelection { kind: ValueKind, key: String },

    /// Iteration over a value that is not a container
    #[error("Runtime Error : Unable to iterate object of type {0}")]
    NotIterable(ValueKind),

    /// Bounded range used on an object
    #[error("Runtime Error : Unable to slice object, only .[*] can iterate an object")]
    RangeOnObject,

    /// Assignment into a value that is not a container
    #[error("Runtime Error : Unable to assign key {key} in type {kind}")]
    CannotAssign { kind: ValueKind, key: String },

    #[error("Function {0} not found")]
    UnknownFunction(String),

    #[error("Function {function} cannot be applied to type {kind}")]
    FunctionNotApplicable { function: String, kind: ValueKind },

    #[error("Function {function} does not take {given} argument(s), expects {expected}")]
    BadArity {
        function: String,
        given: usize,
        expected: String,
    },

    /// A producer function followed by more calls
    #[error("Non modifier function {0} must be the last command")]
    NonModifierNotLast(String),

    /// A mutation inside a read-only nested statement
    #[error("modifier not allowed : {0}")]
    ModifierNotAllowed(ModifierSite),

    /// Failure reported by a function implementation
    #[error("Function {function} failed : {message}")]
    Function { function: String, message: String },

    /// The working copy lost the location a context points at
    #[error("Runtime Error : no value at {0} in the working copy")]
    MissingPath(String),
}

impl RuntimeError {
    /// Error raised from inside a function implementation
    pub fn function(function: &str, message: impl Into<String>) -> Self {
        RuntimeError::Function {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// The evaluator's scoping unit.
///
/// A context is a read-only view of one value of the statement's input plus
/// the way it was reached. Contexts borrow their parent, so a chain can only
/// be walked upwards and never mutated; writes go through the
/// [`WorkingCopy`] owned by the statement, addressed by [`RuntimeContext::path`].
#[derive(Debug, Clone)]
pub struct RuntimeContext<'a> {
    /// The value at this navigation point
    pub data: &'a Value,
    parent: Option<&'a RuntimeContext<'a>>,
    inbound: Option<PathSegment>,
}

impl<'a> RuntimeContext<'a> {
    /// Context for the input of a statement
    pub fn root(data: &'a Value) -> Self {
        RuntimeContext {
            data,
            parent: None,
            inbound: None,
        }
    }

    pub fn parent(&self) -> Option<&'a RuntimeContext<'a>> {
        self.parent
    }

    /// Key or index used to reach this context from its parent
    pub fn inbound_key(&self) -> Option<&PathSegment> {
        self.inbound.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The root of this context's ancestry
    pub fn origin(&self) -> &RuntimeContext<'a> {
        let mut current = self;
        while let Some(parent) = current.parent {
            current = parent;
        }
        current
    }

    /// Path from the origin to this context
    pub fn path(&self) -> Path {
        let mut segments = Vec::new();
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Some(segment) = &ctx.inbound {
                segments.push(segment.clone());
            }
            current = ctx.parent;
        }
        segments.reverse();
        segments
    }

    fn child<'c>(&'c self, data: &'a Value, segment: PathSegment) -> RuntimeContext<'c> {
        RuntimeContext {
            data,
            parent: Some(self),
            inbound: Some(segment),
        }
    }

    /// Descend by key or index
    pub fn select<'c>(&'c self, key: &SelectorKey) -> Result<RuntimeContext<'c>, RuntimeError> {
        match self.data {
            Value::Array(items) => match key {
                SelectorKey::Integer(index) => {
                    let resolved = resolve_index(*index, items.len()).ok_or(
                        RuntimeError::IndexOutOfBounds {
                            index: *index,
                            len: items.len(),
                        },
                    )?;
                    Ok(self.child(&items[resolved], PathSegment::Index(resolved)))
                }
                other => Err(RuntimeError::InvalidIndex(other.to_string())),
            },
            Value::Object(map) => {
                let name = key.as_object_key();
                match map.get_key_value(&name) {
                    Some((name, value)) => Ok(self.child(value, PathSegment::Field(name.clone()))),
                    None => Err(RuntimeError::KeyNotFound(name)),
                }
            }
            other => Err(RuntimeError::InvalidSelection {
                kind: other.kind(),
                key: key.to_string(),
            }),
        }
    }
}

/// Whether a statement collects results or writes through its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Read,
    Write,
}

/// Result of evaluating a command tail.
#[derive(Debug)]
enum Outcome {
    Value(Value),
    /// The result is the statement's working copy
    Written,
}

/// Per-statement evaluation state threaded through the recursion.
struct Pass<'w> {
    working: Option<&'w mut WorkingCopy>,
    mode: Mode,
}

impl Outcome {
    fn into_value(self, pass: &Pass<'_>) -> Result<Value, Error> {
        match self {
            Outcome::Value(value) => Ok(value),
            Outcome::Written => pass
                .working
                .as_deref()
                .map(|working| working.root().clone())
                .ok_or_else(|| Error::generic("statement wrote without a working copy")),
        }
    }
}

/// The query evaluator.
///
/// Walks a parsed [`Query`] against a document, resolving function calls in
/// the registry it was built with. The input document is never modified.
pub struct Evaluator<'r> {
    functions: &'r FunctionRegistry,
}

impl<'r> Evaluator<'r> {
    pub fn new(functions: &'r FunctionRegistry) -> Self {
        Evaluator { functions }
    }

    /// Evaluates a complete query against a JSON document.
    ///
    /// Piped statements run in order, each consuming the previous result.
    ///
    /// # Examples
    ///
    /// ```
    /// use jpio::{Evaluator, FunctionRegistry, parse};
    /// use jpio::convert::json_to_value;
    /// use serde_json::json;
    ///
    /// let functions = FunctionRegistry::default();
    /// let doc = json_to_value(json!({"data": [3, 1, 2]}));
    ///
    /// let query = parse(".data#sort()").unwrap();
    /// let result = Evaluator::new(&functions).eval_query(&query, &doc).unwrap();
    /// assert_eq!(result, json_to_value(json!({"data": [1, 2, 3]})));
    /// ```
    pub fn eval_query(&self, query: &Query, document: &Value) -> Result<Value, Error> {
        let mut current: Option<Value> = None;

        for statement in query.statements() {
            let input = current.as_ref().unwrap_or(document);
            current = Some(self.eval_statement(statement, input)?);
        }

        Ok(current.unwrap_or_else(|| document.clone()))
    }

    /// Evaluates one statement against a document.
    ///
    /// A statement ending in an assignment or function chain works on a deep
    /// copy of `document` and, unless a producer function ends it, returns
    /// that copy.
    pub fn eval_statement(&self, statement: &Statement, document: &Value) -> Result<Value, Error> {
        let Some(last) = statement.last() else {
            return Ok(document.clone());
        };

        let mode = self.mode_for(last);
        let ctx = RuntimeContext::root(document);
        log::debug!(
            "evaluating statement of {} command(s) in {:?} mode",
            statement.commands.len(),
            mode
        );

        if !last.needs_working_copy() {
            let mut pass = Pass {
                working: None,
                mode,
            };
            let outcome = self.eval_commands(&statement.commands, &ctx, &mut pass)?;
            return outcome.into_value(&pass);
        }

        let mut working = WorkingCopy::new(document);
        let outcome = {
            let mut pass = Pass {
                working: Some(&mut working),
                mode,
            };
            self.eval_commands(&statement.commands, &ctx, &mut pass)?
        };

        match outcome {
            Outcome::Value(value) => Ok(value),
            Outcome::Written => Ok(working.into_value()),
        }
    }

    /// Write mode if the statement ends in a mutation of the document
    fn mode_for(&self, last: &Command) -> Mode {
        match last {
            Command::Assignment { .. } => Mode::Write,
            Command::FunctionChain(functions) => {
                let ends_in_producer = functions
                    .last()
                    .and_then(|function| self.functions.get(&function.name))
                    .is_some_and(|spec| !spec.is_modifier());
                if ends_in_producer { Mode::Read } else { Mode::Write }
            }
            _ => Mode::Read,
        }
    }

    /// Whether a command would write to a working copy
    fn is_mutation(&self, command: &Command) -> bool {
        match command {
            Command::Assignment { .. } => true,
            Command::FunctionChain(functions) => functions.iter().any(|function| {
                self.functions
                    .get(&function.name)
                    .is_some_and(|spec| spec.is_modifier())
            }),
            _ => false,
        }
    }

    /// Apply `commands` left to right starting at `ctx`
    fn eval_commands(
        &self,
        commands: &[Command],
        ctx: &RuntimeContext<'_>,
        pass: &mut Pass<'_>,
    ) -> Result<Outcome, Error> {
        match commands {
            [] => Ok(Outcome::Value(ctx.data.clone())),
            [last] => {
                log::trace!("applying terminal {}", last);
                self.eval_terminal(last, ctx, pass)
            }
            [command, rest @ ..] => {
                log::trace!("applying {}", command);
                match command {
                    Command::Selector(key) => {
                        let child = ctx.select(key)?;
                        self.eval_commands(rest, &child, pass)
                    }
                    Command::Iterator(spec) => self.eval_fan_out(*spec, rest, ctx, pass),
                    other => Err(Error::generic(format!(
                        "Unable to run command of type {}",
                        other.name()
                    ))),
                }
            }
        }
    }

    /// Iterator with commands after it.
    ///
    /// In read mode the tail runs once per addressed element and the results
    /// are collected in the shape of the source. In write mode the tail runs
    /// once per element for its writes and the working copy is the result.
    fn eval_fan_out(
        &self,
        spec: IteratorSpec,
        rest: &[Command],
        ctx: &RuntimeContext<'_>,
        pass: &mut Pass<'_>,
    ) -> Result<Outcome, Error> {
        match ctx.data {
            Value::Array(items) => {
                let (lo, hi) = match spec {
                    IteratorSpec::Wildcard => (0, items.len()),
                    IteratorSpec::Range { start, end } => slice_bounds(items.len(), start, end),
                };

                let mut collected = Vec::with_capacity(hi - lo);
                for (index, item) in items.iter().enumerate().take(hi).skip(lo) {
                    let child = ctx.child(item, PathSegment::Index(index));
                    let outcome = self.eval_commands(rest, &child, pass)?;
                    if pass.mode == Mode::Read {
                        collected.push(outcome.into_value(pass)?);
                    }
                }

                match pass.mode {
                    Mode::Read => Ok(Outcome::Value(Value::Array(collected))),
                    Mode::Write => Ok(Outcome::Written),
                }
            }
            Value::Object(map) => {
                if spec != IteratorSpec::Wildcard {
                    return Err(RuntimeError::RangeOnObject.into());
                }

                let mut collected = IndexMap::with_capacity(map.len());
                for (key, value) in map {
                    let child = ctx.child(value, PathSegment::Field(key.clone()));
                    let outcome = self.eval_commands(rest, &child, pass)?;
                    if pass.mode == Mode::Read {
                        collected.insert(key.clone(), outcome.into_value(pass)?);
                    }
                }

                match pass.mode {
                    Mode::Read => Ok(Outcome::Value(Value::Object(collected))),
                    Mode::Write => Ok(Outcome::Written),
                }
            }
            other => Err(RuntimeError::NotIterable(other.kind()).into()),
        }
    }

    fn eval_terminal(
        &self,
        command: &Command,
        ctx: &RuntimeContext<'_>,
        pass: &mut Pass<'_>,
    ) -> Result<Outcome, Error> {
        match command {
            Command::Selector(key) => {
                let child = ctx.select(key)?;
                Ok(Outcome::Value(child.data.clone()))
            }
            Command::Iterator(spec) => Ok(Outcome::Value(slice(*spec, ctx.data)?)),
            Command::Assignment { target, value } => {
                self.eval_assignment(target, value, ctx, pass)
            }
            Command::FunctionChain(functions) => self.eval_function_chain(functions, ctx, pass),
            Command::ListConstruction(elements) => {
                let items = elements
                    .iter()
                    .map(|element| self.resolve_operand(element, ctx, ModifierSite::ListElement))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Outcome::Value(Value::Array(items)))
            }
        }
    }

    /// Write the right-hand side under `target` in the value at `ctx`.
    ///
    /// A sub-query on the right-hand side sees the same value the assignment
    /// writes into, so `.books.[*].date=(.author)` reads each book's author.
    fn eval_assignment(
        &self,
        target: &SelectorKey,
        value: &Operand,
        ctx: &RuntimeContext<'_>,
        pass: &mut Pass<'_>,
    ) -> Result<Outcome, Error> {
        let resolved = self.resolve_operand(value, ctx, ModifierSite::AssignmentValue)?;

        let working = pass
            .working
            .as_deref_mut()
            .ok_or(RuntimeError::ModifierNotAllowed(ModifierSite::AssignmentValue))?;
        working.assign(&ctx.path(), target, resolved)?;

        Ok(Outcome::Written)
    }

    /// Run `#f(..)#g(..)...` on the working value at `ctx`.
    ///
    /// Modifier results replace the working value; a producer ends the chain
    /// and its result is returned as is.
    fn eval_function_chain(
        &self,
        functions: &[Function],
        ctx: &RuntimeContext<'_>,
        pass: &mut Pass<'_>,
    ) -> Result<Outcome, Error> {
        let path = ctx.path();
        let mut current = match pass.working.as_deref() {
            Some(working) => working
                .get(&path)
                .cloned()
                .ok_or_else(|| RuntimeError::MissingPath(describe_path(&path)))?,
            None => ctx.data.clone(),
        };
        // arguments are read relative to the value that holds this one
        let arg_ctx = ctx.parent().unwrap_or(ctx);

        for (position, function) in functions.iter().enumerate() {
            let spec = self
                .functions
                .get(&function.name)
                .ok_or_else(|| RuntimeError::UnknownFunction(function.name.clone()))?;

            if !spec.accepts(current.kind()) {
                return Err(RuntimeError::FunctionNotApplicable {
                    function: function.name.clone(),
                    kind: current.kind(),
                }
                .into());
            }
            if !spec.takes(function.args.len()) {
                let expected: Vec<String> = spec.arities().iter().map(|n| n.to_string()).collect();
                return Err(RuntimeError::BadArity {
                    function: function.name.clone(),
                    given: function.args.len(),
                    expected: expected.join(" or "),
                }
                .into());
            }

            let args = function
                .args
                .iter()
                .map(|arg| self.resolve_operand(arg, arg_ctx, ModifierSite::FunctionArgument))
                .collect::<Result<Vec<_>, _>>()?;

            log::trace!("calling #{} with {} argument(s)", function.name, args.len());
            let call = Invocation {
                function: &function.name,
                data: ctx.data,
                value: current,
            };
            let result = spec.call(call, args)?;

            if !spec.is_modifier() {
                if position + 1 != functions.len() {
                    return Err(RuntimeError::NonModifierNotLast(function.name.clone()).into());
                }
                return Ok(Outcome::Value(result));
            }
            current = result;
        }

        // intermediate results are only visible to the chain itself
        let working = pass
            .working
            .as_deref_mut()
            .ok_or(RuntimeError::ModifierNotAllowed(ModifierSite::FunctionArgument))?;
        working.replace(&path, current)?;

        Ok(Outcome::Written)
    }

    /// Literal as is, or a sub-query evaluated read-only at `ctx`
    fn resolve_operand(
        &self,
        operand: &Operand,
        ctx: &RuntimeContext<'_>,
        site: ModifierSite,
    ) -> Result<Value, Error> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Query(query) => self.eval_nested(query, ctx, site),
        }
    }

    /// Evaluate a parenthesized sub-query without a working copy.
    ///
    /// The first segment starts at `ctx`; later pipe segments start at the
    /// previous result. Any segment ending in a mutation is rejected before
    /// anything runs.
    fn eval_nested(
        &self,
        query: &Query,
        ctx: &RuntimeContext<'_>,
        site: ModifierSite,
    ) -> Result<Value, Error> {
        let statements = query.statements();
        if statements
            .iter()
            .filter_map(Statement::last)
            .any(|last| self.is_mutation(last))
        {
            return Err(RuntimeError::ModifierNotAllowed(site).into());
        }

        let Some((first, rest)) = statements.split_first() else {
            return Ok(ctx.data.clone());
        };

        let mut pass = Pass {
            working: None,
            mode: Mode::Read,
        };
        let mut current = self
            .eval_commands(&first.commands, ctx, &mut pass)?
            .into_value(&pass)?;

        for statement in rest {
            let root = RuntimeContext::root(&current);
            let next = self
                .eval_commands(&statement.commands, &root, &mut pass)?
                .into_value(&pass)?;
            current = next;
        }
        Ok(current)
    }
}

/// Iterator in terminal position: the addressed elements themselves
fn slice(spec: IteratorSpec, data: &Value) -> Result<Value, RuntimeError> {
    match (data, spec) {
        (Value::Array(_) | Value::Object(_), IteratorSpec::Wildcard) => Ok(data.clone()),
        (Value::Array(items), IteratorSpec::Range { start, end }) => {
            let (lo, hi) = slice_bounds(items.len(), start, end);
            Ok(Value::Array(items[lo..hi].to_vec()))
        }
        (Value::Object(_), IteratorSpec::Range { .. }) => Err(RuntimeError::RangeOnObject),
        (other, _) => Err(RuntimeError::NotIterable(other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::json_to_value;
    use serde_json::json;

    #[test]
    fn test_context_path_and_origin() {
        let doc = json_to_value(json!({"books": [{"name": "A"}, {"name": "B"}]}));
        let root = RuntimeContext::root(&doc);
        let books = root.select(&SelectorKey::String("books".into())).unwrap();
        let second = books.select(&SelectorKey::Integer(-1)).unwrap();
        let name = second.select(&SelectorKey::String("name".into())).unwrap();

        assert_eq!(name.data, &Value::String("B".into()));
        assert_eq!(
            name.path(),
            vec![
                PathSegment::Field("books".into()),
                PathSegment::Index(1),
                PathSegment::Field("name".into()),
            ]
        );
        assert!(name.origin().is_root());
        assert_eq!(name.origin().data, &doc);
        assert_eq!(second.inbound_key(), Some(&PathSegment::Index(1)));
        assert!(root.path().is_empty());
    }

    #[test]
    fn test_select_errors() {
        let doc = json_to_value(json!({"list": [1], "n": 5}));
        let root = RuntimeContext::root(&doc);

        let err = root.select(&SelectorKey::String("missing".into())).unwrap_err();
        assert_eq!(err, RuntimeError::KeyNotFound("missing".into()));

        let list = root.select(&SelectorKey::String("list".into())).unwrap();
        let err = list.select(&SelectorKey::Integer(3)).unwrap_err();
        assert_eq!(err, RuntimeError::IndexOutOfBounds { index: 3, len: 1 });
        let err = list.select(&SelectorKey::String("a".into())).unwrap_err();
        assert_eq!(err, RuntimeError::InvalidIndex("a".into()));

        let n = root.select(&SelectorKey::String("n".into())).unwrap();
        let err = n.select(&SelectorKey::String("x".into())).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::InvalidSelection {
                kind: ValueKind::Integer,
                ..
            }
        ));
    }

    #[test]
    fn test_numeric_keys_on_objects_use_their_text() {
        let doc = json_to_value(json!({"1": "one", "1.5": "one and a half"}));
        let root = RuntimeContext::root(&doc);
        assert_eq!(
            root.select(&SelectorKey::Integer(1)).unwrap().data,
            &Value::String("one".into())
        );
        assert_eq!(
            root.select(&SelectorKey::Float(1.5)).unwrap().data,
            &Value::String("one and a half".into())
        );
    }

    #[test]
    fn test_terminal_slice() {
        let doc = json_to_value(json!([0, 1, 2, 3]));
        let range = IteratorSpec::Range {
            start: Some(1),
            end: Some(3),
        };
        assert_eq!(slice(range, &doc).unwrap(), json_to_value(json!([1, 2])));
        assert_eq!(slice(IteratorSpec::Wildcard, &doc).unwrap(), doc);
        assert_eq!(
            slice(range, &json_to_value(json!({"a": 1}))).unwrap_err(),
            RuntimeError::RangeOnObject
        );
        assert_eq!(
            slice(IteratorSpec::Wildcard, &Value::Null).unwrap_err(),
            RuntimeError::NotIterable(ValueKind::Null)
        );
    }
}
