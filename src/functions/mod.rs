//! Defines the registry the evaluator resolves `#name(...)` calls against.
//!
//! The evaluator only reads a registry. Building one is up to the caller:
//! [`FunctionRegistry::default()`] holds the built-in functions, while
//! [`FunctionRegistry::new()`] starts empty for callers that register their own.

mod builtin;

use indexmap::IndexMap;

use crate::{
    evaluator::RuntimeError,
    value::{Value, ValueKind},
};

/// What a function is called with, besides its arguments.
#[derive(Debug)]
pub struct Invocation<'a> {
    /// Name the function was called by
    pub function: &'a str,
    /// Read-only value of the original document at the call site
    pub data: &'a Value,
    /// Current working value; the result of the previous call in the chain
    pub value: Value,
}

/// The signature for a function implementation.
pub type FunctionImpl = fn(call: Invocation<'_>, args: Vec<Value>) -> Result<Value, RuntimeError>;

/// How a function's result is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// The result replaces the working value and the chain may continue
    Modifier,
    /// The result is the query's result; must be the last call of its chain
    Producer,
}

/// A registered function and its calling contract.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub usages: Vec<String>,
    pub kind: FunctionKind,
    accepts: Vec<ValueKind>,
    arities: Vec<usize>,
    run: FunctionImpl,
}

impl FunctionSpec {
    /// A function whose result feeds back into the working copy
    pub fn modifier(name: &str, run: FunctionImpl) -> Self {
        Self::with_kind(name, FunctionKind::Modifier, run)
    }

    /// A function whose result is returned as the query result
    pub fn producer(name: &str, run: FunctionImpl) -> Self {
        Self::with_kind(name, FunctionKind::Producer, run)
    }

    fn with_kind(name: &str, kind: FunctionKind, run: FunctionImpl) -> Self {
        FunctionSpec {
            name: name.to_string(),
            description: String::new(),
            usages: Vec::new(),
            kind,
            accepts: Vec::new(),
            arities: vec![0],
            run,
        }
    }

    /// Value kinds the function can be applied to
    pub fn accepting(mut self, kinds: &[ValueKind]) -> Self {
        self.accepts = kinds.to_vec();
        self
    }

    /// Accepted argument counts (defaults to no arguments)
    pub fn with_arities(mut self, arities: &[usize]) -> Self {
        self.arities = arities.to_vec();
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn usage(mut self, usage: &str) -> Self {
        self.usages.push(usage.to_string());
        self
    }

    pub fn accepts(&self, kind: ValueKind) -> bool {
        self.accepts.contains(&kind)
    }

    pub fn accepted_kinds(&self) -> &[ValueKind] {
        &self.accepts
    }

    pub fn takes(&self, count: usize) -> bool {
        self.arities.contains(&count)
    }

    pub fn arities(&self) -> &[usize] {
        &self.arities
    }

    pub fn is_modifier(&self) -> bool {
        self.kind == FunctionKind::Modifier
    }

    pub fn call(&self, call: Invocation<'_>, args: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.run)(call, args)
    }
}

/// A registry to hold all available functions for the evaluator.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: IndexMap<String, FunctionSpec>,
}

impl FunctionRegistry {
    /// Creates a new, empty function registry.
    pub fn new() -> Self {
        Self {
            functions: IndexMap::new(),
        }
    }

    /// Registers a function, replacing any previous one with the same name.
    pub fn register(&mut self, spec: FunctionSpec) {
        self.functions.insert(spec.name.clone(), spec);
    }

    /// Finds a function by its exact name.
    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered functions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &FunctionSpec> {
        self.functions.values()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    /// Creates a new registry populated with all built-in functions.
    fn default() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }
}
