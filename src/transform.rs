use crate::{ast::SelectorKey, evaluator::RuntimeError, value::Value};

/// A segment in a navigable path used for writes.
///
/// Paths are collected from the inbound keys of a context's ancestry and used
/// to locate and modify values in the working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object field access by name
    ///
    /// # Examples
    /// - `.name` → `Field("name")`
    /// - `.f(1.5)` on an object → `Field("1.5")`
    Field(String),

    /// Array element access by resolved index
    ///
    /// # Note
    /// Negative selector indices are resolved against the array length before
    /// they become segments, so an `Index` is always a real position.
    Index(usize),
}

/// A sequence of path segments from the origin of an evaluation.
///
/// # Examples
///
/// For `.books.[0].name` the path would be:
/// - `PathSegment::Field("books")`
/// - `PathSegment::Index(0)`
/// - `PathSegment::Field("name")`
pub type Path = Vec<PathSegment>;

/// Render a path the way it would be written in a query (`.` for the root)
pub fn describe_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    path.iter()
        .map(|segment| match segment {
            PathSegment::Field(name) => format!(".{}", name),
            PathSegment::Index(index) => format!(".[{}]", index),
        })
        .collect()
}

/// Resolve a possibly negative index against `len`
///
/// `-1` is the last element. Returns `None` when the index falls outside the array.
pub fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        (len as i64).checked_add(index)?
    } else {
        index
    };
    usize::try_from(resolved).ok().filter(|i| *i < len)
}

/// Resolve half-open slice bounds against `len`.
///
/// Missing bounds default to the ends, negative bounds count from the end, and
/// both are clamped into `0..=len`. An inverted range is empty.
pub fn slice_bounds(len: usize, start: Option<i64>, end: Option<i64>) -> (usize, usize) {
    let clamp = |bound: i64| -> usize {
        if bound < 0 {
            usize::try_from((len as i64).saturating_add(bound)).unwrap_or(0)
        } else {
            usize::try_from(bound).map_or(len, |b| b.min(len))
        }
    };
    let lo = start.map_or(0, clamp);
    let hi = end.map_or(len, clamp);
    (lo, hi.max(lo))
}

/// The mutable copy of a statement's input document.
///
/// Owned by the evaluation of one statement. Contexts never hold a piece of
/// it; every write names its location as a path from the root, so nested
/// writes always land in the same document.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingCopy {
    root: Value,
}

impl WorkingCopy {
    /// Deep-copy `document`
    pub fn new(document: &Value) -> Self {
        WorkingCopy {
            root: document.clone(),
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    pub fn get(&self, path: &[PathSegment]) -> Option<&Value> {
        path.iter().try_fold(&self.root, |current, segment| match (current, segment) {
            (Value::Object(map), PathSegment::Field(name)) => map.get(name),
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        })
    }

    pub fn get_mut(&mut self, path: &[PathSegment]) -> Option<&mut Value> {
        let mut current = &mut self.root;
        for segment in path {
            current = match (current, segment) {
                (Value::Object(map), PathSegment::Field(name)) => map.get_mut(name)?,
                (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Replace the value at `path`; an empty path replaces the whole document
    pub fn replace(&mut self, path: &[PathSegment], value: Value) -> Result<(), RuntimeError> {
        let slot = self
            .get_mut(path)
            .ok_or_else(|| RuntimeError::MissingPath(describe_path(path)))?;
        *slot = value;
        Ok(())
    }

    /// Write `value` under `key` inside the container at `path`.
    ///
    /// Objects gain the key if it is missing (appended, so existing order is
    /// kept); arrays only accept an in-range integer index.
    pub fn assign(
        &mut self,
        path: &[PathSegment],
        key: &SelectorKey,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let container = self
            .get_mut(path)
            .ok_or_else(|| RuntimeError::MissingPath(describe_path(path)))?;

        match container {
            Value::Object(map) => {
                map.insert(key.as_object_key(), value);
                Ok(())
            }
            Value::Array(items) => match key {
                SelectorKey::Integer(index) => {
                    let len = items.len();
                    let resolved = resolve_index(*index, len).ok_or(
                        RuntimeError::IndexOutOfBounds {
                            index: *index,
                            len,
                        },
                    )?;
                    items[resolved] = value;
                    Ok(())
                }
                other => Err(RuntimeError::InvalidIndex(other.to_string())),
            },
            other => Err(RuntimeError::CannotAssign {
                kind: other.kind(),
                key: key.to_string(),
            }),
        }
    }
}
