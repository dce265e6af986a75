//! Built-in functions available in every default registry.

use std::cmp::Ordering;

use regex::Regex;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use super::{FunctionRegistry, FunctionSpec, Invocation};
use crate::{
    evaluator::RuntimeError,
    transform::resolve_index,
    value::{Value, ValueKind},
};

pub(super) fn register_all(registry: &mut FunctionRegistry) {
    registry.register(
        FunctionSpec::modifier("sort", sort)
            .accepting(&[ValueKind::Array])
            .with_arities(&[0, 1, 2])
            .describe("Sort a list in ascending order")
            .usage("#sort()")
            .usage("#sort(key)")
            .usage("#sort(item, key)"),
    );
    registry.register(
        FunctionSpec::modifier("rsort", rsort)
            .accepting(&[ValueKind::Array])
            .with_arities(&[0, 1, 2])
            .describe("Sort a list in descending order")
            .usage("#rsort()")
            .usage("#rsort(key)")
            .usage("#rsort(item, key)"),
    );
    registry.register(
        FunctionSpec::modifier("upper", upper)
            .accepting(&[ValueKind::String])
            .describe("Convert a string to upper case")
            .usage("#upper()"),
    );
    registry.register(
        FunctionSpec::modifier("lower", lower)
            .accepting(&[ValueKind::String])
            .describe("Convert a string to lower case")
            .usage("#lower()"),
    );
    registry.register(
        FunctionSpec::modifier("replace", replace)
            .accepting(&[ValueKind::String])
            .with_arities(&[2])
            .describe("Replace every match of a regular expression")
            .usage("#replace(pattern, replacement)"),
    );
    registry.register(
        FunctionSpec::producer("len", len)
            .accepting(&[ValueKind::Array, ValueKind::Object])
            .describe("Number of elements of a list or entries of an object")
            .usage("#len()"),
    );
    registry.register(
        FunctionSpec::producer("keys", keys)
            .accepting(&[ValueKind::Object])
            .describe("Keys of an object, in document order")
            .usage("#keys()"),
    );
    registry.register(
        FunctionSpec::producer("sum", sum)
            .accepting(&[ValueKind::Array])
            .describe("Sum of a list of numbers")
            .usage("#sum()"),
    );
    registry.register(
        FunctionSpec::producer("matches", matches)
            .accepting(&[ValueKind::String])
            .with_arities(&[1])
            .describe("Whether a string matches a regular expression")
            .usage("#matches(pattern)"),
    );
}

// ========================================
// Sorting
// ========================================

fn sort(call: Invocation<'_>, args: Vec<Value>) -> Result<Value, RuntimeError> {
    sort_items(call, args, false)
}

fn rsort(call: Invocation<'_>, args: Vec<Value>) -> Result<Value, RuntimeError> {
    sort_items(call, args, true)
}

fn sort_items(
    call: Invocation<'_>,
    args: Vec<Value>,
    descending: bool,
) -> Result<Value, RuntimeError> {
    let Value::Array(items) = call.value else {
        return Err(RuntimeError::function(call.function, "expects a list"));
    };

    let key = match args.as_slice() {
        [] => None,
        [key] => Some(key),
        [key_type, key] => match key_type.as_str() {
            Some("item") => Some(key),
            _ => {
                return Err(RuntimeError::function(
                    call.function,
                    format!("Unknown sort type {}", key_type.as_string()),
                ));
            }
        },
        _ => return Err(RuntimeError::function(call.function, "too many arguments")),
    };

    let mut keyed = items
        .into_iter()
        .map(|item| {
            let sort_key = match key {
                Some(key) => sort_key(call.function, &item, key)?,
                None => item.clone(),
            };
            Ok((item, sort_key))
        })
        .collect::<Result<Vec<_>, RuntimeError>>()?;

    check_comparable(call.function, keyed.iter().map(|(_, key)| key))?;

    keyed.sort_by(|(_, a), (_, b)| {
        let ord = compare_values(a, b);
        if descending { ord.reverse() } else { ord }
    });

    Ok(Value::Array(keyed.into_iter().map(|(item, _)| item).collect()))
}

/// Look `key` up in a list element
fn sort_key(function: &str, item: &Value, key: &Value) -> Result<Value, RuntimeError> {
    let found = match item {
        Value::Object(map) => map.get(&key.as_string()),
        Value::Array(elements) => key
            .as_int()
            .and_then(|index| resolve_index(index, elements.len()))
            .map(|index| &elements[index]),
        _ => None,
    };
    found.cloned().ok_or_else(|| {
        RuntimeError::function(
            function,
            format!("unable to find key {} in {}", key.as_string(), item.kind()),
        )
    })
}

/// Sort keys must all be numbers, all strings, or all booleans
fn check_comparable<'v>(
    function: &str,
    mut keys: impl Iterator<Item = &'v Value>,
) -> Result<(), RuntimeError> {
    let class = |value: &Value| match value {
        Value::Integer(_) | Value::Float(_) => Some("number"),
        Value::String(_) => Some("string"),
        Value::Boolean(_) => Some("boolean"),
        _ => None,
    };

    let Some(first) = keys.next() else {
        return Ok(());
    };
    let expected = class(first)
        .ok_or_else(|| RuntimeError::function(function, format!("cannot sort {}", first.kind())))?;

    for key in keys {
        match class(key) {
            Some(found) if found == expected => {}
            _ => {
                return Err(RuntimeError::function(
                    function,
                    format!("cannot compare {} with {}", first.kind(), key.kind()),
                ));
            }
        }
    }
    Ok(())
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

// ========================================
// String Functions
// ========================================

fn upper(call: Invocation<'_>, _args: Vec<Value>) -> Result<Value, RuntimeError> {
    match call.value {
        Value::String(s) => Ok(Value::String(s.to_uppercase())),
        other => Err(RuntimeError::function(
            call.function,
            format!("expects a string, got {}", other.kind()),
        )),
    }
}

fn lower(call: Invocation<'_>, _args: Vec<Value>) -> Result<Value, RuntimeError> {
    match call.value {
        Value::String(s) => Ok(Value::String(s.to_lowercase())),
        other => Err(RuntimeError::function(
            call.function,
            format!("expects a string, got {}", other.kind()),
        )),
    }
}

fn compile(function: &str, pattern: &Value) -> Result<Regex, RuntimeError> {
    Regex::new(&pattern.as_string())
        .map_err(|e| RuntimeError::function(function, format!("invalid pattern: {}", e)))
}

fn replace(call: Invocation<'_>, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let [pattern, replacement] = args.as_slice() else {
        return Err(RuntimeError::function(call.function, "expects pattern and replacement"));
    };
    let Some(text) = call.value.as_str() else {
        return Err(RuntimeError::function(call.function, "expects a string"));
    };

    let re = compile(call.function, pattern)?;
    let replaced = re.replace_all(text, replacement.as_string().as_str());
    Ok(Value::String(replaced.into_owned()))
}

fn matches(call: Invocation<'_>, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let [pattern] = args.as_slice() else {
        return Err(RuntimeError::function(call.function, "expects a pattern"));
    };
    let Some(text) = call.value.as_str() else {
        return Err(RuntimeError::function(call.function, "expects a string"));
    };

    let re = compile(call.function, pattern)?;
    Ok(Value::Boolean(re.is_match(text)))
}

// ========================================
// Producers
// ========================================

fn len(call: Invocation<'_>, _args: Vec<Value>) -> Result<Value, RuntimeError> {
    let count = match &call.value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(RuntimeError::function(
                call.function,
                format!("cannot count {}", other.kind()),
            ));
        }
    };
    Ok(Value::Integer(count as i64))
}

fn keys(call: Invocation<'_>, _args: Vec<Value>) -> Result<Value, RuntimeError> {
    match call.value {
        Value::Object(map) => Ok(Value::Array(map.into_keys().map(Value::String).collect())),
        other => Err(RuntimeError::function(
            call.function,
            format!("expects an object, got {}", other.kind()),
        )),
    }
}

/// Exact decimal accumulation; integer result when every element is an integer
fn sum(call: Invocation<'_>, _args: Vec<Value>) -> Result<Value, RuntimeError> {
    let Value::Array(items) = &call.value else {
        return Err(RuntimeError::function(call.function, "expects a list"));
    };

    let overflow = || RuntimeError::function(call.function, "numeric overflow");
    let mut total = Decimal::ZERO;
    let mut all_integers = true;

    for item in items {
        let addend = match item {
            Value::Integer(n) => Decimal::from_i64(*n),
            Value::Float(n) => {
                all_integers = false;
                Decimal::from_f64(*n)
            }
            other => {
                return Err(RuntimeError::function(
                    call.function,
                    format!("cannot add {}", other.kind()),
                ));
            }
        }
        .ok_or_else(overflow)?;
        total = total.checked_add(addend).ok_or_else(overflow)?;
    }

    if all_integers {
        total.to_i64().map(Value::Integer).ok_or_else(overflow)
    } else {
        total.to_f64().map(Value::Float).ok_or_else(overflow)
    }
}
