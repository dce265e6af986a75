use jpio::{
    Error, FunctionRegistry, ModifierSite, RuntimeError, Value, convert::json_to_value, run_query,
};
use serde_json::json;

fn library() -> Value {
    json_to_value(json!({
        "version": {"major": 1, "minor": 0},
        "books": [
            {"name": "Learning JPIO", "isbn": "M12345678", "author": "1"},
            {"name": "Introduction to Python", "isbn": "M35123115", "author": "2"},
            {"name": "Crazy JPIO", "isbn": "M51236131", "author": "3"}
        ]
    }))
}

fn eval(query: &str, doc: &Value) -> Result<Value, Error> {
    run_query(doc, query, &FunctionRegistry::default())
}

fn eval_json(query: &str, doc: serde_json::Value) -> serde_json::Value {
    let doc = json_to_value(doc);
    eval(query, &doc).unwrap().into()
}

fn runtime_err(query: &str, doc: serde_json::Value) -> RuntimeError {
    match eval(query, &json_to_value(doc)) {
        Err(Error::Runtime(e)) => e,
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_empty_query_returns_document() {
    let doc = library();
    assert_eq!(eval("", &doc).unwrap(), doc);
}

#[test]
fn test_basic_accessors() {
    let doc = library();
    assert_eq!(eval(".version", &doc).unwrap(), json_to_value(json!({"major": 1, "minor": 0})));
    assert_eq!(eval(".version.major", &doc).unwrap(), Value::Integer(1));
    assert_eq!(eval(".books.[0].name", &doc).unwrap(), Value::from("Learning JPIO"));
    assert_eq!(eval(".books.[-1].author", &doc).unwrap(), Value::from("3"));
}

#[test]
fn test_list_iterator() {
    assert_eq!(
        eval_json(".books.[*].name", json!({"books": [{"name": "A"}, {"name": "B"}]})),
        json!(["A", "B"])
    );
}

#[test]
fn test_object_iterator_keeps_keys() {
    assert_eq!(
        eval_json(".[*].count", json!({"x": {"count": 1}, "y": {"count": 2}})),
        json!({"x": 1, "y": 2})
    );
}

#[test]
fn test_slices() {
    let doc = json!({"list": [0, 1, 2, 3, 4]});
    assert_eq!(eval_json(".list.[1:3]", doc.clone()), json!([1, 2]));
    assert_eq!(eval_json(".list.[-2:]", doc.clone()), json!([3, 4]));
    assert_eq!(eval_json(".list.[:]", doc.clone()), json!([0, 1, 2, 3, 4]));
    assert_eq!(eval_json(".list.[3:1]", doc.clone()), json!([]));
    assert_eq!(eval_json(".list.[2:100]", doc), json!([2, 3, 4]));
}

#[test]
fn test_range_fan_out() {
    let doc = json!({"books": [{"n": "a"}, {"n": "b"}, {"n": "c"}]});
    assert_eq!(eval_json(".books.[1:].n", doc), json!(["b", "c"]));
}

#[test]
fn test_numeric_object_keys() {
    let doc = json!({"1": "int key", "1.5": "float key"});
    assert_eq!(eval_json(".1", doc.clone()), json!("int key"));
    assert_eq!(eval_json(".f(1.5)", doc), json!("float key"));
}

#[test]
fn test_large_float_keys_use_exponent_text() {
    let doc = json!({"1e+20": "big", "1e-05": "small", "3.0": "three"});
    assert_eq!(eval_json(".f(1e20)", doc.clone()), json!("big"));
    assert_eq!(eval_json(".f(0.00001)", doc.clone()), json!("small"));
    assert_eq!(eval_json(".f(3)", doc), json!("three"));
}

#[test]
fn test_escaped_keys() {
    assert_eq!(eval_json(".a~.b", json!({"a.b": 1, "a": {"b": 2}})), json!(1));
}

// ============================================================================
// Writing
// ============================================================================

#[test]
fn test_assignment() {
    let doc = library();
    let result = eval(".version.minor=3", &doc).unwrap();

    let mut expected: serde_json::Value = doc.clone().into();
    expected["version"]["minor"] = json!(3);
    assert_eq!(serde_json::Value::from(result), expected);
}

#[test]
fn test_assignment_leaves_input_untouched() {
    let doc = library();
    let before = doc.clone();
    let _ = eval(".x=5", &doc).unwrap();
    let _ = eval(".books.[*].name#upper()", &doc).unwrap();
    assert_eq!(doc, before);
}

#[test]
fn test_assignment_appends_new_key() {
    assert_eq!(
        eval_json(".version.patch=7", json!({"version": {"major": 1, "minor": 0}})),
        json!({"version": {"major": 1, "minor": 0, "patch": 7}})
    );
}

#[test]
fn test_mass_assignment() {
    let result = eval_json(".books.[*].date=s(2014-12-12)", library().into());
    for book in result["books"].as_array().unwrap() {
        assert_eq!(book["date"], json!("2014-12-12"));
        assert!(book["isbn"].is_string());
    }
    assert_eq!(result["version"], json!({"major": 1, "minor": 0}));
}

#[test]
fn test_set_by_selection() {
    let result = eval_json(".books.[*].date=(.author)", library().into());
    for book in result["books"].as_array().unwrap() {
        assert_eq!(book["date"], book["author"]);
    }
}

#[test]
fn test_assignment_into_arrays() {
    assert_eq!(eval_json(".list.[-1]=x", json!({"list": [1, 2]})), json!({"list": [1, "x"]}));
    assert_eq!(
        runtime_err(".list.[5]=x", json!({"list": [1, 2]})),
        RuntimeError::IndexOutOfBounds { index: 5, len: 2 }
    );
}

#[test]
fn test_assign_nested_query_with_pipe() {
    assert_eq!(
        eval_json(".copy=(.version|.major)", json!({"version": {"major": 4}})),
        json!({"version": {"major": 4}, "copy": 4})
    );
}

#[test]
fn test_assign_list_and_json() {
    assert_eq!(
        eval_json(".a=([(.b), 2])", json!({"b": 1})),
        json!({"b": 1, "a": [1, 2]})
    );
    assert_eq!(
        eval_json(".a=j({\"c\":[true]})", json!({})),
        json!({"a": {"c": [true]}})
    );
}

// ============================================================================
// Pipes and list construction
// ============================================================================

#[test]
fn test_pipe_before_function_returns_raw_value() {
    assert_eq!(
        eval_json(".data|#lower()", json!({"data": "SIMPLE_STRING"})),
        json!("simple_string")
    );
}

#[test]
fn test_pipe_after_write() {
    assert_eq!(
        eval_json(".version.minor=3|.version", json!({"version": {"minor": 0}})),
        json!({"minor": 3})
    );
}

#[test]
fn test_group_then_commands() {
    assert_eq!(eval_json("(.a|.b).c", json!({"a": {"b": {"c": 9}}})), json!(9));
}

#[test]
fn test_list_construction() {
    assert_eq!(
        eval_json("[(.version.major), 1, s(two), (.books.[*].author)]", library().into()),
        json!([1, 1, "two", ["1", "2", "3"]])
    );
    assert_eq!(eval_json(".a|[(.b)]", json!({"a": {"b": 1}})), json!([1]));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_selection_errors() {
    assert_eq!(
        runtime_err(".missing", json!({"a": 1})),
        RuntimeError::KeyNotFound("missing".into())
    );
    assert!(matches!(
        runtime_err(".a.b", json!({"a": 1})),
        RuntimeError::InvalidSelection { .. }
    ));
    assert_eq!(
        runtime_err(".[3]", json!([1])),
        RuntimeError::IndexOutOfBounds { index: 3, len: 1 }
    );
    assert_eq!(
        runtime_err(".x", json!([1])),
        RuntimeError::InvalidIndex("x".into())
    );
}

#[test]
fn test_iteration_errors() {
    assert!(matches!(runtime_err(".a.[*]", json!({"a": 1})), RuntimeError::NotIterable(_)));
    assert!(matches!(runtime_err(".a.[*].b", json!({"a": "s"})), RuntimeError::NotIterable(_)));
    assert_eq!(runtime_err(".[0:1]", json!({"a": 1})), RuntimeError::RangeOnObject);
    assert_eq!(runtime_err(".[0:1].a", json!({"a": 1})), RuntimeError::RangeOnObject);
}

#[test]
fn test_error_in_one_element_aborts_query() {
    assert_eq!(
        runtime_err(".books.[*].date=(.author)", json!({"books": [{"author": 1}, {}]})),
        RuntimeError::KeyNotFound("author".into())
    );
}

#[test]
fn test_modifier_not_allowed_in_nested_statements() {
    let doc = json!({"a": "x", "list": [2, 1]});
    assert_eq!(
        runtime_err(".b=(.a=1)", doc.clone()),
        RuntimeError::ModifierNotAllowed(ModifierSite::AssignmentValue)
    );
    assert_eq!(
        runtime_err(".b=(.list#sort())", doc.clone()),
        RuntimeError::ModifierNotAllowed(ModifierSite::AssignmentValue)
    );
    assert_eq!(
        runtime_err(".list#sort((.a#upper()))", doc.clone()),
        RuntimeError::ModifierNotAllowed(ModifierSite::FunctionArgument)
    );
    assert_eq!(
        runtime_err("[(.a=2)]", doc.clone()),
        RuntimeError::ModifierNotAllowed(ModifierSite::ListElement)
    );
    assert_eq!(
        runtime_err(".b=(.a|#upper())", doc),
        RuntimeError::ModifierNotAllowed(ModifierSite::AssignmentValue)
    );
}

#[test]
fn test_runtime_error_display() {
    let err = eval(".missing", &json_to_value(json!({}))).unwrap_err();
    assert_eq!(err.to_string(), " error : Runtime Error : unable to find key missing");
}
