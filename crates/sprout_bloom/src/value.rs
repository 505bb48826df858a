//! JavaScript-flavored operations over JSON values.
//!
//! Component state is plain JSON. These helpers give it the coercions the
//! generated JavaScript would apply: truthiness, `String(x)`, `Number(x)`,
//! loose and strict equality. Numbers that JSON cannot hold (`NaN`,
//! infinities) become `null`.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use sprout_graft::INDEX_FIELD;

/// Build a number value, keeping integral results integral.
pub fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(single),
            _ => f64::NAN,
        },
        Value::Object(_) => f64::NAN,
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// `String(value)`
pub fn to_display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => format_number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_display(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Name used in diagnostics.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `===`
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// `==`
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => a == b,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(_) | Value::Object(_), _) => to_display(a) == to_display(b) || to_number(a) == to_number(b),
        (_, Value::Array(_) | Value::Object(_)) => loose_equals(b, a),
        _ => to_number(a) == to_number(b),
    }
}

/// `+`: concatenation when either side is a string, addition otherwise.
pub fn add(a: &Value, b: &Value) -> Value {
    let stringy = |v: &Value| matches!(v, Value::String(_) | Value::Array(_) | Value::Object(_));
    if stringy(a) || stringy(b) {
        let mut out = to_display(a);
        out.push_str(&to_display(b));
        Value::String(out)
    } else {
        number(to_number(a) + to_number(b))
    }
}

/// Relational comparison. `None` when either side is `NaN`.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => to_number(a).partial_cmp(&to_number(b)),
    }
}

/// Bind a loop item: objects gain the index field, anything else is wrapped
/// as `{ "value": item, "_index": n }`.
pub fn bind_item(item: &Value, index: usize) -> Value {
    let mut object = match item {
        Value::Object(fields) => fields.clone(),
        other => {
            let mut fields = Map::new();
            fields.insert("value".to_string(), other.clone());
            fields
        }
    };
    object.insert(INDEX_FIELD.to_string(), Value::from(index));
    Value::Object(object)
}
