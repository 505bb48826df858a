//! Expression evaluation against a component's state cells.
//!
//! Reads go through the reactive cells, so evaluating inside an effect
//! subscribes it. Writes read the current value untracked and go through
//! `set`/`update`, which notify subscribers only on change.

use std::cell::RefCell;
use std::rc::Rc;

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use sprout_sap::{Computed, EffectError, Signal};
use sprout_seed::expr::{BinaryOp, Expr, PathSegment, UnaryOp, UpdateOp};

use crate::host::Host;
use crate::value::{
    add, compare, is_truthy, loose_equals, number, strict_equals, to_display, to_number, type_name,
};

/// Evaluation failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unknown state `${0}`")]
    UnknownState(CompactString),

    #[error("`${0}` is computed and cannot be written")]
    ReadOnly(CompactString),

    #[error("`:{0}` read outside of a loop")]
    NoItem(CompactString),

    #[error("unknown function `{0}`")]
    UnknownFunction(CompactString),

    #[error("`{method}` is not a method of {receiver}")]
    UnknownMethod {
        method: CompactString,
        receiver: &'static str,
    },

    #[error("cannot read `{0}` of null")]
    NullAccess(CompactString),

    #[error("cannot write `{field}` on {receiver}")]
    InvalidWrite {
        field: String,
        receiver: &'static str,
    },

    #[error("expression cannot be called")]
    NotCallable,
}

impl From<EvalError> for EffectError {
    fn from(error: EvalError) -> Self {
        EffectError::new(error.to_string())
    }
}

/// A component state cell.
#[derive(Debug, Clone)]
pub enum StateCell {
    Signal(Signal<Value>),
    Computed(Computed<Value>),
}

impl StateCell {
    pub fn get(&self) -> Value {
        match self {
            Self::Signal(signal) => signal.get(),
            Self::Computed(computed) => computed.get(),
        }
    }

    pub fn get_untracked(&self) -> Value {
        match self {
            Self::Signal(signal) => signal.get_untracked(),
            Self::Computed(computed) => computed.get_untracked(),
        }
    }
}

/// The state cells of one mounted component, keyed by name.
///
/// Cloning shares the table, so closures created while the component is
/// being set up see cells declared after them.
#[derive(Debug, Clone, Default)]
pub struct States {
    cells: Rc<RefCell<FxHashMap<CompactString, StateCell>>>,
}

impl States {
    pub fn insert(&self, name: impl Into<CompactString>, cell: StateCell) {
        self.cells.borrow_mut().insert(name.into(), cell);
    }

    pub fn get(&self, name: &str) -> Option<StateCell> {
        self.cells.borrow().get(name).cloned()
    }

    fn cell(&self, name: &str) -> Result<StateCell, EvalError> {
        self.get(name)
            .ok_or_else(|| EvalError::UnknownState(CompactString::from(name)))
    }

    pub(crate) fn signal(&self, name: &str) -> Result<Signal<Value>, EvalError> {
        match self.cell(name)? {
            StateCell::Signal(signal) => Ok(signal),
            StateCell::Computed(_) => Err(EvalError::ReadOnly(CompactString::from(name))),
        }
    }
}

/// Everything an expression can see.
#[derive(Clone, Copy)]
pub struct Env<'e> {
    pub states: &'e States,
    /// The bound loop item, inside list templates
    pub item: Option<&'e Value>,
    /// Receives `navigate(path)`
    pub host: Option<&'e dyn Host>,
}

impl<'e> Env<'e> {
    pub fn new(states: &'e States) -> Self {
        Self {
            states,
            item: None,
            host: None,
        }
    }

    pub fn with_item(mut self, item: &'e Value) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_host(mut self, host: &'e dyn Host) -> Self {
        self.host = Some(host);
        self
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Number(n) => Ok(number(*n)),
            Expr::String(s) => Ok(Value::String(s.to_string())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Array(items) => Ok(Value::Array(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<_, _>>()?,
            )),
            Expr::Object(entries) => {
                let mut object = Map::new();
                for (key, value) in entries {
                    object.insert(key.to_string(), self.eval(value)?);
                }
                Ok(Value::Object(object))
            }
            Expr::State(name) => Ok(self.states.cell(name)?.get()),
            Expr::Item(name) => {
                let item = self.item.ok_or_else(|| EvalError::NoItem(name.clone()))?;
                Ok(read_field(item, name))
            }
            Expr::Ident(name) => Err(EvalError::UnknownFunction(name.clone())),
            Expr::Member { object, property } => {
                let object = self.eval(object)?;
                if object.is_null() {
                    return Err(EvalError::NullAccess(property.clone()));
                }
                Ok(read_field(&object, property))
            }
            Expr::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                if object.is_null() {
                    return Err(EvalError::NullAccess(to_display(&index).into()));
                }
                Ok(read_index(&object, &index))
            }
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!is_truthy(&value)),
                    UnaryOp::Neg => number(-to_number(&value)),
                    UnaryOp::Plus => number(to_number(&value)),
                })
            }
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if is_truthy(&self.eval(test)?) {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
            Expr::Assign { op, target, value } => {
                let value = self.eval(value)?;
                match op.binary() {
                    None => {
                        self.write(target, |_| Ok(value.clone()))?;
                        Ok(value)
                    }
                    Some(binary) => self.write(target, |current| Ok(apply(binary, current, &value))),
                }
            }
            Expr::Update { op, prefix, target } => {
                let delta = match op {
                    UpdateOp::Increment => 1.0,
                    UpdateOp::Decrement => -1.0,
                };
                let mut old = 0.0;
                let new = self.write(target, |current| {
                    old = to_number(current);
                    Ok(number(old + delta))
                })?;
                Ok(if *prefix { new } else { number(old) })
            }
            Expr::Sequence(items) => {
                let mut last = Value::Null;
                for item in items {
                    last = self.eval(item)?;
                }
                Ok(last)
            }
        }
    }

    fn binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value, EvalError> {
        let left = self.eval(left)?;
        match op {
            BinaryOp::And if !is_truthy(&left) => return Ok(left),
            BinaryOp::Or if is_truthy(&left) => return Ok(left),
            BinaryOp::Coalesce if !left.is_null() => return Ok(left),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => return self.eval(right),
            _ => {}
        }
        let right = self.eval(right)?;
        Ok(apply(op, &left, &right))
    }

    /// Write through a `$state` path. `compute` receives the current value
    /// at the path and returns the new one.
    fn write(
        &self,
        target: &Expr,
        compute: impl FnOnce(&Value) -> Result<Value, EvalError>,
    ) -> Result<Value, EvalError> {
        let Some((root, path)) = target.state_path() else {
            return Err(EvalError::InvalidWrite {
                field: "expression".to_string(),
                receiver: "a temporary value",
            });
        };
        let signal = self.states.signal(root)?;
        let path = self.resolve_path(&path)?;

        if path.is_empty() {
            let new = compute(&signal.get_untracked())?;
            signal.set(new.clone());
            return Ok(new);
        }

        let current = signal.with_untracked(|value| lookup(value, &path));
        let new = compute(&current)?;
        let mut result = Ok(());
        signal.update(|value| result = assign_at(value, &path, new.clone()));
        result.map(|()| new)
    }

    fn resolve_path(&self, path: &[PathSegment<'_>]) -> Result<Vec<Key>, EvalError> {
        path.iter()
            .map(|segment| match segment {
                PathSegment::Field(field) => Ok(Key::Field(field.to_string())),
                PathSegment::Index(index) => Ok(match self.eval(index)? {
                    Value::Number(n) => match n.as_u64() {
                        Some(i) => Key::Index(i as usize),
                        None => Key::Field(n.to_string()),
                    },
                    other => Key::Field(to_display(&other)),
                }),
            })
            .collect()
    }

    fn call(&self, callee: &Expr, args: &[Expr]) -> Result<Value, EvalError> {
        match callee {
            Expr::Ident(name) => {
                let args = self.eval_args(args)?;
                let first = args.first().cloned().unwrap_or(Value::Null);
                match name.as_str() {
                    "String" => Ok(Value::String(to_display(&first))),
                    "Number" => Ok(number(to_number(&first))),
                    "Boolean" => Ok(Value::Bool(is_truthy(&first))),
                    "log" => {
                        let line: Vec<String> = args.iter().map(to_display).collect();
                        tracing::info!(target: "sprout::log", "{}", line.join(" "));
                        Ok(Value::Null)
                    }
                    "navigate" => {
                        let path = to_display(&first);
                        match self.host {
                            Some(host) => host.navigate(&path),
                            None => tracing::warn!(path = %path, "navigate without a host"),
                        }
                        Ok(Value::Null)
                    }
                    _ => Err(EvalError::UnknownFunction(name.clone())),
                }
            }
            Expr::Member { object, property } => {
                let args = self.eval_args(args)?;
                if MUTATING_METHODS.contains(&property.as_str()) && object.is_assignable() {
                    let mut result = Value::Null;
                    self.write(object, |current| {
                        let mut receiver = current.clone();
                        result = mutate(&mut receiver, property, &args)?;
                        Ok(receiver)
                    })?;
                    return Ok(result);
                }
                let mut receiver = self.eval(object)?;
                if receiver.is_null() {
                    return Err(EvalError::NullAccess(property.clone()));
                }
                if MUTATING_METHODS.contains(&property.as_str()) {
                    return mutate(&mut receiver, property, &args);
                }
                method(&receiver, property, &args)
            }
            _ => Err(EvalError::NotCallable),
        }
    }

    fn eval_args(&self, args: &[Expr]) -> Result<SmallVec<[Value; 4]>, EvalError> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }
}

const MUTATING_METHODS: &[&str] = &["push", "pop", "shift", "unshift", "splice", "sort", "reverse"];

#[derive(Debug, Clone, PartialEq)]
enum Key {
    Field(String),
    Index(usize),
}

fn apply(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let numeric = |f: fn(f64, f64) -> f64| number(f(to_number(left), to_number(right)));
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => numeric(|a, b| a - b),
        BinaryOp::Mul => numeric(|a, b| a * b),
        BinaryOp::Div => numeric(|a, b| a / b),
        BinaryOp::Rem => numeric(|a, b| a % b),
        BinaryOp::Lt => Value::Bool(compare(left, right).is_some_and(|o| o.is_lt())),
        BinaryOp::Le => Value::Bool(compare(left, right).is_some_and(|o| o.is_le())),
        BinaryOp::Gt => Value::Bool(compare(left, right).is_some_and(|o| o.is_gt())),
        BinaryOp::Ge => Value::Bool(compare(left, right).is_some_and(|o| o.is_ge())),
        BinaryOp::Eq => Value::Bool(loose_equals(left, right)),
        BinaryOp::Ne => Value::Bool(!loose_equals(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNe => Value::Bool(!strict_equals(left, right)),
        // Short-circuiting operators never reach here with both sides
        BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => right.clone(),
    }
}

fn read_field(value: &Value, field: &str) -> Value {
    match (value, field) {
        (Value::Array(items), "length") => Value::from(items.len()),
        (Value::String(s), "length") => Value::from(s.chars().count()),
        (Value::Object(fields), _) => fields.get(field).cloned().unwrap_or(Value::Null),
        (Value::Array(items), _) => field
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn read_index(value: &Value, index: &Value) -> Value {
    match (value, index) {
        (Value::Array(items), Value::Number(n)) => n
            .as_u64()
            .and_then(|i| items.get(i as usize).cloned())
            .unwrap_or(Value::Null),
        (Value::String(s), Value::Number(n)) => n
            .as_u64()
            .and_then(|i| s.chars().nth(i as usize))
            .map_or(Value::Null, |c| Value::String(c.to_string())),
        _ => read_field(value, &to_display(index)),
    }
}

fn lookup(value: &Value, path: &[Key]) -> Value {
    let mut current = value.clone();
    for key in path {
        current = match key {
            Key::Field(field) => read_field(&current, field),
            Key::Index(i) => read_index(&current, &Value::from(*i)),
        };
    }
    current
}

fn assign_at(value: &mut Value, path: &[Key], new: Value) -> Result<(), EvalError> {
    let Some((last, parents)) = path.split_last() else {
        *value = new;
        return Ok(());
    };
    let mut current = value;
    for key in parents {
        current = child_mut(current, key)?;
    }
    match (current, last) {
        (Value::Object(fields), Key::Field(field)) => {
            fields.insert(field.clone(), new);
        }
        (Value::Object(fields), Key::Index(i)) => {
            fields.insert(i.to_string(), new);
        }
        (Value::Array(items), Key::Index(i)) => {
            if *i >= items.len() {
                items.resize(*i + 1, Value::Null);
            }
            items[*i] = new;
        }
        (other, key) => {
            return Err(EvalError::InvalidWrite {
                field: key_name(key),
                receiver: type_name(other),
            })
        }
    }
    Ok(())
}

fn child_mut<'v>(value: &'v mut Value, key: &Key) -> Result<&'v mut Value, EvalError> {
    let receiver = type_name(value);
    let child = match (value, key) {
        (Value::Object(fields), Key::Field(field)) => fields.get_mut(field.as_str()),
        (Value::Object(fields), Key::Index(i)) => fields.get_mut(i.to_string().as_str()),
        (Value::Array(items), Key::Index(i)) => items.get_mut(*i),
        _ => None,
    };
    child.ok_or_else(|| EvalError::InvalidWrite {
        field: key_name(key),
        receiver,
    })
}

fn key_name(key: &Key) -> String {
    match key {
        Key::Field(field) => field.clone(),
        Key::Index(i) => i.to_string(),
    }
}

fn index_arg(args: &[Value], i: usize, len: usize, default: usize) -> usize {
    match args.get(i) {
        None | Some(Value::Null) => default,
        Some(value) => {
            let n = to_number(value);
            if n.is_nan() {
                0
            } else if n < 0.0 {
                len.saturating_sub((-n) as usize)
            } else {
                (n as usize).min(len)
            }
        }
    }
}

/// Methods that mutate their receiver in place.
fn mutate(receiver: &mut Value, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let Value::Array(items) = receiver else {
        return Err(EvalError::UnknownMethod {
            method: CompactString::from(name),
            receiver: type_name(receiver),
        });
    };
    Ok(match name {
        "push" => {
            items.extend(args.iter().cloned());
            Value::from(items.len())
        }
        "pop" => items.pop().unwrap_or(Value::Null),
        "shift" => {
            if items.is_empty() {
                Value::Null
            } else {
                items.remove(0)
            }
        }
        "unshift" => {
            items.splice(0..0, args.iter().cloned());
            Value::from(items.len())
        }
        "reverse" => {
            items.reverse();
            Value::Array(items.clone())
        }
        "sort" => {
            items.sort_by_key(to_display);
            Value::Array(items.clone())
        }
        "splice" => {
            let len = items.len();
            let start = index_arg(args, 0, len, 0);
            let count = match args.get(1) {
                None => len - start,
                Some(value) => (to_number(value).max(0.0) as usize).min(len - start),
            };
            let inserted = args.iter().skip(2).cloned();
            Value::Array(items.splice(start..start + count, inserted).collect())
        }
        _ => {
            return Err(EvalError::UnknownMethod {
                method: CompactString::from(name),
                receiver: "array",
            })
        }
    })
}

fn method(receiver: &Value, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Null);
    match (receiver, name) {
        (_, "toString") => Ok(Value::String(to_display(receiver))),
        (Value::String(s), "toUpperCase") => Ok(Value::String(s.to_uppercase())),
        (Value::String(s), "toLowerCase") => Ok(Value::String(s.to_lowercase())),
        (Value::String(s), "trim") => Ok(Value::String(s.trim().to_string())),
        (Value::String(s), "includes") => Ok(Value::Bool(s.contains(&to_display(&arg(0))))),
        (Value::String(s), "indexOf") => {
            let needle = to_display(&arg(0));
            Ok(match s.find(&needle) {
                Some(byte) => Value::from(s[..byte].chars().count()),
                None => Value::from(-1),
            })
        }
        (Value::String(s), "slice") => {
            let chars: Vec<char> = s.chars().collect();
            let start = index_arg(args, 0, chars.len(), 0);
            let end = index_arg(args, 1, chars.len(), chars.len());
            Ok(Value::String(
                chars[start..end.max(start)].iter().collect(),
            ))
        }
        (Value::Array(items), "includes") => {
            let needle = arg(0);
            Ok(Value::Bool(items.iter().any(|item| strict_equals(item, &needle))))
        }
        (Value::Array(items), "indexOf") => {
            let needle = arg(0);
            Ok(match items.iter().position(|item| strict_equals(item, &needle)) {
                Some(i) => Value::from(i),
                None => Value::from(-1),
            })
        }
        (Value::Array(items), "join") => {
            let separator = match arg(0) {
                Value::Null => ",".to_string(),
                other => to_display(&other),
            };
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => to_display(other),
                })
                .collect();
            Ok(Value::String(parts.join(&separator)))
        }
        (Value::Array(items), "slice") => {
            let start = index_arg(args, 0, items.len(), 0);
            let end = index_arg(args, 1, items.len(), items.len());
            Ok(Value::Array(items[start..end.max(start)].to_vec()))
        }
        _ => Err(EvalError::UnknownMethod {
            method: CompactString::from(name),
            receiver: type_name(receiver),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sprout_sap::Runtime;
    use sprout_seed::expr::parse_expression;

    fn setup(runtime: &Runtime, cells: &[(&str, Value)]) -> States {
        let states = States::default();
        for (name, value) in cells {
            states.insert(*name, StateCell::Signal(runtime.signal(value.clone())));
        }
        states
    }

    fn eval(states: &States, source: &str) -> Result<Value, EvalError> {
        Env::new(states).eval(&parse_expression(source).unwrap())
    }

    #[test]
    fn test_arithmetic_and_logic() {
        let runtime = Runtime::new();
        let states = setup(&runtime, &[("count", json!(4)), ("name", json!("Ada"))]);
        assert_eq!(eval(&states, "$count * 2 + 1").unwrap(), json!(9));
        assert_eq!(eval(&states, "$count / 8").unwrap(), json!(0.5));
        assert_eq!(eval(&states, "$count > 3 && $name").unwrap(), json!("Ada"));
        assert_eq!(eval(&states, "null ?? 'fallback'").unwrap(), json!("fallback"));
        assert_eq!(eval(&states, "$count === 4 ? 'four' : 'other'").unwrap(), json!("four"));
        assert_eq!(eval(&states, "'Hi ' + $name").unwrap(), json!("Hi Ada"));
        assert_eq!(eval(&states, "!$count").unwrap(), json!(false));
    }

    #[test]
    fn test_writes() {
        let runtime = Runtime::new();
        let states = setup(&runtime, &[("count", json!(1)), ("user", json!({"name": "a"}))]);
        assert_eq!(eval(&states, "$count++").unwrap(), json!(1));
        assert_eq!(eval(&states, "++$count").unwrap(), json!(3));
        assert_eq!(eval(&states, "$count += 10").unwrap(), json!(13));
        eval(&states, "$user.name = 'b'; $user.tags = []").unwrap();
        eval(&states, "$user.tags.push('x', 'y')").unwrap();
        assert_eq!(
            eval(&states, "$user").unwrap(),
            json!({"name": "b", "tags": ["x", "y"]})
        );
    }

    #[test]
    fn test_array_methods() {
        let runtime = Runtime::new();
        let states = setup(&runtime, &[("items", json!([3, 1, 2]))]);
        assert_eq!(eval(&states, "$items.pop()").unwrap(), json!(2));
        assert_eq!(eval(&states, "$items.length").unwrap(), json!(2));
        assert_eq!(eval(&states, "$items.includes(1)").unwrap(), json!(true));
        assert_eq!(eval(&states, "$items.join('-')").unwrap(), json!("3-1"));
        assert_eq!(eval(&states, "$items.indexOf(7)").unwrap(), json!(-1));
        eval(&states, "$items.unshift(0); $items.sort()").unwrap();
        assert_eq!(eval(&states, "$items").unwrap(), json!([0, 1, 3]));
        assert_eq!(eval(&states, "$items.slice(1)").unwrap(), json!([1, 3]));
        assert_eq!(eval(&states, "$items.splice(0, 1)").unwrap(), json!([0]));
        assert_eq!(eval(&states, "$items").unwrap(), json!([1, 3]));
    }

    #[test]
    fn test_string_methods() {
        let runtime = Runtime::new();
        let states = setup(&runtime, &[("s", json!("  Hello "))]);
        assert_eq!(eval(&states, "$s.trim().toUpperCase()").unwrap(), json!("HELLO"));
        assert_eq!(eval(&states, "$s.trim().slice(1, 3)").unwrap(), json!("el"));
        assert_eq!(eval(&states, "$s.indexOf('H')").unwrap(), json!(2));
        assert_eq!(eval(&states, "String(12) + Number('3')").unwrap(), json!("123"));
    }

    #[test]
    fn test_item_reads() {
        let runtime = Runtime::new();
        let states = setup(&runtime, &[]);
        let item = json!({"title": "a", "_index": 1});
        let env = Env::new(&states).with_item(&item);
        assert_eq!(env.eval(&parse_expression(":title").unwrap()).unwrap(), json!("a"));
        assert_eq!(
            env.eval(&parse_expression(":_index + 1").unwrap()).unwrap(),
            json!(2)
        );
        assert_eq!(
            eval(&states, ":title"),
            Err(EvalError::NoItem("title".into()))
        );
    }

    #[test]
    fn test_errors() {
        let runtime = Runtime::new();
        let states = setup(&runtime, &[("user", json!(null))]);
        let double = runtime.computed(|| json!(2));
        states.insert("double", StateCell::Computed(double));
        assert_eq!(eval(&states, "$missing"), Err(EvalError::UnknownState("missing".into())));
        assert_eq!(eval(&states, "$double = 3"), Err(EvalError::ReadOnly("double".into())));
        assert_eq!(eval(&states, "$user.name"), Err(EvalError::NullAccess("name".into())));
        assert_eq!(eval(&states, "alert(1)"), Err(EvalError::UnknownFunction("alert".into())));
        assert!(matches!(
            eval(&states, "$user.name = 1"),
            Err(EvalError::InvalidWrite { receiver: "null", .. })
        ));
    }

    #[test]
    fn test_reads_subscribe() {
        let runtime = Runtime::new();
        let states = setup(&runtime, &[("count", json!(0))]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let effect_states = states.clone();
        let expr = parse_expression("$count * 10").unwrap();
        runtime.effect(move || {
            log.borrow_mut().push(Env::new(&effect_states).eval(&expr)?);
            Ok(())
        });
        eval(&states, "$count = 2").unwrap();
        eval(&states, "$count = 2").unwrap();
        assert_eq!(*seen.borrow(), vec![json!(0), json!(20)]);
    }
}
