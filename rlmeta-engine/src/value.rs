//! Values flowing through matching and evaluation.
//!
//! The same type is used for input items (characters of source text,
//! message tags, nested messages) and for the results of evaluating
//! deferred actions.

use crate::component::Component;
use crate::error::{EvalError, EvalResult};
use crate::host::Effect;
use std::fmt;
use std::sync::Arc;

/// Shared, immutable run of values. Matching never mutates one.
pub type Sequence = Arc<[Value]>;

type NativeFn = dyn Fn(&[Value]) -> EvalResult<Value> + Send + Sync;

/// A named host function callable from semantic actions.
#[derive(Clone)]
pub struct Func {
    name: Arc<str>,
    call: Arc<NativeFn>,
}

impl Func {
    pub fn new<F>(name: impl Into<Arc<str>>, call: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            call: Arc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> EvalResult<Value> {
        (self.call)(args)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name)
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

/// A matchable, evaluable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Char(char),
    Str(Arc<str>),
    Seq(Sequence),
    Func(Func),
    Effect(Effect),
    Component(Arc<Component>),
}

impl Value {
    pub fn str(text: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(text.as_ref()))
    }

    pub fn seq(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Seq(items.into_iter().collect())
    }

    /// Short name of the variant, used in type errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Func(_) => "function",
            Value::Effect(_) => "effect",
            Value::Component(_) => "component",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&Sequence> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// The items a nested match runs over.
    ///
    /// Sequences are used as-is; strings are viewed as sequences of
    /// characters so text grammars can run over message payloads.
    pub fn nested_items(&self) -> Option<Sequence> {
        match self {
            Value::Seq(items) => Some(items.clone()),
            Value::Str(text) => Some(text.chars().map(Value::Char).collect()),
            _ => None,
        }
    }

    /// Debug rendering: strings quoted, sequences bracketed.
    pub fn repr(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Char(c) => format!("{:?}", c),
            Value::Str(text) => format!("{:?}", text),
            Value::Seq(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Func(func) => format!("<fn {}>", func.name()),
            Value::Effect(effect) => format!("<effect {}>", effect.name()),
            Value::Component(component) => format!("<component {}>", component.name()),
        }
    }

    /// Convert plain JSON data into a value.
    ///
    /// Only null, booleans, integers, strings and arrays have a counterpart.
    pub fn from_json(json: &serde_json::Value) -> EvalResult<Self> {
        match json {
            serde_json::Value::Null => Ok(Value::Nil),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => n.as_i64().map(Value::Int).ok_or_else(|| {
                EvalError::Type {
                    op: "from_json".to_string(),
                    expected: "integer",
                    got: n.to_string(),
                }
            }),
            serde_json::Value::String(s) => Ok(Value::str(s)),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::from),
            serde_json::Value::Object(_) => Err(EvalError::Type {
                op: "from_json".to_string(),
                expected: "null, bool, integer, string or array",
                got: json.to_string(),
            }),
        }
    }

    pub fn to_json(&self) -> EvalResult<serde_json::Value> {
        match self {
            Value::Nil => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Value::Int(n) => Ok(serde_json::Value::from(*n)),
            Value::Char(c) => Ok(serde_json::Value::String(c.to_string())),
            Value::Str(text) => Ok(serde_json::Value::String(text.to_string())),
            Value::Seq(items) => items
                .iter()
                .map(Value::to_json)
                .collect::<EvalResult<Vec<_>>>()
                .map(serde_json::Value::Array),
            other => Err(EvalError::type_mismatch("to_json", "plain data", other)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Char(c) => write!(f, "{}", c),
            Value::Str(text) => write!(f, "{}", text),
            other => write!(f, "{}", other.repr()),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::str(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Str(Arc::from(text))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(Arc::from(items))
    }
}

impl From<Func> for Value {
    fn from(func: Func) -> Self {
        Value::Func(func)
    }
}

impl From<Component> for Value {
    fn from(component: Component) -> Self {
        Value::Component(Arc::new(component))
    }
}

/// Cut `text` to at most `width` characters, marking the cut.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width).collect();
        format!("{} ...", head)
    } else {
        text.to_string()
    }
}

/// Build a message from a tag and positional payload fields.
///
/// ```
/// use rlmeta_engine::{message, Value};
///
/// let msg = message("Part", [Value::from(3), Value::from("chunk")]);
/// assert_eq!(msg.repr(), r#"["Part", 3, "chunk"]"#);
/// ```
pub fn message(tag: &str, fields: impl IntoIterator<Item = Value>) -> Value {
    Value::seq(std::iter::once(Value::str(tag)).chain(fields))
}
