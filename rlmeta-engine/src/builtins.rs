//! Functions every semantic action can call without the host providing them.

use crate::action::splice_into;
use crate::error::{EvalError, EvalResult};
use crate::host::Effect;
use crate::value::{Func, Value};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

static BUILTINS: Lazy<HashMap<&'static str, Value>> = Lazy::new(|| {
    let mut table = HashMap::new();
    let mut native = |name: &'static str, f: fn(&[Value]) -> EvalResult<Value>| {
        table.insert(name, Value::Func(Func::new(name, f)));
    };

    native("increment", increment);
    native("decrement", decrement);
    native("add", add);
    native("sub", sub);
    native("len", len);
    native("int", int);
    native("repr", repr);
    native("join", join);
    native("indent", indent);
    native("splice", splice);
    native("concat", concat);
    native("Counter", counter);

    for effect in [
        Effect::Put,
        Effect::Spawn,
        Effect::Kill,
        Effect::Exit,
        Effect::Write,
        Effect::Read,
    ] {
        table.insert(effect.name(), Value::Effect(effect));
    }
    table
});

pub(crate) fn lookup(name: &str) -> Option<Value> {
    BUILTINS.get(name).cloned()
}

/// Names of all builtins, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = BUILTINS.keys().copied().collect();
    names.sort_unstable();
    names
}

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> EvalResult<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{}..={}", min, max)
        };
        return Err(EvalError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn int_arg(op: &str, value: &Value) -> EvalResult<i64> {
    value
        .as_int()
        .ok_or_else(|| EvalError::type_mismatch(op, "int", value))
}

fn str_arg<'a>(op: &str, value: &'a Value) -> EvalResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| EvalError::type_mismatch(op, "string", value))
}

fn checked(op: &str, result: Option<i64>) -> EvalResult<Value> {
    result
        .map(Value::Int)
        .ok_or_else(|| EvalError::Overflow(op.to_string()))
}

fn increment(args: &[Value]) -> EvalResult<Value> {
    arity("increment", args, 1, 1)?;
    checked("increment", int_arg("increment", &args[0])?.checked_add(1))
}

fn decrement(args: &[Value]) -> EvalResult<Value> {
    arity("decrement", args, 1, 1)?;
    checked("decrement", int_arg("decrement", &args[0])?.checked_sub(1))
}

fn add(args: &[Value]) -> EvalResult<Value> {
    arity("add", args, 2, 2)?;
    let (a, b) = (int_arg("add", &args[0])?, int_arg("add", &args[1])?);
    checked("add", a.checked_add(b))
}

fn sub(args: &[Value]) -> EvalResult<Value> {
    arity("sub", args, 2, 2)?;
    let (a, b) = (int_arg("sub", &args[0])?, int_arg("sub", &args[1])?);
    checked("sub", a.checked_sub(b))
}

fn len(args: &[Value]) -> EvalResult<Value> {
    arity("len", args, 1, 1)?;
    match &args[0] {
        Value::Str(text) => Ok(Value::from(text.chars().count())),
        Value::Seq(items) => Ok(Value::from(items.len())),
        other => Err(EvalError::type_mismatch("len", "string or sequence", other)),
    }
}

fn int(args: &[Value]) -> EvalResult<Value> {
    arity("int", args, 1, 1)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(text) => text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| EvalError::type_mismatch("int", "integer literal", &args[0])),
        Value::Char(c) => c
            .to_digit(10)
            .map(|d| Value::Int(i64::from(d)))
            .ok_or_else(|| EvalError::type_mismatch("int", "digit", &args[0])),
        other => Err(EvalError::type_mismatch("int", "number or string", other)),
    }
}

fn repr(args: &[Value]) -> EvalResult<Value> {
    arity("repr", args, 1, 1)?;
    Ok(Value::str(args[0].repr()))
}

fn join_into(out: &mut String, item: &Value, delimiter: &str) {
    match item {
        Value::Seq(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(delimiter);
                }
                join_into(out, item, delimiter);
            }
        }
        other => out.push_str(&other.to_string()),
    }
}

fn join(args: &[Value]) -> EvalResult<Value> {
    arity("join", args, 1, 2)?;
    let delimiter = match args.get(1) {
        Some(delimiter) => str_arg("join", delimiter)?,
        None => "",
    };
    let items = args[0]
        .as_seq()
        .ok_or_else(|| EvalError::type_mismatch("join", "sequence", &args[0]))?;

    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(delimiter);
        }
        join_into(&mut out, item, delimiter);
    }
    Ok(Value::from(out))
}

fn indent(args: &[Value]) -> EvalResult<Value> {
    arity("indent", args, 1, 2)?;
    let text = str_arg("indent", &args[0])?;
    let prefix = match args.get(1) {
        Some(prefix) => str_arg("indent", prefix)?,
        None => "    ",
    };
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        out.push_str(prefix);
        out.push_str(line);
    }
    Ok(Value::from(out))
}

fn splice(args: &[Value]) -> EvalResult<Value> {
    arity("splice", args, 2, 2)?;
    let depth = int_arg("splice", &args[0])?;
    let depth = usize::try_from(depth)
        .map_err(|_| EvalError::type_mismatch("splice", "non-negative depth", &args[0]))?;
    let mut out = Vec::new();
    splice_into(&mut out, depth, args[1].clone())?;
    Ok(Value::from(out))
}

fn concat(args: &[Value]) -> EvalResult<Value> {
    arity("concat", args, 1, 1)?;
    let lists = args[0]
        .as_seq()
        .ok_or_else(|| EvalError::type_mismatch("concat", "sequence", &args[0]))?;
    let mut out = Vec::new();
    for list in lists.iter() {
        splice_into(&mut out, 1, list.clone())?;
    }
    Ok(Value::from(out))
}

fn counter(args: &[Value]) -> EvalResult<Value> {
    arity("Counter", args, 0, 0)?;
    let next = AtomicI64::new(0);
    Ok(Value::Func(Func::new("counter", move |args: &[Value]| {
        arity("counter", args, 0, 0)?;
        Ok(Value::Int(next.fetch_add(1, Ordering::SeqCst)))
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> EvalResult<Value> {
        match lookup(name) {
            Some(Value::Func(func)) => func.call(args),
            other => panic!("{} is not a function: {:?}", name, other),
        }
    }

    #[test]
    fn join_flattens_nested_lists() {
        let items = Value::seq([
            Value::str("a"),
            Value::seq([Value::str("b"), Value::from(1)]),
        ]);
        assert_eq!(call("join", &[items.clone()]).unwrap(), Value::str("ab1"));
        assert_eq!(
            call("join", &[items, Value::str(",")]).unwrap(),
            Value::str("a,b,1")
        );
    }

    #[test]
    fn indent_prefixes_every_line() {
        let out = call("indent", &[Value::str("a\nb\n")]).unwrap();
        assert_eq!(out, Value::str("    a\n    b\n"));
        let out = call("indent", &[Value::str("x"), Value::str("> ")]).unwrap();
        assert_eq!(out, Value::str("> x"));
    }

    #[test]
    fn splice_and_concat() {
        let nested = Value::seq([Value::seq([Value::from(1)]), Value::seq([Value::from(2)])]);
        assert_eq!(
            call("splice", &[Value::from(0), nested.clone()]).unwrap(),
            Value::seq([nested.clone()])
        );
        assert_eq!(
            call("splice", &[Value::from(2), nested.clone()]).unwrap(),
            Value::seq([Value::from(1), Value::from(2)])
        );
        assert_eq!(
            call("concat", &[nested]).unwrap(),
            Value::seq([Value::from(1), Value::from(2)])
        );
    }

    #[test]
    fn counters_are_independent() {
        let a = call("Counter", &[]).unwrap();
        let b = call("Counter", &[]).unwrap();
        let (Value::Func(a), Value::Func(b)) = (a, b) else {
            panic!("Counter returns functions");
        };
        assert_eq!(a.call(&[]).unwrap(), Value::from(0));
        assert_eq!(a.call(&[]).unwrap(), Value::from(1));
        assert_eq!(b.call(&[]).unwrap(), Value::from(0));
    }

    #[test]
    fn arithmetic_checks_types() {
        assert_eq!(call("increment", &[Value::from(4)]).unwrap(), Value::from(5));
        assert_eq!(call("sub", &[Value::from(4), Value::from(6)]).unwrap(), Value::from(-2));
        assert!(matches!(
            call("increment", &[Value::str("4")]),
            Err(EvalError::Type { .. })
        ));
        assert_eq!(call("int", &[Value::str(" 42 ")]).unwrap(), Value::from(42));
    }

    #[test]
    fn arithmetic_overflow_is_an_error() {
        assert!(matches!(
            call("increment", &[Value::from(i64::MAX)]),
            Err(EvalError::Overflow(op)) if op == "increment"
        ));
        assert!(matches!(
            call("decrement", &[Value::from(i64::MIN)]),
            Err(EvalError::Overflow(_))
        ));
        assert!(matches!(
            call("add", &[Value::from(i64::MAX), Value::from(1)]),
            Err(EvalError::Overflow(_))
        ));
        assert!(matches!(
            call("sub", &[Value::from(i64::MIN), Value::from(1)]),
            Err(EvalError::Overflow(_))
        ));
        assert_eq!(
            call("add", &[Value::from(i64::MAX - 1), Value::from(1)]).unwrap(),
            Value::from(i64::MAX)
        );
    }

    #[test]
    fn effects_are_listed() {
        let names = names();
        for name in ["put", "spawn", "kill", "exit", "write", "read"] {
            assert!(names.contains(&name), "missing {}", name);
        }
    }
}
