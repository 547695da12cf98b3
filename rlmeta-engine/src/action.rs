//! Deferred semantic actions.
//!
//! Matching only records *what* to compute. An [`Action`] is evaluated after
//! the whole match has succeeded, so work done by alternatives that were
//! later backtracked over never runs.

use crate::error::{EvalError, EvalResult};
use crate::host::Host;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::value::Value;
use std::sync::Arc;

/// Expression language for semantic actions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Value),
    /// A matched binding, a runtime variable or a builtin, in that order.
    Lookup(Arc<str>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    List(Vec<Splice>),
    /// Evaluate `value`, bind it to `name` in the runtime, then evaluate `body`.
    Let {
        name: Arc<str>,
        value: Box<Expr>,
        body: Box<Expr>,
    },
}

/// One element of an [`Expr::List`].
///
/// `depth` 0 adds the value as one element. Depth `n` flattens `n` levels
/// of nesting into the surrounding list.
#[derive(Debug, Clone, PartialEq)]
pub struct Splice {
    pub depth: usize,
    pub expr: Expr,
}

impl Expr {
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Lit(value.into())
    }

    pub fn lookup(name: &str) -> Self {
        Expr::Lookup(Arc::from(name))
    }

    pub fn call(callee: &str, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Call {
            callee: Box::new(Expr::lookup(callee)),
            args: args.into_iter().collect(),
        }
    }

    pub fn list(items: impl IntoIterator<Item = Splice>) -> Self {
        Expr::List(items.into_iter().collect())
    }

    pub fn let_in(name: &str, value: Expr, body: Expr) -> Self {
        Expr::Let {
            name: Arc::from(name),
            value: Box::new(value),
            body: Box::new(body),
        }
    }

    /// Evaluate `first` for its effects, then `second`.
    pub fn then(first: Expr, second: Expr) -> Self {
        Expr::let_in("_", first, second)
    }

    /// Use as a single list element.
    pub fn item(self) -> Splice {
        self.splice(0)
    }

    pub fn splice(self, depth: usize) -> Splice {
        Splice { depth, expr: self }
    }
}

#[derive(Debug, Clone)]
enum Kind {
    Neutral,
    Item(Value),
    Collect(Arc<[Action]>),
    Compute { scope: Scope, expr: Arc<Expr> },
}

/// A deferred computation produced by a successful match.
#[derive(Debug, Clone)]
pub struct Action {
    kind: Kind,
}

impl Action {
    /// Evaluates to nil.
    pub fn neutral() -> Self {
        Self {
            kind: Kind::Neutral,
        }
    }

    /// Evaluates to a matched item.
    pub fn item(value: Value) -> Self {
        Self {
            kind: Kind::Item(value),
        }
    }

    /// Evaluates each action in order and yields the list of results.
    pub fn collect(actions: Vec<Action>) -> Self {
        Self {
            kind: Kind::Collect(actions.into()),
        }
    }

    /// Evaluates `expr` with the bindings captured in `scope`.
    pub fn compute(scope: Scope, expr: Arc<Expr>) -> Self {
        Self {
            kind: Kind::Compute { scope, expr },
        }
    }

    pub fn eval(&self, runtime: &Runtime, host: &mut dyn Host) -> EvalResult<Value> {
        match &self.kind {
            Kind::Neutral => Ok(Value::Nil),
            Kind::Item(value) => Ok(value.clone()),
            Kind::Collect(actions) => actions
                .iter()
                .map(|action| action.eval(runtime, &mut *host))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::from),
            Kind::Compute { scope, expr } => Evaluator { scope, host }.eval(expr, runtime),
        }
    }
}

struct Evaluator<'a> {
    scope: &'a Scope,
    host: &'a mut dyn Host,
}

impl Evaluator<'_> {
    fn eval(&mut self, expr: &Expr, runtime: &Runtime) -> EvalResult<Value> {
        match expr {
            Expr::Lit(value) => Ok(value.clone()),
            Expr::Lookup(name) => match self.scope.get(name) {
                Some(action) => action.eval(runtime, self.host),
                None => runtime.lookup(name),
            },
            Expr::Call { callee, args } => {
                let callee = self.eval(callee, runtime)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, runtime))
                    .collect::<EvalResult<Vec<_>>>()?;
                runtime.apply(&callee, &args, self.host)
            }
            Expr::List(items) => {
                let mut out = Vec::new();
                for item in items {
                    let value = self.eval(&item.expr, runtime)?;
                    splice_into(&mut out, item.depth, value)?;
                }
                Ok(Value::from(out))
            }
            Expr::Let { name, value, body } => {
                let value = self.eval(value, runtime)?;
                let inner = runtime.bind(name.clone(), value);
                self.eval(body, &inner)
            }
        }
    }
}

pub(crate) fn splice_into(out: &mut Vec<Value>, depth: usize, value: Value) -> EvalResult<()> {
    if depth == 0 {
        out.push(value);
        return Ok(());
    }
    match value.nested_items() {
        Some(items) => {
            for item in items.iter() {
                splice_into(out, depth - 1, item.clone())?;
            }
            Ok(())
        }
        None => Err(EvalError::type_mismatch("splice", "sequence", &value)),
    }
}
