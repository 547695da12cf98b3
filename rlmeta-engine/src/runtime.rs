//! Name resolution for semantic actions.

use crate::builtins;
use crate::component::Component;
use crate::error::{EvalError, EvalResult};
use crate::host::Host;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
struct Frame {
    name: Arc<str>,
    value: Value,
    parent: Option<Arc<Frame>>,
}

/// Layered variable environment.
///
/// Lookup order is: names bound with [`Runtime::bind`] (innermost first),
/// host-supplied globals, the state fields of the component being run, and
/// finally the builtin table. Binding never changes an existing runtime.
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    frames: Option<Arc<Frame>>,
    globals: Arc<HashMap<Arc<str>, Value>>,
    component: Option<Arc<Component>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host-supplied global. Globals shadow component state and builtins.
    pub fn with_global(mut self, name: &str, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.globals).insert(Arc::from(name), value.into());
        self
    }

    /// The same globals, resolving state fields against `component`.
    pub fn for_component(&self, component: Arc<Component>) -> Self {
        Self {
            frames: None,
            globals: self.globals.clone(),
            component: Some(component),
        }
    }

    pub fn component(&self) -> Option<&Arc<Component>> {
        self.component.as_ref()
    }

    /// A new runtime with `name` bound to `value`.
    pub fn bind(&self, name: Arc<str>, value: Value) -> Self {
        Self {
            frames: Some(Arc::new(Frame {
                name,
                value,
                parent: self.frames.clone(),
            })),
            globals: self.globals.clone(),
            component: self.component.clone(),
        }
    }

    pub fn lookup(&self, name: &str) -> EvalResult<Value> {
        let mut frame = self.frames.as_deref();
        while let Some(current) = frame {
            if &*current.name == name {
                return Ok(current.value.clone());
            }
            frame = current.parent.as_deref();
        }

        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }

        if let Some(value) = self.component.as_ref().and_then(|c| c.state(name)) {
            return Ok(value.clone());
        }

        builtins::lookup(name).ok_or_else(|| EvalError::Unbound(name.to_string()))
    }

    /// Call a function or effect value.
    pub fn apply(&self, callee: &Value, args: &[Value], host: &mut dyn Host) -> EvalResult<Value> {
        match callee {
            Value::Func(func) => func.call(args),
            Value::Effect(effect) => effect.perform(args, host),
            other => Err(EvalError::NotCallable(other.repr())),
        }
    }
}
