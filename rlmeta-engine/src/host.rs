//! Effects a semantic action can ask its host to perform.
//!
//! Evaluation itself never touches a message queue or the set of live
//! components. It calls into a [`Host`], which the scheduler (or a worker)
//! implements over the state it owns.

use crate::component::Component;
use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use std::io::Read;
use std::sync::Arc;

/// Builtin operations with side effects outside the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Put,
    Spawn,
    Kill,
    Exit,
    Write,
    Read,
}

impl Effect {
    pub fn name(self) -> &'static str {
        match self {
            Effect::Put => "put",
            Effect::Spawn => "spawn",
            Effect::Kill => "kill",
            Effect::Exit => "exit",
            Effect::Write => "write",
            Effect::Read => "read",
        }
    }

    fn arity(self) -> usize {
        match self {
            Effect::Kill | Effect::Exit => 0,
            Effect::Put | Effect::Spawn | Effect::Write | Effect::Read => 1,
        }
    }

    pub(crate) fn perform(self, args: &[Value], host: &mut dyn Host) -> EvalResult<Value> {
        if args.len() != self.arity() {
            return Err(EvalError::Arity {
                name: self.name().to_string(),
                expected: self.arity().to_string(),
                got: args.len(),
            });
        }

        match self {
            Effect::Put => host.put(args[0].clone())?,
            Effect::Spawn => match &args[0] {
                Value::Component(component) => host.spawn(component.clone())?,
                other => return Err(EvalError::type_mismatch("spawn", "component", other)),
            },
            Effect::Kill => host.kill()?,
            Effect::Exit => host.exit()?,
            Effect::Write => host.write(&args[0].to_string())?,
            Effect::Read => {
                return match &args[0] {
                    Value::Str(path) => Ok(Value::str(host.read(path)?)),
                    other => Err(EvalError::type_mismatch("read", "string", other)),
                }
            }
        }
        Ok(Value::Nil)
    }
}

/// The owner of queues, components and I/O during one evaluation.
pub trait Host {
    /// Enqueue a message for later delivery.
    fn put(&mut self, message: Value) -> EvalResult<()>;

    /// Add a component to the live set.
    fn spawn(&mut self, component: Arc<Component>) -> EvalResult<()>;

    /// Remove the component whose action is being evaluated.
    fn kill(&mut self) -> EvalResult<()>;

    /// End the whole simulation once the current evaluation returns.
    fn exit(&mut self) -> EvalResult<()>;

    fn write(&mut self, text: &str) -> EvalResult<()>;

    fn read(&mut self, path: &str) -> EvalResult<String> {
        read_source(path)
    }
}

/// Read a file, with `-` meaning standard input.
pub fn read_source(path: &str) -> EvalResult<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// A host that records every effect instead of acting on it.
#[derive(Debug, Default)]
pub struct CollectingHost {
    pub messages: Vec<Value>,
    pub spawned: Vec<Arc<Component>>,
    pub output: String,
    pub killed: bool,
    pub exited: bool,
}

impl CollectingHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Host for CollectingHost {
    fn put(&mut self, message: Value) -> EvalResult<()> {
        self.messages.push(message);
        Ok(())
    }

    fn spawn(&mut self, component: Arc<Component>) -> EvalResult<()> {
        self.spawned.push(component);
        Ok(())
    }

    fn kill(&mut self) -> EvalResult<()> {
        self.killed = true;
        Ok(())
    }

    fn exit(&mut self) -> EvalResult<()> {
        self.exited = true;
        Ok(())
    }

    fn write(&mut self, text: &str) -> EvalResult<()> {
        self.output.push_str(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_check_arity() {
        let mut host = CollectingHost::new();
        let result = Effect::Put.perform(&[], &mut host);
        assert!(matches!(result, Err(EvalError::Arity { got: 0, .. })));
    }

    #[test]
    fn spawn_requires_component() {
        let mut host = CollectingHost::new();
        let result = Effect::Spawn.perform(&[Value::from(1)], &mut host);
        assert!(matches!(result, Err(EvalError::Type { .. })));
        assert!(host.spawned.is_empty());
    }

    #[test]
    fn write_renders_display_text() {
        let mut host = CollectingHost::new();
        Effect::Write
            .perform(&[Value::str("abc")], &mut host)
            .unwrap();
        Effect::Write.perform(&[Value::from(7)], &mut host).unwrap();
        assert_eq!(host.output, "abc7");
    }

    #[test]
    fn read_goes_through_host() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "abc").unwrap();

        let mut host = CollectingHost::new();
        let text = Effect::Read
            .perform(&[Value::str(path.to_string_lossy())], &mut host)
            .unwrap();
        assert_eq!(text, Value::str("abc"));
    }
}
