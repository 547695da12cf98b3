use crate::action::Action;
use crate::error::{EvalError, MatchResult};
use crate::grammar::Grammar;
use crate::value::{truncate, Func, Value};
use std::fmt;
use std::sync::Arc;

/// A grammar paired with the state fields its actions can read.
///
/// Components are compared by identity: two components built from the same
/// grammar and state are still different participants in a simulation.
pub struct Component {
    name: Arc<str>,
    state: Vec<(Arc<str>, Value)>,
    grammar: Arc<Grammar>,
}

impl Component {
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self {
            name: Arc::from(grammar.name()),
            state: Vec::new(),
            grammar,
        }
    }

    pub fn with_state(mut self, field: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.state.iter_mut().find(|(name, _)| &**name == field) {
            Some(slot) => slot.1 = value,
            None => self.state.push((Arc::from(field), value)),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    pub fn state(&self, field: &str) -> Option<&Value> {
        self.state
            .iter()
            .find(|(name, _)| &**name == field)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.state.iter().map(|(name, value)| (&**name, value))
    }

    /// Match a message against the main rule.
    pub fn accept(&self, message: &Value) -> MatchResult<Action> {
        self.grammar.match_value(message)
    }

    /// `Name {field: value, ...}`, cut to `width` characters.
    pub fn label(&self, width: usize) -> String {
        let fields: Vec<String> = self
            .state
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value.repr()))
            .collect();
        truncate(&format!("{} {{{}}}", self.name, fields.join(", ")), width)
    }

    /// A function building components from `grammar`, one state field per
    /// positional argument.
    pub fn constructor(grammar: Arc<Grammar>, fields: &[&str]) -> Func {
        let name = grammar.name().to_string();
        let fields: Vec<Arc<str>> = fields.iter().map(|f| Arc::from(*f)).collect();
        Func::new(name.clone(), move |args: &[Value]| {
            if args.len() != fields.len() {
                return Err(EvalError::Arity {
                    name: name.clone(),
                    expected: fields.len().to_string(),
                    got: args.len(),
                });
            }
            let state = fields.iter().cloned().zip(args.iter().cloned()).collect();
            Ok(Value::Component(Arc::new(Component {
                name: Arc::from(grammar.name()),
                state,
                grammar: grammar.clone(),
            })))
        })
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("fields", &self.state.len())
            .finish()
    }
}
