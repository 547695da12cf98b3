use crate::action::Action;
use std::collections::HashMap;
use std::sync::Arc;

/// Name to deferred-action bindings made during one matching attempt.
///
/// Bindings are copy-on-write: [`Scope::capture`] hands out a snapshot in
/// O(1), and a later [`Scope::bind`] copies the table instead of changing
/// what was captured.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: Arc<HashMap<Arc<str>, Action>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any earlier binding in this scope only.
    pub fn bind(&mut self, name: Arc<str>, action: Action) {
        Arc::make_mut(&mut self.bindings).insert(name, action);
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Snapshot of the current bindings.
    pub fn capture(&self) -> Scope {
        self.clone()
    }
}
