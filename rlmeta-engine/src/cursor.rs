//! Positional view over the sequence being matched.

use crate::action::Action;
use crate::error::{MatchFailure, MatchResult};
use crate::scope::Scope;
use crate::value::{Sequence, Value};

/// Backtrack point taken by [`Cursor::checkpoint`].
#[derive(Debug, Clone)]
pub struct Checkpoint {
    position: usize,
    scope: Scope,
}

impl Checkpoint {
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Cursor over a sequence with backtrackable position.
///
/// The cursor also carries the furthest failure seen so far (for
/// diagnostics only) and the scope that bindings currently go into.
#[derive(Debug, Clone)]
pub struct Cursor {
    items: Sequence,
    position: usize,
    furthest: Option<MatchFailure>,
    scope: Scope,
}

impl Cursor {
    pub fn new(items: impl Into<Sequence>) -> Self {
        Self {
            items: items.into(),
            position: 0,
            furthest: None,
            scope: Scope::new(),
        }
    }

    pub fn items(&self) -> &Sequence {
        &self.items
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.items.len()
    }

    /// Item under the cursor. Never yields anything past the end.
    pub fn peek(&self) -> Option<&Value> {
        self.items.get(self.position)
    }

    /// Snapshot the position for a later [`Cursor::restore`].
    pub fn save(&self) -> usize {
        self.position
    }

    pub fn restore(&mut self, position: usize) {
        debug_assert!(position <= self.items.len());
        self.position = position;
    }

    /// Snapshot the position together with the current bindings.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            position: self.position,
            scope: self.scope.capture(),
        }
    }

    /// Return to `checkpoint`, dropping any binding made since.
    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.restore(checkpoint.position);
        self.scope = checkpoint.scope;
    }

    pub fn advance(&mut self) {
        debug_assert!(self.position < self.items.len());
        self.position += 1;
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    pub fn furthest_failure(&self) -> Option<&MatchFailure> {
        self.furthest.as_ref()
    }

    /// Record a failure at the current position and return the one to raise.
    ///
    /// The returned failure is the furthest one recorded on this cursor; a new
    /// failure replaces the record when its position is at least as far.
    pub fn fail(&mut self, description: impl Into<String>) -> MatchFailure {
        match &self.furthest {
            Some(furthest) if furthest.position > self.position => furthest.clone(),
            _ => {
                let failure = MatchFailure::new(description, self.items.clone(), self.position);
                self.furthest = Some(failure.clone());
                failure
            }
        }
    }

    /// Consume one item if `predicate` accepts it.
    pub fn element<F>(&mut self, description: &str, predicate: F) -> MatchResult<Action>
    where
        F: FnOnce(&Value) -> bool,
    {
        match self.peek() {
            Some(item) if predicate(item) => {
                let action = Action::item(item.clone());
                self.position += 1;
                Ok(action)
            }
            _ => Err(self.fail(format!("expected {}", description))),
        }
    }

    /// Run `matcher` with a fresh, empty scope and restore the parent after.
    pub fn with_scope<F>(&mut self, matcher: F) -> MatchResult<Action>
    where
        F: FnOnce(&mut Cursor) -> MatchResult<Action>,
    {
        let parent = std::mem::take(&mut self.scope);
        let result = matcher(self);
        self.scope = parent;
        result
    }

    /// Run `matcher` over `nested` from position 0, then step past the
    /// nested item in the outer sequence on success.
    ///
    /// On failure the outer position is left where it was.
    pub fn descend<F>(&mut self, nested: Sequence, matcher: F) -> MatchResult<Action>
    where
        F: FnOnce(&mut Cursor) -> MatchResult<Action>,
    {
        let outer_items = std::mem::replace(&mut self.items, nested);
        let outer_position = std::mem::replace(&mut self.position, 0);
        let result = matcher(self);
        self.items = outer_items;
        self.position = match result {
            Ok(_) => outer_position + 1,
            Err(_) => outer_position,
        };
        result
    }
}

impl From<Vec<Value>> for Cursor {
    fn from(items: Vec<Value>) -> Self {
        Cursor::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(items: &[i64]) -> Cursor {
        Cursor::new(items.iter().map(|n| Value::Int(*n)).collect::<Vec<_>>())
    }

    #[test]
    fn element_advances_on_success_only() {
        let mut c = cursor(&[1, 2]);
        assert!(c.element("1", |v| *v == Value::Int(1)).is_ok());
        assert_eq!(c.position(), 1);
        assert!(c.element("1", |v| *v == Value::Int(1)).is_err());
        assert_eq!(c.position(), 1);
    }

    #[test]
    fn predicate_never_sees_past_the_end() {
        let mut c = cursor(&[]);
        let mut called = false;
        let result = c.element("any", |_| {
            called = true;
            true
        });
        assert!(result.is_err());
        assert!(!called);
    }

    #[test]
    fn furthest_failure_keeps_the_deepest_position() {
        let mut c = cursor(&[1, 2, 3]);
        c.restore(2);
        let deep = c.fail("deep");
        assert_eq!(deep.position, 2);

        c.restore(0);
        let raised = c.fail("shallow");
        assert_eq!(raised.description, "deep");
        assert_eq!(c.furthest_failure().map(|f| f.position), Some(2));

        c.restore(2);
        let same = c.fail("same place");
        assert_eq!(same.description, "same place");
    }

    #[test]
    fn rewind_drops_later_bindings() {
        let mut c = cursor(&[1, 2]);
        c.scope_mut().bind("kept".into(), Action::neutral());
        let mark = c.checkpoint();
        c.advance();
        c.scope_mut().bind("dropped".into(), Action::neutral());

        c.rewind(mark);
        assert_eq!(c.position(), 0);
        assert!(c.scope().contains("kept"));
        assert!(!c.scope().contains("dropped"));
    }

    #[test]
    fn with_scope_restores_parent_bindings() {
        let mut c = cursor(&[1]);
        c.scope_mut().bind("outer".into(), Action::neutral());
        let _ = c.with_scope(|inner| {
            assert!(inner.scope().is_empty());
            inner.scope_mut().bind("inner".into(), Action::neutral());
            Ok(Action::neutral())
        });
        assert!(c.scope().contains("outer"));
        assert!(!c.scope().contains("inner"));
    }
}
