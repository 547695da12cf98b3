//! The backtracking interpreter for matcher trees.
//!
//! Every combinator either succeeds with a deferred [`Action`] or fails with
//! a [`MatchFailure`](crate::MatchFailure). Every backtrack point restores
//! both the cursor position and the bindings made since; no input is ever
//! modified.

use crate::action::Action;
use crate::cursor::Cursor;
use crate::error::MatchResult;
use crate::grammar::{Grammar, MatcherId, Node, RuleId};
use crate::value::{Sequence, Value};

impl Grammar {
    /// Run matcher `id` at the cursor's current position.
    pub fn run(&self, id: MatcherId, cursor: &mut Cursor) -> MatchResult<Action> {
        match self.node(id) {
            Node::Element {
                predicate,
                description,
            } => cursor.element(description, |item| predicate.accepts(item)),

            Node::Sequence(parts) => {
                let mut last = Action::neutral();
                for part in parts {
                    last = self.run(*part, cursor)?;
                }
                Ok(last)
            }

            Node::Choice(alternatives) => {
                let start = cursor.checkpoint();
                for alternative in alternatives {
                    match self.run(*alternative, cursor) {
                        Ok(action) => return Ok(action),
                        Err(_) => cursor.rewind(start.clone()),
                    }
                }
                Err(cursor.fail("no alternative matched"))
            }

            Node::Star(inner) => self.repeat(*inner, cursor, Vec::new()),

            Node::Plus(inner) => {
                let first = self.run(*inner, cursor)?;
                self.repeat(*inner, cursor, vec![first])
            }

            Node::Not(inner) => {
                let start = cursor.checkpoint();
                let result = self.run(*inner, cursor);
                cursor.rewind(start);
                match result {
                    Ok(_) => Err(cursor.fail("negative lookahead matched")),
                    Err(_) => Ok(Action::neutral()),
                }
            }

            Node::Descend(inner) => match cursor.peek().and_then(Value::nested_items) {
                Some(nested) => cursor.descend(nested, |cursor| self.run(*inner, cursor)),
                None => Err(cursor.fail("no nested sequence found")),
            },

            Node::Dispatch => {
                let rule = cursor
                    .peek()
                    .map(|item| (item.as_str().and_then(|name| self.rule_id(name)), item.repr()));
                match rule {
                    Some((Some(rule), _)) => {
                        cursor.advance();
                        self.run(self.rule_body(rule), cursor)
                    }
                    Some((None, name)) => {
                        tracing::trace!(grammar = %self.name(), rule = %name, "unknown rule");
                        Err(cursor.fail(format!("unknown rule {}", name)))
                    }
                    None => Err(cursor.fail("expected rule name")),
                }
            }

            Node::Call(rule) => self.run(self.rule_body(*rule), cursor),

            Node::Scoped(inner) => cursor.with_scope(|cursor| self.run(*inner, cursor)),

            Node::Bind { name, matcher } => {
                let action = self.run(*matcher, cursor)?;
                cursor.scope_mut().bind(name.clone(), action.clone());
                Ok(action)
            }

            Node::Action(expr) => Ok(Action::compute(cursor.scope().capture(), expr.clone())),
        }
    }

    fn repeat(
        &self,
        inner: MatcherId,
        cursor: &mut Cursor,
        mut actions: Vec<Action>,
    ) -> MatchResult<Action> {
        loop {
            let start = cursor.checkpoint();
            match self.run(inner, cursor) {
                Ok(action) => {
                    debug_assert_ne!(
                        start.position(),
                        cursor.position(),
                        "repetition body matched without consuming input"
                    );
                    actions.push(action);
                }
                Err(_) => {
                    cursor.rewind(start);
                    return Ok(Action::collect(actions));
                }
            }
        }
    }

    /// Run rule `rule` from the start of `items`.
    ///
    /// The rule does not have to consume every item; grammars that need that
    /// end their rule with [`GrammarBuilder::end`](crate::GrammarBuilder::end).
    pub fn match_rule(&self, rule: RuleId, items: impl Into<Sequence>) -> MatchResult<Action> {
        let mut cursor = Cursor::new(items);
        self.run(self.rule_body(rule), &mut cursor)
    }

    /// Run the main rule from the start of `items`.
    pub fn match_main(&self, items: impl Into<Sequence>) -> MatchResult<Action> {
        self.match_rule(self.main(), items)
    }

    /// Run the main rule over a value.
    ///
    /// Sequences and strings are matched item by item; any other value is
    /// matched as a one-item sequence.
    pub fn match_value(&self, value: &Value) -> MatchResult<Action> {
        let items = value
            .nested_items()
            .unwrap_or_else(|| Sequence::from(vec![value.clone()]));
        self.match_main(items)
    }
}
