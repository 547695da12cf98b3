//! Matcher trees and the named-rule table.
//!
//! A [`Grammar`] is an arena of matcher nodes addressed by [`MatcherId`].
//! Rule calls refer to rules by [`RuleId`], so rules may be mutually
//! recursive without any shared ownership between nodes. Grammars are
//! assembled with a [`GrammarBuilder`] and are immutable afterwards.

use crate::action::Expr;
use crate::error::GrammarError;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Index of a matcher node inside its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatcherId(pub(crate) usize);

/// Interned rule name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub(crate) usize);

/// What an element test accepts.
#[derive(Clone)]
pub enum Predicate {
    Any,
    Eq(Value),
    Range(char, char),
    Custom(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
}

impl Predicate {
    pub fn accepts(&self, item: &Value) -> bool {
        match self {
            Predicate::Any => true,
            Predicate::Eq(expected) => expected == item,
            Predicate::Range(lo, hi) => match item {
                Value::Char(c) => lo <= c && c <= hi,
                _ => false,
            },
            Predicate::Custom(test) => test(item),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Any => write!(f, "Any"),
            Predicate::Eq(value) => write!(f, "Eq({})", value.repr()),
            Predicate::Range(lo, hi) => write!(f, "Range({:?}, {:?})", lo, hi),
            Predicate::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Element {
        predicate: Predicate,
        description: String,
    },
    Sequence(Vec<MatcherId>),
    Choice(Vec<MatcherId>),
    Star(MatcherId),
    Plus(MatcherId),
    Not(MatcherId),
    Descend(MatcherId),
    Dispatch,
    Call(RuleId),
    Scoped(MatcherId),
    Bind {
        name: Arc<str>,
        matcher: MatcherId,
    },
    Action(Arc<Expr>),
}

#[derive(Debug, Clone)]
pub(crate) struct Rule {
    pub(crate) name: Arc<str>,
    pub(crate) body: MatcherId,
}

/// A complete, validated set of rules.
#[derive(Debug)]
pub struct Grammar {
    name: Arc<str>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) rules: Vec<Rule>,
    by_name: HashMap<Arc<str>, RuleId>,
    main: RuleId,
}

impl Grammar {
    pub fn builder(name: impl Into<Arc<str>>) -> GrammarBuilder {
        GrammarBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn main(&self) -> RuleId {
        self.main
    }

    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.by_name.get(name).copied()
    }

    pub fn rule_name(&self, rule: RuleId) -> &str {
        &self.rules[rule.0].name
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| &*rule.name)
    }

    pub(crate) fn node(&self, id: MatcherId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn rule_body(&self, rule: RuleId) -> MatcherId {
        self.rules[rule.0].body
    }
}

/// Incremental construction of a [`Grammar`].
///
/// Combinator methods return the [`MatcherId`] of the node they add, so
/// trees are built bottom-up. Rule calls may name rules that are defined
/// later; [`GrammarBuilder::build`] checks that every called rule exists.
#[derive(Debug)]
pub struct GrammarBuilder {
    name: Arc<str>,
    nodes: Vec<Node>,
    names: Vec<Arc<str>>,
    by_name: HashMap<Arc<str>, RuleId>,
    bodies: Vec<Option<MatcherId>>,
    duplicates: Vec<String>,
}

impl GrammarBuilder {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            names: Vec::new(),
            by_name: HashMap::new(),
            bodies: Vec::new(),
            duplicates: Vec::new(),
        }
    }

    fn push(&mut self, node: Node) -> MatcherId {
        self.nodes.push(node);
        MatcherId(self.nodes.len() - 1)
    }

    fn intern(&mut self, name: &str) -> RuleId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let name: Arc<str> = Arc::from(name);
        let id = RuleId(self.names.len());
        self.names.push(name.clone());
        self.bodies.push(None);
        self.by_name.insert(name, id);
        id
    }

    fn element(&mut self, predicate: Predicate, description: String) -> MatcherId {
        self.push(Node::Element {
            predicate,
            description,
        })
    }

    /// Accept any single item.
    pub fn any(&mut self) -> MatcherId {
        self.element(Predicate::Any, "any item".to_string())
    }

    /// Accept an item equal to `value`.
    pub fn eq(&mut self, value: impl Into<Value>) -> MatcherId {
        let value = value.into();
        let description = value.repr();
        self.element(Predicate::Eq(value), description)
    }

    /// Accept a character in `lo..=hi`.
    pub fn range(&mut self, lo: char, hi: char) -> MatcherId {
        self.element(Predicate::Range(lo, hi), format!("{:?}-{:?}", lo, hi))
    }

    /// Accept an item satisfying an arbitrary predicate.
    pub fn test<F>(&mut self, description: impl Into<String>, predicate: F) -> MatcherId
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.element(Predicate::Custom(Arc::new(predicate)), description.into())
    }

    /// Match the characters of `text` one by one.
    pub fn text(&mut self, text: &str) -> MatcherId {
        let chars: Vec<MatcherId> = text.chars().map(|c| self.eq(c)).collect();
        self.seq(chars)
    }

    pub fn seq(&mut self, matchers: impl IntoIterator<Item = MatcherId>) -> MatcherId {
        let matchers = matchers.into_iter().collect();
        self.push(Node::Sequence(matchers))
    }

    pub fn choice(&mut self, matchers: impl IntoIterator<Item = MatcherId>) -> MatcherId {
        let matchers = matchers.into_iter().collect();
        self.push(Node::Choice(matchers))
    }

    pub fn star(&mut self, matcher: MatcherId) -> MatcherId {
        self.push(Node::Star(matcher))
    }

    pub fn not(&mut self, matcher: MatcherId) -> MatcherId {
        self.push(Node::Not(matcher))
    }

    /// One or more `matcher`.
    pub fn plus(&mut self, matcher: MatcherId) -> MatcherId {
        self.push(Node::Plus(matcher))
    }

    /// `matcher` or nothing.
    pub fn opt(&mut self, matcher: MatcherId) -> MatcherId {
        let empty = self.seq([]);
        self.choice([matcher, empty])
    }

    /// Succeeds only when no items remain.
    pub fn end(&mut self) -> MatcherId {
        let any = self.any();
        self.not(any)
    }

    pub fn descend(&mut self, matcher: MatcherId) -> MatcherId {
        self.push(Node::Descend(matcher))
    }

    /// Read a rule name from the input and run that rule.
    pub fn dispatch(&mut self) -> MatcherId {
        self.push(Node::Dispatch)
    }

    pub fn call(&mut self, rule: &str) -> MatcherId {
        let id = self.intern(rule);
        self.push(Node::Call(id))
    }

    pub fn scoped(&mut self, matcher: MatcherId) -> MatcherId {
        self.push(Node::Scoped(matcher))
    }

    pub fn bind(&mut self, name: &str, matcher: MatcherId) -> MatcherId {
        self.push(Node::Bind {
            name: Arc::from(name),
            matcher,
        })
    }

    pub fn action(&mut self, expr: Expr) -> MatcherId {
        self.push(Node::Action(Arc::new(expr)))
    }

    /// Define rule `name`. Its body runs in a fresh scope.
    pub fn define(&mut self, name: &str, body: MatcherId) -> RuleId {
        let id = self.intern(name);
        let body = self.scoped(body);
        if self.bodies[id.0].is_some() {
            self.duplicates.push(name.to_string());
        } else {
            self.bodies[id.0] = Some(body);
        }
        id
    }

    pub fn build(self, main: &str) -> Result<Grammar, GrammarError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(GrammarError::DuplicateRule(name));
        }

        let main_id = match self.by_name.get(main) {
            Some(id) if self.bodies[id.0].is_some() => *id,
            _ => return Err(GrammarError::MissingMain(main.to_string())),
        };

        let mut rules = Vec::with_capacity(self.names.len());
        for (name, body) in self.names.into_iter().zip(self.bodies) {
            match body {
                Some(body) => rules.push(Rule { name, body }),
                None => return Err(GrammarError::UndefinedRule(name.to_string())),
            }
        }

        Ok(Grammar {
            name: self.name,
            nodes: self.nodes,
            rules,
            by_name: self.by_name,
            main: main_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_references_resolve() {
        let mut g = GrammarBuilder::new("Forward");
        let call = g.call("later");
        g.define("main", call);
        let any = g.any();
        g.define("later", any);

        let grammar = g.build("main").unwrap();
        assert_eq!(grammar.rule_names().collect::<Vec<_>>(), ["main", "later"]);
        assert_eq!(grammar.rule_name(grammar.main()), "main");
    }

    #[test]
    fn undefined_rule_is_reported() {
        let mut g = GrammarBuilder::new("Broken");
        let call = g.call("missing");
        g.define("main", call);
        assert_eq!(
            g.build("main").unwrap_err(),
            GrammarError::UndefinedRule("missing".to_string())
        );
    }

    #[test]
    fn duplicate_rule_is_reported() {
        let mut g = GrammarBuilder::new("Twice");
        let a = g.any();
        g.define("main", a);
        let b = g.any();
        g.define("main", b);
        assert_eq!(
            g.build("main").unwrap_err(),
            GrammarError::DuplicateRule("main".to_string())
        );
    }

    #[test]
    fn missing_main_is_reported() {
        let mut g = GrammarBuilder::new("Headless");
        let a = g.any();
        g.define("other", a);
        assert_eq!(
            g.build("main").unwrap_err(),
            GrammarError::MissingMain("main".to_string())
        );
    }

    #[test]
    fn range_accepts_chars_only() {
        let p = Predicate::Range('a', 'c');
        assert!(p.accepts(&Value::Char('b')));
        assert!(!p.accepts(&Value::Char('d')));
        assert!(!p.accepts(&Value::str("b")));
    }
}
