//! # rlmeta-engine
//!
//! A backtracking matcher over sequences of values, with semantic actions
//! whose evaluation is deferred until a match has fully succeeded.
//!
//! - [`GrammarBuilder`] assembles matcher trees and named rules into a
//!   [`Grammar`]. Rules may call each other by name, or be selected at
//!   match time from a name found in the input.
//! - Matching a [`Grammar`] over a [`Cursor`] yields an [`Action`]. Nothing
//!   is computed until [`Action::eval`] runs it against a [`Runtime`].
//! - Effects (enqueueing messages, spawning components, writing output) go
//!   through a [`Host`], so evaluation stays independent of any scheduler.
//!
//! ## Example
//!
//! ```
//! use rlmeta_engine::{CollectingHost, Expr, GrammarBuilder, Runtime, Value};
//!
//! // main = "x" any:n -> ["got", n]
//! let mut g = GrammarBuilder::new("Example");
//! let x = g.eq("x");
//! let any = g.any();
//! let n = g.bind("n", any);
//! let result = g.action(Expr::list([
//!     Expr::lit("got").item(),
//!     Expr::lookup("n").item(),
//! ]));
//! let body = g.seq([x, n, result]);
//! g.define("main", body);
//! let grammar = g.build("main").unwrap();
//!
//! let action = grammar.match_main(vec![Value::from("x"), Value::from(7)]).unwrap();
//! let value = action.eval(&Runtime::new(), &mut CollectingHost::new()).unwrap();
//! assert_eq!(value.repr(), r#"["got", 7]"#);
//! ```

pub mod action;
pub mod builtins;
pub mod component;
pub mod cursor;
pub mod error;
pub mod grammar;
pub mod host;
pub mod matcher;
pub mod runtime;
pub mod scope;
pub mod value;

#[cfg(test)]
mod tests;

pub use action::{Action, Expr, Splice};
pub use component::Component;
pub use cursor::{Checkpoint, Cursor};
pub use error::{EvalError, EvalResult, GrammarError, MatchFailure, MatchResult};
pub use grammar::{Grammar, GrammarBuilder, MatcherId, Predicate, RuleId};
pub use host::{read_source, CollectingHost, Effect, Host};
pub use runtime::Runtime;
pub use scope::Scope;
pub use value::{message, truncate, Func, Sequence, Value};
