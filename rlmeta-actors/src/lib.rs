//! rlmeta-actors - message schedulers for rlmeta components
//!
//! A component is a grammar plus fixed state (see [`rlmeta_engine::Component`]).
//! Components communicate only through messages: an action emits a message
//! with `put`, and some component whose main rule matches it consumes it
//! later. This crate provides two ways to drive that exchange.
//!
//! # Schedulers
//!
//! ```text
//!  Scheduler (in-process)              Broker (tokio tasks)
//!  ┌──────────────────────┐            ┌────────────────────────┐
//!  │ round N:             │            │ message table          │
//!  │  msg → C1? C2? C3?   │            │  id → message          │
//!  │  first match wins    │            └──────▲─────────▲───────┘
//!  │  unmatched → N + 1   │       get ids / pop│         │get ids / pop
//!  └──────────────────────┘            ┌──────┴──┐  ┌───┴──────┐
//!                                      │ worker  │  │ worker   │ ...
//!                                      │  (C1)   │  │  (C2)    │
//!                                      └─────────┘  └──────────┘
//! ```
//!
//! - [`Scheduler`] runs rounds on the calling thread. Message order and the
//!   component order decide who consumes what, so runs are deterministic.
//! - [`Broker`] runs one task per component. Workers race for messages and
//!   the broker's `pop_message` decides each race, so every message is
//!   consumed at most once.
//!
//! Both stop when no messages are left, when a component calls `exit`, or
//! when nothing more can be consumed. The last case is an error carrying a
//! [`StuckReport`] unless the configuration is [`StuckPolicy::Lenient`].
//!
//! # Example
//!
//! ```
//! use rlmeta_actors::{Completion, Output, Scheduler, SchedulerConfig};
//! use rlmeta_engine::{message, Component, Expr, GrammarBuilder};
//! use std::sync::Arc;
//!
//! // main = "Ping" -> put(["Pong"])
//! let mut g = GrammarBuilder::new("Pinger");
//! let tag = g.eq("Ping");
//! let reply = g.action(Expr::call("put", [Expr::list([Expr::lit("Pong").item()])]));
//! let body = g.seq([tag, reply]);
//! g.define("main", body);
//! let pinger = Component::new(Arc::new(g.build("main").unwrap()));
//!
//! let (output, _) = Output::capture();
//! let outcome = Scheduler::new(SchedulerConfig::new().lenient(true))
//!     .with_output(output)
//!     .with_component(pinger)
//!     .run(vec![message("Ping", [])])
//!     .unwrap();
//!
//! assert_eq!(outcome.reason, Completion::Stuck);
//! assert_eq!(outcome.leftover, vec![message("Pong", [])]);
//! ```

pub mod broker;
pub mod config;
pub mod error;
pub mod output;
pub mod report;
pub mod scheduler;
pub mod types;

pub use broker::{Broker, BrokerClient};
pub use config::{SchedulerConfig, StuckPolicy};
pub use error::{Result, SchedulerError};
pub use output::{Captured, Output};
pub use report::{FailureEntry, StuckReport};
pub use scheduler::{args_message, Completion, Outcome, Scheduler};
pub use types::{MessageId, WorkerId};
