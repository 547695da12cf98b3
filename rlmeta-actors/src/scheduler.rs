//! Round-based, single-threaded scheduler.
//!
//! Every round offers each pending message to the live components in
//! order. The first component whose main rule matches consumes the message
//! and its action is evaluated immediately; unmatched messages carry over
//! to the next round. A round that consumes nothing ends the simulation.

use crate::config::{SchedulerConfig, StuckPolicy};
use crate::error::{Result, SchedulerError};
use crate::output::Output;
use crate::report::{FailureEntry, StuckReport};
use rlmeta_engine::{message, truncate, Component, EvalResult, Host, Runtime, Value};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Why a simulation ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// No messages were left.
    Drained,
    /// A round consumed nothing under [`StuckPolicy::Lenient`].
    Stuck,
    /// A component called `exit`.
    Exited,
}

/// Result of a finished simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Messages nobody consumed, in queue order.
    pub leftover: Vec<Value>,
    /// Rounds run. The broker has no rounds and counts claimed messages.
    pub rounds: usize,
    pub reason: Completion,
}

/// `["Args", arg...]`, the message a simulation starts from when the caller
/// supplies none.
pub fn args_message<I, S>(args: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    message("Args", args.into_iter().map(Value::str))
}

/// In-process scheduler over a fixed starting set of components.
#[derive(Debug, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
    components: Vec<Arc<Component>>,
    runtime: Runtime,
    output: Output,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            components: Vec::new(),
            runtime: Runtime::new(),
            output: Output::stdout(),
        }
    }

    pub fn with_component(mut self, component: impl Into<Arc<Component>>) -> Self {
        self.spawn(component);
        self
    }

    /// Make `value` visible to every action under `name`.
    pub fn with_global(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.runtime = self.runtime.with_global(name, value);
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn spawn(&mut self, component: impl Into<Arc<Component>>) {
        self.components.push(component.into());
    }

    pub fn components(&self) -> &[Arc<Component>] {
        &self.components
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run until the queue drains, a component exits, or a round is stuck.
    ///
    /// With no messages, the simulation starts from `["Args"]`.
    pub fn run(&self, messages: Vec<Value>) -> Result<Outcome> {
        self.run_with_args(messages, std::iter::empty::<&str>())
    }

    /// Like [`Scheduler::run`], seeding `["Args", args...]` when `messages`
    /// is empty.
    pub fn run_with_args<I, S>(&self, messages: Vec<Value>, args: I) -> Result<Outcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pending = if messages.is_empty() {
            vec![args_message(args)]
        } else {
            messages
        };
        let mut live = self.components.clone();
        let width = self.config.trace_width;
        let mut round = 0;

        info!(
            components = live.len(),
            messages = pending.len(),
            "starting simulation"
        );

        while !pending.is_empty() {
            self.trace_round(round, &live, &pending);

            let mut next_round = Vec::new();
            let mut failures = Vec::new();
            let mut processed = false;
            let mut queue = pending.into_iter();

            while let Some(message) = queue.next() {
                let mut consumed = false;
                let mut exited = false;

                let snapshot = live.clone();
                for component in &snapshot {
                    match component.accept(&message) {
                        Ok(action) => {
                            let runtime = self.runtime.for_component(component.clone());
                            let mut host = RoundHost {
                                current: component,
                                live: &mut live,
                                next_round: &mut next_round,
                                output: &self.output,
                                exited: false,
                            };
                            action.eval(&runtime, &mut host).map_err(|source| {
                                SchedulerError::Eval {
                                    component: component.label(width),
                                    source,
                                }
                            })?;
                            exited = host.exited;
                            consumed = true;
                            break;
                        }
                        Err(failure) => {
                            trace!(
                                round,
                                component = %component.name(),
                                %failure,
                                "no match"
                            );
                            failures.push(FailureEntry {
                                component: component.label(width),
                                failure,
                            });
                        }
                    }
                }

                if exited {
                    next_round.extend(queue);
                    info!(rounds = round + 1, leftover = next_round.len(), "simulation exited");
                    return Ok(Outcome {
                        leftover: next_round,
                        rounds: round + 1,
                        reason: Completion::Exited,
                    });
                }

                if consumed {
                    processed = true;
                } else {
                    next_round.push(message);
                }
            }

            round += 1;

            if !processed {
                let report = StuckReport::new(failures, width);
                match self.config.policy {
                    StuckPolicy::Fail => return Err(SchedulerError::Stuck { round, report }),
                    StuckPolicy::Lenient => {
                        warn!(
                            round,
                            leftover = next_round.len(),
                            "no message processed, stopping"
                        );
                        return Ok(Outcome {
                            leftover: next_round,
                            rounds: round,
                            reason: Completion::Stuck,
                        });
                    }
                }
            }

            pending = next_round;
        }

        info!(rounds = round, "simulation done");
        Ok(Outcome {
            leftover: Vec::new(),
            rounds: round,
            reason: Completion::Drained,
        })
    }

    fn trace_round(&self, round: usize, live: &[Arc<Component>], pending: &[Value]) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        let width = self.config.trace_width;
        debug!("round {}", round);
        for component in live {
            debug!("  component {}", component.label(width));
        }
        for (index, message) in pending.iter().enumerate() {
            debug!("  message {:2} = {}", index, truncate(&message.repr(), width));
        }
    }
}

/// Effects of one evaluation, applied straight to the round's state.
struct RoundHost<'a> {
    current: &'a Arc<Component>,
    live: &'a mut Vec<Arc<Component>>,
    next_round: &'a mut Vec<Value>,
    output: &'a Output,
    exited: bool,
}

impl Host for RoundHost<'_> {
    fn put(&mut self, message: Value) -> EvalResult<()> {
        self.next_round.push(message);
        Ok(())
    }

    fn spawn(&mut self, component: Arc<Component>) -> EvalResult<()> {
        debug!(component = %component.name(), "spawned");
        self.live.push(component);
        Ok(())
    }

    fn kill(&mut self) -> EvalResult<()> {
        debug!(component = %self.current.name(), "killed");
        let current = self.current;
        self.live.retain(|component| !Arc::ptr_eq(component, current));
        Ok(())
    }

    fn exit(&mut self) -> EvalResult<()> {
        self.exited = true;
        Ok(())
    }

    fn write(&mut self, text: &str) -> EvalResult<()> {
        Ok(self.output.write_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlmeta_engine::{Expr, Grammar, GrammarBuilder};

    fn tagged(tag: &str) -> Value {
        message(tag, [])
    }

    /// main = "Ping" end -> put(["Pong"])
    fn ping() -> Arc<Grammar> {
        let mut g = GrammarBuilder::new("Pinger");
        let tag = g.eq("Ping");
        let end = g.end();
        let reply = g.action(Expr::call(
            "put",
            [Expr::list([Expr::lit("Pong").item()])],
        ));
        let body = g.seq([tag, end, reply]);
        g.define("main", body);
        Arc::new(g.build("main").unwrap())
    }

    /// main = tag end -> effect()
    fn on(name: &str, tag: &str, effect: Expr) -> Arc<Grammar> {
        let mut g = GrammarBuilder::new(name);
        let tag = g.eq(tag);
        let end = g.end();
        let action = g.action(effect);
        let body = g.seq([tag, end, action]);
        g.define("main", body);
        Arc::new(g.build("main").unwrap())
    }

    fn scheduler(policy: StuckPolicy) -> Scheduler {
        let (output, _) = Output::capture();
        Scheduler::new(SchedulerConfig::new().with_policy(policy)).with_output(output)
    }

    #[test]
    fn unmatched_messages_keep_their_order() {
        let scheduler = scheduler(StuckPolicy::Lenient).with_component(Component::new(ping()));
        let outcome = scheduler
            .run(vec![tagged("Ping"), tagged("Other")])
            .unwrap();
        assert_eq!(outcome.reason, Completion::Stuck);
        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.leftover, vec![tagged("Pong"), tagged("Other")]);
    }

    #[test]
    fn stuck_round_reports_every_attempt() {
        let scheduler = scheduler(StuckPolicy::Fail).with_component(Component::new(ping()));
        let err = scheduler
            .run(vec![tagged("Ping"), tagged("Other")])
            .unwrap_err();
        match err {
            SchedulerError::Stuck { round, report } => {
                assert_eq!(round, 2);
                assert_eq!(report.entries().len(), 2);
                assert!(report.to_string().ends_with("No message processed."));
            }
            other => panic!("expected stuck, got {other}"),
        }
    }

    #[test]
    fn first_matching_component_wins() {
        let (output, captured) = Output::capture();
        let scheduler = Scheduler::default()
            .with_output(output)
            .with_component(Component::new(on(
                "First",
                "Go",
                Expr::call("write", [Expr::lit("first")]),
            )))
            .with_component(Component::new(on(
                "Second",
                "Go",
                Expr::call("write", [Expr::lit("second")]),
            )));
        let outcome = scheduler.run(vec![tagged("Go"), tagged("Go")]).unwrap();
        assert_eq!(outcome.reason, Completion::Drained);
        assert_eq!(outcome.rounds, 1);
        assert_eq!(captured.contents(), "firstfirst");
    }

    #[test]
    fn killed_component_stops_receiving() {
        let (output, captured) = Output::capture();
        let once = Expr::then(
            Expr::call("write", [Expr::lit("once")]),
            Expr::call("kill", []),
        );
        let scheduler = Scheduler::new(SchedulerConfig::new().lenient(true))
            .with_output(output)
            .with_component(Component::new(on("Once", "Go", once)));
        let outcome = scheduler.run(vec![tagged("Go"), tagged("Go")]).unwrap();
        assert_eq!(captured.contents(), "once");
        assert_eq!(outcome.leftover, vec![tagged("Go")]);
    }

    #[test]
    fn spawned_component_joins_from_next_message() {
        let echo = on("Echo", "Hello", Expr::call("write", [Expr::lit("hi")]));
        let spawn = Expr::call("spawn", [Expr::lit(Component::new(echo))]);
        let (output, captured) = Output::capture();
        let scheduler = Scheduler::default()
            .with_output(output)
            .with_component(Component::new(on("Spawner", "Start", spawn)));
        let outcome = scheduler
            .run(vec![tagged("Start"), tagged("Hello")])
            .unwrap();
        assert_eq!(outcome.reason, Completion::Drained);
        assert_eq!(captured.contents(), "hi");
    }

    #[test]
    fn exit_returns_unconsumed_messages() {
        let stop = Expr::then(
            Expr::call("put", [Expr::lit(tagged("Later"))]),
            Expr::call("exit", []),
        );
        let scheduler = scheduler(StuckPolicy::Fail)
            .with_component(Component::new(on("Stopper", "Stop", stop)));
        let outcome = scheduler
            .run(vec![tagged("Stop"), tagged("Rest")])
            .unwrap();
        assert_eq!(outcome.reason, Completion::Exited);
        assert_eq!(outcome.leftover, vec![tagged("Later"), tagged("Rest")]);
    }

    #[test]
    fn empty_queue_starts_from_args() {
        let mut g = GrammarBuilder::new("Cli");
        let tag = g.eq("Args");
        let any = g.any();
        let arg = g.bind("arg", any);
        let write = g.action(Expr::call("write", [Expr::lookup("arg")]));
        let body = g.seq([tag, arg, write]);
        g.define("main", body);

        let (output, captured) = Output::capture();
        let scheduler = Scheduler::default()
            .with_output(output)
            .with_component(Component::new(Arc::new(g.build("main").unwrap())));
        scheduler.run_with_args(Vec::new(), ["input.txt"]).unwrap();
        assert_eq!(captured.contents(), "input.txt");
    }

    #[test]
    fn eval_errors_abort_the_simulation() {
        let broken = Expr::call("undefined_function", []);
        let scheduler = scheduler(StuckPolicy::Fail)
            .with_component(Component::new(on("Broken", "Go", broken)));
        let err = scheduler.run(vec![tagged("Go")]).unwrap_err();
        assert!(matches!(err, SchedulerError::Eval { .. }));
    }
}
