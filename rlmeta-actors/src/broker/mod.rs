//! Brokered scheduler: one task per component, racing over a shared table.
//!
//! The broker task owns the message table and serves requests from every
//! worker one at a time, so `pop_message` is the single point where a
//! message changes hands. A worker evaluates an action only after winning
//! that pop, which gives at-most-once consumption however many workers
//! match the same message.
//!
//! The broker stops when a worker asks it to `exit`, when no worker or
//! client is left, or when every live worker has made a full pass over an
//! unchanged table. In the last case the leftover messages are treated
//! like a stuck round of the in-process scheduler.

mod protocol;
mod worker;

pub use protocol::BrokerClient;

use crate::config::{SchedulerConfig, StuckPolicy};
use crate::error::{Result, SchedulerError};
use crate::output::Output;
use crate::report::{FailureEntry, StuckReport};
use crate::scheduler::{Completion, Outcome};
use crate::types::{MessageId, WorkerId};
use futures_util::stream::{self, BoxStream, SelectAll, StreamExt};
use protocol::Request;
use rlmeta_engine::{Component, Runtime, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};
use worker::Worker;

const CHANNEL_CAPACITY: usize = 16;

/// Last table generation a worker asked for ids at, and how many times in
/// a row it did so without the table changing.
#[derive(Debug, Clone, Copy)]
struct Poll {
    generation: u64,
    repeats: u32,
}

enum Event {
    Request(Option<Request>),
    Joined(Option<std::result::Result<(WorkerId, Result<()>), JoinError>>),
}

/// Owner of the message table for a brokered simulation.
pub struct Broker {
    config: SchedulerConfig,
    messages: HashMap<MessageId, Value>,
    order: Vec<MessageId>,
    channels: SelectAll<BoxStream<'static, Request>>,
    workers: JoinSet<(WorkerId, Result<()>)>,
    live: BTreeMap<WorkerId, Arc<Component>>,
    polls: HashMap<WorkerId, Poll>,
    starting: Vec<Arc<Component>>,
    generation: u64,
    next_worker: u64,
    claims: usize,
    runtime: Runtime,
    output: Output,
}

impl Broker {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            messages: HashMap::new(),
            order: Vec::new(),
            channels: SelectAll::new(),
            workers: JoinSet::new(),
            live: BTreeMap::new(),
            polls: HashMap::new(),
            starting: Vec::new(),
            generation: 0,
            next_worker: 0,
            claims: 0,
            runtime: Runtime::new(),
            output: Output::stdout(),
        }
    }

    pub fn with_global(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.runtime = self.runtime.with_global(name, value);
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn with_component(mut self, component: impl Into<Arc<Component>>) -> Self {
        self.spawn(component);
        self
    }

    /// Start a worker for `component` once the broker runs.
    pub fn spawn(&mut self, component: impl Into<Arc<Component>>) {
        self.starting.push(component.into());
    }

    /// Add a message to the table.
    pub fn put(&mut self, message: Value) -> MessageId {
        let id = MessageId::new();
        self.messages.insert(id, message);
        self.order.push(id);
        self.generation += 1;
        id
    }

    /// Open a channel to the broker that is not tied to any worker.
    ///
    /// The broker keeps running while any client is alive.
    pub fn connect(&mut self) -> BrokerClient {
        self.open_channel(None)
    }

    fn open_channel(&mut self, worker: Option<WorkerId>) -> BrokerClient {
        let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.channels
            .push(stream::poll_fn(move |cx| rx.poll_recv(cx)).boxed());
        BrokerClient::new(worker, tx)
    }

    fn start_worker(&mut self, component: Arc<Component>) {
        let id = WorkerId(self.next_worker);
        self.next_worker += 1;
        let client = self.open_channel(Some(id));
        debug!(worker = %id, component = %component.name(), "starting worker");
        self.live.insert(id, component.clone());
        self.generation += 1;

        let worker = Worker {
            id,
            component,
            client,
            runtime: self.runtime.clone(),
            output: self.output.clone(),
            trace_width: self.config.trace_width,
        };
        self.workers.spawn(worker.run());
    }

    /// Serve requests until the simulation ends.
    pub async fn run(mut self) -> Result<Outcome> {
        info!(
            components = self.starting.len(),
            messages = self.order.len(),
            "starting brokered simulation"
        );
        for component in std::mem::take(&mut self.starting) {
            self.start_worker(component);
        }

        let reason = loop {
            let event = tokio::select! {
                request = self.channels.next(), if !self.channels.is_empty() => Event::Request(request),
                joined = self.workers.join_next(), if !self.workers.is_empty() => Event::Joined(joined),
                else => break self.settle(),
            };

            match event {
                Event::Request(Some(Request::Exit)) => {
                    info!(claims = self.claims, "simulation exited");
                    break Completion::Exited;
                }
                Event::Request(Some(request)) => {
                    if let Some(reason) = self.serve(request) {
                        break reason;
                    }
                }
                Event::Request(None) | Event::Joined(None) => {}
                Event::Joined(Some(Ok((id, Ok(()))))) => {
                    debug!(worker = %id, "worker finished");
                    self.live.remove(&id);
                    self.polls.remove(&id);
                }
                Event::Joined(Some(Ok((id, Err(err))))) => {
                    warn!(worker = %id, error = %err, "worker failed");
                    self.shutdown().await;
                    return Err(err);
                }
                Event::Joined(Some(Err(err))) => {
                    self.shutdown().await;
                    return Err(SchedulerError::Worker(err.to_string()));
                }
            }
        };

        self.shutdown().await;
        self.finish(reason)
    }

    /// Handle one request. Returns a completion when the table has gone
    /// quiet.
    fn serve(&mut self, request: Request) -> Option<Completion> {
        match request {
            Request::GetMessageIds { worker, reply } => {
                let _ = reply.send(self.order.clone());
                if let Some(worker) = worker {
                    self.record_poll(worker);
                    if self.is_quiescent() {
                        return Some(self.settle());
                    }
                }
            }
            Request::GetMessage { id, reply } => {
                let _ = reply.send(self.messages.get(&id).cloned());
            }
            Request::PopMessage { id, worker, reply } => {
                let claimed = self.messages.remove(&id).is_some();
                if claimed {
                    self.order.retain(|other| *other != id);
                    self.generation += 1;
                    self.claims += 1;
                    match worker {
                        Some(worker) => debug!(%worker, message = %id, "claimed"),
                        None => debug!(message = %id, "claimed by client"),
                    }
                }
                let _ = reply.send(claimed);
            }
            Request::Spawn { component, reply } => {
                self.start_worker(component);
                let _ = reply.send(());
            }
            Request::Put { message, reply } => {
                self.put(message);
                let _ = reply.send(());
            }
            Request::Exit => {}
        }
        None
    }

    fn record_poll(&mut self, worker: WorkerId) {
        let generation = self.generation;
        let poll = self.polls.entry(worker).or_insert(Poll {
            generation,
            repeats: 0,
        });
        if poll.generation == generation {
            poll.repeats += 1;
        } else {
            *poll = Poll {
                generation,
                repeats: 1,
            };
        }
    }

    /// Every live worker has asked for ids twice with no table change in
    /// between, so none of them can consume anything that is left.
    fn is_quiescent(&self) -> bool {
        !self.live.is_empty()
            && self.live.keys().all(|worker| {
                matches!(
                    self.polls.get(worker),
                    Some(poll) if poll.generation == self.generation && poll.repeats > 1
                )
            })
    }

    fn settle(&self) -> Completion {
        if self.order.is_empty() {
            info!(claims = self.claims, "simulation done");
            Completion::Drained
        } else {
            Completion::Stuck
        }
    }

    async fn shutdown(&mut self) {
        self.channels = SelectAll::new();
        self.workers.shutdown().await;
    }

    fn finish(mut self, reason: Completion) -> Result<Outcome> {
        if reason == Completion::Stuck && self.config.policy == StuckPolicy::Fail {
            return Err(SchedulerError::Stuck {
                round: self.claims,
                report: self.stuck_report(),
            });
        }
        if reason == Completion::Stuck {
            warn!(leftover = self.order.len(), "no worker can make progress, stopping");
        }

        let leftover = std::mem::take(&mut self.order)
            .into_iter()
            .filter_map(|id| self.messages.remove(&id))
            .collect();
        Ok(Outcome {
            leftover,
            rounds: self.claims,
            reason,
        })
    }

    fn stuck_report(&self) -> StuckReport {
        let width = self.config.trace_width;
        let mut entries = Vec::new();
        for message in self.order.iter().filter_map(|id| self.messages.get(id)) {
            for component in self.live.values() {
                if let Err(failure) = component.accept(message) {
                    entries.push(FailureEntry {
                        component: component.label(width),
                        failure,
                    });
                }
            }
        }
        StuckReport::new(entries, width)
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("messages", &self.order.len())
            .field("workers", &self.live.len())
            .field("claims", &self.claims)
            .finish()
    }
}
