use super::protocol::BrokerClient;
use crate::error::{Result, SchedulerError};
use crate::output::Output;
use crate::types::WorkerId;
use rlmeta_engine::{Component, EvalResult, Host, Runtime, Value};
use std::sync::Arc;
use tracing::{debug, trace};

enum Deferred {
    Put(Value),
    Spawn(Arc<Component>),
    Exit,
}

/// Host for one evaluation inside a worker.
///
/// Evaluation is synchronous and runs on the blocking pool (`read` and
/// `write` do std I/O), so effects that need the broker are queued and sent
/// in order once it returns.
struct WorkerHost {
    output: Output,
    deferred: Vec<Deferred>,
    killed: bool,
}

impl Host for WorkerHost {
    fn put(&mut self, message: Value) -> EvalResult<()> {
        self.deferred.push(Deferred::Put(message));
        Ok(())
    }

    fn spawn(&mut self, component: Arc<Component>) -> EvalResult<()> {
        self.deferred.push(Deferred::Spawn(component));
        Ok(())
    }

    fn kill(&mut self) -> EvalResult<()> {
        self.killed = true;
        Ok(())
    }

    fn exit(&mut self) -> EvalResult<()> {
        self.deferred.push(Deferred::Exit);
        Ok(())
    }

    fn write(&mut self, text: &str) -> EvalResult<()> {
        Ok(self.output.write_str(text)?)
    }
}

pub(crate) struct Worker {
    pub(crate) id: WorkerId,
    pub(crate) component: Arc<Component>,
    pub(crate) client: BrokerClient,
    pub(crate) runtime: Runtime,
    pub(crate) output: Output,
    pub(crate) trace_width: usize,
}

impl Worker {
    /// Poll the broker until the component is killed or the simulation ends.
    pub(crate) async fn run(self) -> (WorkerId, Result<()>) {
        let id = self.id;
        (id, self.poll_loop().await)
    }

    async fn poll_loop(self) -> Result<()> {
        let Worker {
            id,
            component,
            client,
            runtime,
            output,
            trace_width,
        } = self;
        let runtime = runtime.for_component(component.clone());
        debug!(worker = %id, component = %component.label(trace_width), "worker started");

        loop {
            for message_id in client.get_message_ids().await? {
                let Some(message) = client.get_message(message_id).await? else {
                    continue;
                };

                let action = match component.accept(&message) {
                    Ok(action) => action,
                    Err(failure) => {
                        trace!(worker = %id, message = %message_id, %failure, "no match");
                        continue;
                    }
                };

                if !client.pop_message(message_id).await? {
                    debug!(worker = %id, message = %message_id, "claim lost");
                    continue;
                }

                let mut host = WorkerHost {
                    output: output.clone(),
                    deferred: Vec::new(),
                    killed: false,
                };
                let eval_runtime = runtime.clone();
                let (result, host) = tokio::task::spawn_blocking(move || {
                    let result = action.eval(&eval_runtime, &mut host);
                    (result, host)
                })
                .await
                .map_err(|err| SchedulerError::Worker(err.to_string()))?;
                result.map_err(|source| SchedulerError::Eval {
                    component: component.label(trace_width),
                    source,
                })?;

                let WorkerHost {
                    deferred, killed, ..
                } = host;
                for effect in deferred {
                    match effect {
                        Deferred::Put(message) => client.put(message).await?,
                        Deferred::Spawn(component) => client.spawn(component).await?,
                        Deferred::Exit => {
                            debug!(worker = %id, "exit requested");
                            return client.exit().await;
                        }
                    }
                }

                if killed {
                    debug!(worker = %id, "killed");
                    return Ok(());
                }
            }

            tokio::task::yield_now().await;
        }
    }
}
