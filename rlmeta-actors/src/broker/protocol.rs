//! Requests a worker sends to the broker.

use crate::error::{Result, SchedulerError};
use crate::types::{MessageId, WorkerId};
use rlmeta_engine::{Component, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// One broker request. Every request except `Exit` carries its reply channel.
#[derive(Debug)]
pub(crate) enum Request {
    GetMessageIds {
        worker: Option<WorkerId>,
        reply: oneshot::Sender<Vec<MessageId>>,
    },
    GetMessage {
        id: MessageId,
        reply: oneshot::Sender<Option<Value>>,
    },
    PopMessage {
        id: MessageId,
        worker: Option<WorkerId>,
        reply: oneshot::Sender<bool>,
    },
    Spawn {
        component: Arc<Component>,
        reply: oneshot::Sender<()>,
    },
    Put {
        message: Value,
        reply: oneshot::Sender<()>,
    },
    Exit,
}

/// Handle for talking to a running [`Broker`](super::Broker).
///
/// Every call is one request/response round trip. Calls fail with
/// [`SchedulerError::Disconnected`] once the broker has stopped.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    worker: Option<WorkerId>,
    tx: mpsc::Sender<Request>,
}

impl BrokerClient {
    pub(crate) fn new(worker: Option<WorkerId>, tx: mpsc::Sender<Request>) -> Self {
        Self { worker, tx }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| SchedulerError::Disconnected)?;
        response.await.map_err(|_| SchedulerError::Disconnected)
    }

    /// Ids of all messages currently in the table, oldest first.
    pub async fn get_message_ids(&self) -> Result<Vec<MessageId>> {
        let worker = self.worker;
        self.request(|reply| Request::GetMessageIds { worker, reply })
            .await
    }

    /// The message for `id`, or `None` if it has been claimed.
    pub async fn get_message(&self, id: MessageId) -> Result<Option<Value>> {
        self.request(|reply| Request::GetMessage { id, reply }).await
    }

    /// Remove `id` from the table. Exactly one caller per id gets `true`.
    pub async fn pop_message(&self, id: MessageId) -> Result<bool> {
        let worker = self.worker;
        self.request(|reply| Request::PopMessage { id, worker, reply })
            .await
    }

    pub async fn spawn(&self, component: Arc<Component>) -> Result<()> {
        self.request(|reply| Request::Spawn { component, reply })
            .await
    }

    pub async fn put(&self, message: Value) -> Result<()> {
        self.request(|reply| Request::Put { message, reply }).await
    }

    /// Ask the broker to end the simulation. There is no reply.
    pub async fn exit(&self) -> Result<()> {
        self.tx
            .send(Request::Exit)
            .await
            .map_err(|_| SchedulerError::Disconnected)
    }
}
