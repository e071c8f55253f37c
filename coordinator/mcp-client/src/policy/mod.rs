/// Agent policies: the opaque decision procedure behind every turn
///
/// A policy receives the session history and the new query and yields the
/// events of the turn as a stream. Routing, parameter extraction and tool
/// sequencing all happen behind this interface.

pub mod coordinator;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::event::QueryEvent;
use crate::session::SessionKey;

pub use coordinator::CoordinatorPolicy;

/// A boxed stream of events, produced by one policy invocation.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<QueryEvent>> + Send + 'static>>;

/// Read-only view of the session handed to a policy
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub key: SessionKey,
    pub history: Vec<QueryEvent>,
    pub state: Map<String, Value>,
}

#[async_trait]
pub trait AgentPolicy: Send + Sync {
    /// Starts a turn. The returned stream ends once the turn is complete.
    async fn invoke(&self, session: SessionSnapshot, query: QueryEvent) -> Result<EventStream>;
}
