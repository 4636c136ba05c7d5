//! Contracts consumed from the overlay routing layer, and an in-process
//! overlay used for tests and single-process deployments
//!
//! The overlay owns transport, peer discovery, and ring stabilization. The
//! chat core only routes messages toward identifiers and reacts to
//! deliveries and neighbor changes through the traits defined here.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::id::NodeId;
use crate::msg::ChatMessage;

/// Handle to a node known to the overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeHandle {
    pub id: NodeId,
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.id.short())
    }
}

/// Any error that may occur when routing a message through the overlay
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("No node in the overlay is responsible for {0}")]
    NoRoute(NodeId),
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Routing contract consumed from the overlay.
///
/// `route` delivers `msg` to whichever live node's identifier is currently
/// nearest `target`; the message's [priority](ChatMessage::priority) tells
/// the transport how to schedule it against ring-maintenance traffic.
#[async_trait]
pub trait Overlay: Send + Sync {
    /// Route `msg` toward `target`, or straight to `direct` when a handle to
    /// the recipient is already known
    async fn route(
        &self,
        target: NodeId,
        msg: ChatMessage,
        direct: Option<NodeHandle>,
    ) -> Result<(), RouteError>;
}

/// Callbacks the overlay invokes on the application layer
#[async_trait]
pub trait Application: Send + Sync {
    /// Called when a message routed to an identifier this node is responsible
    /// for arrives
    async fn deliver(&self, msg: ChatMessage);

    /// Called when a neighboring node joins (`joined`) or leaves the ring
    fn neighbor_update(&self, node: NodeHandle, joined: bool);
}

/// A single-process overlay: every registered application lives in this
/// process and routing resolves to the registered identifier nearest the
/// target.
///
/// Deliveries run on their own task so that routing never re-enters the
/// sender's critical section.
pub struct LocalRing {
    nodes: DashMap<NodeId, Arc<dyn Application>>,
}

impl LocalRing {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            nodes: DashMap::new(),
        })
    }

    /// Add a node to the ring, notifying every existing member of the new
    /// neighbor
    pub fn join(&self, id: NodeId, app: Arc<dyn Application>) {
        for entry in self.nodes.iter() {
            entry.value().neighbor_update(NodeHandle { id }, true);
        }

        self.nodes.insert(id, app);
        log::info!("Node {} joined the ring", id.short());
    }

    /// Remove a node from the ring, notifying the remaining members
    pub fn leave(&self, id: NodeId) {
        if self.nodes.remove(&id).is_none() {
            return;
        }

        for entry in self.nodes.iter() {
            entry.value().neighbor_update(NodeHandle { id }, false);
        }
        log::info!("Node {} left the ring", id.short());
    }

    /// The registered node whose identifier is nearest `target`
    fn responsible_for(&self, target: NodeId) -> Option<Arc<dyn Application>> {
        self.nodes
            .iter()
            .min_by_key(|entry| entry.key().distance(&target))
            .map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl Overlay for LocalRing {
    async fn route(
        &self,
        target: NodeId,
        msg: ChatMessage,
        direct: Option<NodeHandle>,
    ) -> Result<(), RouteError> {
        let app = match direct {
            Some(handle) => self
                .nodes
                .get(&handle.id)
                .map(|entry| entry.value().clone())
                .ok_or(RouteError::NoRoute(handle.id))?,
            None => self
                .responsible_for(target)
                .ok_or(RouteError::NoRoute(target))?,
        };

        tokio::spawn(async move {
            app.deliver(msg).await;
        });

        Ok(())
    }
}
