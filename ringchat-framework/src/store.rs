//! The replicated channel store contract and the record type persisted in it
//!
//! The store is an external collaborator: a replicated key-value service with
//! asynchronous lookup and insert where overwrites are always permitted, so
//! last-writer-wins is the consistency model. Values are opaque bytes to the
//! store; typed access lives in [crate::channels].

use std::collections::BTreeSet;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// A channel membership record, the value stored in the channel store under
/// the channel's derived identifier.
///
/// Conceptually owned by whichever node is currently nearest `id` on the
/// ring, but any node may fetch and overwrite it; the store is the durability
/// owner. Records are created lazily on first join and never deleted, an
/// empty channel is inert rather than erased.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Identifier the record is stored under, always `NodeId::derive(name)`
    pub id: NodeId,
    /// Human-readable channel name
    pub name: String,
    members: BTreeSet<String>,
}

impl ChannelRecord {
    /// Create an empty record for the channel addressed at `id`
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            members: BTreeSet::new(),
        }
    }

    /// Current members, deduplicated and free of empty names
    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// Add a member; joining twice is a no-op and empty names are rejected
    pub fn add_member(&mut self, name: &str) {
        if name.is_empty() {
            log::warn!("Refusing to add empty member name to channel '{}'", self.name);
            return;
        }

        self.members.insert(name.to_owned());
    }

    /// Remove a member; removing an absent member is a no-op
    pub fn remove_member(&mut self, name: &str) {
        self.members.remove(name);
    }
}

/// Any error reported by a channel store operation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Lookup of key {0} failed: {1}")]
    Lookup(NodeId, String),
    #[error("Insert under key {0} failed: {1}")]
    Insert(NodeId, String),
    #[error("Failed to encode a channel record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Contract consumed from the external replicated key-value store.
///
/// Both operations are asynchronous; protocol steps that follow them run as
/// continuations, never as blocking waits on the overlay's delivery thread.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Fetch the value stored at `key`, if any
    async fn lookup(&self, key: NodeId) -> Result<Option<Bytes>, StoreError>;

    /// Store `value` under `key`, overwriting any previous value.
    ///
    /// Returns one success flag per replica that was asked to hold the value;
    /// callers log partial success but do not act on it.
    async fn insert(&self, key: NodeId, value: Bytes) -> Result<Vec<bool>, StoreError>;
}

/// In-memory channel store.
///
/// Channel membership does not need to survive a process restart, so a
/// map-backed store is the reference implementation; replicated deployments
/// supply their own [ChannelStore].
#[derive(Debug)]
pub struct MemoryStore {
    values: DashMap<NodeId, Bytes>,
    /// Number of acks reported per insert, standing in for a replica set
    replicas: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
            replicas: 1,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelStore for MemoryStore {
    async fn lookup(&self, key: NodeId) -> Result<Option<Bytes>, StoreError> {
        Ok(self.values.get(&key).map(|v| v.clone()))
    }

    async fn insert(&self, key: NodeId, value: Bytes) -> Result<Vec<bool>, StoreError> {
        self.values.insert(key, value);
        Ok(vec![true; self.replicas])
    }
}
