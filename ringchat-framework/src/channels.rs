//! Typed access to the channel store: fetch-or-create, persist, and the
//! serialized fetch-mutate-persist cycle used by the membership protocol

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::id::NodeId;
use crate::store::{ChannelRecord, ChannelStore, StoreError};

/// Wrapper over the raw [ChannelStore] that reads and writes [ChannelRecord]
/// values keyed by the channel name's derived identifier
pub struct Channels {
    store: Arc<dyn ChannelStore>,
    /// One lock per channel identifier, held across a full
    /// fetch-mutate-persist cycle so concurrent membership updates for the
    /// same channel cannot overwrite each other's writes
    update_locks: DashMap<NodeId, Arc<Mutex<()>>>,
}

impl Channels {
    pub fn new(store: Arc<dyn ChannelStore>) -> Self {
        Self {
            store,
            update_locks: DashMap::new(),
        }
    }

    /// Look up the record stored at `derive(channel_name)`.
    ///
    /// If nothing is stored there, or the stored value does not decode as a
    /// channel record, a fresh empty record addressed at that identifier is
    /// synthesized instead.
    pub async fn fetch_or_create(&self, channel_name: &str) -> Result<ChannelRecord, StoreError> {
        let key = NodeId::derive(channel_name);

        let record = match self.store.lookup(key).await? {
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(record) => record,
                Err(e) => {
                    log::warn!(
                        "Value stored at {} is not a channel record ({}), starting fresh",
                        key.short(),
                        e
                    );
                    ChannelRecord::new(key, channel_name)
                }
            },
            None => ChannelRecord::new(key, channel_name),
        };

        Ok(record)
    }

    /// Upsert `record` under its identifier. Overwrite is always permitted;
    /// per-replica ack counts are logged and otherwise ignored.
    pub async fn persist(&self, record: &ChannelRecord) -> Result<(), StoreError> {
        let bytes = Bytes::from(serde_json::to_vec(record)?);
        let acks = self.store.insert(record.id, bytes).await?;

        let stored = acks.iter().filter(|ok| **ok).count();
        log::debug!(
            "Channel '{}' stored at {}/{} replicas",
            record.name,
            stored,
            acks.len()
        );

        Ok(())
    }

    /// Fetch or create the record for `channel_name`, apply `mutate` to it,
    /// persist the result, and return the persisted record.
    ///
    /// Cycles for the same channel are serialized through a per-channel lock;
    /// cycles for distinct channels run independently.
    pub async fn update<F>(&self, channel_name: &str, mutate: F) -> Result<ChannelRecord, StoreError>
    where
        F: FnOnce(&mut ChannelRecord),
    {
        let key = NodeId::derive(channel_name);
        let lock = self
            .update_locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut record = self.fetch_or_create(channel_name).await?;
        mutate(&mut record);
        self.persist(&record).await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn missing_record_is_synthesized_empty() {
        let channels = Channels::new(Arc::new(MemoryStore::new()));

        let record = channels.fetch_or_create("fresh").await.unwrap();

        assert_eq!(record.id, NodeId::derive("fresh"));
        assert_eq!(record.name, "fresh");
        assert!(record.members().is_empty());
    }

    #[tokio::test]
    async fn garbage_value_is_replaced_with_a_fresh_record() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(NodeId::derive("c1"), Bytes::from_static(b"not a record"))
            .await
            .unwrap();

        let channels = Channels::new(store);
        let record = channels.fetch_or_create("c1").await.unwrap();

        assert!(record.members().is_empty());
    }

    #[tokio::test]
    async fn update_persists_the_mutation() {
        let channels = Channels::new(Arc::new(MemoryStore::new()));

        channels
            .update("c1", |record| record.add_member("a"))
            .await
            .unwrap();
        let record = channels.fetch_or_create("c1").await.unwrap();

        assert!(record.members().contains("a"));
    }
}
