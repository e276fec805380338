//! In-memory event store adapter for the `foldkit` event sourcing kernel.
//!
//! Useful for tests and development where persistence is not required.
//! Appends are atomic under a single lock, so the all-or-nothing batch
//! contract holds trivially, and the expected-version guard is checked
//! before any event of a batch becomes visible.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::trace;

use foldkit::errors::EventStoreResult;
use foldkit::event::Event;
use foldkit::partition_keys::PartitionKeys;
use foldkit::store::{EventStore, ExpectedVersion};
use foldkit::types::EventVersion;

/// Thread-safe in-memory event store.
///
/// Cloning shares the underlying storage, so a cloned handle observes
/// the same log. The current version of a partition is the version of
/// its last appended event; append is the only mutation.
#[derive(Clone)]
pub struct InMemoryEventStore<E>
where
    E: PartialEq + Eq + Clone + Send + Sync + 'static,
{
    // Maps partition keys to the events of that stream, in append order.
    partitions: Arc<RwLock<HashMap<PartitionKeys, Vec<Event<E>>>>>,
}

impl<E> InMemoryEventStore<E>
where
    E: PartialEq + Eq + Clone + Send + Sync + 'static,
{
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self {
            partitions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Total number of events across all partitions.
    pub fn event_count(&self) -> usize {
        let partitions = self.partitions.read().expect("RwLock poisoned");
        partitions.values().map(Vec::len).sum()
    }
}

impl<E> Default for InMemoryEventStore<E>
where
    E: PartialEq + Eq + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E> EventStore for InMemoryEventStore<E>
where
    E: PartialEq + Eq + Clone + Send + Sync + 'static,
{
    type Event = E;

    async fn append_all(
        &self,
        partition_keys: &PartitionKeys,
        expected_version: ExpectedVersion,
        events: Vec<Event<Self::Event>>,
    ) -> EventStoreResult<EventVersion> {
        let mut partitions = self.partitions.write().expect("RwLock poisoned");

        let current = partitions
            .get(partition_keys)
            .and_then(|partition| partition.last())
            .map(|event| event.version);
        expected_version.verify(partition_keys, current)?;

        let appended = events.len();
        let partition = partitions.entry(partition_keys.clone()).or_default();
        partition.extend(events);
        let version = partition
            .last()
            .map_or_else(EventVersion::initial, |event| event.version);
        trace!(partition = %partition_keys, appended, version = %version, "events appended");
        Ok(version)
    }

    async fn events_for(
        &self,
        partition_keys: &PartitionKeys,
    ) -> EventStoreResult<Vec<Event<Self::Event>>> {
        let partitions = self.partitions.read().expect("RwLock poisoned");

        let mut events = partitions.get(partition_keys).cloned().unwrap_or_default();
        // Retrieval order is identifier order, not insertion order.
        events.sort_by(Event::by_sortable_unique_id);
        Ok(events)
    }

    async fn latest_version(
        &self,
        partition_keys: &PartitionKeys,
    ) -> EventStoreResult<Option<EventVersion>> {
        let partitions = self.partitions.read().expect("RwLock poisoned");

        Ok(partitions
            .get(partition_keys)
            .and_then(|partition| partition.last())
            .map(|event| event.version))
    }
}
