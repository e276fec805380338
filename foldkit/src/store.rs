//! The event store port: an append-only, partition-addressed event log.
//!
//! Any concrete store (in-memory list, file, database table) satisfies
//! this contract. Retrieval order is defined by the sortable unique
//! identifier, not by physical insertion order, so stores backed by
//! non-sequential storage remain correct as long as identifiers are
//! correctly time-ordered.

use async_trait::async_trait;

use crate::aggregate::{Aggregate, Projector};
use crate::errors::{EventStoreError, EventStoreResult};
use crate::event::Event;
use crate::partition_keys::PartitionKeys;
use crate::types::EventVersion;

/// Expected stream version for the compare-and-append guard.
///
/// Appends are rejected with [`EventStoreError::VersionConflict`] when
/// the stream has advanced past what the caller loaded, which keeps
/// per-partition versions strictly monotonic under concurrent writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// The partition must have no events yet.
    New,
    /// The partition's current version must be exactly this value
    /// (0 for a partition with no events).
    Exact(EventVersion),
    /// Any version is acceptable (no concurrency control).
    Any,
}

impl ExpectedVersion {
    /// Checks this expectation against the current stream version
    /// (`None` when the partition has no events).
    pub fn verify(
        self,
        partition_keys: &PartitionKeys,
        current: Option<EventVersion>,
    ) -> EventStoreResult<()> {
        let current_version = current.unwrap_or_else(EventVersion::initial);
        match self {
            Self::New if current.is_some() => Err(EventStoreError::VersionConflict {
                partition_keys: partition_keys.clone(),
                expected: EventVersion::initial(),
                current: current_version,
            }),
            Self::Exact(expected) if current_version != expected => {
                Err(EventStoreError::VersionConflict {
                    partition_keys: partition_keys.clone(),
                    expected,
                    current: current_version,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Append-only event store, queryable by partition key.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// The event payload family this store handles.
    type Event: PartialEq + Eq + Clone + Send + Sync;

    /// Appends a sequence of events atomically, in the given order,
    /// after verifying the expected version of the target partition.
    ///
    /// All-or-nothing: on any failure no event of the batch is visible.
    /// Returns the partition's version after the append.
    ///
    /// # Errors
    ///
    /// * [`EventStoreError::VersionConflict`] when the partition has
    ///   advanced past `expected_version`.
    /// * [`EventStoreError::WriteFailed`] on backend failure.
    async fn append_all(
        &self,
        partition_keys: &PartitionKeys,
        expected_version: ExpectedVersion,
        events: Vec<Event<Self::Event>>,
    ) -> EventStoreResult<EventVersion>;

    /// Returns all events whose partition keys equal the argument,
    /// ascending by sortable unique identifier.
    async fn events_for(
        &self,
        partition_keys: &PartitionKeys,
    ) -> EventStoreResult<Vec<Event<Self::Event>>>;

    /// The current version of a partition, or `None` if it has no events.
    async fn latest_version(
        &self,
        partition_keys: &PartitionKeys,
    ) -> EventStoreResult<Option<EventVersion>>;

    /// Appends a single event with no concurrency check. Never rejects
    /// based on content; only backend failure is an error.
    async fn append(&self, event: Event<Self::Event>) -> EventStoreResult<EventVersion> {
        let partition_keys = event.partition_keys.clone();
        self.append_all(&partition_keys, ExpectedVersion::Any, vec![event])
            .await
    }

    /// Loads the aggregate for a partition key by folding its events
    /// through the projector, starting from the empty aggregate.
    ///
    /// A partition with no events yields the empty aggregate (version 0);
    /// that is not an error. This is a pure read.
    async fn load<P>(
        &self,
        partition_keys: &PartitionKeys,
        projector: &P,
    ) -> EventStoreResult<Aggregate<P::State>>
    where
        P: Projector<Event = Self::Event> + Sync,
    {
        let events = self.events_for(partition_keys).await?;
        let empty = Aggregate::empty_from_partition_keys(projector, partition_keys.clone());
        Ok(empty.apply_all(&events, projector))
    }
}
