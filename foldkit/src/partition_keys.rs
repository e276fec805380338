//! Partition keys: the composite address of one event stream.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AggregateGroup, RootPartitionKey};

/// Identifies the logical stream an event belongs to.
///
/// Equality is structural over all three components; `PartitionKeys` is
/// immutable once created and is the filter key for event retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKeys {
    /// The aggregate instance this stream belongs to.
    pub aggregate_id: Uuid,
    /// The aggregate group (kind) within the root partition.
    pub group: AggregateGroup,
    /// The root partition (tenant/environment) above the group.
    pub root_partition_key: RootPartitionKey,
}

impl PartitionKeys {
    /// Creates keys for a new aggregate instance in the default group
    /// and root partition. The aggregate id is a fresh `UUIDv7`, so ids
    /// themselves sort roughly by creation time.
    pub fn generate() -> Self {
        Self::generate_in(AggregateGroup::default_group())
    }

    /// Creates keys for a new aggregate instance in the given group.
    pub fn generate_in(group: AggregateGroup) -> Self {
        Self {
            aggregate_id: Uuid::now_v7(),
            group,
            root_partition_key: RootPartitionKey::default_root(),
        }
    }

    /// Addresses an existing aggregate in the default group and root
    /// partition.
    pub fn existing(aggregate_id: Uuid) -> Self {
        Self::existing_in(aggregate_id, AggregateGroup::default_group())
    }

    /// Addresses an existing aggregate in the given group.
    pub fn existing_in(aggregate_id: Uuid, group: AggregateGroup) -> Self {
        Self {
            aggregate_id,
            group,
            root_partition_key: RootPartitionKey::default_root(),
        }
    }

    /// Replaces the root partition component.
    #[must_use]
    pub fn with_root(mut self, root_partition_key: RootPartitionKey) -> Self {
        self.root_partition_key = root_partition_key;
        self
    }
}

impl std::fmt::Display for PartitionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.root_partition_key, self.group, self.aggregate_id
        )
    }
}
