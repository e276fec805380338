//! Committed domain events.
//!
//! An [`Event`] is the immutable record of one fact: a domain payload
//! plus its position (partition keys, stream version, sortable unique
//! identifier). Events are never mutated or removed once appended.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::partition_keys::PartitionKeys;
use crate::sortable_id::SortableUniqueId;
use crate::types::EventVersion;

/// One committed fact within a partition's stream.
///
/// The generic type `E` is the domain-specific payload family, usually a
/// tagged enum with one variant per fact kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<E>
where
    E: PartialEq + Eq,
{
    /// The domain payload carried by this event.
    pub payload: E,
    /// The stream this event belongs to.
    pub partition_keys: PartitionKeys,
    /// The globally unique, time-ordered identifier of this event.
    pub sortable_unique_id: SortableUniqueId,
    /// The 1-based sequence number within the partition's stream.
    pub version: EventVersion,
}

impl<E> Event<E>
where
    E: PartialEq + Eq,
{
    /// Creates an event at the given stream position with a freshly
    /// generated sortable identifier.
    pub fn new(payload: E, partition_keys: PartitionKeys, version: EventVersion) -> Self {
        Self {
            payload,
            partition_keys,
            version,
            sortable_unique_id: SortableUniqueId::now(),
        }
    }

    /// Creates an event with an explicit identifier (for replay or tests).
    pub const fn with_id(
        payload: E,
        partition_keys: PartitionKeys,
        sortable_unique_id: SortableUniqueId,
        version: EventVersion,
    ) -> Self {
        Self {
            payload,
            partition_keys,
            sortable_unique_id,
            version,
        }
    }
}

impl<E> Event<E>
where
    E: PartialEq + Eq,
{
    /// Global order of events: by sortable identifier, which tracks
    /// generation time. A comparator rather than an `Ord` impl, because
    /// structural equality over all fields is finer than identifier
    /// equality.
    pub fn by_sortable_unique_id(a: &Self, b: &Self) -> Ordering {
        a.sortable_unique_id.cmp(&b.sortable_unique_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    enum TestPayload {
        Noted { text: String },
    }

    fn at(secs: i64) -> SortableUniqueId {
        SortableUniqueId::generate(
            Utc.timestamp_opt(secs, 0).single().unwrap(),
            Uuid::nil(),
        )
    }

    #[test]
    fn new_assigns_position_and_identifier() {
        let keys = PartitionKeys::generate();
        let version = EventVersion::initial().next();
        let event = Event::new(
            TestPayload::Noted {
                text: "hello".to_string(),
            },
            keys.clone(),
            version,
        );

        assert_eq!(event.partition_keys, keys);
        assert_eq!(event.version, version);
        assert_eq!(
            event.sortable_unique_id.as_ref().len(),
            SortableUniqueId::LENGTH
        );
    }

    #[test]
    fn events_order_by_sortable_id_not_insertion() {
        let keys = PartitionKeys::generate();
        let version = EventVersion::initial().next();
        let later = Event::with_id(
            TestPayload::Noted {
                text: "b".to_string(),
            },
            keys.clone(),
            at(200),
            version.next(),
        );
        let earlier = Event::with_id(
            TestPayload::Noted {
                text: "a".to_string(),
            },
            keys,
            at(100),
            version,
        );

        let mut events = vec![later.clone(), earlier.clone()];
        events.sort_by(Event::by_sortable_unique_id);
        assert_eq!(events, vec![earlier, later]);
    }

    #[test]
    fn comparator_distinguishes_same_id_events_that_differ_structurally() {
        let keys = PartitionKeys::generate();
        let version = EventVersion::initial().next();
        let a = Event::with_id(
            TestPayload::Noted {
                text: "a".to_string(),
            },
            keys.clone(),
            at(100),
            version,
        );
        let b = Event::with_id(
            TestPayload::Noted {
                text: "b".to_string(),
            },
            keys,
            at(100),
            version,
        );

        assert_eq!(Event::by_sortable_unique_id(&a, &b), Ordering::Equal);
        assert_ne!(a, b);
    }

    #[test]
    fn serde_round_trip() {
        let event = Event::new(
            TestPayload::Noted {
                text: "hello".to_string(),
            },
            PartitionKeys::generate(),
            EventVersion::initial().next(),
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: Event<TestPayload> = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
