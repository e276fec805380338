//! Aggregate projection: folding an event stream into typed state.
//!
//! An [`Aggregate`] is never mutated in place; it is recomputed by
//! folding events through a [`Projector`], which is the one pure
//! function defining an aggregate type's reducer.

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::partition_keys::PartitionKeys;
use crate::sortable_id::SortableUniqueId;
use crate::types::EventVersion;

/// A pure reducer from `(state, event)` to the next state.
///
/// Implementations dispatch on the concrete variants of state and event
/// payload. Replay must be total: an unrecognized combination returns
/// the input state unchanged (identity fallback) via an explicit default
/// match arm, never an error. From the empty state, only a
/// "created"-class event transitions to concrete state.
pub trait Projector: Send + Sync {
    /// The aggregate state family, including its empty variant.
    type State: Clone + Send + Sync;
    /// The event payload family this projector understands.
    type Event: PartialEq + Eq + Send + Sync;

    /// The canonical zero-state before any event has been applied.
    fn initial_state(&self) -> Self::State;

    /// Folds one event into the state. Must be pure: the same inputs
    /// always yield the same output.
    fn project(&self, state: Self::State, event: &Event<Self::Event>) -> Self::State;

    /// Schema tag of this projector, recorded for future migration use.
    fn version(&self) -> &'static str {
        "initial"
    }
}

/// The materialized result of folding all events for one partition key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate<S> {
    /// Current materialized state.
    pub payload: S,
    /// The stream this aggregate was folded from.
    pub partition_keys: PartitionKeys,
    /// Version of the last folded event, or 0 if none.
    pub version: EventVersion,
    /// Identifier of the last folded event, or `None` if no event has
    /// been applied.
    pub last_sortable_unique_id: Option<SortableUniqueId>,
}

impl<S> Aggregate<S>
where
    S: Clone,
{
    /// The empty aggregate (version 0) for a partition key.
    pub fn empty_from_partition_keys<P>(projector: &P, partition_keys: PartitionKeys) -> Self
    where
        P: Projector<State = S>,
    {
        Self {
            payload: projector.initial_state(),
            partition_keys,
            version: EventVersion::initial(),
            last_sortable_unique_id: None,
        }
    }

    /// Folds one event, returning the next aggregate.
    ///
    /// Version and last-identifier always advance to the event's,
    /// regardless of whether the payload changed shape.
    #[must_use]
    pub fn apply<P>(&self, event: &Event<P::Event>, projector: &P) -> Self
    where
        P: Projector<State = S>,
    {
        Self {
            payload: projector.project(self.payload.clone(), event),
            partition_keys: self.partition_keys.clone(),
            version: event.version,
            last_sortable_unique_id: Some(event.sortable_unique_id.clone()),
        }
    }

    /// Folds an ordered sequence of events left to right.
    #[must_use]
    pub fn apply_all<P>(&self, events: &[Event<P::Event>], projector: &P) -> Self
    where
        P: Projector<State = S>,
    {
        events
            .iter()
            .fold(self.clone(), |acc, event| acc.apply(event, projector))
    }
}
