//! Command capabilities and the per-execution command context.
//!
//! Commands come in two shapes. A bare [`Command`] is just data; the
//! caller supplies the projector, partition-key derivation, and handler
//! to the executor. A [`CommandWithHandler`] carries all three itself,
//! so the executor can run it without extra arguments.

use crate::aggregate::{Aggregate, Projector};
use crate::errors::CommandResult;
use crate::event::Event;
use crate::partition_keys::PartitionKeys;

/// Minimal command capability: an immutable, ephemeral request to
/// change state. Commands are not persisted.
pub trait Command: Send + Sync {}

/// Extended command capability: the command describes its own projector,
/// target partition keys, and business logic.
pub trait CommandWithHandler: Command {
    /// The projector for the aggregate this command targets.
    type Projector: Projector;

    /// Returns the projector instance to fold events with.
    fn projector(&self) -> Self::Projector;

    /// Derives the target partition keys from the command's data.
    fn partition_keys(&self) -> PartitionKeys;

    /// Runs the business logic against the loaded aggregate.
    ///
    /// Returning `Ok(Some(payload))` emits one event; `Ok(None)` emits
    /// nothing. Additional events can be queued on the context via
    /// [`CommandContext::append_event`].
    fn handle(
        &self,
        context: &mut CommandContext<'_, Self::Projector>,
    ) -> CommandResult<Option<<Self::Projector as Projector>::Event>>;
}

/// Mutable working state for one command execution.
///
/// Wraps the loaded aggregate, the projector in use, and the events
/// accumulated so far. Scoped to a single execution and discarded after.
pub struct CommandContext<'a, P>
where
    P: Projector,
{
    aggregate: Aggregate<P::State>,
    projector: &'a P,
    pending: Vec<Event<P::Event>>,
}

impl<'a, P> CommandContext<'a, P>
where
    P: Projector,
{
    /// Wraps a freshly loaded aggregate with an empty pending-event list.
    pub const fn new(aggregate: Aggregate<P::State>, projector: &'a P) -> Self {
        Self {
            aggregate,
            projector,
            pending: Vec::new(),
        }
    }

    /// The in-progress aggregate, reflecting all events queued so far.
    pub const fn aggregate(&self) -> &Aggregate<P::State> {
        &self.aggregate
    }

    /// The current materialized state of the in-progress aggregate.
    pub const fn state(&self) -> &P::State {
        &self.aggregate.payload
    }

    /// The events queued by this execution, in append order.
    pub fn pending_events(&self) -> &[Event<P::Event>] {
        &self.pending
    }

    /// Queues an event at the next stream version, folding it into the
    /// in-progress aggregate so later logic sees the updated state.
    pub fn append_event(&mut self, payload: P::Event) {
        let event = Event::new(
            payload,
            self.aggregate.partition_keys.clone(),
            self.aggregate.version.next(),
        );
        self.aggregate = self.aggregate.apply(&event, self.projector);
        self.pending.push(event);
    }

    /// Tears the context apart into its final aggregate and the pending
    /// events for persistence.
    pub(crate) fn into_parts(self) -> (Aggregate<P::State>, Vec<Event<P::Event>>) {
        (self.aggregate, self.pending)
    }
}
