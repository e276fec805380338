//! The command pipeline: load, decide, append.
//!
//! One execution runs `Idle -> Loaded -> Handled -> Persisted ->
//! Responded`, short-circuiting to an error on load or append failure.
//! The appended batch is guarded by the version the aggregate was loaded
//! at, so a concurrent writer surfaces as a retryable
//! [`CommandError::ConcurrencyConflict`] instead of a duplicated stream
//! version. The pipeline itself never retries.

use tracing::debug;

use crate::aggregate::Projector;
use crate::command::{Command, CommandContext, CommandWithHandler};
use crate::errors::{CommandError, CommandResult};
use crate::event::Event;
use crate::partition_keys::PartitionKeys;
use crate::store::{EventStore, ExpectedVersion};
use crate::types::EventVersion;

/// The outcome of one command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse<E>
where
    E: PartialEq + Eq,
{
    /// The partition the command executed against.
    pub partition_keys: PartitionKeys,
    /// The events appended by this execution, in order (possibly empty).
    pub events: Vec<Event<E>>,
    /// The aggregate version after execution.
    pub version: EventVersion,
}

/// Executes commands against an event store.
#[derive(Debug, Clone)]
pub struct CommandExecutor<ES> {
    event_store: ES,
}

impl<ES> CommandExecutor<ES>
where
    ES: EventStore,
{
    /// Creates an executor backed by the given event store.
    pub const fn new(event_store: ES) -> Self {
        Self { event_store }
    }

    /// The backing event store.
    pub const fn event_store(&self) -> &ES {
        &self.event_store
    }

    /// Executes a self-describing command: projector, partition keys,
    /// and handler come from the command itself.
    #[tracing::instrument(skip_all, fields(command = std::any::type_name::<C>()))]
    pub async fn execute<C>(&self, command: &C) -> CommandResult<CommandResponse<ES::Event>>
    where
        C: CommandWithHandler,
        C::Projector: Projector<Event = ES::Event>,
    {
        let projector = command.projector();
        self.execute_with(
            command,
            &projector,
            CommandWithHandler::partition_keys,
            C::handle,
        )
        .await
    }

    /// Executes a bare command with caller-supplied collaborators: the
    /// projector, a function deriving the target partition keys, and
    /// the handler holding the business logic.
    ///
    /// The handler may emit one event by returning it, or queue any
    /// number via [`CommandContext::append_event`]; when nothing is
    /// emitted, nothing is persisted.
    #[tracing::instrument(skip_all, fields(command = std::any::type_name::<C>()))]
    pub async fn execute_with<C, P, K, H>(
        &self,
        command: &C,
        projector: &P,
        partition_keys_for: K,
        handler: H,
    ) -> CommandResult<CommandResponse<ES::Event>>
    where
        C: Command,
        P: Projector<Event = ES::Event> + Sync,
        K: FnOnce(&C) -> PartitionKeys + Send,
        H: FnOnce(&C, &mut CommandContext<'_, P>) -> CommandResult<Option<P::Event>> + Send,
    {
        let partition_keys = partition_keys_for(command);
        let aggregate = self
            .event_store
            .load(&partition_keys, projector)
            .await
            .map_err(CommandError::from)?;
        let loaded_version = aggregate.version;
        debug!(partition = %partition_keys, version = %loaded_version, "aggregate loaded");

        let mut context = CommandContext::new(aggregate, projector);
        if let Some(payload) = handler(command, &mut context)? {
            context.append_event(payload);
        }

        let (aggregate, pending) = context.into_parts();
        if !pending.is_empty() {
            self.event_store
                .append_all(
                    &partition_keys,
                    ExpectedVersion::Exact(loaded_version),
                    pending.clone(),
                )
                .await
                .map_err(CommandError::from)?;
            debug!(
                partition = %partition_keys,
                appended = pending.len(),
                version = %aggregate.version,
                "events appended"
            );
        }

        Ok(CommandResponse {
            partition_keys: aggregate.partition_keys,
            events: pending,
            version: aggregate.version,
        })
    }
}
