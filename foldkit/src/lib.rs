//! `foldkit` - an event sourcing kernel.
//!
//! State is reconstructed by replaying an ordered log of immutable
//! events, and every change goes through a command that validates
//! against the current state and appends new events. Three pieces define
//! the consistency contract: the sortable unique identifier giving every
//! event a globally comparable, time-ordered key; the projection fold
//! turning events into typed aggregate state; and the command pipeline
//! that loads, decides, and atomically appends.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod command;
pub mod errors;
pub mod event;
pub mod executor;
pub mod partition_keys;
pub mod sortable_id;
pub mod store;
pub mod types;

pub use aggregate::{Aggregate, Projector};
pub use command::{Command, CommandContext, CommandWithHandler};
pub use errors::{CommandError, CommandResult, EventStoreError, EventStoreResult};
pub use event::Event;
pub use executor::{CommandExecutor, CommandResponse};
pub use partition_keys::PartitionKeys;
pub use sortable_id::SortableUniqueId;
pub use store::{EventStore, ExpectedVersion};
pub use types::{AggregateGroup, EventVersion, RootPartitionKey};
