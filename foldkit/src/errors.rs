//! Error types for the foldkit kernel.
//!
//! Two subsystems, two error enums: [`EventStoreError`] for the
//! persistence port and [`CommandError`] for the command pipeline, with
//! a lossless conversion between the layers. Version conflicts are the
//! one retryable kind; retry policy belongs to the caller, never the
//! kernel itself.

use thiserror::Error;

use crate::partition_keys::PartitionKeys;
use crate::types::EventVersion;

/// Errors surfaced by the event store port.
#[derive(Debug, Clone, Error)]
pub enum EventStoreError {
    /// Reading events for a partition failed at the backing collaborator.
    #[error("Read failed for partition '{partition_keys}': {reason}")]
    ReadFailed {
        /// The partition that was being read.
        partition_keys: PartitionKeys,
        /// The reason for the failure.
        reason: String,
    },

    /// Appending events failed at the backing collaborator.
    #[error("Write failed for partition '{partition_keys}': {reason}")]
    WriteFailed {
        /// The partition that was being written.
        partition_keys: PartitionKeys,
        /// The reason for the failure.
        reason: String,
    },

    /// A concurrent append advanced the stream past the expected version.
    #[error(
        "Version conflict on partition '{partition_keys}': expected {expected}, but current is {current}"
    )]
    VersionConflict {
        /// The partition with the conflict.
        partition_keys: PartitionKeys,
        /// The version the caller loaded.
        expected: EventVersion,
        /// The version actually present in the store.
        current: EventVersion,
    },

    /// An I/O error occurred in a durable backend.
    #[error("I/O error: {0}")]
    Io(String),

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for EventStoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors surfaced by the command pipeline.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// A business rule rejected the command against the loaded state.
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// A concurrent execution appended to the same partition first.
    /// Retryable: reload and re-execute against fresh state.
    #[error("Concurrency conflict on partition '{partition_keys}'")]
    ConcurrencyConflict {
        /// The partition that was contended.
        partition_keys: PartitionKeys,
    },

    /// The event store failed while executing the command.
    #[error("Event store error: {0}")]
    EventStore(EventStoreError),

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EventStoreError> for CommandError {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::VersionConflict { partition_keys, .. } => {
                Self::ConcurrencyConflict { partition_keys }
            }
            other => Self::EventStore(other),
        }
    }
}

/// Type alias for event store results.
pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// Type alias for command pipeline results.
pub type CommandResult<T> = Result<T, CommandError>;
