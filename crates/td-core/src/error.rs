//! Error types for validation and persistence.

use crate::models::TaskId;
use thiserror::Error;

/// Rejected user input or persisted task data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Name is empty after trimming.
    #[error("task name cannot be empty")]
    EmptyName,

    /// Name exceeds the allowed length.
    #[error("task name is too long (maximum {max} characters)")]
    NameTooLong { max: usize },

    /// Name contains newlines, tabs or other control characters.
    #[error("task name cannot contain newlines or control characters")]
    InvalidCharacters,

    /// Priority outside 0..=3.
    #[error("invalid priority value {0} (must be between 0 and 3)")]
    InvalidPriority(u8),

    /// Task ids start at 1.
    #[error("task ID must be positive")]
    InvalidId,

    /// Creation time was never set.
    #[error("task must have a creation time")]
    MissingCreatedAt,

    /// Creation time is implausibly far in the future.
    #[error("task creation time cannot be more than 24 hours in the future")]
    CreatedInFuture,
}

/// Errors raised by task repositories.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No permission to read or write the data file.
    #[error("permission denied: {0}")]
    PermissionDenied(std::io::Error),

    /// The data file is not valid JSON for any known format.
    #[error("invalid data in file: {0}")]
    InvalidData(#[source] serde_json::Error),

    /// A task failed validation on load or before save.
    #[error("invalid task {id}: {source}")]
    InvalidTask {
        id: TaskId,
        #[source]
        source: ValidationError,
    },

    /// Two stored tasks share an id.
    #[error("duplicate task ID {0}")]
    DuplicateId(TaskId),

    /// The integrity checksum does not match the stored tasks.
    #[error("data integrity check failed: checksum mismatch")]
    ChecksumMismatch,

    /// Tasks could not be encoded.
    #[error("failed to serialize tasks: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Unknown storage backend name.
    #[error("unsupported storage type: {0}")]
    UnsupportedStorage(String),
}

impl StorageError {
    /// Map an IO error, separating permission failures.
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied(err)
        } else {
            Self::Io(err)
        }
    }
}

/// Result type for repository operations.
pub type StorageResult<T> = Result<T, StorageError>;
