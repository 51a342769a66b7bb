//! Data models for td.

use crate::error::ValidationError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Unique task identifier.
pub type TaskId = u64;

/// Longest name accepted in the data file.
pub const MAX_PERSISTED_NAME_LEN: usize = 500;

/// Task priority levels, lowest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::None,
        Priority::Low,
        Priority::Medium,
        Priority::High,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Priority::None => "○",
            Priority::Low | Priority::Medium | Priority::High => "●",
        }
    }

    /// Cycle to the next level, wrapping from High back to None.
    pub fn next(&self) -> Priority {
        match self {
            Priority::None => Priority::Low,
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::None,
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Priority::ALL
            .get(value as usize)
            .copied()
            .ok_or(ValidationError::InvalidPriority(value))
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p as u8
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub id: TaskId,
    pub is_done: bool,
    #[serde(default)]
    pub priority: Priority,
}

impl Task {
    pub fn new(id: TaskId, name: &str) -> Self {
        Self {
            created_at: Utc::now(),
            name: name.to_string(),
            id,
            is_done: false,
            priority: Priority::None,
        }
    }

    /// Check the rules a task must satisfy to be loaded or saved.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if name.chars().count() > MAX_PERSISTED_NAME_LEN {
            return Err(ValidationError::NameTooLong {
                max: MAX_PERSISTED_NAME_LEN,
            });
        }
        if self.id == 0 {
            return Err(ValidationError::InvalidId);
        }
        if self.created_at.timestamp() == 0 {
            return Err(ValidationError::MissingCreatedAt);
        }
        if self.created_at > Utc::now() + Duration::hours(24) {
            return Err(ValidationError::CreatedInFuture);
        }
        Ok(())
    }
}
