//! Input validation for names and priorities typed by the user.
//!
//! These rules are stricter than [`Task::validate`](crate::Task::validate),
//! which only guards what is accepted from the data file.

use crate::error::ValidationError;
use crate::models::Priority;

/// Longest name accepted from the input line.
pub const MAX_INPUT_NAME_LEN: usize = 200;

/// Trim the name, turn newlines and tabs into spaces and collapse repeated
/// spaces.
pub fn sanitize_task_name(name: &str) -> String {
    name.split(|c: char| c == ' ' || c == '\n' || c == '\r' || c == '\t')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_task_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > MAX_INPUT_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            max: MAX_INPUT_NAME_LEN,
        });
    }
    if name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidCharacters);
    }
    Ok(())
}

pub fn validate_priority_input(value: u8) -> Result<Priority, ValidationError> {
    Priority::try_from(value)
}
