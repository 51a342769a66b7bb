//! # td-core
//!
//! Task engine for the `td` terminal task list.
//!
//! ## Features
//!
//! - Two-list task store (active / done) with stable priority ordering
//! - Bounded undo/redo log with compound batch actions
//! - JSON persistence with an optional checksummed format
//! - Input validation shared with the UI layer

mod error;
mod manager;
mod models;
mod undo;

pub mod storage;
pub mod validation;

pub use error::{StorageError, StorageResult, ValidationError};
pub use manager::{sort_tasks, TaskManager, TaskStats};
pub use models::{Priority, Task, TaskId, MAX_PERSISTED_NAME_LEN};
pub use undo::{Action, ActionKind, UndoManager, DEFAULT_MAX_UNDO_SIZE};
