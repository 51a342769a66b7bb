//! Task persistence.
//!
//! The store is built from [`TaskRepository::load_tasks`] at startup and
//! handed back to [`TaskRepository::save_tasks`] at save points.

mod file;
mod memory;

pub use file::{FileFormat, FileRepository};
pub use memory::MemoryRepository;

use crate::error::{StorageError, StorageResult};
use crate::manager::TaskManager;
use crate::models::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name of the default data file in the home directory.
pub const DEFAULT_DATA_FILE_NAME: &str = ".td.json";

/// Everything a repository hands back on load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedTasks {
    pub active: Vec<Task>,
    pub done: Vec<Task>,
    /// Highest id seen; the store assigns ids above it.
    pub next_id: TaskId,
}

impl LoadedTasks {
    pub fn into_manager(self) -> TaskManager {
        TaskManager::new(self.active, self.done, self.next_id)
    }
}

/// A place tasks are loaded from and saved to.
pub trait TaskRepository: Send {
    fn load_tasks(&self) -> StorageResult<LoadedTasks>;

    /// Replace everything stored with the given collections.
    fn save_tasks(&self, active: &[Task], done: &[Task]) -> StorageResult<()>;

    /// Copy whatever is currently stored aside before it gets overwritten.
    ///
    /// Returns the backup location, or `None` if there was nothing to copy
    /// or the repository keeps no backups.
    fn backup(&self) -> StorageResult<Option<String>> {
        Ok(None)
    }

    /// Release any resources. Repositories without any are a no-op.
    fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Short human-readable location for logs and the status bar.
    fn describe(&self) -> String;
}

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StorageKind {
    #[default]
    File,
    /// Nothing survives the process; useful for tests and demos.
    Memory,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::File => "file",
            StorageKind::Memory => "memory",
        }
    }
}

impl FromStr for StorageKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" | "" => Ok(StorageKind::File),
            "memory" => Ok(StorageKind::Memory),
            other => Err(StorageError::UnsupportedStorage(other.to_string())),
        }
    }
}

impl TryFrom<String> for StorageKind {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StorageKind> for String {
    fn from(kind: StorageKind) -> String {
        kind.as_str().to_string()
    }
}

/// Settings for [`open_repository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// Data file; `~` expands to the home directory.
    pub file_path: PathBuf,
    /// Write the checksummed format instead of a plain array.
    pub integrity: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::File,
            file_path: default_data_file(),
            integrity: false,
        }
    }
}

/// Create the repository described by `config`.
pub fn open_repository(config: &StorageConfig) -> Box<dyn TaskRepository> {
    match config.kind {
        StorageKind::File => {
            let format = if config.integrity {
                FileFormat::Integrity
            } else {
                FileFormat::Plain
            };
            let path = expand_home(&config.file_path);
            tracing::debug!(path = %path.display(), ?format, "opening file repository");
            Box::new(FileRepository::new(path).with_format(format))
        }
        StorageKind::Memory => {
            tracing::debug!("opening memory repository");
            Box::new(MemoryRepository::new())
        }
    }
}

/// `~/.td.json`, or `.td.json` in the working directory when there is no home.
pub fn default_data_file() -> PathBuf {
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(DEFAULT_DATA_FILE_NAME),
        None => PathBuf::from(DEFAULT_DATA_FILE_NAME),
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}

/// Validate every task and reject duplicate ids. Returns the highest id.
pub(crate) fn check_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> StorageResult<TaskId> {
    let mut seen = HashSet::new();
    let mut highest = 0;
    for task in tasks {
        task.validate()
            .map_err(|source| StorageError::InvalidTask { id: task.id, source })?;
        if !seen.insert(task.id) {
            return Err(StorageError::DuplicateId(task.id));
        }
        highest = highest.max(task.id);
    }
    Ok(highest)
}
