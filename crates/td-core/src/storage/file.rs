//! JSON file repository.

use super::{check_tasks, LoadedTasks, TaskRepository};
use crate::error::{StorageError, StorageResult};
use crate::models::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const INTEGRITY_VERSION: u32 = 1;

/// On-disk layout written by [`FileRepository::save_tasks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// A JSON array of all tasks, active first.
    #[default]
    Plain,
    /// Separate active/done lists with a SHA-256 checksum header.
    Integrity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IntegrityHeader {
    version: u32,
    checksum: String,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct IntegrityFileRef<'a> {
    integrity: IntegrityHeader,
    tasks: &'a [Task],
    done_tasks: &'a [Task],
}

#[derive(Deserialize)]
struct IntegrityFile {
    integrity: IntegrityHeader,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    done_tasks: Vec<Task>,
}

/// Tasks stored in a single JSON file, overwritten whole on every save.
///
/// Loading accepts both formats regardless of the configured one.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
    format: FileFormat,
}

impl FileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: FileFormat::Plain,
        }
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    fn read(&self) -> StorageResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to read data file");
                Err(StorageError::from_io(e))
            }
        }
    }

    fn write(&self, content: &[u8]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StorageError::from_io)?;
            }
        }
        std::fs::write(&self.path, content).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "failed to write data file");
            StorageError::from_io(e)
        })
    }
}

impl TaskRepository for FileRepository {
    fn load_tasks(&self) -> StorageResult<LoadedTasks> {
        tracing::debug!(path = %self.path.display(), "loading tasks");

        let Some(content) = self.read()? else {
            tracing::debug!("data file does not exist, starting empty");
            return Ok(LoadedTasks::default());
        };
        if content.trim().is_empty() {
            return Ok(LoadedTasks::default());
        }

        let loaded = parse(&content)?;
        tracing::info!(
            active = loaded.active.len(),
            done = loaded.done.len(),
            next_id = loaded.next_id,
            "loaded tasks"
        );
        Ok(loaded)
    }

    fn save_tasks(&self, active: &[Task], done: &[Task]) -> StorageResult<()> {
        tracing::debug!(
            path = %self.path.display(),
            active = active.len(),
            done = done.len(),
            "saving tasks"
        );
        check_tasks(active.iter().chain(done.iter()))?;

        let data = match self.format {
            FileFormat::Plain => {
                let all: Vec<&Task> = active.iter().chain(done.iter()).collect();
                serde_json::to_vec_pretty(&all)
            }
            FileFormat::Integrity => {
                let file = IntegrityFileRef {
                    integrity: IntegrityHeader {
                        version: INTEGRITY_VERSION,
                        checksum: checksum(active, done)?,
                        created_at: Utc::now(),
                    },
                    tasks: active,
                    done_tasks: done,
                };
                serde_json::to_vec_pretty(&file)
            }
        }
        .map_err(StorageError::Serialize)?;

        self.write(&data)?;
        tracing::info!("saved tasks");
        Ok(())
    }

    /// Copy the data file to `<name>.bak` next to it.
    fn backup(&self) -> StorageResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        let backup = PathBuf::from(name);
        std::fs::copy(&self.path, &backup).map_err(|e| {
            tracing::error!(path = %backup.display(), error = %e, "failed to back up data file");
            StorageError::from_io(e)
        })?;
        tracing::info!(path = %backup.display(), "backed up data file");
        Ok(Some(backup.display().to_string()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Decode either file format, validating every task.
fn parse(content: &str) -> StorageResult<LoadedTasks> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(StorageError::InvalidData)?;

    if value.is_object() {
        let file: IntegrityFile =
            serde_json::from_value(value).map_err(StorageError::InvalidData)?;
        if file.integrity.checksum != checksum(&file.tasks, &file.done_tasks)? {
            tracing::error!("checksum mismatch in data file");
            return Err(StorageError::ChecksumMismatch);
        }
        let mut active = file.tasks;
        let mut done = file.done_tasks;
        active.iter_mut().for_each(|t| t.is_done = false);
        done.iter_mut().for_each(|t| t.is_done = true);
        let next_id = check_tasks(active.iter().chain(done.iter()))?;
        return Ok(LoadedTasks {
            active,
            done,
            next_id,
        });
    }

    let tasks: Vec<Task> = serde_json::from_value(value).map_err(StorageError::InvalidData)?;
    let next_id = check_tasks(&tasks)?;
    let (done, active) = tasks.into_iter().partition(|t| t.is_done);
    Ok(LoadedTasks {
        active,
        done,
        next_id,
    })
}

fn checksum(active: &[Task], done: &[Task]) -> StorageResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(active).map_err(StorageError::Serialize)?);
    hasher.update(serde_json::to_vec(done).map_err(StorageError::Serialize)?);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::ValidationError;
    use tempfile::TempDir;

    fn sample() -> (Vec<Task>, Vec<Task>) {
        let mut a = Task::new(1, "Write tests");
        a.priority = Priority::High;
        let mut b = Task::new(3, "Ship it");
        b.is_done = true;
        (vec![a], vec![b])
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path().join("nope.json"));
        assert_eq!(repo.load_tasks().unwrap(), LoadedTasks::default());
    }

    #[test]
    fn test_plain_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path().join("nested/dir/tasks.json"));
        let (active, done) = sample();
        repo.save_tasks(&active, &done).unwrap();

        let raw = std::fs::read_to_string(repo.path()).unwrap();
        assert!(raw.trim_start().starts_with('['));

        let loaded = repo.load_tasks().unwrap();
        assert_eq!(loaded.active, active);
        assert_eq!(loaded.done, done);
        assert_eq!(loaded.next_id, 3);
    }

    #[test]
    fn test_integrity_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo =
            FileRepository::new(dir.path().join("tasks.json")).with_format(FileFormat::Integrity);
        let (active, done) = sample();
        repo.save_tasks(&active, &done).unwrap();

        let loaded = repo.load_tasks().unwrap();
        assert_eq!(loaded.active, active);
        assert_eq!(loaded.done, done);

        // A plain repository on the same path still reads it.
        let plain = FileRepository::new(repo.path());
        assert_eq!(plain.load_tasks().unwrap().done, done);
    }

    #[test]
    fn test_checksum_mismatch() {
        let dir = TempDir::new().unwrap();
        let repo =
            FileRepository::new(dir.path().join("tasks.json")).with_format(FileFormat::Integrity);
        let (active, done) = sample();
        repo.save_tasks(&active, &done).unwrap();

        let raw = std::fs::read_to_string(repo.path()).unwrap();
        std::fs::write(repo.path(), raw.replace("Write tests", "Tampered")).unwrap();
        assert!(matches!(
            repo.load_tasks(),
            Err(StorageError::ChecksumMismatch)
        ));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "{not json").unwrap();
        let repo = FileRepository::new(&path);
        assert!(matches!(repo.load_tasks(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_invalid_task_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(
            &path,
            r#"[{"created_at":"2024-01-01T00:00:00Z","name":"  ","id":1,"is_done":false,"priority":0}]"#,
        )
        .unwrap();
        let repo = FileRepository::new(&path);
        assert!(matches!(
            repo.load_tasks(),
            Err(StorageError::InvalidTask {
                id: 1,
                source: ValidationError::EmptyName
            })
        ));
    }

    #[test]
    fn test_out_of_range_priority_is_invalid_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(
            &path,
            r#"[{"created_at":"2024-01-01T00:00:00Z","name":"a","id":1,"is_done":false,"priority":7}]"#,
        )
        .unwrap();
        let repo = FileRepository::new(&path);
        assert!(matches!(repo.load_tasks(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_invalid_task_not_saved() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path().join("tasks.json"));
        let bad = Task::new(0, "no id");
        assert!(repo.save_tasks(&[bad], &[]).is_err());
        assert!(!repo.path().exists());
    }

    #[test]
    fn test_backup_copies_data_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let repo = FileRepository::new(&path);
        assert_eq!(repo.backup().unwrap(), None);

        std::fs::write(&path, "{broken").unwrap();
        let backup = repo.backup().unwrap().unwrap();
        assert!(backup.ends_with("tasks.json.bak"));
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "{broken");
    }

    #[test]
    fn test_empty_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(
            FileRepository::new(&path).load_tasks().unwrap(),
            LoadedTasks::default()
        );
    }
}
