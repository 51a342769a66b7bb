//! In-memory task repository.

use super::{check_tasks, LoadedTasks, TaskRepository};
use crate::error::StorageResult;
use crate::models::Task;
use std::sync::{Mutex, PoisonError};

/// Keeps the last saved collections in process memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<LoadedTasks>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing collections, as if they had been saved.
    pub fn with_tasks(active: Vec<Task>, done: Vec<Task>) -> StorageResult<Self> {
        let next_id = check_tasks(active.iter().chain(done.iter()))?;
        Ok(Self {
            state: Mutex::new(LoadedTasks {
                active,
                done,
                next_id,
            }),
        })
    }
}

impl TaskRepository for MemoryRepository {
    fn load_tasks(&self) -> StorageResult<LoadedTasks> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.clone())
    }

    fn save_tasks(&self, active: &[Task], done: &[Task]) -> StorageResult<()> {
        let next_id = check_tasks(active.iter().chain(done.iter()))?;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = LoadedTasks {
            active: active.to_vec(),
            done: done.to_vec(),
            next_id,
        };
        tracing::debug!(active = active.len(), done = done.len(), "saved tasks in memory");
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_save_then_load() {
        let repo = MemoryRepository::new();
        let mut done = Task::new(4, "done");
        done.is_done = true;
        repo.save_tasks(&[Task::new(2, "active")], &[done.clone()])
            .unwrap();

        let loaded = repo.load_tasks().unwrap();
        assert_eq!(loaded.active[0].name, "active");
        assert_eq!(loaded.done, vec![done]);
        assert_eq!(loaded.next_id, 4);
    }

    #[test]
    fn test_save_rejects_invalid() {
        let repo = MemoryRepository::new();
        assert!(repo.save_tasks(&[Task::new(1, "")], &[]).is_err());
        assert_eq!(repo.load_tasks().unwrap(), LoadedTasks::default());
    }

    #[test]
    fn test_shared_across_threads() {
        let repo = Arc::new(MemoryRepository::with_tasks(vec![Task::new(1, "a")], vec![]).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || repo.load_tasks().unwrap().active.len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}
