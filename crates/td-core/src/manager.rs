//! Task store owning the active and done collections.

use crate::models::{Priority, Task, TaskId};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Owns every task and keeps the active list sorted.
///
/// Tasks live in exactly one of the two collections; `is_done` always matches
/// the collection holding the task. Methods that hand a task back return a
/// snapshot, so callers cannot mutate stored tasks behind the store's back.
#[derive(Debug, Clone, Default)]
pub struct TaskManager {
    tasks: Vec<Task>,
    done_tasks: Vec<Task>,
    next_id: TaskId,
}

/// Counts for the status bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub active: usize,
    pub done: usize,
    pub by_priority: BTreeMap<Priority, usize>,
}

impl TaskManager {
    /// Build a store from loaded collections.
    ///
    /// `next_id` is the last assigned id. It is raised to the highest id
    /// present so ids are never handed out twice.
    pub fn new(tasks: Vec<Task>, done_tasks: Vec<Task>, next_id: TaskId) -> Self {
        let highest = tasks
            .iter()
            .chain(done_tasks.iter())
            .map(|t| t.id)
            .max()
            .unwrap_or(0);

        let mut tm = Self {
            tasks,
            done_tasks,
            next_id: next_id.max(highest),
        };
        tm.sort_active();
        tm
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn done_tasks(&self) -> &[Task] {
        &self.done_tasks
    }

    /// The last id handed out.
    pub fn next_id(&self) -> TaskId {
        self.next_id
    }

    pub fn add_task(&mut self, name: &str) -> Task {
        self.next_id += 1;
        let task = Task::new(self.next_id, name);
        tracing::debug!(id = task.id, "adding task");
        self.tasks.push(task.clone());
        self.sort_active();
        task
    }

    /// Remove a task from whichever collection holds it.
    pub fn delete_task(&mut self, id: TaskId) -> Option<Task> {
        if let Some(pos) = position(&self.tasks, id) {
            tracing::debug!(id, "deleting active task");
            return Some(self.tasks.remove(pos));
        }
        if let Some(pos) = position(&self.done_tasks, id) {
            tracing::debug!(id, "deleting done task");
            return Some(self.done_tasks.remove(pos));
        }
        None
    }

    /// Move an active task to the done list.
    pub fn complete_task(&mut self, id: TaskId) -> Option<Task> {
        self.complete_task_at(id, None)
    }

    /// Complete a task, placing it at `done_index` in the done list, or
    /// appending it when `None`. The index is clamped to the list length.
    pub(crate) fn complete_task_at(&mut self, id: TaskId, done_index: Option<usize>) -> Option<Task> {
        let pos = position(&self.tasks, id)?;
        let mut task = self.tasks.remove(pos);
        task.is_done = true;
        tracing::debug!(id, "completing task");
        self.insert_done(task.clone(), done_index);
        self.sort_active();
        Some(task)
    }

    /// Move a done task back to the active list.
    pub fn uncomplete_task(&mut self, id: TaskId) -> Option<Task> {
        let pos = position(&self.done_tasks, id)?;
        let mut task = self.done_tasks.remove(pos);
        task.is_done = false;
        tracing::debug!(id, "reopening task");
        self.tasks.push(task.clone());
        self.sort_active();
        Some(task)
    }

    pub fn update_task_name(&mut self, id: TaskId, name: &str) -> Option<Task> {
        let task = self.find_task_mut(id)?;
        task.name = name.to_string();
        tracing::debug!(id, "renamed task");
        Some(task.clone())
    }

    /// Change the priority of an active task. Done tasks are left alone.
    pub fn set_task_priority(&mut self, id: TaskId, priority: Priority) -> Option<Task> {
        let pos = position(&self.tasks, id)?;
        self.tasks[pos].priority = priority;
        let task = self.tasks[pos].clone();
        tracing::debug!(id, %priority, "set priority");
        self.sort_active();
        Some(task)
    }

    /// Position of a task in the done list.
    pub fn done_index(&self, id: TaskId) -> Option<usize> {
        position(&self.done_tasks, id)
    }

    pub fn find_task_by_id(&self, id: TaskId) -> Option<&Task> {
        self.tasks
            .iter()
            .chain(self.done_tasks.iter())
            .find(|t| t.id == id)
    }

    /// Drop every done task, returning them in list order.
    pub fn clear_done(&mut self) -> Vec<Task> {
        tracing::debug!(count = self.done_tasks.len(), "clearing done tasks");
        std::mem::take(&mut self.done_tasks)
    }

    /// Active tasks at exactly `priority`, in display order.
    pub fn tasks_with_priority(&self, priority: Priority) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.priority == priority).collect()
    }

    pub fn stats(&self) -> TaskStats {
        let mut by_priority = BTreeMap::new();
        for task in &self.tasks {
            *by_priority.entry(task.priority).or_insert(0) += 1;
        }
        TaskStats {
            active: self.tasks.len(),
            done: self.done_tasks.len(),
            by_priority,
        }
    }

    /// Put a previously removed task back where its `is_done` flag says.
    ///
    /// Returns false if a task with the same id is already stored.
    pub(crate) fn restore_task(&mut self, task: Task) -> bool {
        self.restore_task_at(task, None)
    }

    /// Like [`TaskManager::restore_task`], but a done task goes back to
    /// `done_index` (clamped) instead of the end of the done list.
    pub(crate) fn restore_task_at(&mut self, task: Task, done_index: Option<usize>) -> bool {
        if self.find_task_by_id(task.id).is_some() {
            tracing::warn!(id = task.id, "refusing to restore duplicate task");
            return false;
        }
        self.next_id = self.next_id.max(task.id);
        if task.is_done {
            self.insert_done(task, done_index);
        } else {
            self.tasks.push(task);
            self.sort_active();
        }
        true
    }

    fn insert_done(&mut self, task: Task, done_index: Option<usize>) {
        match done_index {
            Some(index) => {
                let index = index.min(self.done_tasks.len());
                self.done_tasks.insert(index, task);
            }
            None => self.done_tasks.push(task),
        }
    }

    fn find_task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .chain(self.done_tasks.iter_mut())
            .find(|t| t.id == id)
    }

    fn sort_active(&mut self) {
        sort_tasks(&mut self.tasks);
    }
}

fn position(tasks: &[Task], id: TaskId) -> Option<usize> {
    tasks.iter().position(|t| t.id == id)
}

/// Sort by priority (highest first), then newest first.
///
/// Equal timestamps fall back to the higher id, so the order depends only on
/// the tasks themselves and a re-inserted task lands where it was.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| (Reverse(t.priority), Reverse(t.created_at), Reverse(t.id)));
}
