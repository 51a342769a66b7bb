//! Undo/redo log for task store mutations.

use crate::manager::TaskManager;
use crate::models::{Priority, Task, TaskId};
use std::collections::VecDeque;

/// Default maximum undo stack size.
pub const DEFAULT_MAX_UNDO_SIZE: usize = 100;

/// The kind of a recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Add,
    Delete,
    Complete,
    Uncomplete,
    Edit,
    Priority,
    Batch,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Add => "add",
            ActionKind::Delete => "delete",
            ActionKind::Complete => "complete",
            ActionKind::Uncomplete => "uncomplete",
            ActionKind::Edit => "edit",
            ActionKind::Priority => "priority",
            ActionKind::Batch => "batch",
        }
    }
}

/// A reversible mutation of the task store.
///
/// `task` is the task as it was right after the mutation. Edit and Priority
/// carry both sides of the change so the action can be replayed either way.
/// `done_index` is where the task sat in the done list before it left it;
/// undo puts it back there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add {
        task: Task,
    },
    Delete {
        task: Task,
        done_index: Option<usize>,
    },
    Complete {
        task: Task,
    },
    Uncomplete {
        task: Task,
        done_index: usize,
    },
    Edit {
        task: Task,
        old_name: String,
        new_name: String,
    },
    Priority {
        task: Task,
        old: Priority,
        new: Priority,
    },
    /// Several actions applied as one step, in order.
    Batch(Vec<Action>),
}

impl Action {
    /// A batch deleting every task in `tasks`, as produced by clearing the
    /// done list.
    ///
    /// Children are recorded last-to-first, so undo re-inserts the tasks in
    /// their original list order.
    pub fn delete_all(tasks: Vec<Task>) -> Self {
        Action::Batch(
            tasks
                .into_iter()
                .enumerate()
                .rev()
                .map(|(index, task)| Action::Delete {
                    task,
                    done_index: Some(index),
                })
                .collect(),
        )
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Add { .. } => ActionKind::Add,
            Action::Delete { .. } => ActionKind::Delete,
            Action::Complete { .. } => ActionKind::Complete,
            Action::Uncomplete { .. } => ActionKind::Uncomplete,
            Action::Edit { .. } => ActionKind::Edit,
            Action::Priority { .. } => ActionKind::Priority,
            Action::Batch(_) => ActionKind::Batch,
        }
    }

    /// Id of the affected task; `None` for batches.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Action::Add { task }
            | Action::Delete { task, .. }
            | Action::Complete { task }
            | Action::Uncomplete { task, .. }
            | Action::Edit { task, .. }
            | Action::Priority { task, .. } => Some(task.id),
            Action::Batch(_) => None,
        }
    }
}

/// Bounded undo and redo stacks.
#[derive(Debug, Clone)]
pub struct UndoManager {
    undo_stack: VecDeque<Action>,
    redo_stack: Vec<Action>,
    max_size: usize,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_SIZE)
    }
}

impl UndoManager {
    /// Create a manager keeping at most `max_size` undo entries.
    /// Zero falls back to [`DEFAULT_MAX_UNDO_SIZE`].
    pub fn new(max_size: usize) -> Self {
        let max_size = if max_size == 0 {
            DEFAULT_MAX_UNDO_SIZE
        } else {
            max_size
        };
        Self {
            undo_stack: VecDeque::with_capacity(max_size),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Record a fresh action. Invalidates the redo history.
    pub fn push_undo(&mut self, action: Action) {
        tracing::trace!(kind = action.kind().label(), "push undo");
        self.redo_stack.clear();
        self.push_bounded(action);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The action the next `undo` would reverse.
    pub fn peek_undo(&self) -> Option<&Action> {
        self.undo_stack.back()
    }

    /// The action the next `redo` would re-apply.
    pub fn peek_redo(&self) -> Option<&Action> {
        self.redo_stack.last()
    }

    /// Reverse the most recent action. Returns false if there is nothing to undo.
    pub fn undo(&mut self, tm: &mut TaskManager) -> bool {
        let Some(action) = self.undo_stack.pop_back() else {
            return false;
        };
        tracing::debug!(kind = action.kind().label(), "undo");
        apply_inverse(&action, tm);
        self.redo_stack.push(action);
        true
    }

    /// Re-apply the most recently undone action. Returns false if there is
    /// nothing to redo.
    ///
    /// The undo entry recorded for the replay is rebuilt from the store's
    /// current state rather than copied from the undone action.
    pub fn redo(&mut self, tm: &mut TaskManager) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            return false;
        };
        tracing::debug!(kind = action.kind().label(), "redo");
        if let Some(undo) = apply_forward(&action, tm) {
            self.push_bounded(undo);
        }
        true
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push_bounded(&mut self, action: Action) {
        self.undo_stack.push_back(action);
        while self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
        }
    }
}

fn apply_inverse(action: &Action, tm: &mut TaskManager) {
    let applied = match action {
        Action::Add { task } => tm.delete_task(task.id).is_some(),
        Action::Delete { task, done_index } => tm.restore_task_at(task.clone(), *done_index),
        Action::Complete { task } => tm.uncomplete_task(task.id).is_some(),
        Action::Uncomplete { task, done_index } => {
            tm.complete_task_at(task.id, Some(*done_index)).is_some()
        }
        Action::Edit { task, old_name, .. } => tm.update_task_name(task.id, old_name).is_some(),
        Action::Priority { task, old, .. } => tm.set_task_priority(task.id, *old).is_some(),
        Action::Batch(actions) => {
            for child in actions.iter().rev() {
                apply_inverse(child, tm);
            }
            true
        }
    };
    if !applied {
        tracing::warn!(
            kind = action.kind().label(),
            id = action.task_id(),
            "undo target missing, skipped"
        );
    }
}

/// Re-apply `action` and build the undo entry describing what just happened.
fn apply_forward(action: &Action, tm: &mut TaskManager) -> Option<Action> {
    let undo = match action {
        Action::Add { task } => {
            let mut task = task.clone();
            task.is_done = false;
            tm.restore_task(task.clone()).then_some(Action::Add { task })
        }
        Action::Delete { task, .. } => {
            let done_index = tm.done_index(task.id);
            tm.delete_task(task.id)
                .map(|task| Action::Delete { task, done_index })
        }
        Action::Complete { task } => tm.complete_task(task.id).map(|task| Action::Complete { task }),
        Action::Uncomplete { task, .. } => tm.done_index(task.id).and_then(|done_index| {
            tm.uncomplete_task(task.id)
                .map(|task| Action::Uncomplete { task, done_index })
        }),
        Action::Edit { task, new_name, .. } => {
            let current = tm.find_task_by_id(task.id).map(|t| t.name.clone());
            current.and_then(|old_name| {
                tm.update_task_name(task.id, new_name).map(|task| Action::Edit {
                    task,
                    old_name,
                    new_name: new_name.clone(),
                })
            })
        }
        Action::Priority { task, new, .. } => {
            let current = tm.find_task_by_id(task.id).map(|t| t.priority);
            current.and_then(|old| {
                tm.set_task_priority(task.id, *new).map(|task| Action::Priority {
                    task,
                    old,
                    new: *new,
                })
            })
        }
        Action::Batch(actions) => {
            let redone: Vec<Action> = actions
                .iter()
                .filter_map(|child| apply_forward(child, tm))
                .collect();
            (!redone.is_empty()).then_some(Action::Batch(redone))
        }
    };
    if undo.is_none() {
        tracing::warn!(
            kind = action.kind().label(),
            id = action.task_id(),
            "redo target missing, skipped"
        );
    }
    undo
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tm: &TaskManager) -> (Vec<Task>, Vec<Task>) {
        (tm.tasks().to_vec(), tm.done_tasks().to_vec())
    }

    fn names(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
    }

    /// Store with three active tasks, one of them High.
    fn seeded() -> TaskManager {
        let mut tm = TaskManager::default();
        tm.add_task("A");
        tm.add_task("B");
        tm.add_task("C");
        tm.set_task_priority(2, Priority::High);
        tm
    }

    /// Check undo restores `before`, redo restores `after`, and that the
    /// cycle can be repeated.
    fn assert_round_trip(tm: &mut TaskManager, um: &mut UndoManager, before: &(Vec<Task>, Vec<Task>)) {
        let after = snapshot(tm);

        assert!(um.undo(tm));
        assert_eq!(&snapshot(tm), before);
        assert!(um.redo(tm));
        assert_eq!(snapshot(tm), after);
        assert!(um.undo(tm));
        assert_eq!(&snapshot(tm), before);
        assert!(um.redo(tm));
        assert_eq!(snapshot(tm), after);
    }

    #[test]
    fn test_empty_stacks_report_false() {
        let mut tm = TaskManager::default();
        let mut um = UndoManager::default();
        assert!(!um.can_undo());
        assert!(!um.can_redo());
        assert!(!um.undo(&mut tm));
        assert!(!um.redo(&mut tm));
    }

    #[test]
    fn test_zero_size_uses_default() {
        assert_eq!(UndoManager::new(0).max_size(), DEFAULT_MAX_UNDO_SIZE);
    }

    #[test]
    fn test_round_trip_add() {
        let mut tm = seeded();
        let mut um = UndoManager::default();
        let before = snapshot(&tm);
        let task = tm.add_task("D");
        um.push_undo(Action::Add { task });
        assert_round_trip(&mut tm, &mut um, &before);
    }

    #[test]
    fn test_round_trip_delete_active() {
        let mut tm = seeded();
        let mut um = UndoManager::default();
        let before = snapshot(&tm);
        let task = tm.delete_task(1).unwrap();
        um.push_undo(Action::Delete {
            task,
            done_index: None,
        });
        assert_round_trip(&mut tm, &mut um, &before);
    }

    #[test]
    fn test_round_trip_delete_done() {
        let mut tm = seeded();
        tm.complete_task(3);
        let mut um = UndoManager::default();
        let before = snapshot(&tm);
        let done_index = tm.done_index(3);
        let task = tm.delete_task(3).unwrap();
        um.push_undo(Action::Delete { task, done_index });
        assert_round_trip(&mut tm, &mut um, &before);
        assert!(tm.find_task_by_id(3).is_none());
        um.undo(&mut tm);
        assert!(tm.find_task_by_id(3).unwrap().is_done);
    }

    #[test]
    fn test_round_trip_complete() {
        let mut tm = seeded();
        let mut um = UndoManager::default();
        let before = snapshot(&tm);
        let task = tm.complete_task(2).unwrap();
        um.push_undo(Action::Complete { task });
        assert_round_trip(&mut tm, &mut um, &before);
    }

    #[test]
    fn test_round_trip_uncomplete() {
        let mut tm = seeded();
        tm.complete_task(1);
        let mut um = UndoManager::default();
        let before = snapshot(&tm);
        let task = tm.uncomplete_task(1).unwrap();
        um.push_undo(Action::Uncomplete { task, done_index: 0 });
        assert_round_trip(&mut tm, &mut um, &before);
    }

    /// Store whose done list is A, B, C and whose active list is D.
    fn with_done_list() -> TaskManager {
        let mut tm = TaskManager::default();
        for name in ["A", "B", "C", "D"] {
            tm.add_task(name);
        }
        for id in 1..=3 {
            tm.complete_task(id);
        }
        tm
    }

    #[test]
    fn test_round_trip_delete_done_from_middle() {
        for id in [1, 2] {
            let mut tm = with_done_list();
            let mut um = UndoManager::default();
            let before = snapshot(&tm);
            let done_index = tm.done_index(id);
            let task = tm.delete_task(id).unwrap();
            um.push_undo(Action::Delete { task, done_index });
            assert_round_trip(&mut tm, &mut um, &before);
            um.undo(&mut tm);
            assert_eq!(names(tm.done_tasks()), vec!["A", "B", "C"]);
        }
    }

    #[test]
    fn test_round_trip_uncomplete_from_middle() {
        for id in [1, 2] {
            let mut tm = with_done_list();
            let mut um = UndoManager::default();
            let before = snapshot(&tm);
            let done_index = tm.done_index(id).unwrap();
            let task = tm.uncomplete_task(id).unwrap();
            um.push_undo(Action::Uncomplete { task, done_index });
            assert_round_trip(&mut tm, &mut um, &before);
            um.undo(&mut tm);
            assert_eq!(names(tm.done_tasks()), vec!["A", "B", "C"]);
        }
    }

    #[test]
    fn test_redo_records_current_done_index() {
        let mut tm = with_done_list();
        let mut um = UndoManager::default();
        let task = tm.uncomplete_task(3).unwrap();
        um.push_undo(Action::Uncomplete { task, done_index: 2 });
        um.undo(&mut tm);

        // Reorder the done list outside the log so C now sits first.
        let a = tm.uncomplete_task(1).unwrap();
        let b = tm.uncomplete_task(2).unwrap();
        tm.complete_task(a.id);
        tm.complete_task(b.id);
        assert_eq!(names(tm.done_tasks()), vec!["C", "A", "B"]);

        um.redo(&mut tm);
        match um.peek_undo() {
            Some(Action::Uncomplete { done_index, .. }) => assert_eq!(*done_index, 0),
            other => panic!("unexpected undo entry: {other:?}"),
        }
        um.undo(&mut tm);
        assert_eq!(names(tm.done_tasks()), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_round_trip_edit() {
        let mut tm = seeded();
        let mut um = UndoManager::default();
        let before = snapshot(&tm);
        let task = tm.update_task_name(1, "A renamed").unwrap();
        um.push_undo(Action::Edit {
            task,
            old_name: "A".to_string(),
            new_name: "A renamed".to_string(),
        });
        assert_round_trip(&mut tm, &mut um, &before);
    }

    #[test]
    fn test_round_trip_priority() {
        let mut tm = seeded();
        let mut um = UndoManager::default();
        let before = snapshot(&tm);
        let task = tm.set_task_priority(3, Priority::Medium).unwrap();
        um.push_undo(Action::Priority {
            task,
            old: Priority::None,
            new: Priority::Medium,
        });
        assert_round_trip(&mut tm, &mut um, &before);
    }

    #[test]
    fn test_round_trip_clear_done_batch() {
        let mut tm = seeded();
        tm.complete_task(1);
        tm.complete_task(3);
        let mut um = UndoManager::default();
        let before = snapshot(&tm);
        let cleared = tm.clear_done();
        um.push_undo(Action::delete_all(cleared));
        assert!(tm.done_tasks().is_empty());
        assert_round_trip(&mut tm, &mut um, &before);
    }

    #[test]
    fn test_push_clears_redo() {
        let mut tm = TaskManager::default();
        let mut um = UndoManager::default();
        let task = tm.add_task("A");
        um.push_undo(Action::Add { task });
        um.undo(&mut tm);
        assert!(um.can_redo());

        let task = tm.add_task("B");
        um.push_undo(Action::Add { task });
        assert!(!um.can_redo());
    }

    #[test]
    fn test_redo_keeps_remaining_redo_entries() {
        let mut tm = TaskManager::default();
        let mut um = UndoManager::default();
        for name in ["A", "B"] {
            let task = tm.add_task(name);
            um.push_undo(Action::Add { task });
        }
        um.undo(&mut tm);
        um.undo(&mut tm);
        assert_eq!(um.redo_len(), 2);
        um.redo(&mut tm);
        assert_eq!(um.redo_len(), 1);
        assert_eq!(um.undo_len(), 1);
        assert_eq!(names(tm.tasks()), vec!["A"]);
    }

    #[test]
    fn test_bounded_eviction() {
        let mut tm = TaskManager::default();
        let mut um = UndoManager::new(3);
        for i in 0..5 {
            let task = tm.add_task(&format!("T{i}"));
            um.push_undo(Action::Add { task });
        }
        assert_eq!(um.undo_len(), 3);
        // Oldest two evicted: the bottom entry is now T2.
        while um.undo(&mut tm) {}
        assert_eq!(tm.tasks().len(), 2);
        assert!(tm.tasks().iter().all(|t| t.name == "T0" || t.name == "T1"));
    }

    #[test]
    fn test_redo_recomputes_old_state() {
        let mut tm = TaskManager::default();
        let mut um = UndoManager::default();
        let a = tm.add_task("A");
        let task = tm.update_task_name(a.id, "B").unwrap();
        um.push_undo(Action::Edit {
            task,
            old_name: "A".to_string(),
            new_name: "B".to_string(),
        });
        um.undo(&mut tm);

        // Rename outside the log between undo and redo.
        tm.update_task_name(a.id, "Z");
        um.redo(&mut tm);
        assert_eq!(tm.find_task_by_id(a.id).unwrap().name, "B");

        match um.peek_undo() {
            Some(Action::Edit { old_name, new_name, .. }) => {
                assert_eq!(old_name, "Z");
                assert_eq!(new_name, "B");
            }
            other => panic!("unexpected undo entry: {other:?}"),
        }
        um.undo(&mut tm);
        assert_eq!(tm.find_task_by_id(a.id).unwrap().name, "Z");
    }

    #[test]
    fn test_redo_recomputes_old_priority() {
        let mut tm = TaskManager::default();
        let mut um = UndoManager::default();
        let a = tm.add_task("A");
        let task = tm.set_task_priority(a.id, Priority::High).unwrap();
        um.push_undo(Action::Priority {
            task,
            old: Priority::None,
            new: Priority::High,
        });
        um.undo(&mut tm);
        assert_eq!(tm.find_task_by_id(a.id).unwrap().priority, Priority::None);

        // Change the priority outside the log between undo and redo.
        tm.set_task_priority(a.id, Priority::Low);
        um.redo(&mut tm);
        assert_eq!(tm.find_task_by_id(a.id).unwrap().priority, Priority::High);

        match um.peek_undo() {
            Some(Action::Priority { old, new, .. }) => {
                assert_eq!(*old, Priority::Low);
                assert_eq!(*new, Priority::High);
            }
            other => panic!("unexpected undo entry: {other:?}"),
        }
        um.undo(&mut tm);
        assert_eq!(tm.find_task_by_id(a.id).unwrap().priority, Priority::Low);
    }

    #[test]
    fn test_missing_target_is_skipped() {
        let mut tm = TaskManager::default();
        let mut um = UndoManager::default();
        let a = tm.add_task("A");
        let task = tm.update_task_name(a.id, "A2").unwrap();
        um.push_undo(Action::Edit {
            task,
            old_name: "A".to_string(),
            new_name: "A2".to_string(),
        });

        tm.delete_task(a.id);
        assert!(um.undo(&mut tm));
        assert!(tm.tasks().is_empty());

        // Nothing to re-apply, so no undo entry is recorded.
        assert!(um.redo(&mut tm));
        assert!(!um.can_undo());
    }

    #[test]
    fn test_delete_then_undo_scenario() {
        let mut tm = TaskManager::default();
        let mut um = UndoManager::default();
        let a = tm.add_task("A");
        let b = tm.add_task("B");
        assert_eq!((a.id, b.id), (1, 2));
        let task = tm.set_task_priority(2, Priority::High).unwrap();
        um.push_undo(Action::Priority {
            task,
            old: Priority::None,
            new: Priority::High,
        });
        assert_eq!(names(tm.tasks()), vec!["B", "A"]);

        let task = tm.delete_task(1).unwrap();
        um.push_undo(Action::Delete {
            task,
            done_index: None,
        });
        assert_eq!(names(tm.tasks()), vec!["B"]);

        assert!(um.undo(&mut tm));
        assert_eq!(names(tm.tasks()), vec!["B", "A"]);
    }

    #[test]
    fn test_complete_undo_redo_scenario() {
        let mut tm = TaskManager::default();
        let mut um = UndoManager::default();
        let x = tm.add_task("X");
        assert_eq!(x.id, 1);
        let task = tm.complete_task(1).unwrap();
        um.push_undo(Action::Complete { task });
        assert_eq!(names(tm.done_tasks()), vec!["X"]);
        assert!(tm.tasks().is_empty());

        um.undo(&mut tm);
        assert_eq!(names(tm.tasks()), vec!["X"]);
        assert!(tm.done_tasks().is_empty());

        um.redo(&mut tm);
        assert_eq!(names(tm.done_tasks()), vec!["X"]);
        assert!(tm.tasks().is_empty());
    }
}
