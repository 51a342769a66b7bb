//! Application state and logic.

use crate::config::Config;
use crate::keymap::{Command, KeyMap};
use anyhow::Context;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use td_core::storage::TaskRepository;
use td_core::validation::{sanitize_task_name, validate_task_name};
use td_core::{Action, Priority, Task, TaskId, TaskManager, UndoManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    DoneList,
    Add,
    Edit,
    Help,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "Normal",
            Mode::DoneList => "Completed Tasks",
            Mode::Add => "Add Task",
            Mode::Edit => "Edit Task",
            Mode::Help => "Help",
        }
    }
}

/// Priority filter applied to the active list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Only(Priority),
}

impl Filter {
    /// All, None, Low, Medium, High, then back to All.
    pub fn next(&self) -> Filter {
        match self {
            Filter::All => Filter::Only(Priority::None),
            Filter::Only(Priority::High) => Filter::All,
            Filter::Only(p) => Filter::Only(p.next()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Only(Priority::None) => "None",
            Filter::Only(Priority::Low) => "Low Priority",
            Filter::Only(Priority::Medium) => "Medium Priority",
            Filter::Only(Priority::High) => "High Priority",
        }
    }
}

pub struct App {
    pub tasks: TaskManager,
    pub undo: UndoManager,
    pub config: Config,
    pub keys: KeyMap,
    pub mode: Mode,
    pub filter: Filter,
    /// Index into [`App::visible_tasks`].
    pub cursor: usize,
    pub input: String,
    pub message: Option<String>,
    pub should_quit: bool,
    repo: Box<dyn TaskRepository>,
    editing: Option<TaskId>,
    help_return: Mode,
    dirty: bool,
    /// The stored data could not be loaded; copy it aside before the first
    /// save replaces it.
    backup_pending: bool,
}

impl App {
    /// Load tasks from `repo`. A failed load is reported in the message bar
    /// and the app starts empty; the unreadable data is backed up before it
    /// is first overwritten.
    pub fn new(config: Config, repo: Box<dyn TaskRepository>) -> Self {
        let (tasks, message, backup_pending) = match repo.load_tasks() {
            Ok(loaded) => (loaded.into_manager(), None, false),
            Err(e) => {
                tracing::error!(location = %repo.describe(), error = %e, "failed to load tasks");
                (
                    TaskManager::default(),
                    Some(format!("Could not load tasks: {e}")),
                    true,
                )
            }
        };

        Self {
            tasks,
            undo: UndoManager::new(config.undo.max_size),
            keys: KeyMap::from_config(&config.keymap),
            config,
            mode: Mode::Normal,
            filter: Filter::All,
            cursor: 0,
            input: String::new(),
            message,
            should_quit: false,
            repo,
            editing: None,
            help_return: Mode::Normal,
            dirty: false,
            backup_pending,
        }
    }

    /// Where tasks are stored, for the status bar.
    pub fn location(&self) -> String {
        self.repo.describe()
    }

    /// Tasks shown in the current list, in display order.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        match self.list_mode() {
            Mode::DoneList => self.tasks.done_tasks().iter().collect(),
            _ => match self.filter {
                Filter::All => self.tasks.tasks().iter().collect(),
                Filter::Only(priority) => self.tasks.tasks_with_priority(priority),
            },
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.cursor).copied()
    }

    /// The list underneath any overlay.
    pub fn list_mode(&self) -> Mode {
        match self.mode {
            Mode::Help => self.help_return,
            Mode::Add | Mode::Edit => Mode::Normal,
            mode => mode,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Write both collections to the repository.
    pub fn save(&mut self) -> anyhow::Result<()> {
        if self.backup_pending {
            let backup = self
                .repo
                .backup()
                .with_context(|| format!("failed to back up {}", self.repo.describe()))?;
            if let Some(backup) = backup {
                tracing::warn!(backup = %backup, "unreadable tasks backed up before saving");
            }
            self.backup_pending = false;
        }
        self.repo
            .save_tasks(self.tasks.tasks(), self.tasks.done_tasks())
            .with_context(|| format!("failed to save tasks to {}", self.repo.describe()))?;
        self.dirty = false;
        Ok(())
    }

    /// Save if anything changed since the last save, then release the
    /// repository.
    pub fn shutdown(&mut self) -> anyhow::Result<()> {
        if self.dirty {
            self.save()?;
        }
        self.repo.close()?;
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.message = None;
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::DoneList => self.handle_done_key(key),
            Mode::Add | Mode::Edit => self.handle_input_key(key),
            Mode::Help => self.handle_help_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        let Some(command) = self.keys.command(&key) else {
            return;
        };
        match command {
            Command::Up => self.move_cursor(-1),
            Command::Down => self.move_cursor(1),
            Command::Home => self.cursor = 0,
            Command::End => self.jump_to_end(),
            Command::Add => {
                self.input.clear();
                self.mode = Mode::Add;
            }
            Command::Edit => self.start_edit(),
            Command::Enter => self.complete_selected(),
            Command::Delete => self.delete_selected(),
            Command::CyclePriority => {
                if let Some(next) = self.selected_task().map(|t| t.priority.next()) {
                    self.set_selected_priority(next);
                }
            }
            Command::SetPriority(priority) => self.set_selected_priority(priority),
            Command::Filter => {
                self.filter = self.filter.next();
                self.cursor = 0;
                self.message = Some(format!("Filter: {}", self.filter.label()));
            }
            Command::ListType => self.switch_list(Mode::DoneList),
            Command::ClearCompleted => self.clear_completed(),
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::Help => self.open_help(),
            Command::Quit => self.should_quit = true,
            Command::Escape | Command::Left => {}
        }
    }

    fn handle_done_key(&mut self, key: KeyEvent) {
        let Some(command) = self.keys.command(&key) else {
            return;
        };
        match command {
            Command::Up => self.move_cursor(-1),
            Command::Down => self.move_cursor(1),
            Command::Home => self.cursor = 0,
            Command::End => self.jump_to_end(),
            Command::Enter => self.uncomplete_selected(),
            Command::Delete => self.delete_selected(),
            Command::ClearCompleted => self.clear_completed(),
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::Escape | Command::Left | Command::ListType => self.switch_list(Mode::Normal),
            Command::Help => self.open_help(),
            Command::Quit => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if self.keys.escape.matches(&key) || (ctrl && key.code == KeyCode::Char('c')) {
            self.cancel_input();
            return;
        }
        if self.keys.enter.matches(&key) {
            self.commit_input();
            return;
        }
        if self.keys.undo.matches(&key) {
            self.cancel_input();
            self.undo();
            return;
        }
        if self.keys.redo.matches(&key) {
            self.cancel_input();
            self.redo();
            return;
        }
        match key.code {
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.input.push(c);
            }
            _ => {}
        }
    }

    fn handle_help_key(&mut self, key: KeyEvent) {
        if self.keys.help.matches(&key)
            || self.keys.quit.matches(&key)
            || self.keys.escape.matches(&key)
        {
            self.mode = self.help_return;
        }
    }

    fn open_help(&mut self) {
        self.help_return = self.mode;
        self.mode = Mode::Help;
    }

    fn switch_list(&mut self, mode: Mode) {
        self.mode = mode;
        self.cursor = 0;
    }

    fn start_edit(&mut self) {
        if let Some((id, name)) = self.selected_task().map(|t| (t.id, t.name.clone())) {
            self.editing = Some(id);
            self.input = name;
            self.mode = Mode::Edit;
        }
    }

    fn cancel_input(&mut self) {
        self.input.clear();
        self.editing = None;
        self.mode = Mode::Normal;
    }

    fn commit_input(&mut self) {
        let name = sanitize_task_name(&self.input);
        if let Err(e) = validate_task_name(&name) {
            self.message = Some(e.to_string());
            return;
        }

        match (self.mode, self.editing) {
            (Mode::Add, _) => {
                let task = self.tasks.add_task(&name);
                let id = task.id;
                self.record(Action::Add { task });
                self.follow(id);
            }
            (Mode::Edit, Some(id)) => {
                let old_name = self.tasks.find_task_by_id(id).map(|t| t.name.clone());
                if let Some(old_name) = old_name.filter(|old| *old != name) {
                    if let Some(task) = self.tasks.update_task_name(id, &name) {
                        self.record(Action::Edit {
                            task,
                            old_name,
                            new_name: name,
                        });
                    }
                }
            }
            _ => {}
        }
        self.cancel_input();
    }

    fn complete_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id) else {
            return;
        };
        if let Some(task) = self.tasks.complete_task(id) {
            self.record(Action::Complete { task });
        }
        self.clamp_cursor();
    }

    fn uncomplete_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id) else {
            return;
        };
        let Some(done_index) = self.tasks.done_index(id) else {
            return;
        };
        if let Some(task) = self.tasks.uncomplete_task(id) {
            self.record(Action::Uncomplete { task, done_index });
        }
        self.clamp_cursor();
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id) else {
            return;
        };
        let done_index = self.tasks.done_index(id);
        if let Some(task) = self.tasks.delete_task(id) {
            self.message = Some(format!("Deleted \"{}\"", task.name));
            self.record(Action::Delete { task, done_index });
        }
        self.clamp_cursor();
    }

    fn set_selected_priority(&mut self, priority: Priority) {
        let Some((id, old)) = self.selected_task().map(|t| (t.id, t.priority)) else {
            return;
        };
        if old == priority {
            return;
        }
        if let Some(task) = self.tasks.set_task_priority(id, priority) {
            self.record(Action::Priority {
                task,
                old,
                new: priority,
            });
            self.follow(id);
        }
    }

    fn clear_completed(&mut self) {
        let cleared = self.tasks.clear_done();
        if cleared.is_empty() {
            return;
        }
        self.message = Some(format!("Cleared {} completed tasks", cleared.len()));
        self.record(Action::delete_all(cleared));
        self.clamp_cursor();
    }

    fn undo(&mut self) {
        let label = self.undo.peek_undo().map(|a| a.kind().label());
        if self.undo.undo(&mut self.tasks) {
            self.message = label.map(|l| format!("Undid {l}"));
            self.changed();
        } else {
            self.message = Some("Nothing to undo".to_string());
        }
        self.clamp_cursor();
    }

    fn redo(&mut self) {
        let label = self.undo.peek_redo().map(|a| a.kind().label());
        if self.undo.redo(&mut self.tasks) {
            self.message = label.map(|l| format!("Redid {l}"));
            self.changed();
        } else {
            self.message = Some("Nothing to redo".to_string());
        }
        self.clamp_cursor();
    }

    fn record(&mut self, action: Action) {
        self.undo.push_undo(action);
        self.changed();
    }

    fn changed(&mut self) {
        self.dirty = true;
        if self.config.autosave {
            if let Err(e) = self.save() {
                tracing::error!(error = %e, "autosave failed");
                self.message = Some(format!("{e:#}"));
            }
        }
    }

    /// Put the cursor on `id` if it is visible, else keep it in range.
    fn follow(&mut self, id: TaskId) {
        let pos = self.visible_tasks().iter().position(|t| t.id == id);
        if let Some(pos) = pos {
            self.cursor = pos;
        }
        self.clamp_cursor();
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.visible_tasks().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    fn jump_to_end(&mut self) {
        let len = self.visible_tasks().len();
        self.cursor = len.saturating_sub(1);
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible_tasks().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }
}
