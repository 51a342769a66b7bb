//! Key notation parsing and the resolved key map.

use crate::config::KeymapConfig;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;
use td_core::Priority;

/// A single key plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(key: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn key(key: KeyCode) -> Self {
        Self::new(key, KeyModifiers::NONE)
    }

    #[cfg(test)]
    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c.to_ascii_lowercase()), KeyModifiers::CONTROL)
    }

    /// Check a crossterm event against this binding.
    ///
    /// Shift is ignored for character keys: terminals report `C` and `?`
    /// with or without it.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        if self.key != event.code {
            return false;
        }
        match self.key {
            KeyCode::Char(_) => {
                self.modifiers - KeyModifiers::SHIFT == event.modifiers - KeyModifiers::SHIFT
            }
            _ => self.modifiers == event.modifiers,
        }
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "alt+")?;
        }
        match self.key {
            KeyCode::Char(' ') => write!(f, "space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Enter => write!(f, "enter"),
            KeyCode::Esc => write!(f, "esc"),
            KeyCode::Tab => write!(f, "tab"),
            KeyCode::BackTab => write!(f, "shift+tab"),
            KeyCode::Backspace => write!(f, "backspace"),
            KeyCode::Delete => write!(f, "del"),
            KeyCode::Up => write!(f, "↑"),
            KeyCode::Down => write!(f, "↓"),
            KeyCode::Left => write!(f, "←"),
            KeyCode::Right => write!(f, "→"),
            KeyCode::Home => write!(f, "home"),
            KeyCode::End => write!(f, "end"),
            KeyCode::PageUp => write!(f, "pgup"),
            KeyCode::PageDown => write!(f, "pgdn"),
            KeyCode::F(n) => write!(f, "f{n}"),
            _ => write!(f, "?"),
        }
    }
}

/// Error parsing a key notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownModifier(String),
    UnknownKey(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty key notation"),
            Self::UnknownModifier(m) => write!(f, "unknown modifier: {m}"),
            Self::UnknownKey(k) => write!(f, "unknown key: {k}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a key notation such as `"a"`, `"C"`, `"ctrl+u"`, `"C-r"`, `"<C-r>"`,
/// `"enter"`, `"esc"` or `"f5"`.
///
/// Single characters keep their case, so `"C"` and `"c"` are different keys.
pub fn parse_key(s: &str) -> Result<KeyBinding, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::Empty);
    }
    let s = s
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(s);

    let mut parts: Vec<&str> = if s.len() > 1 && s.contains('+') {
        s.split('+').collect()
    } else if s.len() > 2 && s.contains('-') {
        s.split('-').collect()
    } else {
        vec![s]
    };

    let mut modifiers = KeyModifiers::NONE;
    while parts.len() > 1 {
        let modifier = parts.remove(0).to_lowercase();
        match modifier.as_str() {
            "ctrl" | "control" | "c" => modifiers |= KeyModifiers::CONTROL,
            "alt" | "option" | "a" | "m" => modifiers |= KeyModifiers::ALT,
            "shift" | "s" => modifiers |= KeyModifiers::SHIFT,
            _ => return Err(ParseError::UnknownModifier(modifier)),
        }
    }

    let raw = parts[0];
    let mut chars = raw.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        // ctrl+U and ctrl+u are the same key to a terminal.
        let c = if modifiers.contains(KeyModifiers::CONTROL) {
            c.to_ascii_lowercase()
        } else {
            c
        };
        return Ok(KeyBinding::new(KeyCode::Char(c), modifiers));
    }

    let lower = raw.to_lowercase();
    let key = match lower.as_str() {
        "enter" | "return" | "cr" => KeyCode::Enter,
        "escape" | "esc" => KeyCode::Esc,
        "tab" if modifiers.contains(KeyModifiers::SHIFT) => KeyCode::BackTab,
        "tab" => KeyCode::Tab,
        "backspace" | "bs" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "space" => KeyCode::Char(' '),
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" | "pgup" => KeyCode::PageUp,
        "pagedown" | "pgdn" | "pgdown" => KeyCode::PageDown,
        f if f.len() > 1 && f.starts_with('f') => match f[1..].parse::<u8>() {
            Ok(n @ 1..=12) => KeyCode::F(n),
            _ => return Err(ParseError::UnknownKey(lower)),
        },
        _ => return Err(ParseError::UnknownKey(lower)),
    };

    Ok(KeyBinding::new(key, modifiers))
}

/// What a key press asks the UI to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Add,
    Delete,
    Edit,
    Enter,
    Escape,
    Up,
    Down,
    Left,
    ListType,
    Help,
    Quit,
    CyclePriority,
    SetPriority(Priority),
    Filter,
    Undo,
    Redo,
    ClearCompleted,
    Home,
    End,
}

/// One command's keys and the label shown in the help screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    keys: Vec<KeyBinding>,
    help: &'static str,
}

impl Binding {
    fn new(keys: Vec<KeyBinding>, help: &'static str) -> Self {
        Self { keys, help }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.keys.iter().any(|k| k.matches(event))
    }

    pub fn help(&self) -> &'static str {
        self.help
    }

    /// Keys joined for display, e.g. `↑/k`.
    pub fn keys_label(&self) -> String {
        self.keys
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Every command the UI understands, resolved from [`KeymapConfig`].
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub add: Binding,
    pub delete: Binding,
    pub edit: Binding,
    pub enter: Binding,
    pub escape: Binding,
    pub up: Binding,
    pub down: Binding,
    pub left: Binding,
    pub right: Binding,
    pub list_type: Binding,
    pub help: Binding,
    pub quit: Binding,
    pub priority: Binding,
    pub filter: Binding,
    pub undo: Binding,
    pub redo: Binding,
    pub clear_completed: Binding,
    pub priority_none: Binding,
    pub priority_low: Binding,
    pub priority_medium: Binding,
    pub priority_high: Binding,
    pub home: Binding,
    pub end: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::from_config(&KeymapConfig::default())
    }
}

impl KeyMap {
    /// Resolve configured notations, adding the fixed vim-style aliases.
    ///
    /// Empty or unparsable entries fall back to the default binding.
    pub fn from_config(cfg: &KeymapConfig) -> Self {
        let defaults = KeymapConfig::default();
        let bind = |name: &str, value: &str, fallback: &str, extra: &[&str], help| {
            let primary = resolve(name, value, fallback);
            let mut keys = vec![primary];
            keys.extend(extra.iter().filter_map(|s| parse_key(s).ok()));
            keys.dedup();
            Binding::new(keys, help)
        };
        let fixed = |keys: &[&str], help| {
            Binding::new(keys.iter().filter_map(|s| parse_key(s).ok()).collect(), help)
        };

        Self {
            add: bind("add", &cfg.add, &defaults.add, &[], "add new task"),
            delete: bind("delete", &cfg.delete, &defaults.delete, &[], "delete task"),
            edit: bind("edit", &cfg.edit, &defaults.edit, &[], "edit task name"),
            enter: bind("enter", &cfg.enter, &defaults.enter, &[], "mark done/undone"),
            escape: bind("escape", &cfg.escape, &defaults.escape, &[], "back/cancel"),
            up: bind("up", &cfg.up, &defaults.up, &["k"], "move up"),
            down: bind("down", &cfg.down, &defaults.down, &["j"], "move down"),
            left: bind("left", &cfg.left, &defaults.left, &["h"], "back to tasks"),
            right: bind("right", &cfg.right, &defaults.right, &["l"], "edit task name"),
            list_type: bind(
                "list_type",
                &cfg.list_type,
                &defaults.list_type,
                &["tab"],
                "toggle tasks view",
            ),
            help: bind("help", &cfg.help, &defaults.help, &[], "show/hide help"),
            quit: bind("quit", &cfg.quit, &defaults.quit, &["ctrl+c"], "quit"),
            priority: bind(
                "priority",
                &cfg.priority,
                &defaults.priority,
                &[],
                "cycle priority",
            ),
            filter: bind("filter", &cfg.filter, &defaults.filter, &[], "filter by priority"),
            undo: bind("undo", &cfg.undo, &defaults.undo, &[], "undo"),
            redo: bind("redo", &cfg.redo, &defaults.redo, &[], "redo"),
            clear_completed: bind(
                "clear_completed",
                &cfg.clear_completed,
                &defaults.clear_completed,
                &[],
                "clear completed tasks",
            ),
            priority_none: fixed(&["1"], "set no priority"),
            priority_low: fixed(&["2"], "set low priority"),
            priority_medium: fixed(&["3"], "set medium priority"),
            priority_high: fixed(&["4"], "set high priority"),
            home: fixed(&["home", "g"], "go to top"),
            end: fixed(&["end", "G"], "go to bottom"),
        }
    }

    /// The command bound to `event`, if any. Earlier entries win conflicts.
    pub fn command(&self, event: &KeyEvent) -> Option<Command> {
        let table = [
            (&self.undo, Command::Undo),
            (&self.redo, Command::Redo),
            (&self.quit, Command::Quit),
            (&self.enter, Command::Enter),
            (&self.escape, Command::Escape),
            (&self.up, Command::Up),
            (&self.down, Command::Down),
            (&self.left, Command::Left),
            (&self.right, Command::Edit),
            (&self.edit, Command::Edit),
            (&self.add, Command::Add),
            (&self.delete, Command::Delete),
            (&self.list_type, Command::ListType),
            (&self.help, Command::Help),
            (&self.priority, Command::CyclePriority),
            (&self.filter, Command::Filter),
            (&self.clear_completed, Command::ClearCompleted),
            (&self.priority_none, Command::SetPriority(Priority::None)),
            (&self.priority_low, Command::SetPriority(Priority::Low)),
            (&self.priority_medium, Command::SetPriority(Priority::Medium)),
            (&self.priority_high, Command::SetPriority(Priority::High)),
            (&self.home, Command::Home),
            (&self.end, Command::End),
        ];
        table
            .into_iter()
            .find(|(binding, _)| binding.matches(event))
            .map(|(_, command)| command)
    }

    /// Help screen sections: title and the bindings listed under it.
    pub fn help_sections(&self) -> Vec<(&'static str, Vec<&Binding>)> {
        vec![
            (
                "Task Management",
                vec![&self.add, &self.delete, &self.enter, &self.edit, &self.clear_completed],
            ),
            (
                "Navigation",
                vec![&self.up, &self.down, &self.home, &self.end, &self.list_type, &self.escape],
            ),
            (
                "Priority",
                vec![
                    &self.priority,
                    &self.priority_none,
                    &self.priority_low,
                    &self.priority_medium,
                    &self.priority_high,
                    &self.filter,
                ],
            ),
            ("General", vec![&self.undo, &self.redo, &self.help, &self.quit]),
        ]
    }
}

fn resolve(name: &str, value: &str, fallback: &str) -> KeyBinding {
    let value = if value.trim().is_empty() { fallback } else { value };
    parse_key(value).unwrap_or_else(|err| {
        tracing::warn!(key = name, value, error = %err, "invalid key binding, using default");
        parse_key(fallback).unwrap_or(KeyBinding::key(KeyCode::Null))
    })
}
