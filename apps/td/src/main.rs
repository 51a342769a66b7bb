//! td - a terminal task list.
//!
//! Features:
//! - Active and completed lists with four priority levels
//! - Undo/redo for every change, including clearing completed tasks
//! - Priority filter and configurable key bindings
//! - JSON persistence with an optional checksummed format

mod app;
mod config;
mod keymap;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use config::Config;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs::OpenOptions, io, path::PathBuf, sync::Mutex, time::Duration};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "td", version, about = "A terminal task list")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Data file, overriding the config
    #[arg(short = 'f', long, value_name = "PATH")]
    data_file: Option<PathBuf>,

    /// Log file, overriding the default under the data directory
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_error) = match Config::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    if let Some(path) = cli.data_file {
        config.data_file = Some(path);
    }

    let log_path = cli.log_file.or_else(Config::default_log_path);
    init_logging(log_path.as_deref(), &config.log.level);
    if let Some(e) = config_error {
        tracing::warn!(error = format!("{e:#}"), "using default configuration");
    }

    let repo = td_core::storage::open_repository(&config.storage_config());
    tracing::info!(location = %repo.describe(), "starting td");
    let mut app = App::new(config, repo);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    finish(&mut app, result)?;
    tracing::info!("bye");
    Ok(())
}

/// Save the session whether or not the run loop failed, then report the
/// loop's error first.
fn finish(app: &mut App, run: Result<()>) -> Result<()> {
    let saved = app.shutdown().context("tasks were not saved");
    if let Err(e) = &run {
        tracing::error!(error = format!("{e:#}"), "run loop failed");
        if let Err(save_error) = &saved {
            tracing::error!(error = format!("{save_error:#}"), "save after failure also failed");
        }
    }
    run?;
    saved
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

/// Send `tracing` output to a file; the terminal belongs to the UI.
///
/// `TD_LOG` overrides `level`. Logging is disabled if the file cannot be
/// opened.
fn init_logging(path: Option<&std::path::Path>, level: &str) {
    let Some(path) = path else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };

    let filter = std::env::var("TD_LOG")
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(filter)
        .init();
}
