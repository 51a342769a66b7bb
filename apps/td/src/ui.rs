//! UI rendering for td.

use crate::app::{App, Mode};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use td_core::{Priority, Task};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(f.area());

    draw_task_list(f, app, chunks[0]);
    draw_status_bar(f, app, chunks[1]);

    match app.mode {
        Mode::Add | Mode::Edit => draw_input_dialog(f, app),
        Mode::Help => draw_help(f, app),
        Mode::Normal | Mode::DoneList => {}
    }
}

fn draw_task_list(f: &mut Frame, app: &App, area: Rect) {
    let done_list = app.list_mode() == Mode::DoneList;
    let tasks = app.visible_tasks();

    let title = if done_list {
        " Your Completed Tasks ".to_string()
    } else {
        format!(" Your Tasks [{}] ", app.filter.label())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(app.config.theme.primary()));

    if tasks.is_empty() {
        let empty = if done_list {
            "You have no completed tasks."
        } else {
            "You have no tasks. Press ? for help."
        };
        f.render_widget(
            Paragraph::new(empty)
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| ListItem::new(task_line(app, task)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(app.config.theme.primary())
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(app.cursor));
    f.render_stateful_widget(list, area, &mut state);
}

fn task_line<'a>(app: &App, task: &'a Task) -> Line<'a> {
    let theme = &app.config.theme;
    let priority_style = match task.priority {
        Priority::High => Style::default().fg(theme.high()),
        Priority::Medium => Style::default().fg(theme.medium()),
        Priority::Low => Style::default().fg(theme.low()),
        Priority::None => Style::default().fg(Color::DarkGray),
    };
    let name_style = if task.is_done {
        Style::default().add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::styled(format!("#{} ", task.id), Style::default().fg(Color::DarkGray)),
        Span::styled(task.priority.symbol(), priority_style),
        Span::raw(" "),
        Span::styled(task.name.as_str(), name_style),
        Span::styled(
            format!(" ({})", task.created_at.format(TIME_FORMAT)),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let stats = app.tasks.stats();
    let high = stats.by_priority.get(&Priority::High).copied().unwrap_or(0);
    let unsaved = if app.has_unsaved_changes() { " *" } else { "" };
    let summary = format!(
        "{} | Active: {} | Done: {} | High: {}{}",
        app.mode.label(),
        stats.active,
        stats.done,
        high,
        unsaved
    );
    f.render_widget(
        Paragraph::new(summary).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    let msg = app
        .message
        .clone()
        .unwrap_or_else(|| format!("{} | ? for help | q to quit", app.location()));
    f.render_widget(
        Paragraph::new(msg).block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );
}

fn draw_input_dialog(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, area);

    let title = format!(" {} ", app.mode.label());
    let input = Paragraph::new(format!("{}_", app.input))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(" enter: save | esc: cancel "),
        )
        .style(Style::default().fg(app.config.theme.primary()))
        .wrap(Wrap { trim: false });

    f.render_widget(input, area);
}

fn draw_help(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 80, f.area());
    f.render_widget(Clear, area);

    let mut lines = Vec::new();
    for (title, bindings) in app.keys.help_sections() {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            title,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )));
        for binding in bindings {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:<14}", binding.keys_label()),
                    Style::default().fg(Color::LightBlue),
                ),
                Span::raw(binding.help()),
            ]));
        }
    }

    let help = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Help "));
    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
