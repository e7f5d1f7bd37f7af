//! UI rendering functions for the TUI.
//!
//! Lays out the question input, the answer and sources panels, the disclaimer
//! sidebar, and the status and shortcut lines.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::app::{App, Focus, Status};
use crate::DISCLAIMER;

const SIDEBAR_WIDTH: u16 = 32;

/// Main rendering function for the TUI.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Question input
            Constraint::Min(0),    // Output + sidebar
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Shortcut bar
        ])
        .split(size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(SIDEBAR_WIDTH)])
        .split(main_chunks[1]);

    let output_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(content_chunks[0]);

    render_input(frame, app, main_chunks[0]);
    render_answer(frame, app, output_chunks[0]);
    render_sources(frame, app, output_chunks[1]);
    render_sidebar(frame, content_chunks[1]);
    render_status(frame, app, main_chunks[2]);
    render_shortcut_bar(frame, app, main_chunks[3]);
}

fn panel(title: &'static str, focused: bool) -> Block<'static> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style)
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = matches!(app.focus(), Focus::Input);

    let mut content = app.input().to_string();
    if is_focused {
        content.push('█');
    }

    let paragraph = Paragraph::new(content).block(panel("Enter your question here", is_focused));
    frame.render_widget(paragraph, area);
}

fn render_answer(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel("Response", matches!(app.focus(), Focus::Answer));

    let text = match (app.startup_error(), app.bundle()) {
        (Some(error), _) => Text::from(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        ))),
        (None, Some(bundle)) => tui_markdown::from_str(&bundle.direct_answer),
        (None, None) => Text::from(Line::from(Span::styled(
            "Type a question and press Enter.",
            Style::default().fg(Color::DarkGray),
        ))),
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.answer_scroll(), 0));
    frame.render_widget(paragraph, area);
}

fn render_sources(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel("Sources", matches!(app.focus(), Focus::Sources));

    let mut text = Text::default();
    match app.bundle() {
        Some(bundle) if bundle.has_sources() => {
            for (i, source) in bundle.sourced_summaries.iter().enumerate() {
                if i > 0 {
                    text.lines.push(Line::from(""));
                }
                text.lines.push(Line::from(vec![
                    Span::styled(
                        format!("{}. ", i + 1),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        source.url.clone(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::UNDERLINED),
                    ),
                ]));
                for line in source.summary.lines() {
                    text.lines.push(Line::from(line.to_string()));
                }
            }
        }
        Some(_) => {
            text.lines.push(Line::from(Span::styled(
                "No web sources were summarized.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        None => {}
    }

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.sources_scroll(), 0));
    frame.render_widget(paragraph, area);
}

fn render_sidebar(frame: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::from(Span::styled(
            "Disclaimer:",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(DISCLAIMER),
    ]);

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("About"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(error) = app.startup_error() {
        Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red)))
    } else {
        match app.status() {
            Status::Ready => Line::from(Span::styled("Ready", Style::default().fg(Color::DarkGray))),
            Status::Working(state) => Line::from(Span::styled(
                format!("Getting response... ({state})"),
                Style::default().fg(Color::Yellow),
            )),
            Status::Answered => Line::from(Span::styled("Done", Style::default().fg(Color::Green))),
            Status::Warning(msg) => {
                Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Yellow)))
            }
            Status::Error(msg) => {
                Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Red)))
            }
        }
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Shows context-aware keyboard shortcuts based on current focus state.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled("Ctrl+C", key_style),
        Span::raw(": quit"),
        Span::styled(" | ", sep_style),
        Span::styled("Tab", key_style),
        Span::raw(": next panel"),
        Span::styled(" | ", sep_style),
        Span::styled("Esc", key_style),
        Span::raw(": question"),
    ];

    match app.focus() {
        Focus::Input => {
            if app.can_ask() {
                spans.push(Span::styled(" | ", sep_style));
                spans.push(Span::styled("Enter", key_style));
                spans.push(Span::raw(": get response"));
            }
        }
        Focus::Answer | Focus::Sources => {
            spans.push(Span::styled(" | ", sep_style));
            spans.push(Span::styled("j/k", key_style));
            spans.push(Span::raw(": scroll"));
            spans.push(Span::styled(" | ", sep_style));
            spans.push(Span::styled("q", key_style));
            spans.push(Span::raw(": quit"));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
