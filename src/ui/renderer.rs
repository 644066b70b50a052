use chrono::{DateTime, Local};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::core::app::{AccountField, AccountForm, App, Focus, LoginForm, Modal};
use crate::core::message::Message;
use crate::ui::picker::render_character_picker;

const SIDEBAR_WIDTH: u16 = 32;
const MAX_INPUT_LINES: u16 = 6;

pub fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(f.area());

    f.render_widget(Paragraph::new(title_line(app)), rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(rows[1]);

    render_sidebar(f, app, columns[0]);
    render_chat(f, app, columns[1]);

    let area = f.area();
    match &app.modal {
        Modal::None => {}
        Modal::CharacterPicker(state) => render_character_picker(f, state, area),
        Modal::Account(form) => render_account_form(f, form, area),
        Modal::Login(form) => render_login_form(f, form, area),
    }
}

fn title_line(app: &App) -> Line<'static> {
    let user = app
        .session
        .uid
        .clone()
        .unwrap_or_else(|| "not signed in".to_string());
    let character = app
        .current_character
        .as_ref()
        .map(|c| {
            if c.status_text.is_empty() {
                c.name.clone()
            } else {
                format!("{} ({})", c.name, c.status_text)
            }
        })
        .unwrap_or_else(|| "no chat open".to_string());
    Line::from(vec![
        Span::styled(
            format!("Whispi v{}", env!("CARGO_PKG_VERSION")),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" • {user} • {character}")),
    ])
}

fn render_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Sidebar && !app.modal.is_open();
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let items: Vec<ListItem> = app
        .user_chats
        .iter()
        .map(|chat| {
            let is_current = app.is_current_character(&chat.character_id);
            let name_style = if is_current {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let mut header = vec![Span::styled(chat.character_name.clone(), name_style)];
            if let Some(time) = chat.last_message_time.as_deref() {
                header.push(Span::styled(
                    format!("  {}", format_chat_time(time)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            let preview = chat.last_message.clone().unwrap_or_default();
            ListItem::new(vec![
                Line::from(header),
                Line::styled(
                    truncate_to_width(&preview, area.width.saturating_sub(2) as usize),
                    Style::default().fg(Color::Gray),
                ),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title("Chats (Tab)");

    if items.is_empty() {
        let hint = if app.session.uid.is_some() {
            "No chats yet.\nCtrl+N to pick a character."
        } else {
            "Ctrl+U to enter a UID.\nCtrl+A to create an account."
        };
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if focused {
        state.select(Some(app.sidebar_selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_chat(f: &mut Frame, app: &mut App, area: Rect) {
    let input_lines = (app.input.lines().len() as u16).clamp(1, MAX_INPUT_LINES);
    let banner_height = u16::from(app.banner.is_some());
    let typing_height = u16::from(app.typing_visible());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(banner_height),
            Constraint::Min(0),
            Constraint::Length(typing_height),
            Constraint::Length(input_lines + 2),
        ])
        .split(area);

    if let Some(banner) = &app.banner {
        f.render_widget(
            Paragraph::new(banner.message.clone())
                .style(Style::default().fg(Color::White).bg(Color::Red)),
            rows[0],
        );
    }

    render_transcript(f, app, rows[1]);

    if app.typing_visible() {
        let name = app
            .current_character
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("Assistant");
        f.render_widget(
            Paragraph::new(format!("{name} is typing..."))
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)),
            rows[2],
        );
    }

    let focused = app.focus == Focus::Input && !app.modal.is_open();
    let title_style = if app.can_send() {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    app.input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                "Message (Enter send, Alt+Enter newline, Ctrl+N characters, Ctrl+C quit)",
                title_style,
            )),
    );
    f.render_widget(&app.input, rows[3]);
}

fn render_transcript(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    let lines = if app.messages.is_empty() {
        vec![Line::styled(
            empty_transcript_hint(app),
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        let character_name = app
            .current_character
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("Assistant");
        transcript_lines(&app.messages, character_name, inner_width)
    };

    let scroll = bottom_scroll_offset(lines.len(), inner_height);
    f.render_widget(Paragraph::new(lines).block(block).scroll((scroll, 0)), area);
}

/// Offset that keeps the newest line in view, clamped to what ratatui can scroll.
fn bottom_scroll_offset(total_lines: usize, visible_lines: usize) -> u16 {
    u16::try_from(total_lines.saturating_sub(visible_lines)).unwrap_or(u16::MAX)
}

fn empty_transcript_hint(app: &App) -> &'static str {
    if app.loading_history {
        "Loading history..."
    } else if app.session.uid.is_none() {
        "Set a UID (Ctrl+U) or create an anonymous account (Ctrl+A) to start."
    } else if app.current_character.is_none() {
        "Pick a character with Ctrl+N, or open a chat from the sidebar."
    } else {
        "Say hello."
    }
}

/// Pre-wrapped transcript so the scroll offset matches what is drawn.
fn transcript_lines(messages: &[Message], character_name: &str, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in messages {
        let (label, color) = if message.is_user() {
            ("You".to_string(), Color::Cyan)
        } else {
            (character_name.to_string(), Color::Magenta)
        };
        let time = message.timestamp.with_timezone(&Local).format("%H:%M");
        lines.push(Line::from(vec![
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {time}"), Style::default().fg(Color::DarkGray)),
        ]));
        for row in wrap_text(&message.content, width) {
            lines.push(Line::raw(row));
        }
        lines.push(Line::raw(""));
    }
    lines
}

/// Hard-wrap by display width, honoring embedded newlines.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for source_line in text.split('\n') {
        let mut row = String::new();
        let mut row_width = 0;
        for ch in source_line.chars() {
            let w = ch.width().unwrap_or(0);
            if row_width + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push(ch);
            row_width += w;
        }
        rows.push(row);
    }
    rows
}

fn truncate_to_width(text: &str, width: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let mut out = String::new();
    let mut used = 0;
    for ch in flat.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            if width > 0 {
                out.pop();
                out.push('…');
            }
            break;
        }
        out.push(ch);
        used += w;
    }
    out
}

fn format_chat_time(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Local).format("%b %d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_account_form(f: &mut Frame, form: &AccountForm, area: Rect) {
    let popup = centered_rect(52, 10, area);
    f.render_widget(Clear, popup);

    let field_style = |field: AccountField| {
        if form.field == field && !form.is_locked() {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("Name:       ", field_style(AccountField::DisplayName)),
            Span::raw(form.display_name.clone()),
        ]),
        Line::from(vec![
            Span::styled("Birth year: ", field_style(AccountField::BirthYear)),
            Span::raw(form.birth_year.clone()),
        ]),
        Line::raw(""),
        Line::styled(form.status.clone(), Style::default().fg(Color::Yellow)),
        Line::raw(""),
        Line::styled(
            "Tab switch field • Enter create • Esc close",
            Style::default().fg(Color::DarkGray),
        ),
    ];
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Create anonymous account"),
        ),
        popup,
    );
}

fn render_login_form(f: &mut Frame, form: &LoginForm, area: Rect) {
    let popup = centered_rect(52, 6, area);
    f.render_widget(Clear, popup);
    let lines = vec![
        Line::from(vec![Span::raw("UID: "), Span::raw(form.uid.clone())]),
        Line::raw(""),
        Line::styled("Enter save • Esc close", Style::default().fg(Color::DarkGray)),
    ];
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Set UID")),
        popup,
    );
}
