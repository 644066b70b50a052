use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::core::app::CharacterPickerState;
use crate::core::character::{Character, FILTER_TAGS};
use crate::ui::renderer::centered_rect;

const PICKER_WIDTH: u16 = 72;
const PICKER_HEIGHT: u16 = 24;

pub fn render_character_picker(f: &mut Frame, state: &CharacterPickerState, area: Rect) {
    let popup = centered_rect(PICKER_WIDTH, PICKER_HEIGHT, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Pick a character (Enter open, Esc close)");
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Search: ", Style::default().fg(Color::DarkGray)),
            Span::raw(state.filter.search.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ])),
        rows[0],
    );

    f.render_widget(
        Paragraph::new(tag_strip(state)).wrap(Wrap { trim: true }),
        rows[1],
    );

    render_results(f, state, rows[2]);

    f.render_widget(
        Paragraph::new("←/→ move tag • Space toggle • ↑/↓ select")
            .style(Style::default().fg(Color::DarkGray)),
        rows[3],
    );
}

/// Active tags are bracketed, the tag under the cursor is reversed.
fn tag_strip(state: &CharacterPickerState) -> Line<'static> {
    let mut spans = Vec::with_capacity(FILTER_TAGS.len() * 2);
    for (index, tag) in FILTER_TAGS.iter().enumerate() {
        let active = state.filter.is_active(tag);
        let label = if active {
            format!("[{tag}]")
        } else {
            tag.to_string()
        };
        let mut style = if active {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        if index == state.tag_cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn render_results(f: &mut Frame, state: &CharacterPickerState, area: Rect) {
    let placeholder = if state.loading {
        Some("Loading characters...")
    } else if state.selecting {
        Some("Opening chat...")
    } else if state.filtered.is_empty() {
        Some("No characters match.")
    } else {
        None
    };
    if let Some(text) = placeholder {
        f.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = state.filtered.iter().map(character_item).collect();
    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn character_item(character: &Character) -> ListItem<'static> {
    let mut header = vec![Span::styled(
        character.name.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(age) = character.age {
        header.push(Span::raw(format!(", {age}")));
    }
    if !character.personality_tags().is_empty() {
        header.push(Span::styled(
            format!("  {}", character.personality_tags().join(" · ")),
            Style::default().fg(Color::Magenta),
        ));
    }
    ListItem::new(vec![
        Line::from(header),
        Line::styled(
            format!("  {}", character.status_text),
            Style::default().fg(Color::Gray),
        ),
    ])
}
