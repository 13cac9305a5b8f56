//! Conversation pane
//!
//! Shows the messages of the current room, newest at the bottom.

use parlor_app::App;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use crate::view::{ChatLine, ViewState};

const BORDER_SIZE: u16 = 2;
const PRIVATE_TAG: &str = "[dm] ";

/// Render the conversation pane.
pub fn render(frame: &mut Frame, app: &App, view: &ViewState, area: Rect) {
    let title = app
        .current_room_label()
        .map_or_else(|| " Not connected ".to_string(), |label| format!(" {label} "));

    let block = Block::default().borders(Borders::ALL).title(title);

    let items: Vec<ListItem> = if view.lines().is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            placeholder(app),
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        view.lines().iter().map(line_item).collect()
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

fn line_item(line: &ChatLine) -> ListItem<'static> {
    let text_style = if line.is_self {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = Vec::with_capacity(2);
    if line.is_private {
        spans.push(Span::styled(PRIVATE_TAG, Style::default().fg(Color::Magenta)));
    }
    spans.push(Span::styled(line.text.clone(), text_style));

    ListItem::new(Line::from(spans))
}

fn placeholder(app: &App) -> &'static str {
    if app.session().is_some() { "No messages yet" } else { "Waiting for the server..." }
}
