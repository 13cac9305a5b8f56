//! Rooms sidebar
//!
//! Lists General and one direct room per online peer, marking the current one.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use crate::view::ViewState;

const ACTIVE_PREFIX: &str = "> ";
const INACTIVE_PREFIX: &str = "  ";

/// Render the rooms sidebar.
pub fn render(frame: &mut Frame, view: &ViewState, area: Rect) {
    let items: Vec<ListItem> = view
        .rooms()
        .iter()
        .map(|entry| {
            let (prefix, style) = if entry.active {
                (ACTIVE_PREFIX, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            } else if entry.room.is_direct() {
                (INACTIVE_PREFIX, Style::default().fg(Color::Cyan))
            } else {
                (INACTIVE_PREFIX, Style::default())
            };

            ListItem::new(Line::from(vec![
                Span::raw(prefix),
                Span::styled(entry.label.clone(), style),
            ]))
        })
        .collect();

    let block = Block::default().borders(Borders::ALL).title(" Rooms ");
    frame.render_widget(List::new(items).block(block), area);
}
