//! UI rendering
//!
//! Rendering functions that draw [`App`] and [`ViewState`] into a ratatui
//! frame. All functions are pure (no I/O), so they can be exercised against a
//! `TestBackend`.

mod chat;
mod input;
mod rooms;
mod status;

use parlor_app::App;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

use crate::ViewState;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App, view: &ViewState) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    render_main_area(frame, app, view, *main_area);
    input::render(frame, &view.input, *input_area);
    status::render(frame, app, *status_area);
}

/// Render the main area (rooms sidebar + conversation).
fn render_main_area(frame: &mut Frame, app: &App, view: &ViewState, area: Rect) {
    const ROOM_SIDEBAR_WIDTH: u16 = 22;
    const CHAT_AREA_MIN_WIDTH: u16 = 20;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(ROOM_SIDEBAR_WIDTH), Constraint::Min(CHAT_AREA_MIN_WIDTH)])
        .split(area);

    let [rooms_area, chat_area] = chunks.as_ref() else {
        return;
    };

    rooms::render(frame, view, *rooms_area);
    chat::render(frame, app, view, *chat_area);
}
