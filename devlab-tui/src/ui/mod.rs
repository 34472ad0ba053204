//! Top-level UI layout — active panel frame, status bar, overlays.

pub mod benchmarks_panel;
pub mod blueprints_panel;
pub mod devboxes_panel;
pub mod forms;
pub mod help_panel;
pub mod logs_overlay;
pub mod objects_panel;
pub mod overlays;
pub mod policies_panel;
pub mod settings_panel;
pub mod snapshots_panel;
pub mod status_bar;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::app::{AppState, Overlay, Panel};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &mut AppState) {
    // Split: main area + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let main_area = chunks[0];
    let status_area = chunks[1];

    draw_panel(f, main_area, app);
    status_bar::render(f, status_area, app);

    // Overlays on top.
    match app.overlay.clone() {
        Overlay::Detail => overlays::render_detail(f, main_area, app),
        Overlay::Logs => logs_overlay::render(f, main_area, app),
        Overlay::Exec => forms::render_exec(f, main_area, app),
        Overlay::Create => forms::render_create(f, main_area, app),
        Overlay::ConfirmShutdown { id } => overlays::render_confirm(f, main_area, &id),
        Overlay::ErrorHistory => overlays::render_error_history(f, main_area, app),
        Overlay::None => {}
    }
}

/// Draw the active panel with its border.
fn draw_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let panel = app.active_panel;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} [{}] ", panel.label(), panel.index() + 1))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match panel {
        Panel::Devboxes => devboxes_panel::render(f, inner, app),
        Panel::Blueprints => blueprints_panel::render(f, inner, app),
        Panel::Snapshots => snapshots_panel::render(f, inner, app),
        Panel::Objects => objects_panel::render(f, inner, app),
        Panel::Policies => policies_panel::render(f, inner, app),
        Panel::Benchmarks => benchmarks_panel::render(f, inner, app),
        Panel::Settings => settings_panel::render(f, inner, app),
        Panel::Help => help_panel::render(f, inner, app),
    }
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
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

/// Clip a cell value to a column width.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}.")
    }
}

/// First row of the visible window so the cursor stays on screen.
pub(crate) fn scroll_window(cursor: usize, visible: usize) -> usize {
    if visible == 0 {
        return cursor;
    }
    (cursor + 1).saturating_sub(visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_marks_clipped_cells() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("averylongvalue", 8), "averylo.");
    }

    #[test]
    fn window_follows_cursor() {
        assert_eq!(scroll_window(0, 10), 0);
        assert_eq!(scroll_window(9, 10), 0);
        assert_eq!(scroll_window(10, 10), 1);
        assert_eq!(scroll_window(25, 10), 16);
    }
}
