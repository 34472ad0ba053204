//! Panel 8 — Help: keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, _app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global Navigation");
    key(&mut lines, "1-8", "Switch to panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "r", "Refresh the active panel");
    key(&mut lines, "e", "Open error history overlay");
    key(&mut lines, "q / Ctrl+C", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Lists");
    key(&mut lines, "j / k", "Move cursor down / up");
    key(&mut lines, "g / G", "Jump to first / last row");
    key(&mut lines, "n / p", "Next / previous page");
    key(&mut lines, "Enter", "Open detail view");
    key(&mut lines, "y", "Copy selected id to clipboard");
    key(&mut lines, "o", "Open selected resource in the dashboard");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 1 — Devboxes");
    key(&mut lines, "s", "Cycle status filter");
    key(&mut lines, "c", "Create a devbox (form)");
    key(&mut lines, "u / m", "Suspend / resume selected devbox");
    key(&mut lines, "S", "Shutdown selected devbox (confirms)");
    key(&mut lines, "t", "Snapshot selected devbox's disk");
    key(&mut lines, "l", "Follow logs");
    key(&mut lines, "x", "Run a command");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 2 — Blueprints");
    key(&mut lines, "l", "Show build logs");
    lines.push(Line::from(""));

    section(&mut lines, "Log viewer");
    key(&mut lines, "j / k", "Scroll (disengages follow)");
    key(&mut lines, "PgUp / PgDn", "Scroll by page");
    key(&mut lines, "G / End", "Jump to tail and follow");
    key(&mut lines, "Esc", "Close");

    f.render_widget(Paragraph::new(lines), area);
}

fn section<'a>(lines: &mut Vec<Line<'a>>, title: &str) {
    lines.push(Line::from(Span::styled(
        title.to_string(),
        theme::accent_bold(),
    )));
}

fn key<'a>(lines: &mut Vec<Line<'a>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>18}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
