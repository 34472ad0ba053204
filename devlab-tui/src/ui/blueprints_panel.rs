//! Panel 2 — Blueprints: paged table with build status and build logs.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use devlab_core::types::fmt_epoch_ms;

use crate::app::AppState;
use crate::theme;
use crate::ui::{scroll_window, truncate};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let list = &app.blueprints;
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(vec![
        Span::styled(
            format!("page {} • {} rows", list.pager.page_number(), list.items.len()),
            theme::muted(),
        ),
        Span::styled(
            if list.loading { "  loading..." } else { "" },
            theme::warning(),
        ),
        Span::styled("  [n/p]page [l]build logs [Enter]detail", theme::muted()),
    ]));
    lines.push(Line::from(""));

    if list.items.is_empty() {
        lines.push(Line::from(Span::styled(
            if list.loading {
                "Loading blueprints..."
            } else {
                "No blueprints."
            },
            theme::muted(),
        )));
        f.render_widget(Paragraph::new(lines), area);
        return;
    }

    lines.push(Line::from(Span::styled(
        format!(
            "{:<24} {:<22} {:<15} {:<16}",
            "ID", "NAME", "STATUS", "CREATED"
        ),
        theme::accent_bold(),
    )));

    let visible = area.height.saturating_sub(3) as usize;
    let start = scroll_window(list.cursor, visible);
    let end = (start + visible).min(list.items.len());

    for i in start..end {
        let b = &list.items[i];
        let is_cursor = i == list.cursor;
        let base = if is_cursor {
            theme::cursor(theme::accent())
        } else {
            theme::secondary()
        };
        let status_style = if is_cursor {
            base
        } else {
            theme::blueprint_status(b.status)
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{:<24} ", truncate(&b.id, 24)), base),
            Span::styled(format!("{:<22} ", truncate(&b.name, 22)), base),
            Span::styled(format!("{:<15} ", b.status.as_str()), status_style),
            Span::styled(fmt_epoch_ms(b.create_time_ms), base),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
