//! Panel 3 — Snapshots: disk snapshots across all devboxes.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use devlab_core::types::{fmt_bytes, fmt_epoch_ms};

use crate::app::AppState;
use crate::theme;
use crate::ui::{scroll_window, truncate};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let list = &app.snapshots;
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
        Span::styled("  [n/p]page [Enter]detail", theme::muted()),
    ]));
    lines.push(Line::from(""));

    if list.items.is_empty() {
        lines.push(Line::from(Span::styled(
            if list.loading {
                "Loading snapshots..."
            } else {
                "No snapshots. Press t on a devbox to create one."
            },
            theme::muted(),
        )));
        f.render_widget(Paragraph::new(lines), area);
        return;
    }

    lines.push(Line::from(Span::styled(
        format!(
            "{:<24} {:<24} {:<12} {:>10} {:<16}",
            "ID", "DEVBOX", "STATUS", "SIZE", "CREATED"
        ),
        theme::accent_bold(),
    )));

    let visible = area.height.saturating_sub(3) as usize;
    let start = scroll_window(list.cursor, visible);
    let end = (start + visible).min(list.items.len());

    for i in start..end {
        let s = &list.items[i];
        let is_cursor = i == list.cursor;
        let base = if is_cursor {
            theme::cursor(theme::accent())
        } else {
            theme::secondary()
        };
        let status_style = if is_cursor {
            base
        } else {
            theme::snapshot_status(s.status)
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{:<24} ", truncate(&s.id, 24)), base),
            Span::styled(format!("{:<24} ", truncate(&s.devbox_id, 24)), base),
            Span::styled(format!("{:<12} ", s.status.as_str()), status_style),
            Span::styled(format!("{:>10} ", fmt_bytes(s.size_bytes)), base),
            Span::styled(fmt_epoch_ms(s.create_time_ms), base),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
