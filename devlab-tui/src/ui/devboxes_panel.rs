//! Panel 1 — Devboxes: paged table with status filter and lifecycle actions.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use devlab_core::types::fmt_epoch_ms;

use crate::app::AppState;
use crate::theme;
use crate::ui::{scroll_window, truncate};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let pane = &app.devboxes;
    let list = &pane.list;
    let mut lines: Vec<Line> = Vec::new();

    // Header
    let filter = pane
        .status_filter
        .map(|s| s.as_str())
        .unwrap_or("all");
    let total = list
        .total
        .map(|t| format!(" of {t}"))
        .unwrap_or_default();
    lines.push(Line::from(vec![
        Span::styled("Filter: ", theme::muted()),
        Span::styled(filter, theme::accent()),
        Span::styled(
            format!("  page {} • {} rows{total}", list.pager.page_number(), list.items.len()),
            theme::muted(),
        ),
        Span::styled(
            if list.loading { "  loading..." } else { "" },
            theme::warning(),
        ),
        Span::styled(
            "  [n/p]page [s]filter [l]ogs [x]exec [c]reate [u/m/S]lifecycle [t]snapshot",
            theme::muted(),
        ),
    ]));
    lines.push(Line::from(""));

    if list.items.is_empty() {
        lines.push(Line::from(Span::styled(
            if list.loading {
                "Loading devboxes..."
            } else {
                "No devboxes. Press c to create one or r to refresh."
            },
            theme::muted(),
        )));
        f.render_widget(Paragraph::new(lines), area);
        return;
    }

    // Column headers
    lines.push(Line::from(Span::styled(
        format!(
            "{:<24} {:<16} {:<13} {:<18} {:<16}",
            "ID", "NAME", "STATUS", "BLUEPRINT", "CREATED"
        ),
        theme::accent_bold(),
    )));

    let visible = area.height.saturating_sub(3) as usize;
    let start = scroll_window(list.cursor, visible);
    let end = (start + visible).min(list.items.len());

    for i in start..end {
        let d = &list.items[i];
        let is_cursor = i == list.cursor;
        let base = if is_cursor {
            theme::cursor(theme::accent())
        } else {
            theme::secondary()
        };
        let status_style = if is_cursor {
            base
        } else {
            theme::devbox_status(d.status)
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{:<24} ", truncate(&d.id, 24)), base),
            Span::styled(
                format!("{:<16} ", truncate(d.name.as_deref().unwrap_or("-"), 16)),
                base,
            ),
            Span::styled(format!("{:<13} ", d.status.as_str()), status_style),
            Span::styled(
                format!(
                    "{:<18} ",
                    truncate(d.blueprint_id.as_deref().unwrap_or("-"), 18)
                ),
                base,
            ),
            Span::styled(fmt_epoch_ms(d.create_time_ms), base),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
