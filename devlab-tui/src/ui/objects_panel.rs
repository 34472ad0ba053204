//! Panel 4 — Objects: storage object listing.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use devlab_core::types::{fmt_bytes, fmt_epoch_ms};

use crate::app::AppState;
use crate::theme;
use crate::ui::{scroll_window, truncate};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let list = &app.objects;
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
        Span::styled("  [n/p]page [Enter]detail [y]copy id", theme::muted()),
    ]));
    lines.push(Line::from(""));

    if list.items.is_empty() {
        lines.push(Line::from(Span::styled(
            if list.loading {
                "Loading objects..."
            } else {
                "No storage objects."
            },
            theme::muted(),
        )));
        f.render_widget(Paragraph::new(lines), area);
        return;
    }

    lines.push(Line::from(Span::styled(
        format!(
            "{:<24} {:<22} {:<18} {:<10} {:>10} {:<16}",
            "ID", "NAME", "CONTENT TYPE", "STATE", "SIZE", "CREATED"
        ),
        theme::accent_bold(),
    )));

    let visible = area.height.saturating_sub(3) as usize;
    let start = scroll_window(list.cursor, visible);
    let end = (start + visible).min(list.items.len());

    for i in start..end {
        let o = &list.items[i];
        let is_cursor = i == list.cursor;
        let base = if is_cursor {
            theme::cursor(theme::accent())
        } else {
            theme::secondary()
        };
        let state_style = if is_cursor {
            base
        } else {
            theme::object_state(o.state)
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{:<24} ", truncate(&o.id, 24)), base),
            Span::styled(format!("{:<22} ", truncate(&o.name, 22)), base),
            Span::styled(format!("{:<18} ", truncate(&o.content_type, 18)), base),
            Span::styled(format!("{:<10} ", o.state.as_str()), state_style),
            Span::styled(format!("{:>10} ", fmt_bytes(o.size_bytes)), base),
            Span::styled(fmt_epoch_ms(o.create_time_ms), base),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
