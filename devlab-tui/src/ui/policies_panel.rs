//! Panel 5 — Policies: network egress policies.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use devlab_core::types::fmt_epoch_ms;

use crate::app::AppState;
use crate::theme;
use crate::ui::{scroll_window, truncate};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let list = &app.policies;
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
                "Loading network policies..."
            } else {
                "No network policies."
            },
            theme::muted(),
        )));
        f.render_widget(Paragraph::new(lines), area);
        return;
    }

    lines.push(Line::from(Span::styled(
        format!(
            "{:<24} {:<22} {:<10} {:>6} {:<16}",
            "ID", "NAME", "DEFAULT", "HOSTS", "CREATED"
        ),
        theme::accent_bold(),
    )));

    let visible = area.height.saturating_sub(3) as usize;
    let start = scroll_window(list.cursor, visible);
    let end = (start + visible).min(list.items.len());

    for i in start..end {
        let p = &list.items[i];
        let is_cursor = i == list.cursor;
        let base = if is_cursor {
            theme::cursor(theme::accent())
        } else {
            theme::secondary()
        };
        let default_style = if is_cursor {
            base
        } else if p.deny_by_default {
            theme::warning()
        } else {
            theme::positive()
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{:<24} ", truncate(&p.id, 24)), base),
            Span::styled(format!("{:<22} ", truncate(&p.name, 22)), base),
            Span::styled(
                format!("{:<10} ", if p.deny_by_default { "deny" } else { "allow" }),
                default_style,
            ),
            Span::styled(format!("{:>6} ", p.allowed_hosts.len()), base),
            Span::styled(fmt_epoch_ms(p.create_time_ms), base),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
