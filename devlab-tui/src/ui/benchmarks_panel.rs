//! Panel 6 — Benchmarks: job listing with pass counts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use devlab_core::types::fmt_epoch_ms;

use crate::app::AppState;
use crate::theme;
use crate::ui::{scroll_window, truncate};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let list = &app.benchmarks;
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
                "Loading benchmark jobs..."
            } else {
                "No benchmark jobs."
            },
            theme::muted(),
        )));
        f.render_widget(Paragraph::new(lines), area);
        return;
    }

    lines.push(Line::from(Span::styled(
        format!(
            "{:<24} {:<20} {:<11} {:>10} {:<16}",
            "ID", "BENCHMARK", "STATUS", "PASSED", "STARTED"
        ),
        theme::accent_bold(),
    )));

    let visible = area.height.saturating_sub(3) as usize;
    let start = scroll_window(list.cursor, visible);
    let end = (start + visible).min(list.items.len());

    for i in start..end {
        let j = &list.items[i];
        let is_cursor = i == list.cursor;
        let base = if is_cursor {
            theme::cursor(theme::accent())
        } else {
            theme::secondary()
        };
        let status_style = if is_cursor {
            base
        } else {
            theme::job_status(j.status)
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{:<24} ", truncate(&j.id, 24)), base),
            Span::styled(format!("{:<20} ", truncate(&j.benchmark_id, 20)), base),
            Span::styled(format!("{:<11} ", j.status.as_str()), status_style),
            Span::styled(
                format!("{:>4}/{:<5} ", j.passed_count, j.scenario_count),
                base,
            ),
            Span::styled(fmt_epoch_ms(j.start_time_ms), base),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
