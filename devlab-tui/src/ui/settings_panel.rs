//! Panel 7 — Settings: MCP and gateway configurations, read-only.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;
use crate::ui::truncate;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let settings = &app.settings;
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(vec![
        Span::styled(
            format!(
                "{} MCP configs • {} gateways",
                settings.mcp.len(),
                settings.gateways.len()
            ),
            theme::muted(),
        ),
        Span::styled(
            if settings.loading { "  loading..." } else { "" },
            theme::warning(),
        ),
        Span::styled("  [Enter]detail [y]copy id", theme::muted()),
    ]));
    lines.push(Line::from(""));

    if settings.row_count() == 0 {
        lines.push(Line::from(Span::styled(
            if settings.loading {
                "Loading settings..."
            } else {
                "Nothing configured."
            },
            theme::muted(),
        )));
        f.render_widget(Paragraph::new(lines), area);
        return;
    }

    let mut row = 0usize;

    lines.push(Line::from(Span::styled("MCP servers", theme::accent_bold())));
    for m in &settings.mcp {
        lines.push(config_row(
            row == settings.cursor,
            &m.id,
            &m.name,
            &m.url,
            m.enabled,
        ));
        row += 1;
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Gateways", theme::accent_bold())));
    for g in &settings.gateways {
        lines.push(config_row(
            row == settings.cursor,
            &g.id,
            &g.name,
            &g.endpoint,
            g.enabled,
        ));
        row += 1;
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn config_row<'a>(
    is_cursor: bool,
    id: &str,
    name: &str,
    target: &str,
    enabled: bool,
) -> Line<'a> {
    let base = if is_cursor {
        theme::cursor(theme::accent())
    } else {
        theme::secondary()
    };
    let state_style = if is_cursor {
        base
    } else if enabled {
        theme::positive()
    } else {
        theme::muted()
    };

    Line::from(vec![
        Span::styled(format!("  {:<20} ", truncate(id, 20)), base),
        Span::styled(format!("{:<18} ", truncate(name, 18)), base),
        Span::styled(format!("{:<40} ", truncate(target, 40)), base),
        Span::styled(
            if enabled { "enabled" } else { "disabled" }.to_string(),
            state_style,
        ),
    ])
}
