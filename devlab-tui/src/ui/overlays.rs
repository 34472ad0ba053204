//! Overlay widgets — resource detail, shutdown confirm, error history.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{AppState, Panel};
use crate::detail::{self, Section};
use crate::theme;
use crate::ui::centered_rect;

/// Resource detail for the selected row of the active panel, laid out by
/// the section allocator.
pub fn render_detail(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 80, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(format!(" {} Detail [Esc]close ", app.active_panel.label()))
        .title_style(theme::accent_bold());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let Some(sections) = selected_sections(app) else {
        let text = Paragraph::new(Span::styled("Nothing selected.", theme::muted()));
        f.render_widget(text, inner);
        return;
    };

    let fits = detail::allocate(&sections, inner.height as usize);
    let mut lines: Vec<Line> = Vec::new();

    for (section, fit) in sections.iter().zip(&fits) {
        if !fit.header {
            continue;
        }
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            section.title.clone(),
            theme::accent_bold(),
        )));
        for (label, value) in section.fields.iter().take(fit.shown) {
            lines.push(Line::from(vec![
                Span::styled(format!("  {label:>18}: "), theme::muted()),
                Span::styled(value.clone(), theme::accent()),
            ]));
        }
        if fit.marker {
            lines.push(Line::from(Span::styled(
                format!("  … +{} more", fit.hidden),
                theme::muted(),
            )));
        }
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn selected_sections(app: &AppState) -> Option<Vec<Section>> {
    match app.active_panel {
        Panel::Devboxes => app
            .devboxes
            .list
            .selected()
            .map(detail::devbox_sections),
        Panel::Blueprints => app.blueprints.selected().map(detail::blueprint_sections),
        Panel::Snapshots => app.snapshots.selected().map(detail::snapshot_sections),
        Panel::Objects => app.objects.selected().map(detail::object_sections),
        Panel::Policies => app.policies.selected().map(detail::policy_sections),
        Panel::Benchmarks => app.benchmarks.selected().map(detail::job_sections),
        Panel::Settings => {
            let s = &app.settings;
            if s.cursor < s.mcp.len() {
                s.mcp.get(s.cursor).map(detail::mcp_sections)
            } else {
                s.gateways
                    .get(s.cursor - s.mcp.len())
                    .map(detail::gateway_sections)
            }
        }
        Panel::Help => None,
    }
}

/// Shutdown confirmation.
pub fn render_confirm(f: &mut Frame, area: Rect, id: &str) {
    let popup = centered_rect(50, 20, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::warning())
        .title(" Confirm shutdown ")
        .title_style(theme::warning());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let text = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("Shut down devbox ", theme::secondary()),
            Span::styled(id.to_string(), theme::accent_bold()),
            Span::styled("?", theme::secondary()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "This is permanent. [y]es  [n]o",
            theme::muted(),
        )),
    ];

    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

/// Error history overlay.
pub fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(format!(
            " Error History ({}) [Esc]close [j/k]scroll ",
            app.error_history.len()
        ))
        .title_style(theme::negative());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if app.error_history.is_empty() {
        let text = Paragraph::new(Span::styled("No errors recorded.", theme::muted()));
        f.render_widget(text, inner);
        return;
    }

    let visible_height = inner.height as usize;
    let start = app.error_scroll;
    let end = (start + visible_height).min(app.error_history.len());

    let mut lines: Vec<Line> = Vec::new();
    for i in start..end {
        let err = &app.error_history[i];
        let is_active = i == app.error_scroll;
        let style = if is_active {
            theme::negative().add_modifier(Modifier::BOLD)
        } else {
            theme::muted()
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] ", err.timestamp.format("%H:%M:%S")),
                theme::muted(),
            ),
            Span::styled(format!("[{}] ", err.category.label()), theme::warning()),
            Span::styled(err.message.clone(), style),
        ]));

        if !err.context.is_empty() {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(err.context.clone(), theme::muted()),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines), inner);
}
