//! Input overlays — run-command prompt and the new-devbox form.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use devlab_core::types::ExecutionStatus;

use crate::app::{AppState, CreateForm};
use crate::theme;
use crate::ui::centered_rect;

/// Run-command overlay: prompt, then live status, then the result.
pub fn render_exec(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(exec) = app.exec.as_ref() else {
        return;
    };

    let popup = centered_rect(70, 60, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(format!(" Run command — {} ", exec.devbox_id))
        .title_style(theme::accent_bold());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines: Vec<Line> = Vec::new();

    match (&exec.result, exec.running) {
        (None, false) => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Command to execute ([Enter]run [Esc]cancel):",
                theme::muted(),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("> ", theme::accent()),
                Span::styled(exec.input.clone(), theme::accent_bold()),
                Span::styled("_", theme::accent()),
            ]));
        }
        (result, _) => {
            let execution = result.as_ref();
            let status = execution.map(|e| e.status);
            lines.push(Line::from(vec![
                Span::styled("$ ", theme::muted()),
                Span::styled(exec.input.clone(), theme::accent()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Status: ", theme::muted()),
                match status {
                    Some(status) => {
                        Span::styled(status.as_str(), theme::execution_status(status))
                    }
                    None => Span::styled("starting...", theme::neutral()),
                },
                match execution.and_then(|e| e.exit_status) {
                    Some(code) => Span::styled(
                        format!("  exit_status={code}"),
                        if code == 0 {
                            theme::positive()
                        } else {
                            theme::negative()
                        },
                    ),
                    None => Span::raw(""),
                },
            ]));
            lines.push(Line::from(""));

            if let Some(execution) = execution {
                let budget = (inner.height as usize).saturating_sub(lines.len() + 1);
                push_output(&mut lines, execution.stdout.as_deref(), budget, false);
                if execution.status == ExecutionStatus::Completed {
                    push_output(&mut lines, execution.stderr.as_deref(), 8, true);
                }
            }

            if status == Some(ExecutionStatus::Completed) {
                lines.push(Line::from(Span::styled("[Esc]close", theme::muted())));
            } else {
                lines.push(Line::from(Span::styled(
                    "[Esc]stop watching (command keeps running)",
                    theme::muted(),
                )));
            }
        }
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

/// Append the last lines of a command's output, bounded by `budget` rows.
fn push_output(lines: &mut Vec<Line<'_>>, output: Option<&str>, budget: usize, is_err: bool) {
    let Some(output) = output else {
        return;
    };
    if output.is_empty() || budget == 0 {
        return;
    }
    let all: Vec<&str> = output.lines().collect();
    let start = all.len().saturating_sub(budget);
    let style = if is_err {
        theme::negative()
    } else {
        theme::secondary()
    };
    if is_err {
        lines.push(Line::from(Span::styled("stderr:", theme::muted())));
    }
    for line in &all[start..] {
        lines.push(Line::from(Span::styled(line.to_string(), style)));
    }
}

/// New-devbox form.
pub fn render_create(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(60, 55, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" New devbox [Enter]create [Tab]next field [Esc]cancel ")
        .title_style(theme::accent_bold());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let form = &app.form;
    let mut lines: Vec<Line> = vec![Line::from("")];

    for (i, label) in CreateForm::LABELS.iter().enumerate() {
        let active = i == form.active;
        let label_style = if active {
            theme::accent_bold()
        } else {
            theme::muted()
        };
        let value_style = if active {
            theme::accent_bold()
        } else {
            theme::secondary()
        };
        let caret = if active { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("  {label:>32}: "), label_style),
            Span::styled(format!("{}{caret}", form.fields[i]), value_style),
        ]));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        "  Leave fields blank to use server defaults.",
        theme::muted(),
    )));

    f.render_widget(Paragraph::new(lines), inner);
}
