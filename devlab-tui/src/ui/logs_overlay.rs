//! Log viewer overlay — streamed or polled lines with follow mode.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::app::AppState;
use crate::logs::TailSource;
use crate::theme;
use crate::ui::centered_rect;

pub fn render(f: &mut Frame, area: Rect, app: &mut AppState) {
    let Some(view) = app.log_view.as_mut() else {
        return;
    };

    let popup = centered_rect(90, 85, area);
    f.render_widget(Clear, popup);

    let source_style = match view.source {
        TailSource::Streaming => theme::positive(),
        TailSource::Polling => theme::warning(),
        TailSource::Connecting => theme::neutral(),
        TailSource::Ended => theme::muted(),
    };

    let follow = if view.following() { " following" } else { "" };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(format!(
            " Logs — {} [{}{}] [Esc]close [j/k]scroll [G]tail ",
            view.target,
            view.source.label(),
            follow,
        ))
        .title_style(source_style);

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if view.is_empty() {
        let placeholder = match view.source {
            TailSource::Connecting => "Connecting...",
            _ => "No log entries.",
        };
        let text = Paragraph::new(Span::styled(placeholder, theme::muted()));
        f.render_widget(text, inner);
        return;
    }

    let lines: Vec<Line> = view
        .window(inner.height as usize)
        .map(|l| Line::from(Span::styled(l.to_string(), theme::secondary())))
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}
