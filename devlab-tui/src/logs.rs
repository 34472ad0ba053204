//! Log viewer state — bounded buffer, scroll offset, follow mode.
//!
//! The worker feeds rendered lines in; the overlay renders a window of
//! them. Follow mode sticks the window to the tail until the user scrolls
//! up, and re-engages when they scroll back to the bottom.

use std::collections::VecDeque;

use devlab_core::types::LogEntry;

const MAX_LINES: usize = 10_000;

/// How the viewer is currently being fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailSource {
    Connecting,
    Streaming,
    Polling,
    Ended,
}

impl TailSource {
    pub fn label(self) -> &'static str {
        match self {
            TailSource::Connecting => "connecting",
            TailSource::Streaming => "streaming",
            TailSource::Polling => "polling",
            TailSource::Ended => "ended",
        }
    }
}

#[derive(Debug)]
pub struct LogView {
    /// Overlay title, e.g. "devbox dbx_123".
    pub target: String,
    pub source: TailSource,
    lines: VecDeque<String>,
    scroll: usize,
    follow: bool,
    /// Viewport height from the last render, for page-sized scrolling.
    last_height: usize,
}

impl LogView {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: TailSource::Connecting,
            lines: VecDeque::new(),
            scroll: 0,
            follow: true,
            last_height: 20,
        }
    }

    pub fn page_height(&self) -> usize {
        self.last_height.max(1)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn following(&self) -> bool {
        self.follow
    }

    pub fn push_entries(&mut self, entries: &[LogEntry]) {
        for entry in entries {
            if self.lines.len() == MAX_LINES {
                self.lines.pop_front();
                // Keep the window anchored on the same content.
                if !self.follow {
                    self.scroll = self.scroll.saturating_sub(1);
                }
            }
            self.lines.push_back(entry.display_line());
        }
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.follow = false;
        self.scroll = self.scroll.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize, height: usize) {
        let max_start = self.lines.len().saturating_sub(height);
        self.scroll = (self.scroll + amount).min(max_start);
        if self.scroll == max_start {
            self.follow = true;
        }
    }

    pub fn jump_to_tail(&mut self) {
        self.follow = true;
    }

    /// The window of lines to render for a viewport of `height` rows.
    pub fn window(&mut self, height: usize) -> impl Iterator<Item = &str> {
        self.last_height = height;
        let max_start = self.lines.len().saturating_sub(height);
        if self.follow {
            self.scroll = max_start;
        } else {
            self.scroll = self.scroll.min(max_start);
        }
        self.lines
            .iter()
            .skip(self.scroll)
            .take(height)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(i: usize) -> LogEntry {
        LogEntry {
            timestamp_ms: Some(i as i64 * 1000),
            source: None,
            level: None,
            message: Some(format!("line {i}")),
            cmd: None,
            exit_code: None,
        }
    }

    #[test]
    fn follow_sticks_to_tail() {
        let mut view = LogView::new("devbox dbx_1");
        let entries: Vec<LogEntry> = (0..20).map(msg).collect();
        view.push_entries(&entries);

        let window: Vec<&str> = view.window(5).collect();
        assert_eq!(window.len(), 5);
        assert!(window[4].ends_with("line 19"));
    }

    #[test]
    fn scroll_up_disengages_follow_and_scroll_to_bottom_reengages() {
        let mut view = LogView::new("devbox dbx_1");
        let entries: Vec<LogEntry> = (0..20).map(msg).collect();
        view.push_entries(&entries);
        let _ = view.window(5).count();

        view.scroll_up(3);
        assert!(!view.following());
        let window: Vec<&str> = view.window(5).collect();
        assert!(window[4].ends_with("line 16"));

        // New lines while scrolled up do not move the window.
        view.push_entries(&[msg(20)]);
        let window: Vec<&str> = view.window(5).collect();
        assert!(window[4].ends_with("line 16"));

        view.scroll_down(10, 5);
        assert!(view.following());
    }

    #[test]
    fn buffer_is_bounded() {
        let mut view = LogView::new("devbox dbx_1");
        for chunk in (0..(MAX_LINES + 500)).collect::<Vec<_>>().chunks(100) {
            let entries: Vec<LogEntry> = chunk.iter().map(|&i| msg(i)).collect();
            view.push_entries(&entries);
        }
        assert_eq!(view.len(), MAX_LINES);
        // Oldest lines were dropped.
        let first: Vec<&str> = view.window(1).collect();
        assert!(!first.is_empty());
    }

    #[test]
    fn window_on_short_buffer() {
        let mut view = LogView::new("devbox dbx_1");
        view.push_entries(&[msg(0), msg(1)]);
        let window: Vec<&str> = view.window(10).collect();
        assert_eq!(window.len(), 2);
    }
}
