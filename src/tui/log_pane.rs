//! Scrolling log pane
//!
//! Holds the lines received from a tail and renders them with the colored
//! prefix that the logger put on each line.

use std::collections::VecDeque;

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

/// State of the log pane
#[derive(Debug)]
pub struct LogPane {
    lines: VecDeque<String>,
    max_lines: usize,
    /// First visible line when not following the end
    scroll_offset: usize,
    auto_scroll: bool,
}

impl LogPane {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max_lines),
            max_lines: max_lines.max(1),
            scroll_offset: 0,
            auto_scroll: true,
        }
    }

    /// Append a line received from the tail
    pub fn push(&mut self, line: String) {
        if self.lines.len() >= self.max_lines {
            self.lines.pop_front();
            self.scroll_offset = self.scroll_offset.saturating_sub(1);
        }
        self.lines.push_back(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_following(&self) -> bool {
        self.auto_scroll
    }

    pub fn scroll_up(&mut self, amount: usize, visible_height: usize) {
        if self.auto_scroll {
            self.scroll_offset = self.max_offset(visible_height);
            self.auto_scroll = false;
        }
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize, visible_height: usize) {
        if self.auto_scroll {
            return;
        }
        let max = self.max_offset(visible_height);
        self.scroll_offset = (self.scroll_offset + amount).min(max);
        if self.scroll_offset == max {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.auto_scroll = true;
    }

    fn max_offset(&self, visible_height: usize) -> usize {
        self.lines.len().saturating_sub(visible_height)
    }

    /// First line index to show in a pane `visible_height` lines tall
    pub fn effective_scroll(&self, visible_height: usize) -> usize {
        if self.auto_scroll {
            self.max_offset(visible_height)
        } else {
            self.scroll_offset.min(self.max_offset(visible_height))
        }
    }

    /// Render the pane into `area`
    pub fn render(&self, frame: &mut Frame, area: Rect, title: &str) {
        let visible_height = area.height.saturating_sub(2) as usize;

        if self.lines.is_empty() {
            let empty = Paragraph::new("No log entries yet.")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(empty, area);
            return;
        }

        let scroll = self.effective_scroll(visible_height);
        let items: Vec<ListItem> = self
            .lines
            .iter()
            .skip(scroll)
            .take(visible_height)
            .map(|line| ListItem::new(styled_line(line)))
            .collect();

        let follow = if self.auto_scroll { " [follow]" } else { "" };
        let title = format!(
            "{} [{}-{} of {}]{}",
            title,
            scroll + 1,
            scroll + items.len(),
            self.lines.len(),
            follow
        );
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(list, area);
    }
}

/// Map the ANSI color code that opens a rendered record to a terminal color
fn ansi_color(code: &str) -> Color {
    match code.split(';').next().unwrap_or_default() {
        "31" => Color::Red,
        "32" => Color::Green,
        "33" => Color::Yellow,
        "35" => Color::Magenta,
        "36" => Color::Cyan,
        _ => Color::Gray,
    }
}

/// Turn `ESC[<code>m<prefix>ESC[0m<rest>` into a styled line; anything else is shown raw
pub fn styled_line(line: &str) -> Line<'_> {
    let parsed = line.strip_prefix("\x1b[").and_then(|rest| {
        let (code, rest) = rest.split_once('m')?;
        let (prefix, message) = rest.split_once("\x1b[0m")?;
        Some((code, prefix, message))
    });

    match parsed {
        Some((code, prefix, message)) => {
            let mut style = Style::default().fg(ansi_color(code));
            if code.ends_with(";1") {
                style = style.bold();
            }
            Line::from(vec![Span::styled(prefix, style), Span::raw(message)])
        }
        None => Line::raw(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{Level, LogRecord};

    fn filled(count: usize, max_lines: usize) -> LogPane {
        let mut pane = LogPane::new(max_lines);
        for i in 0..count {
            pane.push(format!("line {}", i));
        }
        pane
    }

    #[test]
    fn test_push_caps_lines() {
        let pane = filled(5, 3);
        assert_eq!(pane.len(), 3);
        assert_eq!(pane.lines.front().map(String::as_str), Some("line 2"));
    }

    #[test]
    fn test_follow_shows_latest() {
        let pane = filled(20, 100);
        assert!(pane.is_following());
        assert_eq!(pane.effective_scroll(5), 15);
    }

    #[test]
    fn test_scroll_up_then_back_down_resumes_follow() {
        let mut pane = filled(20, 100);
        pane.scroll_up(3, 5);
        assert!(!pane.is_following());
        assert_eq!(pane.effective_scroll(5), 12);

        pane.scroll_down(3, 5);
        assert!(pane.is_following());
    }

    #[test]
    fn test_scroll_to_top() {
        let mut pane = filled(20, 100);
        pane.scroll_to_top();
        assert_eq!(pane.effective_scroll(5), 0);
        pane.scroll_to_bottom();
        assert_eq!(pane.effective_scroll(5), 15);
    }

    #[test]
    fn test_styled_line_splits_prefix() {
        let rendered = LogRecord::new(Level::Error, 3, "test", "disk full").render();
        let line = styled_line(&rendered);
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].style.fg, Some(Color::Red));
        assert!(line.spans[0].content.ends_with("ERRO 003"));
        assert_eq!(line.spans[1].content, " disk full");
    }

    #[test]
    fn test_styled_line_plain_text() {
        let line = styled_line("plain");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "plain");
    }
}
