//! Status banner
//!
//! Shows status notices drained from the logger one at a time, each for a
//! short while. Errors stay up longer than informational notices.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::logging::StatusMessage;

/// How long an informational notice is shown
const INFO_DURATION: Duration = Duration::from_secs(3);

/// How long an error notice is shown
const ERROR_DURATION: Duration = Duration::from_secs(8);

/// Notices kept waiting before the oldest are dropped
const MAX_QUEUE_SIZE: usize = 10;

#[derive(Debug, Clone)]
struct Shown {
    message: StatusMessage,
    /// Set once the notice reaches the front of the queue
    since: Option<Instant>,
}

impl Shown {
    fn duration(&self) -> Duration {
        if self.message.is_error {
            ERROR_DURATION
        } else {
            INFO_DURATION
        }
    }

    fn is_expired(&self) -> bool {
        self.since
            .is_some_and(|since| since.elapsed() >= self.duration())
    }
}

/// FIFO of status notices waiting to be displayed
#[derive(Debug, Default)]
pub struct StatusBanner {
    queue: VecDeque<Shown>,
}

impl StatusBanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue drained notices behind the ones already waiting
    pub fn extend(&mut self, messages: impl IntoIterator<Item = StatusMessage>) {
        for message in messages {
            self.queue.push_back(Shown {
                message,
                since: None,
            });
        }
        while self.queue.len() > MAX_QUEUE_SIZE {
            self.queue.pop_front();
        }
        self.start_front();
    }

    fn start_front(&mut self) {
        if let Some(front) = self.queue.front_mut() {
            front.since.get_or_insert_with(Instant::now);
        }
    }

    /// Drop the current notice once its time is up. Returns true if the banner changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        while self.queue.front().is_some_and(Shown::is_expired) {
            self.queue.pop_front();
            self.start_front();
            changed = true;
        }
        changed
    }

    /// Notice currently on display
    pub fn current(&self) -> Option<&StatusMessage> {
        self.queue.front().map(|shown| &shown.message)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Render the current notice into `area`
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(message) = self.current() else {
            return;
        };
        let style = if message.is_error {
            Style::default().fg(Color::White).bg(Color::Red).bold()
        } else {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        };
        frame.render_widget(Paragraph::new(format!(" {} ", message.text)).style(style), area);
    }
}
