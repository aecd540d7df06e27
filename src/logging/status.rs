//! Status notices for the UI
//!
//! A FIFO queue of short messages that any component can post and the UI
//! drains once per refresh. Independent of the log ring.

use std::collections::{vec_deque, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A transient notice waiting to be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    /// The message to display
    pub text: String,
    /// Whether this notice reports an error
    pub is_error: bool,
}

impl StatusMessage {
    /// Create an informational notice
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// Create an error notice
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Messages taken by one [`StatusQueue::drain`] call, oldest first
pub type Drain = vec_deque::IntoIter<StatusMessage>;

/// Thread-safe FIFO of status notices
#[derive(Debug, Default)]
pub struct StatusQueue {
    queue: Mutex<VecDeque<StatusMessage>>,
}

impl StatusQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<StatusMessage>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an informational notice
    pub fn post(&self, text: impl Into<String>) {
        self.push(StatusMessage::info(text));
    }

    /// Queue an error notice
    pub fn post_error(&self, err: impl fmt::Display) {
        self.push(StatusMessage::error(err.to_string()));
    }

    /// Queue a notice
    pub fn push(&self, message: StatusMessage) {
        self.lock().push_back(message);
    }

    /// Check if any notice is waiting
    pub fn has_pending(&self) -> bool {
        !self.lock().is_empty()
    }

    /// Number of waiting notices
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        !self.has_pending()
    }

    /// Take everything queued so far, leaving the queue empty
    ///
    /// Notices posted while the caller iterates land in the next drain.
    pub fn drain(&self) -> Drain {
        std::mem::take(&mut *self.lock()).into_iter()
    }
}
