//! Bounded in-memory record history
//!
//! Nodes are chained through set-once forward links. The ring only tracks the
//! newest `capacity` nodes; a [`TailCursor`] holding an older link keeps the
//! unread part of the chain alive until it walks past it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tokio::sync::watch;

use super::record::{Level, LogRecord};
use super::tail::TailCursor;

/// Forward link from one node (or the ring itself) to the next appended node
pub(crate) type Link = Arc<OnceLock<Arc<RingNode>>>;

/// One appended record with its rendered line
pub struct RingNode {
    record: LogRecord,
    line: String,
    next: Link,
}

impl RingNode {
    /// The stored record
    pub fn record(&self) -> &LogRecord {
        &self.record
    }

    /// The record as rendered when it was written
    pub fn line(&self) -> &str {
        &self.line
    }

    pub(crate) fn next_link(&self) -> &Link {
        &self.next
    }
}

impl fmt::Debug for RingNode {
    // Never follows `next`: a chain can be arbitrarily long
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingNode")
            .field("record", &self.record)
            .field("linked", &self.next.get().is_some())
            .finish()
    }
}

impl Drop for RingNode {
    fn drop(&mut self) {
        // Unlink iteratively so dropping a long unread chain cannot overflow the stack
        let mut next = Arc::get_mut(&mut self.next).and_then(OnceLock::take);
        while let Some(node) = next {
            next = match Arc::try_unwrap(node) {
                Ok(mut node) => Arc::get_mut(&mut node.next).and_then(OnceLock::take),
                Err(_) => None,
            };
        }
    }
}

struct RingInner {
    /// Retained nodes, oldest first
    retained: VecDeque<Arc<RingNode>>,
    /// Link whose target is the oldest retained node
    head: Link,
    /// Link the next append fills
    tail: Link,
    /// Total records appended over the ring's lifetime
    written: u64,
}

impl fmt::Debug for RingInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingInner")
            .field("retained", &self.retained.len())
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

/// Ring of the most recent log records
#[derive(Debug)]
pub struct RingBackend {
    inner: Mutex<RingInner>,
    capacity: usize,
    min_level: Level,
    wake: watch::Sender<u64>,
}

impl RingBackend {
    /// Create a ring holding at most `capacity` records at or above `min_level`
    pub fn new(capacity: usize, min_level: Level) -> Self {
        let link: Link = Arc::new(OnceLock::new());
        let (wake, _) = watch::channel(0);
        Self {
            inner: Mutex::new(RingInner {
                retained: VecDeque::with_capacity(capacity.max(1)),
                head: Arc::clone(&link),
                tail: link,
                written: 0,
            }),
            capacity: capacity.max(1),
            min_level,
            wake,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RingInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether records of `level` are stored
    pub fn accepts(&self, level: Level) -> bool {
        level >= self.min_level
    }

    /// Append a record, evicting the oldest one when full
    pub fn append(&self, record: LogRecord, line: String) {
        let written = {
            let mut inner = self.lock();
            let node = Arc::new(RingNode {
                record,
                line,
                next: Arc::new(OnceLock::new()),
            });
            // The tail link is only ever filled here, under the lock
            let _ = inner.tail.set(Arc::clone(&node));
            inner.tail = Arc::clone(&node.next);
            inner.retained.push_back(node);

            if inner.retained.len() > self.capacity {
                if let Some(evicted) = inner.retained.pop_front() {
                    inner.head = Arc::clone(&evicted.next);
                }
            }

            inner.written += 1;
            inner.written
        };
        self.wake.send_replace(written);
    }

    /// Wake every waiting tail without appending
    pub fn wake(&self) {
        self.wake.send_modify(|_| {});
    }

    /// Subscribe to append notifications
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.wake.subscribe()
    }

    /// Start a cursor at the oldest retained record
    pub fn cursor(&self) -> TailCursor {
        TailCursor::new(Arc::clone(&self.lock().head))
    }

    /// Rendered lines currently retained, oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.lock()
            .retained
            .iter()
            .map(|node| node.line().to_string())
            .collect()
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.lock().retained.len()
    }

    /// Check if nothing is retained
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of retained records
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total records appended since creation
    pub fn written(&self) -> u64 {
        self.lock().written
    }
}
