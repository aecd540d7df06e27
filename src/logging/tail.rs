//! Live tail over the ring
//!
//! A [`TailCursor`] walks the node chain without touching shared state. A
//! [`TailStream`] runs a cursor on its own task and hands rendered lines to a
//! single consumer until the logger has exited and the backlog is drained.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

use super::ring::{Link, RingNode};

/// Upper bound on how long an idle tail waits before re-checking the ring
pub const TAIL_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Lines buffered between a tail task and its consumer
const TAIL_CHANNEL_BUFFER: usize = 256;

/// Per-consumer read position in the ring
pub struct TailCursor {
    link: Link,
}

impl fmt::Debug for TailCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TailCursor")
            .field("pending", &self.link.get().is_some())
            .finish()
    }
}

impl TailCursor {
    pub(crate) fn new(link: Link) -> Self {
        Self { link }
    }

    /// Advance to the next appended node, if any
    pub fn try_next_node(&mut self) -> Option<Arc<RingNode>> {
        let node = Arc::clone(self.link.get()?);
        self.link = Arc::clone(node.next_link());
        Some(node)
    }

    /// Advance and return the rendered line of the next node, if any
    pub fn try_next(&mut self) -> Option<String> {
        self.try_next_node().map(|node| node.line().to_string())
    }

    fn drain_into(&mut self, out: &mut Vec<String>) {
        while let Some(line) = self.try_next() {
            out.push(line);
        }
    }
}

/// Receiving end of a running tail
#[derive(Debug)]
pub struct TailStream {
    rx: mpsc::Receiver<String>,
}

impl TailStream {
    /// Spawn the tail task on `runtime`
    pub(crate) fn spawn(
        runtime: &Handle,
        cursor: TailCursor,
        wake: watch::Receiver<u64>,
        exited: Arc<AtomicBool>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(TAIL_CHANNEL_BUFFER);
        runtime.spawn(run_tail(cursor, wake, exited, tx));
        Self { rx }
    }

    /// A stream that yields nothing
    pub(crate) fn closed() -> Self {
        let (_, rx) = mpsc::channel(1);
        Self { rx }
    }

    /// Wait for the next line; `None` once the logger has exited and everything was delivered
    pub async fn next(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Take the next line if one is already buffered
    pub fn try_next(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

async fn run_tail(
    mut cursor: TailCursor,
    mut wake: watch::Receiver<u64>,
    exited: Arc<AtomicBool>,
    tx: mpsc::Sender<String>,
) {
    let mut batch = Vec::new();
    let mut ring_dropped = false;
    loop {
        // Mark the current version seen before reading, so an append after the
        // read always registers as a change
        wake.borrow_and_update();
        let done = ring_dropped || exited.load(Ordering::Acquire);

        cursor.drain_into(&mut batch);
        for line in batch.drain(..) {
            if tx.send(line).await.is_err() {
                return;
            }
        }

        if done {
            tracing::debug!("tail closed");
            return;
        }

        tokio::select! {
            _ = tx.closed() => return,
            changed = wake.changed() => {
                // Ring dropped: deliver what is left and stop
                ring_dropped = changed.is_err();
            }
            _ = tokio::time::sleep(TAIL_POLL_INTERVAL) => {}
        }
    }
}
