//! Logging system for icm
//!
//! Keeps a bounded in-memory history of log records for live viewing,
//! optionally mirrors it to a file or the console, and carries a queue of
//! short status notices for the UI.

mod error;
mod layer;
mod logger;
mod record;
mod ring;
mod sink;
mod status;
mod tail;

pub use error::LoggerError;
pub use layer::{init_tracing, RingLayer};
pub use logger::{
    global, Lifecycle, Logger, LoggerCell, LoggerConfig, DEFAULT_CAPACITY, DEFAULT_DEBUG_PORT,
};
pub use record::{strip_color, Level, LogRecord};
pub use ring::{RingBackend, RingNode};
pub use sink::{ConsoleSink, FileSink, MirrorSink};
pub use status::{Drain, StatusMessage, StatusQueue};
pub use tail::{TailCursor, TailStream, TAIL_POLL_INTERVAL};
