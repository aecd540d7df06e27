//! The logger context and its lifecycle
//!
//! A [`Logger`] is built once at startup and shared as `Arc<Logger>` with
//! every component that logs, posts status notices or tails the ring.
//! [`LoggerCell`] guards construction so it happens exactly once.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::debug_server::{self, DebugServerHandle};

use super::error::LoggerError;
use super::record::{Level, LogRecord};
use super::ring::RingBackend;
use super::sink::{ConsoleSink, FileSink, MirrorSink};
use super::status::{Drain, StatusQueue};
use super::tail::{TailCursor, TailStream};

/// Default number of records kept in memory
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default debug server port
pub const DEFAULT_DEBUG_PORT: u16 = 9000;

/// Module name the logger uses for records about itself
const SELF_MODULE: &str = "logger";

/// Everything needed to build a [`Logger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Records kept in the ring
    pub capacity: usize,
    /// Verbose level and debug server
    pub debug: bool,
    /// Debug server listens on all interfaces instead of loopback
    pub debug_tcp: bool,
    /// Debug server port (0 picks a free port)
    pub debug_port: u16,
    /// Mirror records to this file
    pub file: Option<PathBuf>,
    /// Mirror records to stderr when no file is configured
    pub console: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            debug: false,
            debug_tcp: false,
            debug_port: DEFAULT_DEBUG_PORT,
            file: None,
            console: false,
        }
    }
}

impl LoggerConfig {
    /// Minimum level accepted by every sink
    pub fn min_level(&self) -> Level {
        if self.debug {
            Level::Debug
        } else {
            Level::Info
        }
    }

    /// Address the debug server binds to
    pub fn debug_addr(&self) -> SocketAddr {
        let ip = if self.debug_tcp {
            Ipv4Addr::UNSPECIFIED
        } else {
            Ipv4Addr::LOCALHOST
        };
        SocketAddr::from((ip, self.debug_port))
    }
}

/// Where a logger is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    ShuttingDown,
    Closed,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Initialized => "initialized",
            Lifecycle::ShuttingDown => "shutting-down",
            Lifecycle::Closed => "closed",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared logging state: ring, mirror sink, status queue and debug server
pub struct Logger {
    config: LoggerConfig,
    ring: RingBackend,
    mirror: Option<MirrorSink>,
    status: StatusQueue,
    exited: Arc<AtomicBool>,
    /// Set while the mirror is failing, so a broken file is reported once
    mirror_failing: AtomicBool,
    /// Next sequence id; held across the whole write so ids follow append order
    next_id: Mutex<u64>,
    state: Mutex<Lifecycle>,
    server: Mutex<Option<DebugServerHandle>>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("retained", &self.ring.len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Logger {
    /// Build a logger from `config`
    ///
    /// Never fails: an unusable log file or debug server is reported through
    /// the logger itself and the rest keeps working. Starting the debug server
    /// needs a tokio runtime.
    pub fn new(config: LoggerConfig) -> Arc<Self> {
        let level = config.min_level();
        let console = || {
            config
                .console
                .then(|| MirrorSink::Console(ConsoleSink::new(level)))
        };

        let mut failures = Vec::new();
        let mirror = match &config.file {
            Some(path) => match FileSink::open(path, level) {
                Ok(sink) => Some(MirrorSink::File(sink)),
                Err(e) => {
                    failures.push(e);
                    console()
                }
            },
            None => console(),
        };

        let logger = Arc::new(Self {
            ring: RingBackend::new(config.capacity, level),
            mirror,
            status: StatusQueue::new(),
            exited: Arc::new(AtomicBool::new(false)),
            mirror_failing: AtomicBool::new(false),
            next_id: Mutex::new(0),
            state: Mutex::new(Lifecycle::Initialized),
            server: Mutex::new(None),
            config,
        });

        for err in &failures {
            logger.report(err);
        }

        if logger.config.debug {
            logger.start_debug_server();
        }

        logger.notice(SELF_MODULE, "logger initialized");
        logger
    }

    fn start_debug_server(self: &Arc<Self>) {
        match debug_server::start(self.config.debug_addr(), Arc::downgrade(self)) {
            Ok(handle) => {
                self.info(
                    SELF_MODULE,
                    format!("debug server listening on {}", handle.addr()),
                );
                *lock(&self.server) = Some(handle);
            }
            Err(e) => self.report(&e),
        }
    }

    /// Log a configuration problem and surface it to the UI
    fn report(&self, err: &LoggerError) {
        self.error(SELF_MODULE, err.to_string());
        self.status.post_error(err);
    }

    /// The configuration this logger was built with
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    // === Writing ===

    /// Whether any sink keeps records of `level`
    pub fn enabled(&self, level: Level) -> bool {
        self.ring.accepts(level)
            || self
                .mirror
                .as_ref()
                .is_some_and(|mirror| mirror.accepts(level))
    }

    /// Write a record to the ring and the mirror sink, each subject to its level filter
    pub fn write(&self, record: LogRecord) {
        if !self.enabled(record.level) {
            return;
        }
        let to_ring = self.ring.accepts(record.level);
        let mirror = self
            .mirror
            .as_ref()
            .filter(|mirror| mirror.accepts(record.level));

        let line = record.render();
        if let Some(mirror) = mirror {
            match mirror.write_line(&line) {
                Ok(()) => self.mirror_failing.store(false, Ordering::Relaxed),
                Err(e) => {
                    if !self.mirror_failing.swap(true, Ordering::Relaxed) {
                        self.status.post_error(format!("log write failed: {}", e));
                    }
                }
            }
        }
        if to_ring {
            self.ring.append(record, line);
        }
    }

    /// Build a record with the next sequence id and write it
    ///
    /// Filtered records take no id.
    pub fn log(&self, level: Level, module: &str, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        let mut next_id = lock(&self.next_id);
        let record = LogRecord::new(level, *next_id, module, message);
        *next_id += 1;
        self.write(record);
    }

    pub fn debug(&self, module: &str, message: impl Into<String>) {
        self.log(Level::Debug, module, message);
    }

    pub fn info(&self, module: &str, message: impl Into<String>) {
        self.log(Level::Info, module, message);
    }

    pub fn notice(&self, module: &str, message: impl Into<String>) {
        self.log(Level::Notice, module, message);
    }

    pub fn warning(&self, module: &str, message: impl Into<String>) {
        self.log(Level::Warning, module, message);
    }

    pub fn error(&self, module: &str, message: impl Into<String>) {
        self.log(Level::Error, module, message);
    }

    // === Reading ===

    /// Attach a live tail starting at the oldest retained record
    ///
    /// The tail runs on the current tokio runtime. Outside one the failure is
    /// reported and the returned stream is already closed.
    pub fn tail(&self) -> TailStream {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => TailStream::spawn(
                &runtime,
                self.ring.cursor(),
                self.ring.subscribe(),
                Arc::clone(&self.exited),
            ),
            Err(_) => {
                self.report(&LoggerError::NoRuntime("live tail"));
                TailStream::closed()
            }
        }
    }

    /// A synchronous cursor starting at the oldest retained record
    pub fn tail_cursor(&self) -> TailCursor {
        self.ring.cursor()
    }

    /// Rendered lines currently retained, oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.ring.snapshot()
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Check if no record is retained
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Records appended to the ring since startup
    pub fn written(&self) -> u64 {
        self.ring.written()
    }

    // === Status ===

    /// Queue an informational notice for the UI
    pub fn post(&self, text: impl Into<String>) {
        self.status.post(text);
    }

    /// Queue an error notice for the UI
    pub fn post_error(&self, err: impl fmt::Display) {
        self.status.post_error(err);
    }

    pub fn has_pending(&self) -> bool {
        self.status.has_pending()
    }

    pub fn pending_count(&self) -> usize {
        self.status.len()
    }

    /// Take every queued notice
    pub fn drain(&self) -> Drain {
        self.status.drain()
    }

    // === Lifecycle ===

    pub fn state(&self) -> Lifecycle {
        *lock(&self.state)
    }

    /// Whether `exit` has run
    pub fn is_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    /// Whether the log file is configured and still open
    pub fn has_open_file(&self) -> bool {
        self.mirror
            .as_ref()
            .and_then(MirrorSink::as_file)
            .is_some_and(FileSink::is_open)
    }

    /// Address of the running debug server
    pub fn debug_server_addr(&self) -> Option<SocketAddr> {
        lock(&self.server).as_ref().map(DebugServerHandle::addr)
    }

    /// Shut down: close the log file, release tails and stop the debug server
    ///
    /// Tails deliver everything written before this call, then end. Calling
    /// `exit` again does nothing.
    pub fn exit(&self) {
        {
            let mut state = lock(&self.state);
            if *state != Lifecycle::Initialized {
                return;
            }
            *state = Lifecycle::ShuttingDown;
        }

        if let Some(file) = self.mirror.as_ref().and_then(MirrorSink::as_file) {
            file.close();
        }

        self.exited.store(true, Ordering::Release);
        self.ring.wake();

        if let Some(mut server) = lock(&self.server).take() {
            server.stop();
        }

        *lock(&self.state) = Lifecycle::Closed;
    }
}

/// Holds the one logger of a process
///
/// The first [`LoggerCell::init`] builds the logger; later calls with the same
/// configuration return it unchanged, and calls with a different one fail.
#[derive(Debug)]
pub struct LoggerCell {
    logger: OnceLock<Arc<Logger>>,
}

impl LoggerCell {
    pub const fn new() -> Self {
        Self {
            logger: OnceLock::new(),
        }
    }

    pub fn init(&self, config: LoggerConfig) -> Result<Arc<Logger>, LoggerError> {
        let logger = self.logger.get_or_init(|| Logger::new(config.clone()));
        if logger.config() != &config {
            return Err(LoggerError::AlreadyInitialized);
        }
        Ok(Arc::clone(logger))
    }

    /// The logger, if initialized
    pub fn get(&self) -> Option<Arc<Logger>> {
        self.logger.get().cloned()
    }

    pub fn state(&self) -> Lifecycle {
        self.logger
            .get()
            .map_or(Lifecycle::Uninitialized, |logger| logger.state())
    }
}

impl Default for LoggerCell {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: LoggerCell = LoggerCell::new();

/// The process-wide logger cell
pub fn global() -> &'static LoggerCell {
    &GLOBAL
}
