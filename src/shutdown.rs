//! Process shutdown guard
//!
//! Held by `main` for the whole run so the logger is shut down on every exit
//! path: normal return, early `?` return, or a panic unwinding out of `main`.

use std::sync::Arc;

use crate::logging::Logger;

/// Calls [`Logger::exit`] when dropped
pub struct ShutdownGuard {
    logger: Arc<Logger>,
}

impl ShutdownGuard {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.logger.error("main", "panic during run, shutting down");
        }
        self.logger.notice("main", "shutting down");
        self.logger.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{Lifecycle, LoggerConfig};
    use std::panic::AssertUnwindSafe;

    #[test]
    fn test_drop_exits_logger() {
        let logger = Logger::new(LoggerConfig::default());
        {
            let _guard = ShutdownGuard::new(Arc::clone(&logger));
        }
        assert!(logger.is_exited());
        assert_eq!(logger.state(), Lifecycle::Closed);
        assert!(logger.snapshot().last().is_some_and(|l| l.ends_with("shutting down")));
    }

    #[test]
    fn test_drop_during_panic_exits_logger() {
        let logger = Logger::new(LoggerConfig::default());
        let inner = Arc::clone(&logger);
        let result = std::panic::catch_unwind(AssertUnwindSafe(move || {
            let _guard = ShutdownGuard::new(inner);
            panic!("boom");
        }));

        assert!(result.is_err());
        assert!(logger.is_exited());
    }

    #[test]
    fn test_guard_after_manual_exit() {
        let logger = Logger::new(LoggerConfig::default());
        let guard = ShutdownGuard::new(Arc::clone(&logger));
        guard.logger().exit();
        drop(guard);
        assert_eq!(logger.state(), Lifecycle::Closed);
    }
}
