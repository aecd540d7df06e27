//! Errors raised while setting up the logger
//!
//! None of these are fatal: the logger degrades and reports them through its
//! own status queue. They are returned only where a caller can act on them.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unable to create log file {}: {source}", path.display())]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to start debug server on {addr}: {source}")]
    DebugServer {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("{0} needs a tokio runtime")]
    NoRuntime(&'static str),

    #[error("logger already initialized with a different configuration")]
    AlreadyInitialized,
}
