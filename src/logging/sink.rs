//! Mirror sinks: the log file or the console
//!
//! At most one mirror runs next to the ring. Each applies its own minimum
//! level and receives the line already rendered for the ring.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::error::LoggerError;
use super::record::Level;

/// Append-only log file, closed exactly once by [`FileSink::close`]
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
    min_level: Level,
}

impl FileSink {
    /// Open (or create) `path` for appending
    pub fn open(path: &Path, min_level: Level) -> Result<Self, LoggerError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LoggerError::OpenLogFile {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(Some(file)),
            min_level,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line; a closed sink silently discards it
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        match self.lock().as_mut() {
            Some(file) => writeln!(file, "{}", line),
            None => Ok(()),
        }
    }

    /// Check if the file handle is still open
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Flush and close the file. Returns false if it was already closed.
    pub fn close(&self) -> bool {
        match self.lock().take() {
            Some(mut file) => {
                let _ = file.flush();
                true
            }
            None => false,
        }
    }
}

/// Standard error output
#[derive(Debug)]
pub struct ConsoleSink {
    min_level: Level,
}

impl ConsoleSink {
    pub fn new(min_level: Level) -> Self {
        Self { min_level }
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        writeln!(io::stderr().lock(), "{}", line)
    }
}

/// The single mirror chosen at configuration time
#[derive(Debug)]
pub enum MirrorSink {
    File(FileSink),
    Console(ConsoleSink),
}

impl MirrorSink {
    /// Whether records of `level` are mirrored
    pub fn accepts(&self, level: Level) -> bool {
        let min_level = match self {
            MirrorSink::File(sink) => sink.min_level,
            MirrorSink::Console(sink) => sink.min_level,
        };
        level >= min_level
    }

    pub fn write_line(&self, line: &str) -> io::Result<()> {
        match self {
            MirrorSink::File(sink) => sink.write_line(line),
            MirrorSink::Console(sink) => sink.write_line(line),
        }
    }

    /// The file sink, if this mirror is one
    pub fn as_file(&self) -> Option<&FileSink> {
        match self {
            MirrorSink::File(sink) => Some(sink),
            MirrorSink::Console(_) => None,
        }
    }
}
