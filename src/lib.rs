//! icm - terminal container monitor
//!
//! This library provides the logging and status core shared by the UI shell:
//! a bounded in-memory log ring with live tails, an optional log file and
//! debug server, and a queue of status notices.

pub mod app;
pub mod cli;
pub mod config;
pub mod debug_server;
pub mod logging;
pub mod shutdown;
pub mod tui;
