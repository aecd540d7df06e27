//! End-to-end behavior of the logger: tails, status queue and lifecycle

use std::sync::Arc;
use std::time::Duration;

use icm::logging::{strip_color, Lifecycle, Logger, LoggerCell, LoggerConfig, TAIL_POLL_INTERVAL};
use tempfile::TempDir;

fn config(capacity: usize) -> LoggerConfig {
    LoggerConfig {
        capacity,
        ..LoggerConfig::default()
    }
}

/// Message part of a rendered line
fn message(line: &str) -> String {
    strip_color(line)
        .splitn(5, ' ')
        .nth(4)
        .unwrap_or_default()
        .to_string()
}

async fn collect_until_closed(logger: &Logger, expected: usize) -> Vec<String> {
    let mut tail = logger.tail();
    let mut seen = Vec::new();
    while seen.len() < expected {
        match tokio::time::timeout(Duration::from_secs(2), tail.next()).await {
            Ok(Some(line)) => seen.push(message(&line)),
            _ => break,
        }
    }
    seen
}

#[tokio::test]
async fn test_tail_attached_first_yields_writes_in_order() {
    let logger = Logger::new(config(64));
    let mut tail = logger.tail();

    for i in 0..10 {
        logger.info("test", format!("msg {}", i));
    }

    // The first line is the logger's own startup notice
    assert_eq!(
        tail.next().await.map(|l| message(&l)).as_deref(),
        Some("logger initialized")
    );
    for i in 0..10 {
        let line = tail.next().await.unwrap();
        assert_eq!(message(&line), format!("msg {}", i));
    }
}

#[tokio::test]
async fn test_tail_drains_backlog_then_closes_after_exit() {
    let logger = Logger::new(config(64));
    let mut tail = logger.tail();
    assert!(tail.next().await.is_some());

    // Nothing new and no exit yet: the tail stays open
    let idle = tokio::time::timeout(Duration::from_millis(200), tail.next()).await;
    assert!(idle.is_err());

    logger.info("test", "before exit 1");
    logger.info("test", "before exit 2");
    logger.exit();

    let first = tokio::time::timeout(TAIL_POLL_INTERVAL, tail.next()).await.unwrap();
    let second = tokio::time::timeout(TAIL_POLL_INTERVAL, tail.next()).await.unwrap();
    let end = tokio::time::timeout(TAIL_POLL_INTERVAL, tail.next()).await.unwrap();

    assert_eq!(first.map(|l| message(&l)).as_deref(), Some("before exit 1"));
    assert_eq!(second.map(|l| message(&l)).as_deref(), Some("before exit 2"));
    assert_eq!(end, None);
}

#[tokio::test]
async fn test_tail_attached_after_exit_drains_then_closes() {
    let logger = Logger::new(config(8));
    logger.info("test", "kept");
    logger.exit();

    let seen = collect_until_closed(&logger, 10).await;
    assert_eq!(seen, vec!["logger initialized", "kept"]);
}

#[tokio::test]
async fn test_lagging_tail_sees_every_record_after_eviction() {
    let logger = Logger::new(config(4));
    let mut tail = logger.tail();

    for i in 0..50 {
        logger.info("test", format!("msg {}", i));
    }
    assert_eq!(logger.len(), 4);
    let retained: Vec<String> = logger.snapshot().iter().map(|l| message(l)).collect();
    assert_eq!(retained, vec!["msg 46", "msg 47", "msg 48", "msg 49"]);

    assert_eq!(
        tail.next().await.map(|l| message(&l)).as_deref(),
        Some("logger initialized")
    );
    for i in 0..50 {
        assert_eq!(message(&tail.next().await.unwrap()), format!("msg {}", i));
    }
}

#[tokio::test]
async fn test_concurrent_tails_see_same_order() {
    let logger = Logger::new(config(128));
    let first = logger.tail();
    let second = logger.tail();

    let writer = {
        let logger = Arc::clone(&logger);
        tokio::spawn(async move {
            for i in 0..20 {
                logger.info("test", format!("msg {}", i));
                tokio::task::yield_now().await;
            }
            logger.exit();
        })
    };

    let read_all = |mut tail: icm::logging::TailStream| async move {
        let mut lines = Vec::new();
        while let Some(line) = tail.next().await {
            lines.push(message(&line));
        }
        lines
    };

    let (a, b) = tokio::join!(read_all(first), read_all(second));
    writer.await.unwrap();

    assert_eq!(a.len(), 21);
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_writes_from_many_threads_are_all_retained() {
    let logger = Logger::new(config(1024));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                for i in 0..50 {
                    logger.info("test", format!("{}:{}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(logger.len(), 201);
    assert_eq!(logger.written(), 201);

    // Sequence ids follow append order even with concurrent writers
    let ids: Vec<u64> = logger
        .snapshot()
        .iter()
        .filter_map(|line| {
            let id = strip_color(line).split(' ').nth(3)?.to_string();
            u64::from_str_radix(&id, 16).ok()
        })
        .collect();
    assert_eq!(ids, (0..201).collect::<Vec<u64>>());
}

#[test]
fn test_status_queue_roundtrip() {
    let logger = Logger::new(config(8));
    assert!(!logger.has_pending());

    logger.post("a");
    assert!(logger.has_pending());
    logger.post("b");

    let drained: Vec<String> = logger.drain().map(|m| m.text).collect();
    assert_eq!(drained, vec!["a", "b"]);
    assert_eq!(logger.drain().count(), 0);
    assert!(!logger.has_pending());

    logger.post_error("bad");
    assert!(logger.has_pending());
}

#[test]
fn test_init_twice_opens_file_once() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("icm.log");
    let config = LoggerConfig {
        file: Some(path.clone()),
        ..config(8)
    };

    let cell = LoggerCell::new();
    let first = cell.init(config.clone()).unwrap();
    let second = cell.init(config).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    first.exit();
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("logger initialized").count(), 1);
}

#[tokio::test]
async fn test_init_twice_starts_debug_server_once() {
    let config = LoggerConfig {
        debug: true,
        debug_port: 0,
        ..config(8)
    };

    let cell = LoggerCell::new();
    let first = cell.init(config.clone()).unwrap();
    let addr = first.debug_server_addr().expect("debug server running");
    let second = cell.init(config).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.debug_server_addr(), Some(addr));
    let started = first
        .snapshot()
        .iter()
        .filter(|l| l.contains("debug server listening"))
        .count();
    assert_eq!(started, 1);

    first.exit();
    assert!(first.debug_server_addr().is_none());
}

#[test]
fn test_exit_twice_does_not_fault() {
    let temp_dir = TempDir::new().unwrap();
    let cell = LoggerCell::new();
    let logger = cell
        .init(LoggerConfig {
            file: Some(temp_dir.path().join("icm.log")),
            ..config(8)
        })
        .unwrap();

    logger.exit();
    logger.exit();
    assert!(logger.is_exited());
    assert_eq!(cell.state(), Lifecycle::Closed);
}

#[test]
fn test_missing_log_directory_downgrades_silently() {
    let temp_dir = TempDir::new().unwrap();
    let logger = Logger::new(LoggerConfig {
        file: Some(temp_dir.path().join("nope").join("icm.log")),
        ..config(8)
    });

    logger.info("test", "memory only");
    assert_eq!(logger.state(), Lifecycle::Initialized);
    assert!(logger
        .snapshot()
        .last()
        .is_some_and(|l| l.ends_with("memory only")));
    assert!(logger.drain().any(|m| m.is_error));
}
