//! `tracing` bridge
//!
//! Routes `tracing` events from anywhere in the process into the logger, so
//! they show up in the ring, the tail and the mirror sink.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use super::logger::Logger;
use super::record::Level;

/// A `tracing` layer that writes every event to a [`Logger`]
pub struct RingLayer {
    logger: Arc<Logger>,
}

impl RingLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for RingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        // Last path component reads better in a narrow pane
        let module = metadata
            .module_path()
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or_else(|| metadata.target());

        self.logger
            .log(Level::from(*metadata.level()), module, visitor.finish());
    }
}

/// Collects the `message` field plus any other fields as `key=value`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, field: &Field, value: impl std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", field.name(), value);
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field, format_args!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field, value);
        }
    }
}

/// Default filter when `RUST_LOG` is not set
fn default_filter(debug: bool) -> &'static str {
    if debug {
        "icm=debug"
    } else {
        "icm=info"
    }
}

/// Install the global subscriber: `RUST_LOG` filter plus [`RingLayer`]
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing(logger: &Arc<Logger>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(logger.config().debug).into());

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(RingLayer::new(Arc::clone(logger)))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{strip_color, LoggerConfig};

    fn debug_logger() -> Arc<Logger> {
        Logger::new(LoggerConfig {
            capacity: 16,
            debug: true,
            debug_port: 0,
            ..LoggerConfig::default()
        })
    }

    fn last_line(logger: &Logger) -> String {
        logger
            .snapshot()
            .last()
            .map(|line| strip_color(line))
            .unwrap_or_default()
    }

    #[test]
    fn test_events_reach_the_ring() {
        let logger = debug_logger();
        let subscriber = tracing_subscriber::registry().with(RingLayer::new(Arc::clone(&logger)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("container stopped");
        });

        assert!(last_line(&logger).ends_with("WARN 002 container stopped"));
    }

    #[test]
    fn test_fields_are_appended() {
        let logger = debug_logger();
        let subscriber = tracing_subscriber::registry().with(RingLayer::new(Arc::clone(&logger)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(id = 7, name = "web", "container started");
        });

        assert!(last_line(&logger).ends_with("INFO 002 container started id=7 name=web"));
    }

    #[test]
    fn test_trace_maps_to_debug() {
        let logger = debug_logger();
        let subscriber = tracing_subscriber::registry().with(RingLayer::new(Arc::clone(&logger)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::trace!("fine detail");
        });

        assert!(last_line(&logger).contains("DEBU"));
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(true), "icm=debug");
        assert_eq!(default_filter(false), "icm=info");
    }
}
