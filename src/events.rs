//! Observability sink for client construction and backoff decisions
//!
//! The factory and the backoff strategy report what they decided through an
//! [`EventSink`] instead of logging directly. The default sink drops
//! everything; the binary installs [`TracingSink`] and tests install
//! [`RecordingSink`] to assert on the exact messages.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Something the client did that is worth an informational log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The factory finished building a client for this base URL
    Configured { base_url: String },
    /// A 429 carried a reset timestamp; raw sleep before bounds are applied
    RateLimitWait { sleep_secs: i64 },
    /// Default exponential backoff was chosen
    BackoffWait { wait: Duration },
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured { base_url } => {
                write!(f, "DigitalOcean Client configured for URL: {base_url}")
            }
            Self::RateLimitWait { sleep_secs } => {
                write!(f, "Reached API Rate Limit, waiting: {sleep_secs} seconds")
            }
            Self::BackoffWait { wait } => {
                write!(
                    f,
                    "API Error (not Rate Limit), waiting: {} seconds",
                    wait.as_secs_f64()
                )
            }
        }
    }
}

/// Receiver of [`ClientEvent`]s
pub trait EventSink: Send + Sync {
    /// Record one event
    fn record(&self, event: ClientEvent);
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn EventSink>;

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn record(&self, _event: ClientEvent) {}
}

/// Sink that forwards events to `tracing` at INFO
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: ClientEvent) {
        tracing::info!("{event}");
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ClientEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<ClientEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Rendered messages of the events recorded so far
    pub fn messages(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: ClientEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// The sink used when the caller injects none
pub fn noop() -> SharedSink {
    Arc::new(NoopSink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_shapes() {
        let configured = ClientEvent::Configured {
            base_url: "https://api.digitalocean.com/".to_string(),
        };
        assert_eq!(
            configured.to_string(),
            "DigitalOcean Client configured for URL: https://api.digitalocean.com/"
        );

        let rate = ClientEvent::RateLimitWait { sleep_secs: 10 };
        assert_eq!(rate.to_string(), "Reached API Rate Limit, waiting: 10 seconds");

        let backoff = ClientEvent::BackoffWait {
            wait: Duration::from_millis(1500),
        };
        assert_eq!(
            backoff.to_string(),
            "API Error (not Rate Limit), waiting: 1.5 seconds"
        );
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.record(ClientEvent::RateLimitWait { sleep_secs: -5 });
        sink.record(ClientEvent::BackoffWait {
            wait: Duration::from_secs(2),
        });

        assert_eq!(
            sink.events(),
            vec![
                ClientEvent::RateLimitWait { sleep_secs: -5 },
                ClientEvent::BackoffWait {
                    wait: Duration::from_secs(2)
                },
            ]
        );
    }

    #[test]
    fn test_noop_sink_accepts_events() {
        let sink = noop();
        sink.record(ClientEvent::RateLimitWait { sleep_secs: 1 });
    }
}
