//! Shared fixtures for integration tests.
//!
//! Provides a [`RecordingTelemetry`] that captures every collection
//! event in memory, and helpers for standing up `wiremock` sources.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use affiliate_engine::config::CollectorConfig;
use affiliate_engine::data::{CollectionTelemetry, DataCollector};
use affiliate_engine::types::SourceFailure;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One captured telemetry event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Info { source: String, status: u16 },
    Error { source: String, detail: String },
}

impl Event {
    pub fn is_error(&self) -> bool {
        matches!(self, Event::Error { .. })
    }

    pub fn source(&self) -> &str {
        match self {
            Event::Info { source, .. } | Event::Error { source, .. } => source,
        }
    }
}

/// In-memory telemetry sink.
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<Event>>,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<Event> {
        self.events().into_iter().filter(Event::is_error).collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl CollectionTelemetry for RecordingTelemetry {
    fn source_succeeded(&self, source: &str, status: u16) {
        self.push(Event::Info {
            source: source.to_string(),
            status,
        });
    }

    fn source_failed(&self, failure: &SourceFailure) {
        self.push(Event::Error {
            source: failure.source.clone(),
            detail: failure.reason.to_string(),
        });
    }

    fn transport_failed(&self, source: &str, error: &reqwest::Error) {
        self.push(Event::Error {
            source: source.to_string(),
            detail: error.to_string(),
        });
    }
}

/// Collector with a short timeout wired to a fresh recorder.
pub fn recording_collector(timeout: Duration) -> (DataCollector, Arc<RecordingTelemetry>) {
    let telemetry = Arc::new(RecordingTelemetry::default());
    let config = CollectorConfig {
        timeout_ms: timeout.as_millis() as u64,
        ..CollectorConfig::default()
    };
    let collector = DataCollector::with_telemetry(&config, telemetry.clone()).unwrap();
    (collector, telemetry)
}

/// Mount a JSON response for `GET route`.
pub async fn mount_json(server: &MockServer, route: &str, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a route that must never be requested.
pub async fn mount_untouched(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}
