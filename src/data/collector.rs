//! Multi-source stats collector.
//!
//! Polls a list of affiliate networks over HTTP, one at a time, and
//! aggregates the JSON payloads keyed by the caller's source string.
//!
//! Failure policy:
//! - non-200 or undecodable 200 → recorded in [`Collection::failures`],
//!   reported to telemetry, batch continues;
//! - no response at all (connect, DNS, timeout, body read) → reported to
//!   telemetry, batch aborts with [`CollectError::Transport`]. Sources after
//!   the failing one are never requested and earlier results are dropped.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::proxy::{selector_for, ProxySelector};
use super::telemetry::{CollectionTelemetry, TracingTelemetry};
use crate::config::CollectorConfig;
use crate::types::{CollectError, Collection, FailureReason, RequestOutcome, SourceFailure};

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

pub struct DataCollector {
    /// Used when no proxy pool is configured.
    direct: Client,
    /// One client per configured proxy, in configuration order.
    proxied: Vec<Client>,
    selector: Box<dyn ProxySelector>,
    telemetry: Arc<dyn CollectionTelemetry>,
    endpoint_path: Option<String>,
}

impl DataCollector {
    /// Build a collector that reports outcomes through `tracing`.
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        Self::with_telemetry(config, Arc::new(TracingTelemetry))
    }

    /// Build a collector that reports outcomes to `telemetry`.
    pub fn with_telemetry(
        config: &CollectorConfig,
        telemetry: Arc<dyn CollectionTelemetry>,
    ) -> Result<Self> {
        let headers = build_headers(&config.headers)?;
        let timeout = config.timeout();

        let direct = build_client(&headers, timeout, None)
            .context("Failed to build collector HTTP client")?;

        let proxied = config
            .proxies
            .iter()
            .map(|endpoint| {
                let proxy = Proxy::all(endpoint)
                    .with_context(|| format!("Invalid proxy endpoint: {endpoint}"))?;
                build_client(&headers, timeout, Some(proxy))
                    .with_context(|| format!("Failed to build HTTP client for proxy {endpoint}"))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            timeout_ms = config.timeout_ms,
            proxies = proxied.len(),
            rotation = ?config.proxy_rotation,
            "Collector initialised"
        );

        Ok(Self {
            direct,
            proxied,
            selector: selector_for(config.proxy_rotation),
            telemetry,
            endpoint_path: config.endpoint_path.clone(),
        })
    }

    /// Replace the proxy selection strategy.
    pub fn with_proxy_selector(mut self, selector: Box<dyn ProxySelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Append `path` to every source when building request URLs.
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = Some(path.into());
        self
    }

    /// Query every source in order and aggregate the successful payloads.
    ///
    /// An empty `sources` slice returns an empty collection without any
    /// network traffic or telemetry.
    pub async fn collect<S: AsRef<str>>(&self, sources: &[S]) -> Result<Collection, CollectError> {
        let mut collection = Collection::default();
        if sources.is_empty() {
            return Ok(collection);
        }

        let run_id = Uuid::new_v4();
        debug!(%run_id, sources = sources.len(), "Starting collection");

        for source in sources {
            let source = source.as_ref();
            let url = self.request_url(source);
            let client = self.next_client();

            match Self::fetch(client, &url).await {
                RequestOutcome::Success(payload) => {
                    self.telemetry.source_succeeded(source, StatusCode::OK.as_u16());
                    collection.record_success(source, payload);
                }
                RequestOutcome::HttpError(status) => {
                    self.record_failure(&mut collection, source, FailureReason::HttpStatus(status));
                }
                RequestOutcome::DecodeError(msg) => {
                    self.record_failure(&mut collection, source, FailureReason::Decode(msg));
                }
                RequestOutcome::TransportError(cause) => {
                    self.telemetry.transport_failed(source, &cause);
                    debug!(%run_id, aborted_at = source, "Collection aborted");
                    return Err(CollectError::Transport {
                        url: source.to_string(),
                        cause,
                    });
                }
            }
        }

        debug!(
            %run_id,
            succeeded = collection.data.len(),
            failed = collection.failures.len(),
            "Collection complete"
        );

        Ok(collection)
    }

    fn record_failure(&self, collection: &mut Collection, source: &str, reason: FailureReason) {
        let failure = SourceFailure {
            source: source.to_string(),
            reason,
        };
        self.telemetry.source_failed(&failure);
        collection.record_failure(failure);
    }

    fn next_client(&self) -> &Client {
        self.selector
            .select(self.proxied.len())
            .and_then(|slot| self.proxied.get(slot))
            .unwrap_or(&self.direct)
    }

    fn request_url(&self, source: &str) -> String {
        match &self.endpoint_path {
            Some(path) => format!(
                "{}/{}",
                source.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => source.to_string(),
        }
    }

    async fn fetch(client: &Client, url: &str) -> RequestOutcome {
        let resp = match client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => return RequestOutcome::TransportError(e),
        };

        let status = resp.status();
        if status != StatusCode::OK {
            return RequestOutcome::HttpError(status.as_u16());
        }

        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => return RequestOutcome::TransportError(e),
        };

        match serde_json::from_slice::<Value>(&body) {
            Ok(payload) => RequestOutcome::Success(payload),
            Err(e) => RequestOutcome::DecodeError(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Client construction
// ---------------------------------------------------------------------------

fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("Invalid header name: {name}"))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid value for header {name}"))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn build_client(headers: &HeaderMap, timeout: Duration, proxy: Option<Proxy>) -> Result<Client> {
    let builder = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("affiliate-engine/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers.clone());

    let builder = match proxy {
        Some(proxy) => builder.proxy(proxy),
        None => builder.no_proxy(),
    };

    Ok(builder.build()?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
