//! Shared types for the affiliate revenue engine.
//!
//! These types form the data model used across the collector, the
//! optimiser and the engine facade. Everything here is call-scoped:
//! nothing outlives a single collection or optimisation pass.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// A source identifier supplied by the caller: a URL or a logical
/// network name that the HTTP client accepts as a target.
pub type Source = String;

// ---------------------------------------------------------------------------
// Aggregation result
// ---------------------------------------------------------------------------

/// Ordered mapping of source → decoded JSON payload.
///
/// Iteration order is request order. Inserting an existing key replaces
/// its payload in place (last write wins, first position kept).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationResult {
    entries: Vec<(Source, Value)>,
}

impl AggregationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a payload, replacing any earlier payload for the same source.
    pub fn insert(&mut self, source: impl Into<Source>, payload: Value) {
        let source = source.into();
        match self.entries.iter_mut().find(|(s, _)| *s == source) {
            Some(entry) => entry.1 = payload,
            None => self.entries.push((source, payload)),
        }
    }

    pub fn get(&self, source: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.get(source).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sources in request order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(s, v)| (s.as_str(), v))
    }
}

impl Serialize for AggregationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (source, payload) in &self.entries {
            map.serialize_entry(source, payload)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Per-source outcomes
// ---------------------------------------------------------------------------

/// Internal classification of a single request.
#[derive(Debug)]
pub(crate) enum RequestOutcome {
    Success(Value),
    HttpError(u16),
    DecodeError(String),
    TransportError(reqwest::Error),
}

/// Why a source was excluded from the aggregation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The source answered with something other than HTTP 200.
    HttpStatus(u16),
    /// The source answered 200 but the body was not valid JSON.
    Decode(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::HttpStatus(status) => write!(f, "HTTP {status}"),
            FailureReason::Decode(msg) => write!(f, "invalid JSON body: {msg}"),
        }
    }
}

/// A recoverable per-source failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: Source,
    pub reason: FailureReason,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

/// Everything a single `collect` call produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Collection {
    /// Sources that answered 200 with parseable JSON.
    pub data: AggregationResult,
    /// Sources that answered but were excluded, in request order.
    pub failures: Vec<SourceFailure>,
    /// Requests that reached a terminal outcome. Counts repeated sources
    /// once per request, unlike `data`, which keeps one entry per source.
    pub attempts: usize,
}

impl Collection {
    /// Record a successful payload.
    pub fn record_success(&mut self, source: impl Into<Source>, payload: Value) {
        self.attempts += 1;
        self.data.insert(source, payload);
    }

    /// Record an excluded source.
    pub fn record_failure(&mut self, failure: SourceFailure) {
        self.attempts += 1;
        self.failures.push(failure);
    }

    /// Number of requests that reached a terminal outcome.
    pub fn attempted(&self) -> usize {
        self.attempts
    }
}

// ---------------------------------------------------------------------------
// Optimisation output
// ---------------------------------------------------------------------------

/// Performance metrics extracted from one network's stats payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub conversion_rate: Decimal,
    /// revenue / cost; absent when no cost was reported.
    pub roi: Option<Decimal>,
}

/// Optimised parameters for a single campaign (one source).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub campaign_id: String,
    pub metrics: CampaignMetrics,
    pub bid_multiplier: Decimal,
}

impl OptimizationResult {
    /// A campaign is profitable when it returns more than it costs.
    pub fn is_profitable(&self) -> bool {
        self.metrics.roi.is_some_and(|roi| roi > Decimal::ONE)
    }
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roi = self
            .metrics
            .roi
            .map(|r| format!("{:.2}", r))
            .unwrap_or_else(|| "n/a".to_string());
        write!(
            f,
            "[{}] clicks: {} | conv: {} | ROI: {} | bid x{:.2}",
            self.campaign_id, self.metrics.clicks, self.metrics.conversions, roi, self.bid_multiplier,
        )
    }
}

/// Output of one optimisation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationPlan {
    pub generated_at: DateTime<Utc>,
    pub campaigns: Vec<OptimizationResult>,
    /// Sources whose payload lacked `clicks` or carried unusable money figures.
    pub skipped: Vec<Source>,
}

impl OptimizationPlan {
    pub fn profitable(&self) -> impl Iterator<Item = &OptimizationResult> {
        self.campaigns.iter().filter(|c| c.is_profitable())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal collection error. Per-source HTTP and decode failures never
/// surface here; they are reported in [`Collection::failures`].
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// No HTTP response could be obtained from `url`. The batch was aborted
    /// at this source; results gathered before it are discarded.
    #[error("Transport failure for {url}: {cause}")]
    Transport {
        url: Source,
        #[source]
        cause: reqwest::Error,
    },
}

impl CollectError {
    /// The source at which the batch was aborted.
    pub fn failed_source(&self) -> &str {
        match self {
            CollectError::Transport { url, .. } => url,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            CollectError::Transport { cause, .. } => cause.is_timeout(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error("No data to optimise")]
    NoData,

    #[error("No payload carries the required field `{0}`")]
    MissingField(&'static str),

    #[error("No payload has representable metrics")]
    NoUsablePayload,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
