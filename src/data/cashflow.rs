//! Payment gateway cashflow tracker.
//!
//! Polls `<gateway>/cashflow` on each configured payment gateway through
//! a [`DataCollector`], so gateways share the collector's timeout policy,
//! headers and failure semantics.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use super::collector::DataCollector;
use super::telemetry::{CollectionTelemetry, TracingTelemetry};
use crate::config::{CashflowConfig, CollectorConfig};
use crate::types::{CollectError, Collection};

pub struct CashflowTracker {
    collector: DataCollector,
    gateways: Vec<String>,
}

impl CashflowTracker {
    pub fn new(cashflow: &CashflowConfig, collector: &CollectorConfig) -> Result<Self> {
        Self::with_telemetry(cashflow, collector, Arc::new(TracingTelemetry))
    }

    pub fn with_telemetry(
        cashflow: &CashflowConfig,
        collector: &CollectorConfig,
        telemetry: Arc<dyn CollectionTelemetry>,
    ) -> Result<Self> {
        let collector = DataCollector::with_telemetry(collector, telemetry)?
            .with_endpoint_path(cashflow.endpoint_path.clone());
        Ok(Self {
            collector,
            gateways: cashflow.gateways.clone(),
        })
    }

    pub fn gateways(&self) -> &[String] {
        &self.gateways
    }

    /// Fetch the current cashflow report from every gateway.
    pub async fn track_cashflow(&self) -> Result<Collection, CollectError> {
        let collection = self.collector.collect(&self.gateways).await?;
        info!(
            gateways = self.gateways.len(),
            reported = collection.data.len(),
            failed = collection.failures.len(),
            "Cashflow tracked"
        );
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_track_cashflow_uses_cashflow_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cashflow"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"inflow": 120.5})))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = CashflowConfig {
            enabled: true,
            gateways: vec![server.uri()],
            endpoint_path: "/cashflow".into(),
        };
        let tracker = CashflowTracker::new(&cfg, &CollectorConfig::default()).unwrap();
        let collection = tracker.track_cashflow().await.unwrap();

        assert_eq!(collection.data.get(&server.uri()), Some(&json!({"inflow": 120.5})));
        assert!(collection.failures.is_empty());
    }

    #[tokio::test]
    async fn test_no_gateways() {
        let cfg = CashflowConfig {
            enabled: true,
            gateways: Vec::new(),
            endpoint_path: "/cashflow".into(),
        };
        let tracker = CashflowTracker::new(&cfg, &CollectorConfig::default()).unwrap();
        assert!(tracker.gateways().is_empty());
        let collection = tracker.track_cashflow().await.unwrap();
        assert_eq!(collection.attempted(), 0);
    }
}
