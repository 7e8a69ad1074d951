//! Revenue engine facade.
//!
//! Owns the network collector, the optional cashflow tracker, the
//! optimisation strategy and the knowledge base, and runs one
//! collect → optimise → record cycle at a time.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use super::report::CycleReport;
use crate::config::AppConfig;
use crate::data::{CashflowTracker, DataCollector};
use crate::knowledge::{KnowledgeBase, NoopKnowledgeBase};
use crate::strategy::{MetricsOptimizer, Optimizer};
use crate::types::{AggregationResult, CollectError, Collection, OptimizationPlan, OptimizeError};

pub struct RevenueEngine {
    collector: DataCollector,
    cashflow: Option<CashflowTracker>,
    optimizer: Box<dyn Optimizer>,
    knowledge: Box<dyn KnowledgeBase>,
}

impl RevenueEngine {
    pub fn new(
        collector: DataCollector,
        cashflow: Option<CashflowTracker>,
        optimizer: Box<dyn Optimizer>,
        knowledge: Box<dyn KnowledgeBase>,
    ) -> Self {
        Self {
            collector,
            cashflow,
            optimizer,
            knowledge,
        }
    }

    /// Wire up the default components from configuration.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let collector = DataCollector::new(&cfg.collector)
            .context("Failed to initialise network collector")?;

        let cashflow = if cfg.cashflow.enabled {
            Some(
                CashflowTracker::new(&cfg.cashflow, &cfg.collector)
                    .context("Failed to initialise cashflow tracker")?,
            )
        } else {
            None
        };

        Ok(Self::new(
            collector,
            cashflow,
            Box::new(MetricsOptimizer::new(&cfg.optimizer)),
            Box::new(NoopKnowledgeBase),
        ))
    }

    /// Collect performance data from the given affiliate networks.
    pub async fn collect_affiliate_data<S: AsRef<str>>(
        &self,
        networks: &[S],
    ) -> Result<Collection, CollectError> {
        self.collector.collect(networks).await.inspect_err(|e| {
            error!(error = %e, source = e.failed_source(), "Failed to collect data");
        })
    }

    /// Run the optimisation strategy over collected data.
    pub fn optimize_strategy(&self, data: &AggregationResult) -> Result<OptimizationPlan, OptimizeError> {
        self.optimizer.optimize(data).inspect_err(|e| {
            error!(error = %e, optimizer = self.optimizer.name(), "Optimisation failed");
        })
    }

    /// Poll payment gateways. `None` when cashflow tracking is disabled.
    pub async fn track_cashflow(&self) -> Result<Option<Collection>, CollectError> {
        match &self.cashflow {
            Some(tracker) => tracker.track_cashflow().await.map(Some),
            None => Ok(None),
        }
    }

    /// One full cycle: collect → optimise → record → cashflow.
    ///
    /// A transport failure on either the networks or the gateways fails
    /// the cycle. When no network returns usable data the optimiser is
    /// skipped and nothing is recorded.
    pub async fn run_cycle<S: AsRef<str>>(&self, networks: &[S]) -> Result<CycleReport> {
        info!(networks = networks.len(), "Starting cycle");

        let collection = self
            .collect_affiliate_data(networks)
            .await
            .context("Network collection aborted")?;

        let plan = if collection.data.is_empty() {
            warn!(
                failed = collection.failures.len(),
                "No network returned usable data, skipping optimisation"
            );
            None
        } else {
            let plan = self.optimize_strategy(&collection.data)?;
            for campaign in &plan.campaigns {
                if campaign.is_profitable() {
                    info!(campaign = %campaign, "Campaign is profitable");
                } else {
                    info!(campaign = %campaign, "Campaign not profitable, adjusting strategy");
                }
            }
            if let Err(e) = self.knowledge.record(&plan).await {
                warn!(error = %e, "Failed to record plan in knowledge base");
            }
            Some(plan)
        };

        let cashflow = self
            .track_cashflow()
            .await
            .context("Cashflow tracking aborted")?;

        Ok(CycleReport::build(
            networks.len(),
            &collection,
            plan.as_ref(),
            cashflow.as_ref(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
