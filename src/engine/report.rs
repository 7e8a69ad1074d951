//! Cycle report: what one collect → optimise → record pass achieved.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::types::{Collection, OptimizationPlan, SourceFailure};

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub networks_requested: usize,
    pub networks_responded: usize,
    /// Networks that answered but were excluded (non-200 or bad JSON).
    pub failures: Vec<SourceFailure>,
    pub campaigns_optimised: usize,
    pub profitable_campaigns: usize,
    /// Revenue summed over optimised campaigns.
    pub total_revenue: Decimal,
    /// Cost summed over optimised campaigns.
    pub total_cost: Decimal,
    /// Gateways that reported cashflow; `None` when tracking is disabled.
    pub gateways_reported: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

impl CycleReport {
    /// Summarise a cycle from its collection and (optional) plan.
    pub fn build(
        networks_requested: usize,
        collection: &Collection,
        plan: Option<&OptimizationPlan>,
        cashflow: Option<&Collection>,
    ) -> Self {
        let (campaigns_optimised, profitable_campaigns, total_revenue, total_cost): (
            usize,
            usize,
            Decimal,
            Decimal,
        ) = match plan {
            Some(plan) => (
                plan.campaigns.len(),
                plan.profitable().count(),
                saturating_total(plan.campaigns.iter().map(|c| c.metrics.revenue)),
                saturating_total(plan.campaigns.iter().map(|c| c.metrics.cost)),
            ),
            None => (0, 0, Decimal::ZERO, Decimal::ZERO),
        };

        let report = CycleReport {
            cycle_id: Uuid::new_v4(),
            networks_requested,
            networks_responded: collection.data.len(),
            failures: collection.failures.clone(),
            campaigns_optimised,
            profitable_campaigns,
            total_revenue,
            total_cost,
            gateways_reported: cashflow.map(|c| c.data.len()),
            timestamp: Utc::now(),
        };

        info!(
            cycle_id = %report.cycle_id,
            requested = report.networks_requested,
            responded = report.networks_responded,
            failed = report.failures.len(),
            campaigns = report.campaigns_optimised,
            profitable = report.profitable_campaigns,
            revenue = format!("${:.2}", report.total_revenue),
            cost = format!("${:.2}", report.total_cost),
            "Cycle complete"
        );

        report
    }

    /// Net margin across optimised campaigns.
    pub fn net(&self) -> Decimal {
        self.total_revenue.saturating_sub(self.total_cost)
    }
}

/// Sum that pins at `Decimal::MAX`/`MIN` instead of overflowing.
fn saturating_total(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
