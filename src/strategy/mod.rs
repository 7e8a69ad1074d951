//! Strategy optimisation over collected network stats.
//!
//! The engine only depends on the [`Optimizer`] trait. [`MetricsOptimizer`]
//! is the built-in strategy: it reads click/conversion/revenue/cost
//! figures from each network payload and nudges the bid for that network
//! up or down in proportion to its ROI.

use chrono::Utc;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::OptimizerConfig;
use crate::types::{AggregationResult, CampaignMetrics, OptimizationPlan, OptimizationResult, OptimizeError};

/// Pluggable optimisation strategy.
pub trait Optimizer: Send + Sync {
    fn optimize(&self, data: &AggregationResult) -> Result<OptimizationPlan, OptimizeError>;

    /// Strategy identifier for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Metrics optimiser
// ---------------------------------------------------------------------------

pub struct MetricsOptimizer {
    learning_rate: Decimal,
    min_bid: Decimal,
    max_bid: Decimal,
}

impl Default for MetricsOptimizer {
    fn default() -> Self {
        Self::new(&OptimizerConfig::default())
    }
}

impl MetricsOptimizer {
    pub fn new(config: &OptimizerConfig) -> Self {
        let lo = Decimal::from_f64(config.min_bid_multiplier).unwrap_or(dec!(0.5));
        let hi = Decimal::from_f64(config.max_bid_multiplier).unwrap_or(dec!(2.0));
        Self {
            learning_rate: Decimal::from_f64(config.learning_rate).unwrap_or(dec!(0.1)),
            min_bid: lo.min(hi),
            max_bid: lo.max(hi),
        }
    }

    /// Pull campaign metrics out of a stats payload.
    ///
    /// The payload must be an object with a numeric `clicks`. Money fields
    /// that are present must fit in a `Decimal`, and the derived ratios must
    /// not overflow; otherwise the payload is unusable.
    fn extract_metrics(payload: &Value) -> Result<CampaignMetrics, SkipReason> {
        let obj = payload.as_object().ok_or(SkipReason::NoClicks)?;
        let clicks = obj.get("clicks").and_then(as_count).ok_or(SkipReason::NoClicks)?;
        let conversions = obj.get("conversions").and_then(as_count).unwrap_or(0);
        let revenue = money_field(obj, "revenue")?;
        let cost = money_field(obj, "cost")?;

        let conversion_rate = if clicks > 0 {
            Decimal::from(conversions)
                .checked_div(Decimal::from(clicks))
                .ok_or(SkipReason::Overflow("conversion_rate"))?
                .round_dp(4)
        } else {
            Decimal::ZERO
        };

        let roi = if cost > Decimal::ZERO {
            Some(
                revenue
                    .checked_div(cost)
                    .ok_or(SkipReason::Overflow("roi"))?
                    .round_dp(4),
            )
        } else {
            None
        };

        Ok(CampaignMetrics {
            clicks,
            conversions,
            revenue,
            cost,
            conversion_rate,
            roi,
        })
    }

    /// 1 + lr·(ROI − 1), clamped to the configured band. Neutral without ROI.
    /// Saturates to the band edge when the intermediate product overflows.
    fn bid_multiplier(&self, roi: Option<Decimal>) -> Decimal {
        let Some(roi) = roi else {
            return Decimal::ONE;
        };
        let raw = roi
            .checked_sub(Decimal::ONE)
            .and_then(|excess| self.learning_rate.checked_mul(excess))
            .and_then(|step| Decimal::ONE.checked_add(step));
        match raw {
            Some(raw) => raw.clamp(self.min_bid, self.max_bid).round_dp(4),
            None if (roi > Decimal::ONE) == (self.learning_rate > Decimal::ZERO) => self.max_bid,
            None => self.min_bid,
        }
    }
}

/// Why a payload could not be turned into campaign metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    NoClicks,
    /// A money field is present but is not a number a `Decimal` can hold.
    Unrepresentable(&'static str),
    Overflow(&'static str),
}

impl Optimizer for MetricsOptimizer {
    fn optimize(&self, data: &AggregationResult) -> Result<OptimizationPlan, OptimizeError> {
        if data.is_empty() {
            return Err(OptimizeError::NoData);
        }

        let mut campaigns = Vec::with_capacity(data.len());
        let mut skipped = Vec::new();
        let mut all_missing_clicks = true;

        for (source, payload) in data.iter() {
            match Self::extract_metrics(payload) {
                Ok(metrics) => {
                    let bid_multiplier = self.bid_multiplier(metrics.roi);
                    debug!(source, roi = ?metrics.roi, %bid_multiplier, "Campaign optimised");
                    campaigns.push(OptimizationResult {
                        campaign_id: source.to_string(),
                        metrics,
                        bid_multiplier,
                    });
                }
                Err(reason) => {
                    debug!(source, ?reason, "Payload unusable, skipping");
                    all_missing_clicks &= reason == SkipReason::NoClicks;
                    skipped.push(source.to_string());
                }
            }
        }

        if campaigns.is_empty() {
            return Err(if all_missing_clicks {
                OptimizeError::MissingField("clicks")
            } else {
                OptimizeError::NoUsablePayload
            });
        }

        Ok(OptimizationPlan {
            generated_at: Utc::now(),
            campaigns,
            skipped,
        })
    }

    fn name(&self) -> &str {
        "metrics"
    }
}

fn as_count(v: &Value) -> Option<u64> {
    v.as_u64()
        .or_else(|| v.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
}

/// An absent money field counts as zero; a present one must be representable.
fn money_field(obj: &Map<String, Value>, key: &'static str) -> Result<Decimal, SkipReason> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(Decimal::ZERO),
        Some(v) => as_amount(v).ok_or(SkipReason::Unrepresentable(key)),
    }
}

fn as_amount(v: &Value) -> Option<Decimal> {
    if let Some(i) = v.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = v.as_u64() {
        return Some(Decimal::from(u));
    }
    v.as_f64().filter(|f| f.is_finite()).and_then(Decimal::from_f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
