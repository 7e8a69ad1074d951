//! Knowledge base integration.
//!
//! Optimisation plans are handed to a [`KnowledgeBase`] after every cycle.
//! No backing store exists yet; [`NoopKnowledgeBase`] only logs.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::types::OptimizationPlan;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn record(&self, plan: &OptimizationPlan) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopKnowledgeBase;

#[async_trait]
impl KnowledgeBase for NoopKnowledgeBase {
    async fn record(&self, plan: &OptimizationPlan) -> Result<()> {
        debug!(
            campaigns = plan.campaigns.len(),
            skipped = plan.skipped.len(),
            generated_at = %plan.generated_at,
            "Plan recorded (no-op)"
        );
        Ok(())
    }
}
