//! Revenue engine: the collect → optimise → record cycle.

pub mod report;
pub mod revenue;

pub use report::CycleReport;
pub use revenue::RevenueEngine;
