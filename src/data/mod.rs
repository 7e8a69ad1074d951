//! Data collection from affiliate networks and payment gateways.
//!
//! [`collector::DataCollector`] is the sequential multi-source poller;
//! [`cashflow::CashflowTracker`] reuses it for payment gateways.

pub mod cashflow;
pub mod collector;
pub mod proxy;
pub mod telemetry;

pub use cashflow::CashflowTracker;
pub use collector::DataCollector;
pub use proxy::{FirstProxySelector, ProxySelector, RoundRobinSelector};
pub use telemetry::{CollectionTelemetry, TracingTelemetry};
