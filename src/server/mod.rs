//! Listeners and process plumbing
//!
//! - API listener (TLS or plain HTTP)
//! - Health/metrics listener (plain HTTP)
//! - Shutdown fan-out

mod health;
mod listener;
pub mod metrics;
mod shutdown;

pub use health::{health_router, run_health_server, ReadinessState};
pub use listener::{run_api_server, ServerError, SHUTDOWN_GRACE};
pub use metrics::{create_metrics, ApiMetrics, SharedMetrics};
pub use shutdown::{shutdown_channel, wait_for_termination, ShutdownSignal, ShutdownTrigger};

#[cfg(test)]
#[path = "health_test.rs"]
mod tests;

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_tests;
