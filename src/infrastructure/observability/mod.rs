//! Push-based observability for the exporter
//!
//! This module provides observability through **outbound data only** - no HTTP server,
//! no incoming requests. Each cycle is written to stdout as either:
//!
//! 1. **Prometheus text exposition**: ready for a textfile collector or a sidecar
//! 2. **Structured JSON Logs**: one `METRICS_JSON:` line (for Loki, Fluentd, CloudWatch)

pub mod metrics;
pub mod reporter;
pub mod scrape_timer;

pub use metrics::{MemPoolGauges, Metrics};
pub use reporter::MetricsReporter;
