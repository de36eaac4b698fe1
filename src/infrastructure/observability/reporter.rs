//! Push-based metrics reporter for the exporter
//!
//! Periodically runs a collection cycle and writes the result to stdout,
//! either as Prometheus text exposition or as a structured JSON line.

use crate::application::collector::{MemPoolCollector, ScrapeSummary};
use crate::config::OutputFormat;
use crate::infrastructure::observability::metrics::Metrics;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics snapshot for JSON output
#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub target: String,
    pub scrape: Option<ScrapeSummary>,
    pub error: Option<String>,
    pub pools: Vec<PoolSnapshot>,
}

#[derive(Serialize)]
pub struct PoolSnapshot {
    pub k_id: String,
    pub pool: String,
    pub obj_size_bytes: f64,
    pub chunks_kb_per_chunk: f64,
}

/// Result of one reporter cycle
pub struct CycleOutput {
    pub rendered: String,
    pub fetched: bool,
}

/// Push-based metrics reporter
///
/// Outputs one rendering per interval to stdout.
/// No HTTP server, no incoming connections - only outbound data.
pub struct MetricsReporter {
    collector: MemPoolCollector,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
    output: OutputFormat,
}

impl MetricsReporter {
    pub fn new(
        collector: MemPoolCollector,
        metrics: Metrics,
        interval_seconds: u64,
        output: OutputFormat,
    ) -> Self {
        Self {
            collector,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds),
            output,
        }
    }

    /// Run the reporter in a loop, outputting metrics periodically
    pub async fn run(self) {
        info!(
            "MetricsReporter: Scraping {} every {:?} ({:?} output)",
            self.collector.target(),
            self.interval,
            self.output
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match self.cycle().await {
                Ok(output) => {
                    println!("{}", output.rendered.trim_end());
                    if output.fetched {
                        info!(
                            "Mem pools: {} series | Uptime: {}s",
                            self.metrics.mempool.len(),
                            self.start_time.elapsed().as_secs()
                        );
                    }
                }
                Err(e) => warn!("Failed to render metrics: {}", e),
            }
        }
    }

    /// Run one collection cycle and render it in the configured format
    pub async fn cycle(&self) -> anyhow::Result<CycleOutput> {
        match self.output {
            OutputFormat::Text => {
                let families = self.collector.collect().await;
                Ok(CycleOutput {
                    rendered: self.metrics.render(&families),
                    fetched: self.metrics.last_scrape_success.get() == 1.0,
                })
            }
            OutputFormat::Json => {
                let snapshot = self.collect_snapshot().await;
                let fetched = self.metrics.last_scrape_success.get() == 1.0;
                let json = serde_json::to_string(&snapshot)?;
                Ok(CycleOutput {
                    // Use a special prefix so logs can be easily filtered
                    rendered: format!("METRICS_JSON:{}", json),
                    fetched,
                })
            }
        }
    }

    /// Scrape and capture the current gauge values
    async fn collect_snapshot(&self) -> MetricsSnapshot {
        let (scrape, error) = match self.collector.scrape().await {
            Ok(summary) => (Some(summary), None),
            Err(e) => {
                warn!("Error fetching data from Squid: {}", e);
                (None, Some(e.to_string()))
            }
        };

        // A failed fetch publishes nothing for the cycle, same as the text output
        if error.is_some() {
            return self.snapshot(scrape, error, Vec::new());
        }

        let gauges = &self.metrics.mempool;
        let pools = gauges
            .label_sets()
            .into_iter()
            .filter_map(|(k_id, pool)| {
                let obj_size_bytes = gauges.obj_size(&k_id, &pool)?;
                let chunks_kb_per_chunk = gauges.chunk_kb(&k_id, &pool)?;
                Some(PoolSnapshot {
                    k_id,
                    pool,
                    obj_size_bytes,
                    chunks_kb_per_chunk,
                })
            })
            .collect();

        self.snapshot(scrape, error, pools)
    }

    fn snapshot(
        &self,
        scrape: Option<ScrapeSummary>,
        error: Option<String>,
        pools: Vec<PoolSnapshot>,
    ) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            target: self.collector.target(),
            scrape,
            error,
            pools,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::StaticReportSource;
    use std::sync::Arc;

    fn reporter(source: StaticReportSource, output: OutputFormat) -> MetricsReporter {
        let metrics = Metrics::new().expect("Failed to create metrics");
        let collector = MemPoolCollector::new(Arc::new(source), metrics.clone());
        MetricsReporter::new(collector, metrics, 60, output)
    }

    #[tokio::test]
    async fn test_text_cycle_renders_exposition() {
        let reporter = reporter(
            StaticReportSource::from_text("kid1 aufs_queue 4096\n"),
            OutputFormat::Text,
        );

        let output = reporter.cycle().await.expect("cycle");

        assert!(output.fetched);
        assert!(output
            .rendered
            .contains("squid_mempool_obj_size_bytes{k_id=\"kid1\",pool=\"aufs_queue\"} 4096"));
        assert!(output.rendered.contains("squid_exporter_last_scrape_success 1"));
    }

    #[tokio::test]
    async fn test_json_cycle_snapshot() {
        let reporter = reporter(
            StaticReportSource::from_text("kid1 aufs_queue 4096\nkid2 cbdata 2048\n"),
            OutputFormat::Json,
        );

        let output = reporter.cycle().await.expect("cycle");
        let json = output.rendered.strip_prefix("METRICS_JSON:").expect("prefix");
        let value: serde_json::Value = serde_json::from_str(json).expect("valid json");

        assert_eq!(value["pools"].as_array().map(|p| p.len()), Some(2));
        assert_eq!(value["pools"][0]["chunks_kb_per_chunk"], 4.0);
        assert_eq!(value["scrape"]["records_applied"], 2);
        assert!(value["error"].is_null());
    }

    #[tokio::test]
    async fn test_json_cycle_reports_fetch_error() {
        let reporter = reporter(
            StaticReportSource::failing("http://127.0.0.1:1/squid-internal-mgr/mem", "refused"),
            OutputFormat::Json,
        );

        let output = reporter.cycle().await.expect("cycle");

        assert!(!output.fetched);
        assert!(output.rendered.contains("refused"));
    }

    #[tokio::test]
    async fn test_json_cycle_after_failure_drops_stale_pools() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        let source = Arc::new(StaticReportSource::from_text("kid1 aufs_queue 4096\n"));
        let collector = MemPoolCollector::new(source.clone(), metrics.clone());
        let reporter = MetricsReporter::new(collector, metrics.clone(), 60, OutputFormat::Json);

        let parse = |rendered: &str| -> serde_json::Value {
            let json = rendered.strip_prefix("METRICS_JSON:").expect("prefix");
            serde_json::from_str(json).expect("valid json")
        };

        let first = parse(&reporter.cycle().await.expect("cycle").rendered);
        assert_eq!(first["pools"].as_array().map(|p| p.len()), Some(1));

        source.set_failure("connection refused").await;
        let output = reporter.cycle().await.expect("cycle");
        let second = parse(&output.rendered);

        assert!(!output.fetched);
        assert!(second["error"].as_str().unwrap_or_default().contains("connection refused"));
        assert_eq!(second["pools"].as_array().map(|p| p.len()), Some(0));
        // Stored values survive for the next successful cycle
        assert_eq!(metrics.mempool.obj_size("kid1", "aufs_queue"), Some(4096.0));
    }

    #[tokio::test]
    async fn test_text_cycle_after_failure_has_only_health() {
        let reporter = reporter(
            StaticReportSource::failing("http://127.0.0.1:1/squid-internal-mgr/mem", "refused"),
            OutputFormat::Text,
        );

        let output = reporter.cycle().await.expect("cycle");

        assert!(!output.fetched);
        assert!(!output.rendered.contains("squid_mempool_"));
        assert!(output.rendered.contains("squid_exporter_scrapes_total{outcome=\"fetch_error\"} 1"));
    }
}
