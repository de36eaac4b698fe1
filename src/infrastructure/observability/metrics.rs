//! Prometheus metrics definitions for the exporter
//!
//! Two families of metrics live here:
//!
//! 1. **Mem-pool gauges** (`squid_mempool_*`): republished from the Squid `mem`
//!    report and flushed by the collector on every cycle.
//! 2. **Exporter health** (`squid_exporter_*`): describes the scraper itself and
//!    is kept in a private registry.

use crate::domain::mempool::MemPoolRecord;
use prometheus::{
    CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
    core::{Collector, Desc},
    proto::MetricFamily,
};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

pub const OBJ_SIZE_METRIC: &str = "squid_mempool_obj_size_bytes";
pub const CHUNK_METRIC: &str = "squid_mempool_chunks_kb_per_chunk";
const MEMPOOL_LABELS: [&str; 2] = ["k_id", "pool"];

/// Label pair identifying one mem-pool series
pub type PoolKey = (String, String);

/// The two label-indexed mem-pool gauges.
///
/// Storage stays private: callers only set, read and enumerate.
#[derive(Clone)]
pub struct MemPoolGauges {
    obj_size: GaugeVec,
    chunk_kb: GaugeVec,
    known: Arc<RwLock<BTreeSet<PoolKey>>>,
}

impl MemPoolGauges {
    pub fn new() -> prometheus::Result<Self> {
        let obj_size = GaugeVec::new(
            Opts::new(OBJ_SIZE_METRIC, "Size of each object in the pool in bytes"),
            &MEMPOOL_LABELS,
        )?;
        let chunk_kb = GaugeVec::new(
            Opts::new(CHUNK_METRIC, "Chunk size in kilobytes"),
            &MEMPOOL_LABELS,
        )?;

        Ok(Self {
            obj_size,
            chunk_kb,
            known: Arc::new(RwLock::new(BTreeSet::new())),
        })
    }

    /// Write one record to both gauges under the same labels
    pub fn set(&self, record: &MemPoolRecord) {
        let labels = [record.k_id.as_str(), record.pool.as_str()];
        self.obj_size.with_label_values(&labels).set(record.obj_size);
        self.chunk_kb.with_label_values(&labels).set(record.chunk_kb());

        self.known
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((record.k_id.clone(), record.pool.clone()));
    }

    /// Current object size for a label pair, without creating the series
    pub fn obj_size(&self, k_id: &str, pool: &str) -> Option<f64> {
        self.read(&self.obj_size, k_id, pool)
    }

    /// Current chunk figure for a label pair, without creating the series
    pub fn chunk_kb(&self, k_id: &str, pool: &str) -> Option<f64> {
        self.read(&self.chunk_kb, k_id, pool)
    }

    fn read(&self, vec: &GaugeVec, k_id: &str, pool: &str) -> Option<f64> {
        let known = self.known.read().unwrap_or_else(|e| e.into_inner());
        if !known.contains(&(k_id.to_string(), pool.to_string())) {
            return None;
        }
        Some(vec.with_label_values(&[k_id, pool]).get())
    }

    /// Every label pair written so far, in sorted order
    pub fn label_sets(&self) -> Vec<PoolKey> {
        self.known
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.known.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Static descriptors of both gauges
    pub fn descs(&self) -> Vec<&Desc> {
        let mut descs = self.obj_size.desc();
        descs.extend(self.chunk_kb.desc());
        descs
    }

    /// Drain current values of both gauges into metric families.
    /// Empty until the first record is set; the text encoder rejects empty families.
    pub fn families(&self) -> Vec<MetricFamily> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut families = self.obj_size.collect();
        families.extend(self.chunk_kb.collect());
        families
    }
}

/// Prometheus metrics for the exporter
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Mem-pool gauges shared by every collector of this process
    pub mempool: MemPoolGauges,
    /// Scrape cycles by outcome
    pub scrapes_total: CounterVec,
    /// 1 if the last fetch read the whole report, 0 otherwise
    pub last_scrape_success: Gauge,
    /// Scrape cycle duration in seconds
    pub scrape_duration_seconds: Histogram,
    /// Relevant lines that could not be parsed, by reason
    pub malformed_lines_total: CounterVec,
    /// Records applied during the last successful cycle
    pub records_last_scrape: Gauge,
}

impl Metrics {
    /// Create a new Metrics instance with the health metrics registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let scrapes_total = CounterVec::new(
            Opts::new(
                "squid_exporter_scrapes_total",
                "Total scrape cycles by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(scrapes_total.clone()))?;

        let last_scrape_success = Gauge::with_opts(Opts::new(
            "squid_exporter_last_scrape_success",
            "Whether the last fetch read the whole mem report (1) or not (0)",
        ))?;
        registry.register(Box::new(last_scrape_success.clone()))?;

        let scrape_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "squid_exporter_scrape_duration_seconds",
                "Duration of a full fetch and parse cycle in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        registry.register(Box::new(scrape_duration_seconds.clone()))?;

        let malformed_lines_total = CounterVec::new(
            Opts::new(
                "squid_exporter_malformed_lines_total",
                "Total kid rows skipped because they could not be parsed",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(malformed_lines_total.clone()))?;

        let records_last_scrape = Gauge::with_opts(Opts::new(
            "squid_exporter_records_last_scrape",
            "Number of mem-pool records applied by the last cycle",
        ))?;
        registry.register(Box::new(records_last_scrape.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            mempool: MemPoolGauges::new()?,
            scrapes_total,
            last_scrape_success,
            scrape_duration_seconds,
            malformed_lines_total,
            records_last_scrape,
        })
    }

    /// Render collected families followed by the health metrics in Prometheus text format
    pub fn render(&self, collected: &[MetricFamily]) -> String {
        let encoder = TextEncoder::new();
        let mut families = collected.to_vec();
        families.extend(self.registry.gather());
        encoder.encode_to_string(&families).unwrap_or_default()
    }

    /// Increment scrape counter
    pub fn inc_scrapes(&self, outcome: &str) {
        self.scrapes_total.with_label_values(&[outcome]).inc();
    }

    /// Increment malformed line counter
    pub fn inc_malformed(&self, reason: &str) {
        self.malformed_lines_total.with_label_values(&[reason]).inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create default Metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(k_id: &str, pool: &str, obj_size: f64) -> MemPoolRecord {
        MemPoolRecord {
            k_id: k_id.to_string(),
            pool: pool.to_string(),
            obj_size,
        }
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        assert!(metrics.render(&[]).contains("squid_exporter_"));
    }

    #[test]
    fn test_gauges_set_both_series() {
        let gauges = MemPoolGauges::new().unwrap();
        gauges.set(&record("kid1", "aufs_queue", 4096.0));

        assert_eq!(gauges.obj_size("kid1", "aufs_queue"), Some(4096.0));
        assert_eq!(gauges.chunk_kb("kid1", "aufs_queue"), Some(4.0));
    }

    #[test]
    fn test_gauges_last_write_wins() {
        let gauges = MemPoolGauges::new().unwrap();
        gauges.set(&record("kid1", "mem_node", 2048.0));
        gauges.set(&record("kid1", "mem_node", 512.0));

        assert_eq!(gauges.obj_size("kid1", "mem_node"), Some(512.0));
        assert_eq!(gauges.chunk_kb("kid1", "mem_node"), Some(0.5));
        assert_eq!(gauges.len(), 1);
    }

    #[test]
    fn test_read_does_not_create_series() {
        let gauges = MemPoolGauges::new().unwrap();
        assert_eq!(gauges.obj_size("kid9", "unknown"), None);
        assert!(gauges.is_empty());
        assert!(gauges.families().is_empty());
    }

    #[test]
    fn test_label_sets_sorted() {
        let gauges = MemPoolGauges::new().unwrap();
        gauges.set(&record("kid2", "b", 1.0));
        gauges.set(&record("kid1", "a", 1.0));

        assert_eq!(
            gauges.label_sets(),
            vec![
                ("kid1".to_string(), "a".to_string()),
                ("kid2".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn test_render_includes_mempool_families() {
        let metrics = Metrics::new().unwrap();
        metrics.mempool.set(&record("kid1", "aufs_queue", 4096.0));
        let output = metrics.render(&metrics.mempool.families());

        let labels = "{k_id=\"kid1\",pool=\"aufs_queue\"}";
        assert!(output.contains(&format!("squid_mempool_obj_size_bytes{} 4096", labels)));
        assert!(output.contains(&format!("squid_mempool_chunks_kb_per_chunk{} 4", labels)));
    }

    #[test]
    fn test_descs_cover_both_gauges() {
        let gauges = MemPoolGauges::new().unwrap();
        let names: Vec<&str> = gauges.descs().iter().map(|d| d.fq_name.as_str()).collect();
        assert_eq!(names, vec![OBJ_SIZE_METRIC, CHUNK_METRIC]);
    }

    #[test]
    fn test_malformed_counter() {
        let metrics = Metrics::new().unwrap();
        metrics.inc_malformed("too_few_fields");
        metrics.inc_malformed("too_few_fields");
        assert_eq!(
            metrics
                .malformed_lines_total
                .with_label_values(&["too_few_fields"])
                .get(),
            2.0
        );
    }
}
