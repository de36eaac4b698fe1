//! Scrape-parse-publish cycle for the Squid memory-pool report.

use crate::domain::errors::{FetchError, RecordError};
use crate::domain::mempool::MemPoolRecord;
use crate::domain::ports::ReportSource;
use crate::infrastructure::observability::metrics::{MemPoolGauges, Metrics};
use crate::infrastructure::observability::scrape_timer::ScrapeTimer;
use futures::io::{AsyncBufRead, AsyncBufReadExt};
use prometheus::core::Desc;
use prometheus::proto::MetricFamily;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a single pass over a report did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeSummary {
    pub lines_read: usize,
    pub records_applied: usize,
    pub too_few_fields: usize,
    pub invalid_values: usize,
    /// The stream failed before EOF
    pub truncated: bool,
}

/// Collector for one Squid instance.
///
/// `describe` and `collect` are the two entry points a hosting exposition
/// layer calls; both can be called repeatedly.
pub struct MemPoolCollector {
    source: Arc<dyn ReportSource>,
    metrics: Metrics,
}

impl MemPoolCollector {
    pub fn new(source: Arc<dyn ReportSource>, metrics: Metrics) -> Self {
        Self { source, metrics }
    }

    pub fn target(&self) -> String {
        self.source.target()
    }

    pub fn gauges(&self) -> &MemPoolGauges {
        &self.metrics.mempool
    }

    /// Static descriptors of the published gauges
    pub fn describe(&self) -> Vec<&Desc> {
        self.metrics.mempool.descs()
    }

    /// Run one cycle and return the gauge families.
    /// A failed fetch is logged and yields no families.
    pub async fn collect(&self) -> Vec<MetricFamily> {
        match self.scrape().await {
            Ok(_) => self.metrics.mempool.families(),
            Err(e) => {
                warn!("Error fetching data from Squid: {}", e);
                Vec::new()
            }
        }
    }

    /// Fetch the report and map it into the gauges
    pub async fn scrape(&self) -> Result<ScrapeSummary, FetchError> {
        let timer = ScrapeTimer::start(self.metrics.scrape_duration_seconds.clone());

        let stream = match self.source.open().await {
            Ok(stream) => stream,
            Err(e) => {
                self.metrics.inc_scrapes("fetch_error");
                self.metrics.last_scrape_success.set(0.0);
                return Err(e);
            }
        };

        let summary = apply_report(stream, &self.metrics).await;

        if summary.truncated {
            // Partial rows stay mapped, but the cycle does not count as a full fetch
            self.metrics.inc_scrapes("truncated");
            self.metrics.last_scrape_success.set(0.0);
        } else {
            self.metrics.inc_scrapes("success");
            self.metrics.last_scrape_success.set(1.0);
        }
        self.metrics
            .records_last_scrape
            .set(summary.records_applied as f64);

        debug!(
            "Scraped {} in {:?}: {} lines, {} records, {} skipped",
            self.source.target(),
            timer.elapsed(),
            summary.lines_read,
            summary.records_applied,
            summary.too_few_fields + summary.invalid_values
        );

        Ok(summary)
    }
}

/// Drain a report stream into the mem-pool gauges.
///
/// Runs to EOF; malformed rows are skipped and counted. A read error stops the
/// scan but keeps whatever was already applied.
pub async fn apply_report<R>(reader: R, metrics: &Metrics) -> ScrapeSummary
where
    R: AsyncBufRead + Unpin,
{
    let mut reader = reader;
    let mut summary = ScrapeSummary::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(
                    "Report stream failed after {} lines: {}",
                    summary.lines_read, e
                );
                summary.truncated = true;
                break;
            }
        }
        summary.lines_read += 1;

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if !MemPoolRecord::is_relevant(line) {
            continue;
        }

        match MemPoolRecord::parse(line) {
            Ok(record) => {
                metrics.mempool.set(&record);
                summary.records_applied += 1;
            }
            Err(e) => {
                metrics.inc_malformed(e.reason_label());
                match e {
                    RecordError::TooFewFields { .. } => {
                        summary.too_few_fields += 1;
                        debug!("Skipping short mem row '{}': {}", line, e);
                    }
                    RecordError::InvalidValue { .. } => {
                        summary.invalid_values += 1;
                        warn!("Error parsing value in '{}': {}", line, e);
                    }
                }
            }
        }
    }

    if summary.records_applied == 0 {
        debug!("No kid rows applied from {} report lines", summary.lines_read);
    }

    summary
}
