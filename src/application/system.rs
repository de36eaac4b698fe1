use crate::application::collector::MemPoolCollector;
use crate::config::Config;
use crate::domain::ports::ReportSource;
use crate::infrastructure::SquidManagerSource;
use crate::infrastructure::observability::{Metrics, MetricsReporter};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Wired exporter: one report source feeding the process-wide metrics
pub struct Application {
    pub config: Config,
    pub metrics: Metrics,
    pub source: Arc<dyn ReportSource>,
}

impl Application {
    /// Wire the live cache manager source from configuration
    pub fn build(config: Config) -> Result<Self> {
        let source = SquidManagerSource::new(
            &config.scrape.hostname,
            config.scrape.port,
            config.scrape.timeout,
            config.scrape.connect_timeout,
        );
        info!(
            "Building exporter for {} (timeout {:?}, connect timeout {:?})",
            source.url(),
            config.scrape.timeout,
            config.scrape.connect_timeout
        );
        Self::with_source(config, Arc::new(source))
    }

    /// Wire an arbitrary source, e.g. a captured report
    pub fn with_source(config: Config, source: Arc<dyn ReportSource>) -> Result<Self> {
        Ok(Self {
            config,
            metrics: Metrics::new()?,
            source,
        })
    }

    pub fn collector(&self) -> MemPoolCollector {
        MemPoolCollector::new(self.source.clone(), self.metrics.clone())
    }

    pub fn reporter(&self) -> MetricsReporter {
        MetricsReporter::new(
            self.collector(),
            self.metrics.clone(),
            self.config.observability.interval_seconds,
            self.config.observability.output,
        )
    }
}
