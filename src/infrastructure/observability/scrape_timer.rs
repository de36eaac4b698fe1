use prometheus::Histogram;
use std::time::{Duration, Instant};

/// RAII guard observing a scrape cycle's duration when dropped,
/// including the early-return paths of a failed fetch.
pub struct ScrapeTimer {
    start: Instant,
    histogram: Histogram,
}

impl ScrapeTimer {
    pub fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScrapeTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
