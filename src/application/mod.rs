// Scrape-parse-publish cycle
pub mod collector;

// Exporter wiring
pub mod system;

pub use collector::{MemPoolCollector, ScrapeSummary};
pub use system::Application;
