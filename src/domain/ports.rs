use crate::domain::errors::FetchError;
use async_trait::async_trait;
use futures::io::AsyncBufRead;
use std::pin::Pin;

/// Buffered byte stream of one `mem` report, consumed once per scrape
pub type ReportStream = Pin<Box<dyn AsyncBufRead + Send>>;

// Need async_trait for async functions in traits
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Open a fresh report stream. Dropping the stream releases the connection.
    async fn open(&self) -> Result<ReportStream, FetchError>;

    /// Human-readable location of the report, used in logs
    fn target(&self) -> String;
}
