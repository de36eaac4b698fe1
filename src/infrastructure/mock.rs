use crate::domain::errors::FetchError;
use crate::domain::ports::{ReportSource, ReportStream};
use async_trait::async_trait;
use futures::TryStreamExt;
use std::io;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::info;

/// One piece of a canned report body
#[derive(Debug, Clone)]
pub enum ReportChunk {
    Data(Vec<u8>),
    /// Simulates the connection dropping mid-body
    ReadError(String),
}

#[derive(Debug, Clone)]
enum Canned {
    Chunks(Vec<ReportChunk>),
    Failure { url: String, reason: String },
}

/// Report source serving canned content instead of a live proxy
pub struct StaticReportSource {
    label: String,
    canned: Mutex<Canned>,
}

impl StaticReportSource {
    pub fn from_text(text: &str) -> Self {
        Self::from_chunks(vec![ReportChunk::Data(text.as_bytes().to_vec())])
    }

    pub fn from_chunks(chunks: Vec<ReportChunk>) -> Self {
        Self {
            label: "static".to_string(),
            canned: Mutex::new(Canned::Chunks(chunks)),
        }
    }

    /// Source whose every fetch fails like a refused connection
    pub fn failing(url: &str, reason: &str) -> Self {
        Self {
            label: url.to_string(),
            canned: Mutex::new(Canned::Failure {
                url: url.to_string(),
                reason: reason.to_string(),
            }),
        }
    }

    /// Load a captured `mem` report from disk
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| FetchError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!("Loaded {} bytes of mem report from {}", bytes.len(), path.display());

        Ok(Self {
            label: path.display().to_string(),
            canned: Mutex::new(Canned::Chunks(vec![ReportChunk::Data(bytes)])),
        })
    }

    /// Swap the canned body, e.g. to simulate the next scrape
    pub async fn set_text(&self, text: &str) {
        *self.canned.lock().await =
            Canned::Chunks(vec![ReportChunk::Data(text.as_bytes().to_vec())]);
    }

    /// Make subsequent fetches fail
    pub async fn set_failure(&self, reason: &str) {
        *self.canned.lock().await = Canned::Failure {
            url: self.label.clone(),
            reason: reason.to_string(),
        };
    }
}

#[async_trait]
impl ReportSource for StaticReportSource {
    async fn open(&self) -> Result<ReportStream, FetchError> {
        match self.canned.lock().await.clone() {
            Canned::Chunks(chunks) => {
                let items: Vec<io::Result<Vec<u8>>> = chunks
                    .into_iter()
                    .map(|chunk| match chunk {
                        ReportChunk::Data(bytes) => Ok(bytes),
                        ReportChunk::ReadError(reason) => Err(io::Error::other(reason)),
                    })
                    .collect();
                Ok(Box::pin(futures::stream::iter(items).into_async_read()))
            }
            Canned::Failure { url, reason } => Err(FetchError::Connect { url, reason }),
        }
    }

    fn target(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::AsyncReadExt;

    #[tokio::test]
    async fn test_static_source_serves_text() {
        let source = StaticReportSource::from_text("kid1 pool 1\n");
        let mut stream = source.open().await.ok().expect("stream");
        let mut body = String::new();
        stream.read_to_string(&mut body).await.unwrap();
        assert_eq!(body, "kid1 pool 1\n");
    }

    #[tokio::test]
    async fn test_failing_source_returns_connect_error() {
        let source = StaticReportSource::failing("http://127.0.0.1:1/squid-internal-mgr/mem", "refused");
        let err = source.open().await.err().expect("fetch should fail");
        assert!(err.to_string().contains("refused"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = StaticReportSource::from_file("/nonexistent/mem.txt").await;
        assert!(matches!(result, Err(FetchError::Io { .. })));
    }

    #[tokio::test]
    async fn test_set_failure_switches_behaviour() {
        let source = StaticReportSource::from_text("kid1 pool 1\n");
        assert!(source.open().await.is_ok());
        source.set_failure("connection reset").await;
        assert!(source.open().await.is_err());
    }
}
