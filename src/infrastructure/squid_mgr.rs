//! Cache manager client for the Squid `mem` report.

use crate::domain::errors::FetchError;
use crate::domain::mempool::MEM_REPORT_PATH;
use crate::domain::ports::{ReportSource, ReportStream};
use crate::infrastructure::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, Response};
use std::io;
use std::time::Duration;
use tracing::debug;

pub struct SquidManagerSource {
    client: Client,
    url: String,
    timeout: Duration,
}

impl SquidManagerSource {
    pub fn new(hostname: &str, port: u16, timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout, connect_timeout),
            url: Self::report_url(hostname, port),
            timeout,
        }
    }

    pub fn report_url(hostname: &str, port: u16) -> String {
        format!("http://{}:{}{}", hostname, port, MEM_REPORT_PATH)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: self.url.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            FetchError::Connect {
                url: self.url.clone(),
                reason: e.to_string(),
            }
        }
    }
}

/// Turn the response body into a buffered reader fed chunk by chunk.
/// The reader owns the response, so dropping it closes the body.
fn body_reader(response: Response) -> ReportStream {
    let chunks = futures::stream::try_unfold(response, |mut response| async move {
        match response.chunk().await {
            Ok(Some(chunk)) => Ok(Some((chunk, response))),
            Ok(None) => Ok(None),
            Err(e) => Err(io::Error::other(e)),
        }
    });
    Box::pin(Box::pin(chunks).into_async_read())
}

#[async_trait]
impl ReportSource for SquidManagerSource {
    async fn open(&self) -> Result<ReportStream, FetchError> {
        debug!("Fetching mem report from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        Ok(body_reader(response))
    }

    fn target(&self) -> String {
        self.url.clone()
    }
}
