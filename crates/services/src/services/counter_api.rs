//! HTTP client for the visitor counter endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;

use super::visitor_counter::VisitorCount;

#[derive(Debug, Clone, Error)]
pub enum CounterApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Serde(String),
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

/// The two operations the tracking client needs from the counter store.
#[async_trait]
pub trait CounterApi: Send + Sync {
    /// Read the current count
    async fn fetch_count(&self) -> Result<i64, CounterApiError>;

    /// Count one visit and return the new total
    async fn increment(&self) -> Result<i64, CounterApiError>;
}

/// `CounterApi` over HTTP against `{base_url}/visitors`
#[derive(Debug, Clone)]
pub struct CounterApiClient {
    http: Client,
    endpoint: Url,
}

impl CounterApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: &str) -> Result<Self, CounterApiError> {
        let mut base =
            Url::parse(base_url).map_err(|e| CounterApiError::InvalidUrl(e.to_string()))?;
        // join() replaces the last segment unless the path ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("visitors")
            .map_err(|e| CounterApiError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("folio-visitor-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CounterApiError::Transport(e.to_string()))?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn read_count(res: reqwest::Response) -> Result<i64, CounterApiError> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(CounterApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        res.json::<VisitorCount>()
            .await
            .map(|payload| payload.count)
            .map_err(|e| CounterApiError::Serde(e.to_string()))
    }
}

#[async_trait]
impl CounterApi for CounterApiClient {
    async fn fetch_count(&self) -> Result<i64, CounterApiError> {
        let res = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_count(res).await
    }

    async fn increment(&self) -> Result<i64, CounterApiError> {
        let res = self
            .http
            .post(self.endpoint.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_count(res).await
    }
}

fn map_reqwest_error(e: reqwest::Error) -> CounterApiError {
    if e.is_timeout() {
        CounterApiError::Timeout
    } else {
        CounterApiError::Transport(e.to_string())
    }
}
