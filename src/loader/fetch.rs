use async_trait::async_trait;
use reqwest::header::ACCEPT;
use thiserror::Error;

use crate::types::ContextDocument;

/// A transport-level failure while fetching a remote document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
}

/// Retrieves remote context documents.
///
/// Resolution only depends on this seam, so callers can substitute an
/// in-memory fetcher for tests or offline use.
#[async_trait]
pub trait ContextFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ContextDocument, FetchError>;
}

/// Default fetcher: HTTP GET with `Accept: application/json`.
#[derive(Debug, Clone, Default)]
pub struct HttpContextFetcher {
    client: reqwest::Client,
}

impl HttpContextFetcher {
    pub fn new() -> Self {
        HttpContextFetcher::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        HttpContextFetcher { client }
    }
}

#[async_trait]
impl ContextFetcher for HttpContextFetcher {
    async fn fetch(&self, url: &str) -> Result<ContextDocument, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}
