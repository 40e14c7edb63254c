//! HTTP page fetching for the crawler.

use crate::types::{AppError, Result};
use std::time::Duration;
use tracing::debug;

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub url: String,
    pub html: String,
}

/// Pooled reqwest client that only accepts HTML responses.
#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::Ingest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Fetch `url`, failing on non-2xx status, non-HTML content or undecodable bodies
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed_url =
            url::Url::parse(url).map_err(|e| AppError::Ingest(format!("{}: {}", url, e)))?;
        if parsed_url.scheme() != "http" && parsed_url.scheme() != "https" {
            return Err(AppError::Ingest(format!(
                "Unsupported scheme: {} (only http/https allowed)",
                parsed_url.scheme()
            )));
        }

        let response = self
            .client
            .get(parsed_url)
            .send()
            .await
            .map_err(|e| AppError::Ingest(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Ingest(format!("{} returned HTTP {}", url, status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.is_empty()
            && !content_type.contains("text/html")
            && !content_type.contains("application/xhtml")
        {
            return Err(AppError::Ingest(format!(
                "Skipping non-HTML content at {}: {}",
                url, content_type
            )));
        }

        let final_url = response.url().to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Ingest(format!("Failed to read body of {}: {}", url, e)))?;

        if bytes.iter().take(1024).any(|b| *b == 0) {
            return Err(AppError::Ingest(format!("Skipping binary content at {}", url)));
        }
        let html = String::from_utf8(bytes.to_vec())
            .map_err(|e| AppError::Ingest(format!("{} is not valid UTF-8: {}", url, e)))?;

        debug!(url = %final_url, bytes = html.len(), "Fetched page");
        Ok(FetchedPage {
            url: final_url,
            html,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url() {
        let fetcher = PageFetcher::new("test", Duration::from_secs(5)).unwrap();
        assert!(matches!(
            fetcher.fetch("not a url").await,
            Err(AppError::Ingest(_))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let fetcher = PageFetcher::new("test", Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch("ftp://example.com/file").await.unwrap_err();
        assert!(err.to_string().contains("Unsupported scheme"));
    }
}
