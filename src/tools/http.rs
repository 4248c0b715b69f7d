//! Shared HTTP access for network tools
//!
//! Wraps one `reqwest::Client` (browser user agent, request timeout) and
//! the retry manager so every tool gets the same transient-failure policy.

use crate::errors::{AgentError, Result};
use crate::tools::retry::RetryManager;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Browser user agent; several services reject library defaults
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Response body with the metadata tools need
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert a non-success response into an error
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AgentError::UpstreamStatus {
                status: self.status,
                body: self.body.chars().take(200).collect(),
            })
        }
    }
}

/// HTTP client with retry
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryManager,
}

impl HttpFetcher {
    /// Create fetcher with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(AgentError::HttpError)?;

        Ok(Self {
            client,
            retry: RetryManager::new(),
        })
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryManager) -> Self {
        self.retry = retry;
        self
    }

    /// Send a request built by `build`, retrying transport failures and
    /// 429/5xx answers. Other statuses are returned to the caller.
    pub async fn send<F>(&self, build: F) -> Result<HttpResponse>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let client = &self.client;
        let build = &build;

        self.retry
            .execute_with_retry(move || async move {
                let response = build(client).send().await?;
                let status = response.status().as_u16();
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_lowercase();
                let body = response.text().await?;

                if status == 429 || status >= 500 {
                    return Err(AgentError::UpstreamStatus {
                        status,
                        body: body.chars().take(200).collect(),
                    });
                }

                Ok(HttpResponse {
                    status,
                    content_type,
                    body,
                })
            })
            .await
    }

    /// GET `url` with query parameters
    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<HttpResponse> {
        self.send(|client| client.get(url).query(params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            content_type: "text/html".to_string(),
            body: "x".repeat(500),
        }
    }

    #[test]
    fn test_success_range() {
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(404).is_success());
    }

    #[test]
    fn test_error_for_status_truncates_body() {
        match response(403).error_for_status() {
            Err(AgentError::UpstreamStatus { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body.len(), 200);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_fetcher_creation() {
        assert!(HttpFetcher::new(Duration::from_secs(5)).is_ok());
    }
}
