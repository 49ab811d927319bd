//! Remote HTTP/HTTPS release document fetcher.

use super::{FetchError, Fetcher};
use crate::error::{ReleaseError, Result};
use async_trait::async_trait;
use reqwest::{Client, header::HeaderValue};
use serde_json::Value;
use std::time::Duration;

/// Authentication method for HTTP requests.
#[derive(Clone)]
pub enum HttpAuth {
    /// No authentication
    None,
    /// Bearer token authentication
    Bearer(String),
    /// Basic authentication (username, password)
    Basic(String, String),
}

/// HTTP-based [`Fetcher`].
///
/// Issues one `GET` per fetch and parses the body as JSON.
///
/// # Examples
///
/// ```rust,no_run
/// use feature_release::sources::HttpFetcher;
/// use std::time::Duration;
///
/// # fn example() -> feature_release::error::Result<()> {
/// let fetcher = HttpFetcher::builder()
///     .with_auth_token("secret-token")
///     .with_timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct HttpFetcher {
    client: Client,
    auth: HttpAuth,
}

impl HttpFetcher {
    /// Create a fetcher with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self> {
        HttpFetcherBuilder::new().build()
    }

    /// Create a new builder for constructing an HTTP fetcher.
    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Value, FetchError> {
        let mut request = self.client.get(url);

        request = match &self.auth {
            HttpAuth::None => request,
            HttpAuth::Bearer(token) => {
                let header_value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| FetchError::new(format!("Invalid bearer token: {}", e)))?;
                request.header("Authorization", header_value)
            }
            HttpAuth::Basic(username, password) => request.basic_auth(username, Some(password)),
        };

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::new(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        tracing::debug!(url, %status, "fetched release document");
        if !status.is_success() {
            return Err(FetchError::new(format!(
                "HTTP request failed with status {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::new(format!("Failed to parse JSON: {}", e)))
    }
}

/// Builder for constructing an [`HttpFetcher`].
pub struct HttpFetcherBuilder {
    auth: HttpAuth,
    timeout: Duration,
}

impl HttpFetcherBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            auth: HttpAuth::None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Set Bearer token authentication.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth = HttpAuth::Bearer(token.into());
        self
    }

    /// Set Basic authentication.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = HttpAuth::Basic(username.into(), password.into());
        self
    }

    /// Set the request timeout.
    ///
    /// Default is 10 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the HTTP fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<HttpFetcher> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                ReleaseError::CannotDownloadConfig(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(HttpFetcher {
            client,
            auth: self.auth,
        })
    }
}

impl Default for HttpFetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_builder() {
        let fetcher = HttpFetcher::builder()
            .with_auth_token("token123")
            .with_timeout(Duration::from_secs(5))
            .build();
        assert!(fetcher.is_ok());

        let fetcher = HttpFetcher::builder()
            .with_basic_auth("user", "pass")
            .build();
        assert!(fetcher.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_document() {
        let server = MockServer::start().await;
        let body = json!({ "f": { "releaseByPercentage": 20 } });
        Mock::given(method("GET"))
            .and(path("/remote-config.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let document = fetcher
            .fetch(&format!("{}/remote-config.json", server.uri()))
            .await
            .unwrap();
        assert_eq!(document, body);
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::builder()
            .with_auth_token("secret")
            .build()
            .unwrap();
        assert!(fetcher.fetch(&server.uri()).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = HttpFetcher::new()
            .unwrap()
            .fetch(&server.uri())
            .await
            .unwrap_err();
        assert!(err.0.contains("503"));
    }

    #[tokio::test]
    async fn test_fetch_invalid_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = HttpFetcher::new()
            .unwrap()
            .fetch(&server.uri())
            .await
            .unwrap_err();
        assert!(err.0.contains("Failed to parse JSON"));
    }
}
