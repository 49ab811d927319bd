//! Builder for constructing remote FeatureRelease instances.

use crate::core::release::{DEFAULT_POLLING_INTERVAL_SECS, RemoteSource};
use crate::core::{DocumentValidator, FeatureRelease, SchemaValidator};
use crate::error::Result;
use crate::sources::Fetcher;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::metrics::RefreshMetrics;

/// Builder for an engine whose document is fetched from a URL.
///
/// The document is downloaded and validated once in [`build`](Self::build);
/// the engine only exists if that succeeds.
///
/// # Examples
///
/// ```rust,no_run
/// use feature_release::prelude::*;
/// use feature_release::sources::HttpFetcher;
///
/// # async fn example() -> Result<()> {
/// let fetcher = HttpFetcher::builder().with_auth_token("secret").build()?;
///
/// let release = FeatureRelease::remote("https://example.com/releases.json")
///     .with_fetcher(fetcher)
///     .with_polling(true)
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct FeatureReleaseBuilder {
    url: String,
    enable_polling: bool,
    polling_interval_secs: u64,
    fetcher: Option<Arc<dyn Fetcher>>,
    validator: Arc<dyn DocumentValidator>,
    #[cfg(feature = "metrics")]
    metrics: Option<RefreshMetrics>,
}

impl FeatureReleaseBuilder {
    /// Create a builder for the document at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            enable_polling: false,
            polling_interval_secs: DEFAULT_POLLING_INTERVAL_SECS,
            fetcher: None,
            validator: Arc::new(SchemaValidator),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Refresh the document periodically after the initial load.
    ///
    /// Default is off.
    pub fn with_polling(mut self, enabled: bool) -> Self {
        self.enable_polling = enabled;
        self
    }

    /// Set the polling interval in whole seconds.
    ///
    /// Default is 60 seconds. Zero leaves polling off.
    pub fn with_polling_interval_secs(mut self, seconds: u64) -> Self {
        self.polling_interval_secs = seconds;
        self
    }

    /// Use a custom fetcher instead of the default HTTP one.
    pub fn with_fetcher<F: Fetcher + 'static>(mut self, fetcher: F) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Use a custom document validator instead of [`SchemaValidator`].
    pub fn with_validator<V: DocumentValidator + 'static>(mut self, validator: V) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Record refresh metrics.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: RefreshMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether polling was requested.
    pub fn polling_enabled(&self) -> bool {
        self.enable_polling
    }

    /// Download the initial document and construct the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the document cannot be downloaded ([`ReleaseError::CannotDownloadConfig`](crate::error::ReleaseError::CannotDownloadConfig))
    /// - the document is invalid ([`ReleaseError::IncorrectConfig`](crate::error::ReleaseError::IncorrectConfig))
    /// - polling was requested but cannot start
    ///
    /// No engine and no poller exist after a failed build.
    pub async fn build(self) -> Result<FeatureRelease> {
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => default_fetcher()?,
        };

        let source = RemoteSource::new(
            self.url,
            fetcher,
            self.validator,
            Duration::from_secs(self.polling_interval_secs),
        );
        #[cfg(feature = "metrics")]
        let source = source.with_metrics(self.metrics);

        let initial = source.download().await?;
        tracing::info!(url = %source.url(), flags = initial.len(), "remote release config loaded");

        let release = FeatureRelease::with_source(initial, Some(Arc::new(source)));
        if self.enable_polling {
            release.start_polling()?;
        }

        Ok(release)
    }
}

#[cfg(feature = "remote")]
fn default_fetcher() -> Result<Arc<dyn Fetcher>> {
    Ok(Arc::new(crate::sources::HttpFetcher::new()?))
}

#[cfg(not(feature = "remote"))]
fn default_fetcher() -> Result<Arc<dyn Fetcher>> {
    Err(crate::error::ReleaseError::CannotDownloadConfig(
        "no fetcher configured; enable the 'remote' feature or call with_fetcher".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReleaseError, ValidationError};
    use crate::model::ReleaseConfig;
    use crate::sources::FetchError;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct StaticFetcher(std::result::Result<Value, FetchError>);

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> std::result::Result<Value, FetchError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_builder_defaults() {
        let builder = FeatureReleaseBuilder::new("https://example.com/releases.json");
        assert!(!builder.polling_enabled());
        assert_eq!(builder.polling_interval_secs, DEFAULT_POLLING_INTERVAL_SECS);
        assert_eq!(builder.url, "https://example.com/releases.json");
    }

    #[tokio::test]
    async fn test_build_loads_document() {
        let release = FeatureReleaseBuilder::new("mem://releases")
            .with_fetcher(StaticFetcher(Ok(json!({ "f": { "releaseByPercentage": 100 } }))))
            .build()
            .await
            .unwrap();

        assert!(release.is_enabled("f", "x", None));
        assert_eq!(release.remote_url(), Some("mem://releases"));
        assert!(!release.is_polling());
    }

    #[tokio::test]
    async fn test_build_fails_on_fetch_error() {
        let err = FeatureReleaseBuilder::new("mem://releases")
            .with_fetcher(StaticFetcher(Err(FetchError::new("connection refused"))))
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::CannotDownloadConfig(ref msg) if msg.contains("refused")));
    }

    #[tokio::test]
    async fn test_build_fails_on_invalid_document() {
        let err = FeatureReleaseBuilder::new("mem://releases")
            .with_fetcher(StaticFetcher(Ok(json!({ "f": { "releaseByPercentage": 101 } }))))
            .with_polling(true)
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::IncorrectConfig(_)));
    }

    #[tokio::test]
    async fn test_custom_validator() {
        let err = FeatureReleaseBuilder::new("mem://releases")
            .with_fetcher(StaticFetcher(Ok(json!({}))))
            .with_validator(|_: &Value| -> std::result::Result<ReleaseConfig, ValidationError> {
                Err(ValidationError::custom("empty documents are not allowed"))
            })
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::IncorrectConfig(ValidationError::Custom(_))));
    }

    #[tokio::test]
    async fn test_zero_interval_does_not_poll() {
        let release = FeatureReleaseBuilder::new("mem://releases")
            .with_fetcher(StaticFetcher(Ok(json!({}))))
            .with_polling(true)
            .with_polling_interval_secs(0)
            .build()
            .await
            .unwrap();
        assert!(!release.is_polling());
    }
}
