//! The release engine providing lock-free evaluation.

use crate::core::evaluate::{Evaluation, Reason, evaluate};
use crate::core::poller::Poller;
use crate::core::{DocumentValidator, FeatureReleaseBuilder, SchemaValidator, Validate};
use crate::error::{ReleaseError, Result};
use crate::model::{ReleaseConfig, TargetKey};
use crate::sources::Fetcher;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::metrics::RefreshMetrics;

/// Default polling interval for remote documents.
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 60;

/// Remote document location and the collaborators used to load it.
pub(crate) struct RemoteSource {
    url: String,
    fetcher: Arc<dyn Fetcher>,
    validator: Arc<dyn DocumentValidator>,
    polling_interval: Duration,
    #[cfg(feature = "metrics")]
    metrics: Option<RefreshMetrics>,
}

impl RemoteSource {
    pub(crate) fn new(
        url: String,
        fetcher: Arc<dyn Fetcher>,
        validator: Arc<dyn DocumentValidator>,
        polling_interval: Duration,
    ) -> Self {
        Self {
            url,
            fetcher,
            validator,
            polling_interval,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: Option<RefreshMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and validate the document.
    pub(crate) async fn download(&self) -> Result<ReleaseConfig> {
        let document = self
            .fetcher
            .fetch(&self.url)
            .await
            .map_err(|e| ReleaseError::CannotDownloadConfig(e.to_string()))?;

        self.validator.validate(&document).map_err(|e| {
            #[cfg(feature = "metrics")]
            if let Some(metrics) = &self.metrics {
                metrics.record_validation_failure();
            }
            tracing::error!(url = %self.url, error = %e, "remote release config failed validation");
            ReleaseError::IncorrectConfig(e)
        })
    }

    /// Download a new document and swap it into `current`.
    ///
    /// On any error `current` is left untouched.
    pub(crate) async fn refresh_into(&self, current: &ArcSwap<ReleaseConfig>) -> Result<()> {
        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(|m| m.start_refresh());

        let result = self.download().await;

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            match &result {
                Ok(_) => metrics.record_refresh_success(timer),
                Err(_) => metrics.record_refresh_failure(timer),
            }
        }

        current.store(Arc::new(result?));
        Ok(())
    }
}

/// The release engine: holds the current release document and evaluates
/// flags against it.
///
/// The document lives behind an `ArcSwap`, so [`is_enabled`](Self::is_enabled)
/// never blocks and always sees one complete document, even while
/// [`update_config`](Self::update_config) or the polling task replaces it.
/// Clones share the same document and poller; dropping the last clone stops
/// the poller.
///
/// # Examples
///
/// ```rust
/// use feature_release::prelude::*;
///
/// # fn example() -> Result<()> {
/// let config = ReleaseConfig::new()
///     .with_flag("f", Rule::percentage(0).with_target("x", true));
/// let release = FeatureRelease::from_config(config)?;
///
/// assert!(release.is_enabled("f", "x", None));
/// assert!(!release.is_enabled("f", "y", None));
/// assert!(!release.is_enabled("doesNotExist", "x", None));
/// # Ok(())
/// # }
/// ```
pub struct FeatureRelease {
    /// The current document, wrapped in ArcSwap for atomic replacement
    current: Arc<ArcSwap<ReleaseConfig>>,
    /// Remote source, present only in remote mode
    remote: Option<Arc<RemoteSource>>,
    /// Background refresh task, if polling
    poller: Arc<Mutex<Option<Poller>>>,
}

impl FeatureRelease {
    /// Create a local engine from a document built in code.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::IncorrectConfig`] if the document is invalid.
    pub fn from_config(config: ReleaseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_source(config, None))
    }

    /// Create a local engine from a raw document, e.g. parsed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::IncorrectConfig`] if the document is invalid.
    pub fn from_document(document: &Value) -> Result<Self> {
        let config = SchemaValidator.validate(document)?;
        Ok(Self::with_source(config, None))
    }

    /// Start building a remote engine that loads its document from `url`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use feature_release::prelude::*;
    ///
    /// # async fn example() -> Result<()> {
    /// let release = FeatureRelease::remote("https://example.com/releases.json")
    ///     .with_polling(true)
    ///     .with_polling_interval_secs(30)
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn remote(url: impl Into<String>) -> FeatureReleaseBuilder {
        FeatureReleaseBuilder::new(url)
    }

    pub(crate) fn with_source(initial: ReleaseConfig, remote: Option<Arc<RemoteSource>>) -> Self {
        Self {
            current: Arc::new(ArcSwap::new(Arc::new(initial))),
            remote,
            poller: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether `flag` is on for `target`, optionally within `namespace`.
    ///
    /// Individual targets win over the percentage rule. Unknown flags and
    /// empty rules yield `false`; this never fails and never waits on I/O.
    pub fn is_enabled<'a>(
        &self,
        flag: &str,
        target: impl Into<TargetKey<'a>>,
        namespace: Option<&str>,
    ) -> bool {
        self.evaluate(flag, target, namespace).enabled
    }

    /// Like [`is_enabled`](Self::is_enabled), also reporting what decided the result.
    pub fn evaluate<'a>(
        &self,
        flag: &str,
        target: impl Into<TargetKey<'a>>,
        namespace: Option<&str>,
    ) -> Evaluation {
        let target = target.into();
        let config = self.current.load();
        let evaluation = evaluate(&config, flag, target.as_str(), namespace);

        if evaluation.reason == Reason::UnknownFlag {
            tracing::warn!(flag, namespace = ?namespace, "unknown feature flag, false is returned");
        }
        evaluation
    }

    /// Get a reference-counted handle to the current document.
    pub fn config(&self) -> Arc<ReleaseConfig> {
        self.current.load_full()
    }

    /// Replace the document.
    ///
    /// The new document is trusted as-is and is not validated. Concurrent
    /// evaluations observe either the old or the new document in full.
    pub fn update_config(&self, config: ReleaseConfig) {
        self.current.store(Arc::new(config));

        #[cfg(feature = "metrics")]
        if let Some(metrics) = self.remote.as_ref().and_then(|r| r.metrics.as_ref()) {
            metrics.record_update();
        }

        tracing::debug!("release config replaced by caller");
    }

    /// Fetch, validate and swap in the remote document once.
    ///
    /// If anything fails the current document is kept and the error returned.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::CannotDownloadConfig`] if the fetch fails or the
    /// engine has no remote source, and [`ReleaseError::IncorrectConfig`] if
    /// the fetched document is invalid.
    pub async fn refresh(&self) -> Result<()> {
        let remote = self.remote.as_ref().ok_or_else(|| {
            ReleaseError::CannotDownloadConfig("no remote config url configured".to_string())
        })?;
        remote.refresh_into(&self.current).await
    }

    /// Start refreshing the document in the background.
    ///
    /// Must be called from within a Tokio runtime. An interval of zero
    /// seconds leaves polling off.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ConfigPollingAlreadyStarted`] if a poller is
    /// running, and [`ReleaseError::PollingUnavailable`] for local engines or
    /// when no runtime is available.
    pub fn start_polling(&self) -> Result<()> {
        let remote = self.remote.as_ref().ok_or_else(|| {
            ReleaseError::PollingUnavailable("polling requires a remote config url".to_string())
        })?;

        let mut poller = self.poller.lock();
        if poller.as_ref().is_some_and(|p| !p.is_finished()) {
            return Err(ReleaseError::ConfigPollingAlreadyStarted);
        }

        if remote.polling_interval.is_zero() {
            tracing::warn!(url = %remote.url, "polling interval is zero, config polling not started");
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ReleaseError::PollingUnavailable(e.to_string()))?;

        *poller = Some(Poller::spawn(
            &runtime,
            Arc::clone(remote),
            Arc::clone(&self.current),
            remote.polling_interval,
        ));
        Ok(())
    }

    /// Stop the background refresh.
    ///
    /// Returns whether a poller was running. Once this returns, the polling
    /// task no longer replaces the document.
    pub async fn stop_polling(&self) -> bool {
        let poller = self.poller.lock().take();
        match poller {
            Some(poller) => {
                let was_running = !poller.is_finished();
                poller.stop().await;
                was_running
            }
            None => false,
        }
    }

    /// Whether the background refresh is running.
    pub fn is_polling(&self) -> bool {
        self.poller.lock().as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Interval of the running poller, if any.
    pub fn polling_interval(&self) -> Option<Duration> {
        self.poller
            .lock()
            .as_ref()
            .filter(|p| !p.is_finished())
            .map(Poller::interval)
    }

    /// URL of the remote document, in remote mode.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote.as_deref().map(RemoteSource::url)
    }
}

impl Clone for FeatureRelease {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            remote: self.remote.clone(),
            poller: Arc::clone(&self.poller),
        }
    }
}

impl fmt::Debug for FeatureRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRelease")
            .field("flags", &self.current.load().len())
            .field("remote_url", &self.remote_url())
            .field("polling", &self.is_polling())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FlagEntry, Rule};
    use serde_json::json;

    #[test]
    fn test_create_and_evaluate() {
        let release = FeatureRelease::from_config(
            ReleaseConfig::new().with_flag("f", Rule::percentage(100)),
        )
        .unwrap();
        assert!(release.is_enabled("f", "anyone", None));
        assert_eq!(release.config().len(), 1);
        assert!(release.remote_url().is_none());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let err = FeatureRelease::from_config(
            ReleaseConfig::new().with_flag("f", Rule::percentage(101)),
        )
        .unwrap_err();
        assert!(matches!(err, ReleaseError::IncorrectConfig(_)));
    }

    #[test]
    fn test_from_document() {
        let release = FeatureRelease::from_document(&json!({
            "f": { "staging": { "releaseByPercentage": 100 } }
        }))
        .unwrap();
        assert!(release.is_enabled("f", "x", Some("staging")));
        assert!(!release.is_enabled("f", "x", Some("production")));

        let err = FeatureRelease::from_document(&json!({
            "f": { "individualTargets": { "x": "abc" } }
        }))
        .unwrap_err();
        assert!(matches!(err, ReleaseError::IncorrectConfig(_)));
    }

    #[test]
    fn test_numeric_identifier() {
        let release = FeatureRelease::from_config(
            ReleaseConfig::new().with_flag("f", Rule::new().with_target("1001", true)),
        )
        .unwrap();
        assert!(release.is_enabled("f", 1001u64, None));
        assert!(!release.is_enabled("f", 1002u64, None));
    }

    #[test]
    fn test_update_config_is_not_validated() {
        let release = FeatureRelease::from_config(ReleaseConfig::new()).unwrap();
        release.update_config(ReleaseConfig::new().with_flag("f", Rule::percentage(200)));
        assert!(release.is_enabled("f", "x", None));
    }

    #[test]
    fn test_clone_shares_document() {
        let release = FeatureRelease::from_config(ReleaseConfig::new()).unwrap();
        let release2 = release.clone();

        release.update_config(ReleaseConfig::new().with_flag(
            "f",
            FlagEntry::namespaced([("eu", Rule::percentage(100))]),
        ));
        assert!(release2.is_enabled("f", "x", Some("eu")));
    }

    #[test]
    fn test_local_engine_cannot_poll() {
        let release = FeatureRelease::from_config(ReleaseConfig::new()).unwrap();
        assert!(matches!(
            release.start_polling(),
            Err(ReleaseError::PollingUnavailable(_))
        ));
        assert!(!release.is_polling());
    }

    #[tokio::test]
    async fn test_local_engine_cannot_refresh() {
        let release = FeatureRelease::from_config(ReleaseConfig::new()).unwrap();
        assert!(matches!(
            release.refresh().await,
            Err(ReleaseError::CannotDownloadConfig(_))
        ));
        assert!(!release.stop_polling().await);
    }
}
