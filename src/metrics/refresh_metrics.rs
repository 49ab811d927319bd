//! Refresh metrics tracking using OpenTelemetry.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Metrics collector for release document refreshes.
///
/// # Examples
///
/// ```rust,no_run
/// use feature_release::metrics::RefreshMetrics;
/// use opentelemetry::global;
///
/// let metrics = RefreshMetrics::new(global::meter("feature-release"));
///
/// let timer = metrics.start_refresh();
/// // ... fetch, validate, swap ...
/// metrics.record_refresh_success(timer);
/// ```
#[derive(Clone)]
pub struct RefreshMetrics {
    refresh_attempts: Counter<u64>,
    refresh_success: Counter<u64>,
    refresh_failures: Counter<u64>,
    refresh_duration: Histogram<f64>,
    config_age_seconds: Gauge<i64>,
    validation_failures: Counter<u64>,
    last_update: Arc<Mutex<Instant>>,
}

impl RefreshMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let refresh_attempts = meter
            .u64_counter("feature_release.refresh.attempts")
            .with_description("Total number of release document refresh attempts")
            .build();

        let refresh_success = meter
            .u64_counter("feature_release.refresh.success")
            .with_description("Number of refreshes that swapped in a new document")
            .build();

        let refresh_failures = meter
            .u64_counter("feature_release.refresh.failures")
            .with_description("Number of refreshes that kept the previous document")
            .build();

        let refresh_duration = meter
            .f64_histogram("feature_release.refresh.duration")
            .with_description("Duration of refresh operations in seconds")
            .with_unit("s")
            .build();

        let config_age_seconds = meter
            .i64_gauge("feature_release.config.age")
            .with_description("Time since the release document was last replaced in seconds")
            .with_unit("s")
            .build();

        let validation_failures = meter
            .u64_counter("feature_release.validation.failures")
            .with_description("Number of fetched documents rejected by validation")
            .build();

        Self {
            refresh_attempts,
            refresh_success,
            refresh_failures,
            refresh_duration,
            config_age_seconds,
            validation_failures,
            last_update: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Start a refresh timer. Pass the result to `record_refresh_success` or
    /// `record_refresh_failure`.
    pub fn start_refresh(&self) -> Instant {
        self.refresh_attempts.add(1, &[]);
        Instant::now()
    }

    /// Record a refresh that replaced the document.
    pub fn record_refresh_success(&self, start: Instant) {
        self.refresh_success.add(1, &[]);
        self.refresh_duration.record(start.elapsed().as_secs_f64(), &[]);
        self.record_update();
        self.update_config_age();
    }

    /// Record a refresh that left the previous document in place.
    pub fn record_refresh_failure(&self, start: Instant) {
        self.refresh_failures.add(1, &[]);
        self.refresh_duration.record(start.elapsed().as_secs_f64(), &[]);
        self.update_config_age();
    }

    /// Record a fetched document rejected by validation.
    pub fn record_validation_failure(&self) {
        self.validation_failures.add(1, &[]);
    }

    /// Record how long the current document has been in place.
    ///
    /// Called on every refresh outcome; call it yourself to sample the age
    /// between refreshes.
    pub fn update_config_age(&self) {
        let age_secs = self.config_age().as_secs() as i64;
        self.config_age_seconds.record(age_secs, &[]);
    }

    /// Time since the document was last replaced.
    pub fn config_age(&self) -> Duration {
        self.last_update.lock().elapsed()
    }

    /// Reset the document age, e.g. after an explicit `update_config`.
    pub fn record_update(&self) {
        *self.last_update.lock() = Instant::now();
    }
}
