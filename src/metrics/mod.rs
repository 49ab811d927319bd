//! Refresh metrics for release documents.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Refresh attempts/success/failures
//! - Refresh duration
//! - Release document age
//! - Validation failures
//!
//! # Examples
//!
//! ```rust,no_run
//! use feature_release::prelude::*;
//! use feature_release::metrics::RefreshMetrics;
//! use opentelemetry::global;
//!
//! # async fn example() -> Result<()> {
//! let metrics = RefreshMetrics::new(global::meter("my-app"));
//!
//! let release = FeatureRelease::remote("https://example.com/releases.json")
//!     .with_polling(true)
//!     .with_metrics(metrics)
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod refresh_metrics;

pub use refresh_metrics::RefreshMetrics;
