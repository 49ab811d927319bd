//! # feature-release
//!
//! Deterministic feature-flag evaluation with percentage rollouts, individual
//! overrides and hot-swappable release documents.
//!
//! ## Overview
//!
//! `feature-release` decides whether a flag is on for an identifier:
//! - Percentage rollout by stable MD5 bucketing, salted per flag and namespace
//! - Individual target overrides that win over the percentage
//! - Optional namespaces (e.g. environments) with independent rules
//! - Lock-free evaluation over an atomically swapped document (`arc-swap`)
//! - Remote documents with optional periodic refresh
//!
//! ## Quick Start
//!
//! ```rust
//! use feature_release::prelude::*;
//!
//! # fn example() -> Result<()> {
//! let config = ReleaseConfig::new()
//!     .with_flag("new-checkout", Rule::percentage(20).with_target("qa-team", true))
//!     .with_flag(
//!         "dark-mode",
//!         FlagEntry::namespaced([
//!             ("staging", Rule::percentage(100)),
//!             ("production", Rule::percentage(5)),
//!         ]),
//!     );
//!
//! let release = init_feature_release(config)?;
//!
//! assert!(release.is_enabled("new-checkout", "qa-team", None));
//! assert!(release.is_enabled("dark-mode", 1001u64, Some("staging")));
//! assert!(!release.is_enabled("unknown-flag", "anyone", None));
//! # Ok(())
//! # }
//! ```
//!
//! ## Remote documents
//!
//! ```rust,no_run
//! use feature_release::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let release = init_feature_release_remote(
//!     FeatureRelease::remote("https://example.com/releases.json")
//!         .with_polling(true)
//!         .with_polling_interval_secs(60),
//! )
//! .await?;
//!
//! // A failed refresh keeps the last good document.
//! let enabled = release.is_enabled("new-checkout", "user-42", None);
//! # Ok(())
//! # }
//! ```
//!
//! ## Document format
//!
//! ```json
//! {
//!   "new-checkout": { "releaseByPercentage": 20, "individualTargets": { "qa-team": true } },
//!   "dark-mode": {
//!     "staging": { "releaseByPercentage": 100 },
//!     "production": { "releaseByPercentage": 5 }
//!   }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `remote` (default): HTTP fetcher built on `reqwest`
//! - `yaml`, `toml`: extra local document formats
//! - `metrics`: OpenTelemetry refresh metrics

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod model;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        DocumentValidator, FeatureRelease, FeatureReleaseBuilder, ReleaseGate, Validate,
        feature_release, init_feature_release, init_feature_release_remote,
    };
    pub use crate::error::{ReleaseError, Result, ValidationError};
    pub use crate::model::{FlagEntry, ReleaseConfig, Rule};
}
