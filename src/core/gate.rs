//! Single-instance guard for release engines.

use crate::core::{FeatureRelease, FeatureReleaseBuilder};
use crate::error::{ReleaseError, Result};
use crate::model::ReleaseConfig;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Factory that constructs at most one [`FeatureRelease`].
///
/// The first successful initialization wins; later attempts fail with
/// [`ReleaseError::AlreadyInitialized`] and leave the existing engine
/// untouched. A failed or cancelled attempt releases the gate so the caller
/// can retry. An attempt racing with one still in progress also fails with
/// `AlreadyInitialized`.
///
/// [`init_feature_release`] and [`init_feature_release_remote`] use a
/// process-wide gate; construct your own gate to scope the rule differently,
/// e.g. per test.
///
/// # Examples
///
/// ```rust
/// use feature_release::prelude::*;
///
/// let gate = ReleaseGate::new();
/// let release = gate.init_local(ReleaseConfig::new()).unwrap();
///
/// assert!(matches!(
///     gate.init_local(ReleaseConfig::new()),
///     Err(ReleaseError::AlreadyInitialized)
/// ));
/// assert!(gate.get().is_some());
/// # drop(release);
/// ```
pub struct ReleaseGate {
    claimed: AtomicBool,
    instance: OnceLock<FeatureRelease>,
}

impl ReleaseGate {
    /// Create an open gate.
    pub const fn new() -> Self {
        Self {
            claimed: AtomicBool::new(false),
            instance: OnceLock::new(),
        }
    }

    /// Initialize from a local document.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::AlreadyInitialized`] if this gate already
    /// produced an engine, or [`ReleaseError::IncorrectConfig`] if `config`
    /// is invalid.
    pub fn init_local(&self, config: ReleaseConfig) -> Result<FeatureRelease> {
        let claim = self.claim()?;
        let release = FeatureRelease::from_config(config)?;
        Ok(claim.commit(release))
    }

    /// Initialize from a remote document described by `builder`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::AlreadyInitialized`] if this gate already
    /// produced an engine, otherwise any error of
    /// [`FeatureReleaseBuilder::build`].
    pub async fn init_remote(&self, builder: FeatureReleaseBuilder) -> Result<FeatureRelease> {
        let claim = self.claim()?;
        let release = builder.build().await?;
        Ok(claim.commit(release))
    }

    /// The engine produced by this gate, if any.
    pub fn get(&self) -> Option<&FeatureRelease> {
        self.instance.get()
    }

    /// Whether this gate has produced an engine.
    pub fn is_initialized(&self) -> bool {
        self.instance.get().is_some()
    }

    fn claim(&self) -> Result<Claim<'_>> {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ReleaseError::AlreadyInitialized)?;
        Ok(Claim {
            gate: self,
            committed: false,
        })
    }
}

impl Default for ReleaseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive right to initialize a gate; released on drop unless committed.
struct Claim<'a> {
    gate: &'a ReleaseGate,
    committed: bool,
}

impl Claim<'_> {
    fn commit(mut self, release: FeatureRelease) -> FeatureRelease {
        self.committed = true;
        self.gate.instance.get_or_init(|| release).clone()
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.gate.claimed.store(false, Ordering::Release);
        }
    }
}

static GLOBAL_GATE: ReleaseGate = ReleaseGate::new();

/// Initialize the process-wide engine from a local document.
///
/// # Errors
///
/// See [`ReleaseGate::init_local`].
pub fn init_feature_release(config: ReleaseConfig) -> Result<FeatureRelease> {
    GLOBAL_GATE.init_local(config)
}

/// Initialize the process-wide engine from a remote document.
///
/// # Errors
///
/// See [`ReleaseGate::init_remote`].
///
/// # Examples
///
/// ```rust,no_run
/// use feature_release::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let release = init_feature_release_remote(
///     FeatureRelease::remote("https://example.com/releases.json").with_polling(true),
/// )
/// .await?;
///
/// if release.is_enabled("new-checkout", "user-42", Some("production")) {
///     // ...
/// }
/// # Ok(())
/// # }
/// ```
pub async fn init_feature_release_remote(builder: FeatureReleaseBuilder) -> Result<FeatureRelease> {
    GLOBAL_GATE.init_remote(builder).await
}

/// The process-wide engine, once initialized.
pub fn feature_release() -> Option<&'static FeatureRelease> {
    GLOBAL_GATE.get()
}
