//! Release rules and the release document.

use crate::core::{DocumentValidator, SchemaValidator};
use crate::error::ValidationError;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Document key holding the rollout percentage of a rule.
pub const RELEASE_BY_PERCENTAGE: &str = "releaseByPercentage";

/// Document key holding the per-identifier overrides of a rule.
pub const INDIVIDUAL_TARGETS: &str = "individualTargets";

/// Release policy for one flag, or for one namespace of a flag.
///
/// # Examples
///
/// ```rust
/// use feature_release::model::Rule;
///
/// let rule = Rule::new()
///     .with_percentage(20)
///     .with_target("qa-account", true)
///     .with_target("blocked-account", false);
///
/// assert_eq!(rule.release_by_percentage, Some(20));
/// assert_eq!(rule.target("qa-account"), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Percentage of identifiers the flag is released to, in `[0, 100]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_by_percentage: Option<u8>,
    /// Explicit overrides keyed by identifier. These win over the percentage.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub individual_targets: HashMap<String, bool>,
}

impl Rule {
    /// Create an empty rule. An empty rule never enables anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rule that only carries a rollout percentage.
    pub fn percentage(percentage: u8) -> Self {
        Self::new().with_percentage(percentage)
    }

    /// Set the rollout percentage.
    pub fn with_percentage(mut self, percentage: u8) -> Self {
        self.release_by_percentage = Some(percentage);
        self
    }

    /// Add an individual target override.
    pub fn with_target<'a>(mut self, target: impl Into<TargetKey<'a>>, enabled: bool) -> Self {
        self.individual_targets
            .insert(target.into().into_owned(), enabled);
        self
    }

    /// Look up the override for `target`, if any.
    pub fn target(&self, target: &str) -> Option<bool> {
        self.individual_targets.get(target).copied()
    }

    /// Whether `key` names a reserved field that is set on this rule.
    fn has_reserved_field(&self, key: &str) -> bool {
        match key {
            RELEASE_BY_PERCENTAGE => self.release_by_percentage.is_some_and(|p| p > 0),
            INDIVIDUAL_TARGETS => !self.individual_targets.is_empty(),
            _ => false,
        }
    }

    /// Whether the rule has neither a percentage nor any targets.
    pub fn is_empty(&self) -> bool {
        self.release_by_percentage.is_none() && self.individual_targets.is_empty()
    }
}

/// Configuration entry of one flag.
///
/// The document format does not tag entries, so both shapes share one type:
/// the reserved keys `releaseByPercentage` and `individualTargets` form the
/// flat [`Rule`], and every other key is a namespace holding its own rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlagEntry {
    /// Rule used when no namespace applies.
    #[serde(flatten)]
    pub rule: Rule,
    /// Per-namespace rules.
    #[serde(flatten)]
    pub namespaces: HashMap<String, Rule>,
}

impl FlagEntry {
    /// An entry that is a single flat rule.
    pub fn flat(rule: Rule) -> Self {
        Self {
            rule,
            namespaces: HashMap::new(),
        }
    }

    /// An entry keyed by namespace.
    pub fn namespaced<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = (S, Rule)>,
        S: Into<String>,
    {
        Self {
            rule: Rule::default(),
            namespaces: namespaces
                .into_iter()
                .map(|(name, rule)| (name.into(), rule))
                .collect(),
        }
    }

    /// Add a namespace rule.
    pub fn with_namespace(mut self, namespace: impl Into<String>, rule: Rule) -> Self {
        self.namespaces.insert(namespace.into(), rule);
        self
    }

    /// Pick the rule that applies to `namespace`.
    ///
    /// A namespace rule is used only when a non-empty namespace was supplied
    /// and the entry has a rule under that exact key. In every other case,
    /// including a supplied namespace that is missing here, the flat rule is
    /// returned. For a purely namespaced entry that flat rule is empty.
    ///
    /// A namespace named after a reserved key that is set on the flat rule
    /// (a non-zero `releaseByPercentage`, or non-empty `individualTargets`)
    /// addresses that field rather than a rule, and resolves to an empty rule.
    pub fn resolve(&self, namespace: Option<&str>) -> &Rule {
        static EMPTY: LazyLock<Rule> = LazyLock::new(Rule::default);

        match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) if self.rule.has_reserved_field(ns) => &*EMPTY,
            Some(ns) => self.namespaces.get(ns).unwrap_or(&self.rule),
            None => &self.rule,
        }
    }
}

impl From<Rule> for FlagEntry {
    fn from(rule: Rule) -> Self {
        Self::flat(rule)
    }
}

/// The root release document: flag name to [`FlagEntry`].
///
/// Values are immutable once handed to an engine; replacing the configuration
/// always swaps a whole document.
///
/// Deserializing goes through [`SchemaValidator`], so a document obtained
/// with `serde_json::from_str` has already been validated.
///
/// # Examples
///
/// ```rust
/// use feature_release::model::{FlagEntry, ReleaseConfig, Rule};
///
/// let config = ReleaseConfig::new()
///     .with_flag("new-checkout", Rule::percentage(25))
///     .with_flag(
///         "dark-mode",
///         FlagEntry::namespaced([("staging", Rule::percentage(100))]),
///     );
///
/// assert_eq!(config.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct ReleaseConfig {
    flags: HashMap<String, FlagEntry>,
}

impl ReleaseConfig {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry of a flag.
    pub fn with_flag(mut self, name: impl Into<String>, entry: impl Into<FlagEntry>) -> Self {
        self.insert(name, entry);
        self
    }

    /// Add or replace the entry of a flag.
    pub fn insert(&mut self, name: impl Into<String>, entry: impl Into<FlagEntry>) {
        self.flags.insert(name.into(), entry.into());
    }

    /// Entry of the named flag.
    pub fn get(&self, name: &str) -> Option<&FlagEntry> {
        self.flags.get(name)
    }

    /// Iterate over all flags.
    pub fn flags(&self) -> impl Iterator<Item = (&str, &FlagEntry)> {
        self.flags.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of flags in the document.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether the document defines no flags.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl Serialize for ReleaseConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.flags.serialize(serializer)
    }
}

impl TryFrom<Value> for ReleaseConfig {
    type Error = ValidationError;

    fn try_from(document: Value) -> Result<Self, Self::Error> {
        SchemaValidator.validate(&document)
    }
}

impl<S: Into<String>, E: Into<FlagEntry>> FromIterator<(S, E)> for ReleaseConfig {
    fn from_iter<I: IntoIterator<Item = (S, E)>>(iter: I) -> Self {
        Self {
            flags: iter
                .into_iter()
                .map(|(name, entry)| (name.into(), entry.into()))
                .collect(),
        }
    }
}

/// Identifier of the subject being evaluated, e.g. a user id.
///
/// Strings are used as-is; integers are rendered in decimal, so `42` and
/// `"42"` are the same target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetKey<'a>(Cow<'a, str>);

impl TargetKey<'_> {
    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into an owned string.
    pub fn into_owned(self) -> String {
        self.0.into_owned()
    }
}

impl fmt::Display for TargetKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> From<&'a str> for TargetKey<'a> {
    fn from(key: &'a str) -> Self {
        Self(Cow::Borrowed(key))
    }
}

impl<'a> From<&'a String> for TargetKey<'a> {
    fn from(key: &'a String) -> Self {
        Self(Cow::Borrowed(key.as_str()))
    }
}

impl From<String> for TargetKey<'_> {
    fn from(key: String) -> Self {
        Self(Cow::Owned(key))
    }
}

macro_rules! target_key_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for TargetKey<'_> {
                fn from(key: $ty) -> Self {
                    Self(Cow::Owned(key.to_string()))
                }
            }
        )*
    };
}

target_key_from_int!(i32, i64, u32, u64, usize);
