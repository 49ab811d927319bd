//! Flag evaluation against a release document.

use crate::core::bucket::{bucket, salt};
use crate::model::{ReleaseConfig, Rule};

/// Why an evaluation produced its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The flag is not in the document.
    UnknownFlag,
    /// An individual target override decided the result.
    IndividualTarget,
    /// The percentage rule decided the result; carries the identifier's bucket.
    Percentage {
        /// Bucket of the identifier in `[0, 99]`.
        bucket: u8,
    },
    /// The applicable rule had neither a matching target nor a percentage.
    NoMatchingRule,
}

/// Result of evaluating a flag for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Whether the flag is on for the identifier.
    pub enabled: bool,
    /// What decided `enabled`.
    pub reason: Reason,
}

/// Evaluate `flag` for `target` in `namespace` against `config`.
///
/// Unknown flags and empty rules evaluate to `false`; this function never fails.
pub fn evaluate(config: &ReleaseConfig, flag: &str, target: &str, namespace: Option<&str>) -> Evaluation {
    let Some(entry) = config.get(flag) else {
        return Evaluation {
            enabled: false,
            reason: Reason::UnknownFlag,
        };
    };

    evaluate_rule(entry.resolve(namespace), flag, target, namespace)
}

fn evaluate_rule(rule: &Rule, flag: &str, target: &str, namespace: Option<&str>) -> Evaluation {
    if let Some(enabled) = rule.target(target) {
        return Evaluation {
            enabled,
            reason: Reason::IndividualTarget,
        };
    }

    if let Some(percentage) = rule.release_by_percentage {
        let bucket = bucket(&salt(flag, namespace), target);
        // Percentage P enables buckets 0..P-1.
        return Evaluation {
            enabled: bucket < percentage,
            reason: Reason::Percentage { bucket },
        };
    }

    Evaluation {
        enabled: false,
        reason: Reason::NoMatchingRule,
    }
}
