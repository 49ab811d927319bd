//! Release document validation.

use crate::error::ValidationError;
use crate::model::{FlagEntry, INDIVIDUAL_TARGETS, RELEASE_BY_PERCENTAGE, ReleaseConfig, Rule};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Trait for validating typed release values.
///
/// Used on documents built in code, which bypass the raw-document schema
/// check. Field paths in the reported errors are dotted, e.g.
/// `checkout.staging.releaseByPercentage`.
///
/// # Examples
///
/// ```rust
/// use feature_release::core::Validate;
/// use feature_release::model::{ReleaseConfig, Rule};
///
/// let config = ReleaseConfig::new().with_flag("f", Rule::percentage(120));
/// assert!(config.validate().is_err());
/// ```
pub trait Validate {
    /// Validate the value.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` describing what validation failed.
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for ReleaseConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        for (name, entry) in self.flags() {
            check_rule(name, &entry.rule, &mut errors);
            for (namespace, rule) in &entry.namespaces {
                check_rule(&format!("{}.{}", name, namespace), rule, &mut errors);
            }
        }
        ValidationError::from_errors(errors).map_or(Ok(()), Err)
    }
}

fn check_rule(path: &str, rule: &Rule, errors: &mut Vec<ValidationError>) {
    if let Some(percentage) = rule.release_by_percentage {
        if percentage > 100 {
            errors.push(ValidationError::invalid_field(
                format!("{}.{}", path, RELEASE_BY_PERCENTAGE),
                format!("must be between 0 and 100, got {}", percentage),
            ));
        }
    }
}

/// Validator for raw release documents.
///
/// A document is accepted only as a whole: any bad field anywhere, including
/// inside namespace rules, rejects it. Implementations return the typed
/// document so callers never handle an unchecked one.
pub trait DocumentValidator: Send + Sync {
    /// Validate `document` and convert it into a [`ReleaseConfig`].
    ///
    /// # Errors
    ///
    /// Returns every field-level problem found in the document.
    fn validate(&self, document: &Value) -> Result<ReleaseConfig, ValidationError>;
}

impl<F> DocumentValidator for F
where
    F: Fn(&Value) -> Result<ReleaseConfig, ValidationError> + Send + Sync,
{
    fn validate(&self, document: &Value) -> Result<ReleaseConfig, ValidationError> {
        self(document)
    }
}

/// Default [`DocumentValidator`] enforcing the release document schema.
///
/// - the root is an object keyed by flag name;
/// - each flag entry is an object;
/// - `releaseByPercentage` is an integer in `[0, 100]`;
/// - `individualTargets` is an object whose values are booleans;
/// - any other key of a flag entry is a namespace whose value is a rule
///   object, and rule objects carry no other keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl DocumentValidator for SchemaValidator {
    fn validate(&self, document: &Value) -> Result<ReleaseConfig, ValidationError> {
        let root = document.as_object().ok_or_else(|| {
            ValidationError::custom("release config must be an object keyed by flag name")
        })?;

        let mut errors = Vec::new();
        let mut config = ReleaseConfig::new();

        for (name, entry) in root {
            match entry.as_object() {
                Some(fields) => {
                    config.insert(name.as_str(), parse_entry(name, fields, &mut errors));
                }
                None => errors.push(ValidationError::invalid_field(
                    name.as_str(),
                    "flag entry must be an object",
                )),
            }
        }

        match ValidationError::from_errors(errors) {
            Some(err) => Err(err),
            None => Ok(config),
        }
    }
}

fn parse_entry(path: &str, fields: &Map<String, Value>, errors: &mut Vec<ValidationError>) -> FlagEntry {
    let mut entry = FlagEntry::default();
    let mut namespaces = HashMap::new();

    for (key, value) in fields {
        let field_path = format!("{}.{}", path, key);
        match key.as_str() {
            RELEASE_BY_PERCENTAGE => {
                entry.rule.release_by_percentage = parse_percentage(&field_path, value, errors);
            }
            INDIVIDUAL_TARGETS => {
                entry.rule.individual_targets = parse_targets(&field_path, value, errors);
            }
            _ => match value.as_object() {
                Some(rule) => {
                    namespaces.insert(key.clone(), parse_rule(&field_path, rule, errors));
                }
                None => errors.push(ValidationError::invalid_field(
                    field_path,
                    "namespace rule must be an object",
                )),
            },
        }
    }

    entry.namespaces = namespaces;
    entry
}

fn parse_rule(path: &str, fields: &Map<String, Value>, errors: &mut Vec<ValidationError>) -> Rule {
    let mut rule = Rule::default();

    for (key, value) in fields {
        let field_path = format!("{}.{}", path, key);
        match key.as_str() {
            RELEASE_BY_PERCENTAGE => {
                rule.release_by_percentage = parse_percentage(&field_path, value, errors);
            }
            INDIVIDUAL_TARGETS => {
                rule.individual_targets = parse_targets(&field_path, value, errors);
            }
            _ => errors.push(ValidationError::invalid_field(field_path, "unknown rule field")),
        }
    }

    rule
}

fn parse_percentage(path: &str, value: &Value, errors: &mut Vec<ValidationError>) -> Option<u8> {
    let reason = match value {
        Value::Number(number) => {
            // 20.0 is accepted as 20; 20.5 is not an integer.
            let whole = number
                .as_i64()
                .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64));
            match whole {
                Some(p) if (0..=100).contains(&p) => return Some(p as u8),
                Some(p) => format!("must be between 0 and 100, got {}", p),
                None => format!("must be an integer, got {}", number),
            }
        }
        other => format!("must be an integer between 0 and 100, got {}", type_name(other)),
    };

    errors.push(ValidationError::invalid_field(path, reason));
    None
}

fn parse_targets(path: &str, value: &Value, errors: &mut Vec<ValidationError>) -> HashMap<String, bool> {
    let Some(targets) = value.as_object() else {
        errors.push(ValidationError::invalid_field(
            path,
            format!("must be an object of booleans, got {}", type_name(value)),
        ));
        return HashMap::new();
    };

    let mut parsed = HashMap::with_capacity(targets.len());
    for (target, enabled) in targets {
        match enabled.as_bool() {
            Some(enabled) => {
                parsed.insert(target.clone(), enabled);
            }
            None => errors.push(ValidationError::invalid_field(
                format!("{}.{}", path, target),
                format!("must be a boolean, got {}", type_name(enabled)),
            )),
        }
    }
    parsed
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
