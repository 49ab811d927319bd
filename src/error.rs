//! Error types for feature-release.

use std::fmt;

/// Result type alias for feature-release operations.
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Errors raised while constructing or refreshing a release engine.
///
/// Evaluation never fails, so none of these are produced by
/// [`FeatureRelease::is_enabled`](crate::core::FeatureRelease::is_enabled).
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    /// A second engine construction was attempted through the same gate.
    #[error("FeatureRelease is already initialized; only one instance may exist")]
    AlreadyInitialized,

    /// The release document failed validation.
    #[error("The release config is incorrectly formatted: {0}")]
    IncorrectConfig(ValidationError),

    /// The remote release document could not be downloaded.
    #[error("Failed to download the release config: {0}")]
    CannotDownloadConfig(String),

    /// Polling was requested on an engine that is already polling.
    #[error("Config polling has already started")]
    ConfigPollingAlreadyStarted,

    /// Polling cannot run for this engine (no remote source, or no runtime).
    #[error("Config polling is unavailable: {0}")]
    PollingUnavailable(String),

    /// IO error while reading a local release document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A local release document could not be parsed.
    #[error("Failed to parse release config: {0}")]
    Parse(String),
}

impl ReleaseError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "ERROR_ALREADY_INITIALIZED",
            Self::IncorrectConfig(_) => "ERROR_INCORRECT_CONFIG",
            Self::CannotDownloadConfig(_) => "ERROR_CANNOT_DOWNLOAD_CONFIG",
            Self::ConfigPollingAlreadyStarted => "ERROR_CONFIG_POLLING_ALREADY_STARTED",
            Self::PollingUnavailable(_) => "ERROR_POLLING_UNAVAILABLE",
            Self::Io(_) => "ERROR_IO",
            Self::Parse(_) => "ERROR_PARSE",
        }
    }
}

/// Validation error for release documents.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// Dotted path to the field, e.g. `checkout.staging.releaseByPercentage`
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Collapse a list of errors: `None` when empty, the error itself when
    /// there is exactly one, `Multiple` otherwise.
    pub fn from_errors(mut errors: Vec<ValidationError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Paths of every invalid field contained in this error.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Custom(_) => Vec::new(),
            Self::InvalidField { field, .. } => vec![field.as_str()],
            Self::Multiple(errors) => errors.iter().flat_map(|e| e.fields()).collect(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ReleaseError {
    fn from(err: ValidationError) -> Self {
        ReleaseError::IncorrectConfig(err)
    }
}
