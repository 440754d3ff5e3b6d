//! Error types for the report normalization core.

use thiserror::Error;

/// Result type alias using our error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the normalization core.
///
/// Every variant is non-fatal from the dashboard's point of view: a payload
/// that cannot be normalized renders as "no results" / "unrecognized result
/// format", and a corrupt history record is skipped without aborting the
/// rest of the history list.
#[derive(Error, Debug)]
pub enum Error {
    /// The raw payload is non-empty but matches none of the known shapes.
    #[error("Unrecognized payload shape: {detail}")]
    UnrecognizedShape { detail: String },

    /// A history record's serialized payload failed to parse.
    #[error("Corrupt history record: {detail}")]
    CorruptHistoryRecord { detail: String },

    /// A test row is missing a required field (`testName`, `status`).
    ///
    /// The lenient decoding path coerces these rows instead of failing and
    /// records the rendered message in [`Report::warnings`]; the variant
    /// exists so strict callers and the warning text share one vocabulary.
    ///
    /// [`Report::warnings`]: crate::model::Report::warnings
    #[error("Malformed test result: {detail}")]
    MalformedTestResult { detail: String },

    /// A `target` string has an unexpected number of dot-separated segments.
    #[error("Cannot split target '{target}' into dataset and table")]
    TargetParse { target: String },

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] Box<serde_json::Error>),

    /// Session store / repository errors
    #[error("Session error: {0}")]
    Session(String),
}

impl Error {
    /// Create an unrecognized-shape error.
    pub fn unrecognized_shape(detail: impl Into<String>) -> Self {
        Self::UnrecognizedShape {
            detail: detail.into(),
        }
    }

    /// Create a corrupt-history-record error.
    pub fn corrupt_history(detail: impl Into<String>) -> Self {
        Self::CorruptHistoryRecord {
            detail: detail.into(),
        }
    }

    /// Create a malformed-test-result error.
    pub fn malformed_result(detail: impl Into<String>) -> Self {
        Self::MalformedTestResult {
            detail: detail.into(),
        }
    }

    /// Create a target-parse error.
    pub fn target_parse(target: impl Into<String>) -> Self {
        Self::TargetParse {
            target: target.into(),
        }
    }

    /// Create a session error.
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(Box::new(value))
    }
}
