//! One-shot feedback messages shown after a redirect.

use crate::errors::Error;
use serde::Serialize;

/// Shown to the user when an uploaded roster cannot be parsed at all.
pub const IMPORT_FAILURE_MESSAGE: &str =
    "An unexpected error occurred during import. Check file format.";

/// A success or error message for the next page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Flash {
    /// The action went through
    Success(String),
    /// The action was refused or failed
    Error(String),
}

impl Flash {
    /// A confirmation message.
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success(message.into())
    }

    /// A refusal or failure message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Turns a failed operation into something a user can read.
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Import { .. } => Self::error(IMPORT_FAILURE_MESSAGE),
            Error::Database(_)
            | Error::Io(_)
            | Error::PasswordHash(_)
            | Error::Export(_)
            | Error::Task(_) => {
                tracing::error!("Request failed: {}", err);
                Self::error("Something went wrong. Please try again.")
            }
            other => Self::error(other.to_string()),
        }
    }
}

/// Builds `prefix/<year>` with the year label percent-encoded.
#[must_use]
pub fn year_path(prefix: &str, year: &str) -> String {
    format!("{prefix}/{}", urlencoding::encode(year))
}
