//! Error types for CourseTrack.
//!
//! Library crates use [`CourseTrackError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all CourseTrack operations.
///
/// The variants mirror the failure taxonomy of the coordinator: extraction
/// failures abort the remainder of an ingestion batch, generation failures
/// abort the remainder of a generation pass, match failures are isolated to
/// one document and never propagate past the match coordinator, and
/// validation failures are rejected before any network call is made.
#[derive(Debug, thiserror::Error)]
pub enum CourseTrackError {
    /// Per-document extraction failure.
    #[error("extraction failed for '{document}': {message}")]
    Extraction { document: String, message: String },

    /// Per-course study-plan generation failure.
    #[error("study plan generation failed for '{course}': {message}")]
    Generation { course: String, message: String },

    /// Per-document social match failure. Logged and swallowed by the
    /// match coordinator; never propagated to callers.
    #[error("social match failed for '{document}': {message}")]
    Match { document: String, message: String },

    /// Calendar serialization failure.
    #[error("calendar export failed: {0}")]
    Export(String),

    /// Rejected input (empty record sets, unknown record ids, malformed
    /// edits). Raised before any network call.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Transport-level HTTP error.
    #[error("network error: {0}")]
    Network(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CourseTrackError>;

impl CourseTrackError {
    /// Create an extraction error for a named document.
    pub fn extraction(document: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Extraction {
            document: document.into(),
            message: msg.into(),
        }
    }

    /// Create a generation error for a named course.
    pub fn generation(course: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Generation {
            course: course.into(),
            message: msg.into(),
        }
    }

    /// Create a match error for a named document.
    pub fn match_failure(document: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Match {
            document: document.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CourseTrackError::extraction("CS101.pdf", "no extractable text");
        assert_eq!(
            err.to_string(),
            "extraction failed for 'CS101.pdf': no extractable text"
        );

        let err = CourseTrackError::validation("no records selected");
        assert!(err.to_string().contains("no records selected"));
    }

    #[test]
    fn generation_error_names_course() {
        let err = CourseTrackError::generation("MATH 201", "rate limited");
        assert!(err.to_string().contains("MATH 201"));
        assert!(err.to_string().contains("rate limited"));
    }
}
