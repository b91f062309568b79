//! Error types for the grading backend.

use quest_core::ports::GradeError;

/// Errors raised while configuring or calling the grading backend.
#[derive(Debug, thiserror::Error)]
pub enum GraderError {
    /// Configuration was missing or invalid.
    #[error("grader config error: {0}")]
    Config(String),

    /// A prompt template failed to load or render.
    #[error("grader template error: {0}")]
    Template(String),

    /// The HTTP call to the grading API failed.
    #[error("grader http error: {0}")]
    Http(String),

    /// The API responded, but the body could not be turned into a
    /// graded report.
    #[error("grader parse error: {0}")]
    Parse(String),
}

impl From<GraderError> for GradeError {
    fn from(value: GraderError) -> Self {
        match value {
            GraderError::Parse(msg) => Self::Malformed(msg),
            GraderError::Config(msg) | GraderError::Template(msg) | GraderError::Http(msg) => {
                Self::Unavailable(msg)
            }
        }
    }
}
