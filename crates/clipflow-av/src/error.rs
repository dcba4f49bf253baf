//! Error types for clipflow-av.

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures an orchestration operation can report.
///
/// Every expected failure mode maps to one of four stable numeric codes (see
/// [`Error::code`]). Composite operations propagate a child failure verbatim,
/// so the code always identifies the primitive stage that detected it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No input file was given, or an input path is empty. Code 100.
    #[error("input file is empty")]
    EmptyInput,

    /// A referenced input does not exist in the storage tier. Code 101.
    #[error("input file not found: {path}")]
    InputNotFound { path: String },

    /// The subprocess failed, timed out, or ran without producing the
    /// declared output. Code 102. Carries the captured diagnostic lines.
    #[error("run failed: {message}")]
    SubprocessFailed {
        message: String,
        output: Vec<String>,
    },

    /// Copying a finished artifact to the remote tier failed. Code 103.
    #[error("publish failed: {key} from {resource}")]
    PublishFailed { key: String, resource: String },
}

impl Error {
    /// Numeric failure code exposed on the operation result surface.
    pub fn code(&self) -> u16 {
        match self {
            Error::EmptyInput => 100,
            Error::InputNotFound { .. } => 101,
            Error::SubprocessFailed { .. } => 102,
            Error::PublishFailed { .. } => 103,
        }
    }

    /// Create an input-not-found error.
    pub fn input_not_found(path: impl Into<String>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    /// Create a subprocess failure carrying the captured output lines.
    pub fn subprocess(message: impl Into<String>, output: Vec<String>) -> Self {
        Self::SubprocessFailed {
            message: message.into(),
            output,
        }
    }

    /// Create a publish failure.
    pub fn publish_failed(key: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::PublishFailed {
            key: key.into(),
            resource: resource.into(),
        }
    }
}
