//! Error types for chronicler.

use thiserror::Error;

/// Main error type for chronicler operations.
#[derive(Error, Debug)]
pub enum ChroniclerError {
    // Configuration errors
    #[error("Invalid configuration at `{key}`: {message}")]
    Config { key: String, message: String },

    // Fetch errors
    #[error("Failed to fetch {what}: {message}")]
    Fetch {
        what: String,
        message: String,
        transient: bool,
    },

    // Template errors
    #[error("Failed to render template `{template}`: {message}")]
    Render { template: String, message: String },

    #[error("Git operation failed: {0}")]
    GitError(#[from] git2::Error),

    #[error("Git URL parse error: {0}")]
    GitUrlError(#[from] git_url_parse::GitUrlParseError),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),
}

/// Result type alias using ChroniclerError
pub type Result<T> = std::result::Result<T, ChroniclerError>;

impl ChroniclerError {
    /// Create a configuration error for the given config key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a fetch error that is not worth retrying
    pub fn fetch(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            what: what.into(),
            message: message.into(),
            transient: false,
        }
    }

    /// Create a fetch error that may succeed on a second attempt
    pub fn transient_fetch(
        what: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Fetch {
            what: what.into(),
            message: message.into(),
            transient: true,
        }
    }

    /// Create a render error for the named template
    pub fn render(
        template: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Render {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Whether a retry of the failed operation could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Fetch {
                transient: true,
                ..
            }
        )
    }
}

/// Flattens an error and all of its sources into a single line.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(inner) = source {
        message = format!("{message}: {inner}");
        source = inner.source();
    }

    message
}
