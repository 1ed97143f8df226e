//! Error types for ctxkit.
//!
//! Library crates use [`CtxKitError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for the top-level report.

use std::path::PathBuf;

/// Top-level error type for all ctxkit operations.
#[derive(Debug, thiserror::Error)]
pub enum CtxKitError {
    /// The configuration document does not match the item schema.
    #[error("{message}")]
    Validation { message: String },

    /// The configuration text is not a JSON document.
    #[error("invalid JSON in \"{path}\": {message}")]
    Parse { path: String, message: String },

    /// A local file or directory does not exist.
    #[error("No such file or directory, \"{}\"", path.display())]
    NotFound { path: PathBuf },

    /// Filesystem I/O error other than a missing path.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A URL fetch failed (transport failure or non-success status).
    #[error("GET {url} failed: {message}")]
    Transport { url: String, message: String },

    /// A directory item matched no files.
    #[error("No files found, \"{}\"", path.display())]
    EmptyDirectory { path: PathBuf },

    /// A config item loads a config that is already being resolved.
    #[error("Config includes itself, \"{path}\"")]
    ConfigCycle { path: String },

    /// A directory item pointed at a URL.
    #[error("Cannot list files of a URL, \"{url}\"")]
    RemoteDirectory { url: String },

    /// Settings loading or validation error.
    #[error("settings error: {message}")]
    Config { message: String },

    /// Chat API error (request, status, or stream decoding).
    #[error("API error: {0}")]
    Api(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CtxKitError>;

impl CtxKitError {
    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a settings error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a transport error for `url`.
    pub fn transport(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    ///
    /// `NotFound` errors become [`CtxKitError::NotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}
