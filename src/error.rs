use std::io;

/// Errors produced while loading, reading or extracting a widget package.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A member name (or a lookup name) resolves outside the archive root.
    #[error("invalid path '{name}': {reason}")]
    InvalidPath { name: String, reason: &'static str },

    /// The requested file or directory is not recorded in the package.
    #[error("'{0}' not found in package")]
    NotFound(String),

    /// The supplied data is not a well-formed zip container.
    #[error("malformed zip archive: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn invalid_path(name: &str, reason: &'static str) -> Self {
        Self::InvalidPath {
            name: name.to_string(),
            reason,
        }
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_invalid_path(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
