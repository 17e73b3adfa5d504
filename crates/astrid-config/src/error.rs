//! Errors produced while discovering, parsing, merging, and validating
//! configuration.

use thiserror::Error;

/// Result alias for fallible configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Everything that can go wrong while loading or validating a [`crate::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file's contents could not be parsed as TOML, or the merged
    /// tree could not be deserialized into [`crate::Config`].
    #[error("failed to parse config at {path}: {source}")]
    ParseError {
        /// Path of the file that failed to parse, or a placeholder for
        /// in-memory sources (e.g. `<embedded defaults>`).
        path: String,
        /// Underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },

    /// A config file exists but could not be read from disk.
    #[error("failed to read config at {path}: {source}")]
    ReadError {
        /// Path of the file that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A field failed post-merge validation.
    #[error("invalid config field '{field}': {message}")]
    ValidationError {
        /// Dotted path of the offending field.
        field: String,
        /// Human-readable description of the violation.
        message: String,
    },

    /// The user's home directory could not be determined, and no override
    /// was supplied.
    #[error("could not determine home directory; set ASTRID_HOME or pass an override")]
    NoHomeDir,
}
