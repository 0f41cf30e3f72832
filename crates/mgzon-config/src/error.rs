//! Error types for local configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No home directory could be resolved for the current user.
    #[error("could not determine a home directory for the current user")]
    NoHomeDir,
    /// Reading or writing the config file failed.
    #[error("config file I/O failed for {path}")]
    Io {
        /// Path involved in the failing operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The config file exists but does not parse as the expected JSON record.
    #[error("config file {path} is not valid JSON")]
    Parse {
        /// Path of the malformed file.
        path: PathBuf,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
    /// A key passed to `mz config get`/`set` does not name a known field.
    #[error("unknown configuration key '{key}'")]
    UnknownKey {
        /// The key supplied by the caller.
        key: String,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
