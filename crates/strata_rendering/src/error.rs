//! # Strata Error Types
//!
//! Errors returned for misconfiguration and upload-contract violations.
//!
//! Frame-time degradations (pool exhaustion, missing assets, ray-cast misses)
//! are not errors; they are counted in [`crate::FrameStats`].

use thiserror::Error;

/// Errors that can occur while configuring or feeding the renderer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrataError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read config {path}: {message}")]
    ConfigIo {
        /// Path that was read.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },

    /// A configuration file is not valid TOML for [`crate::StrataConfig`].
    #[error("failed to parse config: {0}")]
    ConfigParse(String),

    /// A write would land outside the persistent upload buffer.
    #[error("upload out of bounds: offset {offset} + {len} bytes exceeds capacity {capacity}")]
    UploadOutOfBounds {
        /// Byte offset of the write.
        offset: u64,
        /// Length of the write in bytes.
        len: u64,
        /// Capacity of the target in bytes.
        capacity: u64,
    },

    /// A pool handle does not refer to a batch in use.
    #[error("invalid batch handle: {0}")]
    InvalidPoolHandle(usize),
}

/// Result type for Strata operations.
pub type StrataResult<T> = Result<T, StrataError>;
