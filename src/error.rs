//! Error types for credential and endpoint resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Config artifact loading and validation errors.
///
/// These are fully contained inside [`ConfigSource`](crate::config::ConfigSource):
/// each of them clears the published snapshot and is logged, but none of them
/// reaches callers of the resolver.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseFailed { path: PathBuf, message: String },

    #[error("invalid config file '{path}': {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Resolution errors visible to callers.
///
/// All variants surface through the public facade as an absent result plus
/// a logged diagnostic; none of them is a crash-worthy condition.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid authentication type '{0}' (expected 'plaintext' or 'longterm')")]
    InvalidAuthMode(String),

    #[error("no public address available: set RELAY_PUBLIC_ADDR or pass an address option")]
    MissingAddress,

    #[error("unknown HMAC algorithm '{0}' (expected 'sha1' or 'sha256')")]
    UnknownAlgorithm(String),

    #[error("unknown credential encoding '{0}' (expected 'base64' or 'hex')")]
    UnknownEncoding(String),
}
