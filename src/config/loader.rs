//! Config artifact loading, parsing, and validation.

use std::path::Path;

use super::model::{RawRelayConfig, RelayConfig, ACCEPTED_VERSION};
use crate::error::ConfigError;

/// Loads the config artifact from disk, parses it as JSON, and validates
/// its shape.
///
/// The three failure kinds (unreadable, unparseable, wrong shape) all lead
/// the caller to clear the published snapshot, but stay distinguishable for
/// diagnostics.
pub fn load_from_path(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let raw: RawRelayConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    validate(raw, path)
}

/// Checks the version tag and the presence of the auth block. Rejection is
/// all-or-nothing: a file that fails here contributes no fields at all.
fn validate(raw: RawRelayConfig, path: &Path) -> Result<RelayConfig, ConfigError> {
    let version = match raw.version {
        Some(v) if v == ACCEPTED_VERSION => v,
        Some(v) => {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: format!("unsupported version '{}' (expected '{}')", v, ACCEPTED_VERSION),
            })
        }
        None => {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "missing version field".to_string(),
            })
        }
    };

    let auth = raw.auth.ok_or_else(|| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason: "missing auth block".to_string(),
    })?;

    Ok(RelayConfig {
        version,
        auth,
        listeners: raw.listeners,
    })
}
