//! Ephemeral TURN credentials and ICE server configuration for a relay
//! gateway.
//!
//! When a relay config artifact is loaded (and hot-reloaded on change by
//! [`ConfigSource`]), credentials and endpoint descriptors derive from it;
//! otherwise the crate falls back to environment variables and built-in
//! defaults, both overridable per call. Long-term credentials use the
//! time-boxed HMAC scheme TURN relays verify statelessly.
//!
//! Transporting credentials to clients, gateway listener sockets, and
//! relay-side validation are out of scope.

pub mod config;
pub mod credential;
pub mod error;
pub mod ice;
pub mod options;

use tracing::error;

pub use config::{ConfigSource, RelayConfig};
pub use credential::{long_term_credential, resolve_credential, Algorithm, Credential, Encoding};
pub use error::{ConfigError, ResolveError};
pub use ice::{resolve_endpoints, IceConfig, IceServer};
pub use options::ResolveOptions;

/// Issues credentials and ICE configurations against a live config source.
///
/// Construct one, `start` it inside a tokio runtime, and share it by
/// reference with whatever needs credential resolution. Resolution never
/// blocks on the source; it reads whatever snapshot is currently published.
pub struct AuthService {
    source: ConfigSource,
}

impl AuthService {
    /// Creates a service with no config watch running.
    pub fn new() -> Self {
        Self {
            source: ConfigSource::new(),
        }
    }

    /// Starts (or restarts) the config watch. The path is taken from the
    /// `config_file` option, then the environment, then the built-in
    /// default.
    pub fn start(&self, options: &ResolveOptions) {
        self.source
            .start(options::config_file_path(options.config_file.as_deref()));
    }

    /// Stops the config watch and clears the snapshot. Idempotent.
    pub fn stop(&self) {
        self.source.stop();
    }

    /// The underlying config source, for callers that want raw snapshots.
    pub fn config_source(&self) -> &ConfigSource {
        &self.source
    }

    /// Returns a credential pair, or `None` when resolution fails
    /// (unrecognized auth mode, algorithm, or encoding). Absence means "not
    /// configured yet / try again later", never a crash.
    pub fn get_credential(&self, options: &ResolveOptions) -> Option<Credential> {
        let snapshot = self.source.snapshot();
        match resolve_credential(options, snapshot.as_deref()) {
            Ok(cred) => Some(cred),
            Err(e) => {
                error!(error = %e, "credential resolution failed");
                None
            }
        }
    }

    /// Returns the ICE server list plus transport policy, or `None` when
    /// resolution fails (invalid auth mode, or no public address in
    /// fallback mode).
    pub fn get_ice_config(&self, options: &ResolveOptions) -> Option<IceConfig> {
        let snapshot = self.source.snapshot();
        match resolve_endpoints(options, snapshot.as_deref()) {
            Ok(config) => Some(config),
            Err(e) => {
                error!(error = %e, "ICE configuration resolution failed");
                None
            }
        }
    }
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new()
    }
}
