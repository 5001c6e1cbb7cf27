//! Config artifact data structures.

use serde::{Deserialize, Serialize};

/// Version tag the gateway accepts; any other value rejects the whole file.
pub const ACCEPTED_VERSION: &str = "v1alpha1";

/// A parsed, validated relay configuration artifact.
///
/// Constructed by the loader on every successful read and published
/// wholesale by [`ConfigSource`](super::ConfigSource); never mutated after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Config schema version, always [`ACCEPTED_VERSION`].
    pub version: String,

    /// Authentication settings.
    pub auth: AuthBlock,

    /// Relay listener definitions, in file order.
    #[serde(default)]
    pub listeners: Vec<Listener>,
}

/// Authentication settings from the config artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthBlock {
    /// Authentication mode: "plaintext" or "longterm".
    #[serde(rename = "type", default)]
    pub auth_type: Option<String>,

    /// STUN/TURN realm.
    #[serde(default)]
    pub realm: Option<String>,

    /// Identity material for the configured mode.
    #[serde(default)]
    pub credentials: AuthCredentials,
}

/// Identity material inside the auth block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthCredentials {
    /// Username for plaintext mode.
    #[serde(default)]
    pub username: Option<String>,

    /// Password for plaintext mode.
    #[serde(default)]
    pub password: Option<String>,

    /// Shared secret for long-term mode.
    #[serde(default)]
    pub secret: Option<String>,
}

/// One relay endpoint definition inside the artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Listener {
    /// Publicly advertised address.
    #[serde(default, alias = "address")]
    pub public_address: Option<String>,

    /// Publicly advertised port; takes priority over `port`.
    #[serde(default)]
    pub public_port: Option<u16>,

    /// Listener-local port, used when no public port is set.
    #[serde(default)]
    pub port: Option<u16>,

    /// Transport protocol token (e.g. "UDP", "TCP").
    #[serde(default)]
    pub protocol: Option<String>,
}

/// Raw shape used during validation, before required fields are checked.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRelayConfig {
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub auth: Option<AuthBlock>,

    #[serde(default)]
    pub listeners: Vec<Listener>,
}
