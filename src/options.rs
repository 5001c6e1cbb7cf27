//! Call-time options, the environment cascade, and built-in defaults.
//!
//! Every resolvable field follows the same precedence: explicit option >
//! loaded artifact field > environment variable > built-in default. A
//! string is "present" only when non-empty; an empty option or environment
//! value falls through to the next layer.

use std::path::{Path, PathBuf};
use std::str::FromStr;

// Environment variables consumed, each overridable by call-time options.
pub const ENV_PUBLIC_ADDR: &str = "RELAY_PUBLIC_ADDR";
pub const ENV_PUBLIC_PORT: &str = "RELAY_PUBLIC_PORT";
pub const ENV_PROTOCOL: &str = "RELAY_PROTOCOL";
pub const ENV_AUTH_TYPE: &str = "RELAY_AUTH_TYPE";
pub const ENV_REALM: &str = "RELAY_REALM";
pub const ENV_USERNAME: &str = "RELAY_USERNAME";
pub const ENV_PASSWORD: &str = "RELAY_PASSWORD";
pub const ENV_SHARED_SECRET: &str = "RELAY_SHARED_SECRET";
pub const ENV_DURATION: &str = "RELAY_DURATION";
pub const ENV_UDP_ENABLE: &str = "RELAY_TRANSPORT_UDP_ENABLE";
pub const ENV_TCP_ENABLE: &str = "RELAY_TRANSPORT_TCP_ENABLE";
pub const ENV_CONFIG_FILE: &str = "RELAY_CONFIG_FILE";
pub const ENV_ICE_TRANSPORT_POLICY: &str = "RELAY_ICE_TRANSPORT_POLICY";
pub const ENV_HMAC_ALGORITHM: &str = "RELAY_HMAC_ALGORITHM";
pub const ENV_CREDENTIAL_ENCODING: &str = "RELAY_CREDENTIAL_ENCODING";

// Built-in defaults. The public address deliberately has none: in fallback
// mode there is no safe address to advertise, so its absence is fatal.
pub const DEFAULT_PUBLIC_PORT: u16 = 3478;
pub const DEFAULT_PROTOCOL: &str = "UDP";
pub const DEFAULT_AUTH_TYPE: &str = "plaintext";
pub const DEFAULT_REALM: &str = "relay.example.org";
pub const DEFAULT_USERNAME: &str = "user";
pub const DEFAULT_PASSWORD: &str = "pass";
pub const DEFAULT_SHARED_SECRET: &str = "my-secret";
pub const DEFAULT_DURATION_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_UDP_ENABLE: bool = true;
pub const DEFAULT_TCP_ENABLE: bool = false;
pub const DEFAULT_CONFIG_FILE: &str = "/etc/relay-gateway/config.json";
pub const DEFAULT_ICE_TRANSPORT_POLICY: &str = "relay";
pub const DEFAULT_HMAC_ALGORITHM: &str = "sha1";
pub const DEFAULT_CREDENTIAL_ENCODING: &str = "base64";

/// Per-call overrides for credential and endpoint resolution.
///
/// Unset fields fall through the artifact/environment/default cascade;
/// never persisted, re-merged on every call.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Public address of the relay.
    pub address: Option<String>,
    /// Public port of the relay.
    pub port: Option<u16>,
    /// Transport protocol token used in config mode.
    pub protocol: Option<String>,
    /// Authentication mode: "plaintext" or "longterm".
    pub auth_type: Option<String>,
    /// STUN/TURN realm.
    pub realm: Option<String>,
    /// Username for plaintext mode.
    pub username: Option<String>,
    /// Password for plaintext mode.
    pub password: Option<String>,
    /// Shared secret for long-term mode.
    pub secret: Option<String>,
    /// Credential lifetime in seconds for long-term mode.
    pub duration: Option<u64>,
    /// HMAC algorithm token: "sha1" or "sha256".
    pub algorithm: Option<String>,
    /// Digest output encoding token: "base64" or "hex".
    pub encoding: Option<String>,
    /// ICE transport policy: "relay" or "all".
    pub ice_transport_policy: Option<String>,
    /// Whether to advertise a UDP endpoint in fallback mode.
    pub transport_udp_enable: Option<bool>,
    /// Whether to advertise a TCP endpoint in fallback mode.
    pub transport_tcp_enable: Option<bool>,
    /// Path to the config artifact file.
    pub config_file: Option<PathBuf>,
}

/// Treats empty strings the same as unset.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Reads an environment variable, treating unset and empty alike.
pub(crate) fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

pub(crate) fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse().ok())
}

/// Boolean flag semantics: the literal "0" is false, any other non-empty
/// value is true, unset and empty fall through to the built-in default.
pub(crate) fn env_flag(name: &str) -> Option<bool> {
    env_string(name).map(|v| v != "0")
}

/// Precedence merge for a string-valued field:
/// option > artifact > environment > default.
pub(crate) fn merge_str<'a>(
    option: Option<&'a str>,
    artifact: Option<&'a str>,
    env: &str,
    default: &str,
) -> String {
    non_empty(option)
        .or(non_empty(artifact))
        .map(str::to_owned)
        .or_else(|| env_string(env))
        .unwrap_or_else(|| default.to_owned())
}

/// Resolves the config artifact path: explicit option > environment >
/// built-in default.
pub fn config_file_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => env_string(ENV_CONFIG_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn empty_strings_are_absent() {
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(Some("x")), Some("x"));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    #[serial]
    fn merge_prefers_option_then_artifact_then_env_then_default() {
        std::env::set_var("RELAY_TEST_MERGE", "from-env");

        assert_eq!(
            merge_str(Some("from-opt"), Some("from-cfg"), "RELAY_TEST_MERGE", "dflt"),
            "from-opt"
        );
        assert_eq!(
            merge_str(None, Some("from-cfg"), "RELAY_TEST_MERGE", "dflt"),
            "from-cfg"
        );
        assert_eq!(merge_str(None, None, "RELAY_TEST_MERGE", "dflt"), "from-env");
        // Empty layers fall through rather than override.
        assert_eq!(
            merge_str(Some(""), Some(""), "RELAY_TEST_MERGE", "dflt"),
            "from-env"
        );

        std::env::remove_var("RELAY_TEST_MERGE");
        assert_eq!(merge_str(None, None, "RELAY_TEST_MERGE", "dflt"), "dflt");
    }

    #[test]
    #[serial]
    fn boolean_flags_treat_zero_as_false() {
        std::env::set_var("RELAY_TEST_FLAG", "0");
        assert_eq!(env_flag("RELAY_TEST_FLAG"), Some(false));

        std::env::set_var("RELAY_TEST_FLAG", "1");
        assert_eq!(env_flag("RELAY_TEST_FLAG"), Some(true));

        std::env::set_var("RELAY_TEST_FLAG", "false");
        assert_eq!(env_flag("RELAY_TEST_FLAG"), Some(true));

        std::env::set_var("RELAY_TEST_FLAG", "");
        assert_eq!(env_flag("RELAY_TEST_FLAG"), None);

        std::env::remove_var("RELAY_TEST_FLAG");
        assert_eq!(env_flag("RELAY_TEST_FLAG"), None);
    }

    #[test]
    #[serial]
    fn config_file_path_precedence() {
        std::env::remove_var(ENV_CONFIG_FILE);
        assert_eq!(config_file_path(None), PathBuf::from(DEFAULT_CONFIG_FILE));

        std::env::set_var(ENV_CONFIG_FILE, "/run/relay/config.json");
        assert_eq!(config_file_path(None), PathBuf::from("/run/relay/config.json"));
        assert_eq!(
            config_file_path(Some(Path::new("/tmp/override.json"))),
            PathBuf::from("/tmp/override.json")
        );
        std::env::remove_var(ENV_CONFIG_FILE);
    }

    #[test]
    #[serial]
    fn unparseable_numeric_env_falls_through() {
        std::env::set_var("RELAY_TEST_PORT", "not-a-port");
        assert_eq!(env_parsed::<u16>("RELAY_TEST_PORT"), None);
        std::env::set_var("RELAY_TEST_PORT", "3479");
        assert_eq!(env_parsed::<u16>("RELAY_TEST_PORT"), Some(3479));
        std::env::remove_var("RELAY_TEST_PORT");
    }
}
