//! Credential derivation: plaintext passthrough and time-boxed HMAC.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;

use crate::config::RelayConfig;
use crate::error::ResolveError;
use crate::options::{self, ResolveOptions};

/// A TURN credential pair plus realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub credential: String,
    pub realm: String,
}

/// HMAC algorithm for long-term credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Sha256,
}

impl Algorithm {
    fn parse(token: &str) -> Result<Self, ResolveError> {
        match token.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            _ => Err(ResolveError::UnknownAlgorithm(token.to_string())),
        }
    }
}

/// Output encoding for the credential digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Base64,
    Hex,
}

impl Encoding {
    fn parse(token: &str) -> Result<Self, ResolveError> {
        match token.to_ascii_lowercase().as_str() {
            "base64" => Ok(Self::Base64),
            "hex" => Ok(Self::Hex),
            _ => Err(ResolveError::UnknownEncoding(token.to_string())),
        }
    }
}

/// Long-term credential for a fixed expiry timestamp.
///
/// The username is the decimal form of the expiry instant; the credential
/// is the HMAC digest of that string's UTF-8 bytes under the shared secret,
/// which lets the relay verify expiry statelessly.
// Must produce the same bytes as pion/turn GenerateLongTermCredentials.
pub fn long_term_credential(
    expiry: u64,
    secret: &str,
    realm: &str,
    algorithm: Algorithm,
    encoding: Encoding,
) -> Credential {
    let username = expiry.to_string();
    let credential = digest(algorithm, secret, &username, encoding);
    Credential {
        username,
        credential,
        realm: realm.to_string(),
    }
}

fn digest(algorithm: Algorithm, secret: &str, message: &str, encoding: Encoding) -> String {
    let raw = match algorithm {
        Algorithm::Sha1 => {
            let mut mac =
                Hmac::<Sha1>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
            mac.update(message.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
                .expect("HMAC accepts any key length");
            mac.update(message.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
    };

    match encoding {
        Encoding::Base64 => BASE64.encode(&raw),
        Encoding::Hex => hex::encode(&raw),
    }
}

/// Produces a credential pair from the layered option set and the current
/// artifact snapshot, if any.
///
/// Auth mode, realm, and identity fields merge per the crate-wide
/// precedence; duration, algorithm, and encoding have no artifact leg. An
/// unrecognized auth mode, algorithm, or encoding token is a caller-visible
/// "could not resolve" outcome, not a crash.
pub fn resolve_credential(
    options: &ResolveOptions,
    artifact: Option<&RelayConfig>,
) -> Result<Credential, ResolveError> {
    let auth = artifact.map(|a| &a.auth);

    let auth_type = options::merge_str(
        options.auth_type.as_deref(),
        auth.and_then(|a| a.auth_type.as_deref()),
        options::ENV_AUTH_TYPE,
        options::DEFAULT_AUTH_TYPE,
    );
    let realm = options::merge_str(
        options.realm.as_deref(),
        auth.and_then(|a| a.realm.as_deref()),
        options::ENV_REALM,
        options::DEFAULT_REALM,
    );
    let username = options::merge_str(
        options.username.as_deref(),
        auth.and_then(|a| a.credentials.username.as_deref()),
        options::ENV_USERNAME,
        options::DEFAULT_USERNAME,
    );
    let password = options::merge_str(
        options.password.as_deref(),
        auth.and_then(|a| a.credentials.password.as_deref()),
        options::ENV_PASSWORD,
        options::DEFAULT_PASSWORD,
    );
    let secret = options::merge_str(
        options.secret.as_deref(),
        auth.and_then(|a| a.credentials.secret.as_deref()),
        options::ENV_SHARED_SECRET,
        options::DEFAULT_SHARED_SECRET,
    );

    match auth_type.to_ascii_lowercase().as_str() {
        "plaintext" => Ok(Credential {
            username,
            credential: password,
            realm,
        }),
        "longterm" => {
            let duration = options
                .duration
                .or_else(|| options::env_parsed(options::ENV_DURATION))
                .unwrap_or(options::DEFAULT_DURATION_SECS);
            let algorithm = Algorithm::parse(&options::merge_str(
                options.algorithm.as_deref(),
                None,
                options::ENV_HMAC_ALGORITHM,
                options::DEFAULT_HMAC_ALGORITHM,
            ))?;
            let encoding = Encoding::parse(&options::merge_str(
                options.encoding.as_deref(),
                None,
                options::ENV_CREDENTIAL_ENCODING,
                options::DEFAULT_CREDENTIAL_ENCODING,
            ))?;

            let expiry = unix_now() + duration;
            Ok(long_term_credential(expiry, &secret, &realm, algorithm, encoding))
        }
        _ => Err(ResolveError::InvalidAuthMode(auth_type)),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthBlock, AuthCredentials};
    use serial_test::serial;

    fn artifact() -> RelayConfig {
        RelayConfig {
            version: "v1alpha1".to_string(),
            auth: AuthBlock {
                auth_type: Some("plaintext".to_string()),
                realm: Some("cfg.example.org".to_string()),
                credentials: AuthCredentials {
                    username: Some("cfg-user".to_string()),
                    password: Some("cfg-pass".to_string()),
                    secret: Some("cfg-secret".to_string()),
                },
            },
            listeners: Vec::new(),
        }
    }

    #[test]
    fn long_term_digest_matches_reference_vector() {
        // Same derivation as pion/turn GenerateLongTermCredentials.
        let cred = long_term_credential(
            1652173256,
            "my-secret",
            "realm",
            Algorithm::Sha1,
            Encoding::Base64,
        );
        assert_eq!(cred.username, "1652173256");
        assert_eq!(cred.credential, "CguKE5jD1SnJajHjrQEwyx+pHBk=");
        assert_eq!(cred.realm, "realm");
    }

    #[test]
    fn long_term_digest_alternate_algorithms_and_encodings() {
        let hex1 = long_term_credential(1652173256, "my-secret", "r", Algorithm::Sha1, Encoding::Hex);
        assert_eq!(hex1.credential, "0a0b8a1398c3d529c96a31e3ad0130cb1fa91c19");

        let b256 =
            long_term_credential(1652173256, "my-secret", "r", Algorithm::Sha256, Encoding::Base64);
        assert_eq!(b256.credential, "SBeq3Kkh0vfWANw0d2yGUe18BHrxJJ+FNYAqHB1Otsg=");

        let h256 =
            long_term_credential(1652173256, "my-secret", "r", Algorithm::Sha256, Encoding::Hex);
        assert_eq!(
            h256.credential,
            "4817aadca921d2f7d600dc34776c8651ed7c047af1249f8535802a1c1d4eb6c8"
        );
    }

    #[test]
    fn plaintext_returns_identity_pair_verbatim() {
        let options = ResolveOptions {
            auth_type: Some("plaintext".to_string()),
            realm: Some("realm-1".to_string()),
            username: Some("user-1".to_string()),
            password: Some("pass-1".to_string()),
            ..Default::default()
        };

        let cred = resolve_credential(&options, None).unwrap();
        assert_eq!(cred.username, "user-1");
        assert_eq!(cred.credential, "pass-1");
        assert_eq!(cred.realm, "realm-1");
    }

    #[test]
    fn auth_mode_is_case_insensitive() {
        let options = ResolveOptions {
            auth_type: Some("PlainText".to_string()),
            ..Default::default()
        };
        assert!(resolve_credential(&options, None).is_ok());

        let options = ResolveOptions {
            auth_type: Some("LONGTERM".to_string()),
            ..Default::default()
        };
        assert!(resolve_credential(&options, None).is_ok());
    }

    #[test]
    fn unknown_auth_mode_is_an_error() {
        let options = ResolveOptions {
            auth_type: Some("kerberos".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_credential(&options, None).unwrap_err(),
            ResolveError::InvalidAuthMode("kerberos".to_string())
        );
    }

    #[test]
    fn unknown_algorithm_and_encoding_are_errors() {
        let options = ResolveOptions {
            auth_type: Some("longterm".to_string()),
            algorithm: Some("md5".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_credential(&options, None).unwrap_err(),
            ResolveError::UnknownAlgorithm(_)
        ));

        let options = ResolveOptions {
            auth_type: Some("longterm".to_string()),
            encoding: Some("base32".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_credential(&options, None).unwrap_err(),
            ResolveError::UnknownEncoding(_)
        ));
    }

    #[test]
    fn long_term_username_lies_within_validity_window() {
        let duration = 600;
        let options = ResolveOptions {
            auth_type: Some("longterm".to_string()),
            secret: Some("s3cr3t".to_string()),
            duration: Some(duration),
            ..Default::default()
        };

        let before = unix_now();
        let cred = resolve_credential(&options, None).unwrap();
        let after = unix_now();

        let embedded: u64 = cred.username.parse().unwrap();
        assert!(embedded >= before + duration);
        assert!(embedded <= after + duration);
        assert!(!cred.credential.is_empty());
    }

    #[test]
    fn artifact_fields_win_over_defaults() {
        let cred = resolve_credential(&ResolveOptions::default(), Some(&artifact())).unwrap();
        assert_eq!(cred.username, "cfg-user");
        assert_eq!(cred.credential, "cfg-pass");
        assert_eq!(cred.realm, "cfg.example.org");
    }

    #[test]
    fn options_win_over_artifact() {
        let options = ResolveOptions {
            username: Some("opt-user".to_string()),
            ..Default::default()
        };
        let cred = resolve_credential(&options, Some(&artifact())).unwrap();
        assert_eq!(cred.username, "opt-user");
        assert_eq!(cred.credential, "cfg-pass");
    }

    #[test]
    fn empty_option_does_not_override() {
        let options = ResolveOptions {
            username: Some(String::new()),
            ..Default::default()
        };
        let cred = resolve_credential(&options, Some(&artifact())).unwrap();
        assert_eq!(cred.username, "cfg-user");
    }

    #[test]
    #[serial]
    fn artifact_wins_over_environment() {
        std::env::set_var(options::ENV_REALM, "env.example.org");

        let cred = resolve_credential(&ResolveOptions::default(), Some(&artifact())).unwrap();
        assert_eq!(cred.realm, "cfg.example.org");

        let cred = resolve_credential(&ResolveOptions::default(), None).unwrap();
        assert_eq!(cred.realm, "env.example.org");

        std::env::remove_var(options::ENV_REALM);
        let cred = resolve_credential(&ResolveOptions::default(), None).unwrap();
        assert_eq!(cred.realm, options::DEFAULT_REALM);
    }
}
