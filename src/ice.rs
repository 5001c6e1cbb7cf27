//! ICE server descriptor assembly.
//!
//! Config mode emits one descriptor per listener in the artifact, in file
//! order. Fallback mode (no artifact loaded) emits at most one UDP and one
//! TCP descriptor, gated by independent enable flags.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::RelayConfig;
use crate::credential::{resolve_credential, Credential};
use crate::error::ResolveError;
use crate::options::{self, ResolveOptions};

/// One relay access point offered to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub url: String,
    pub username: String,
    pub credential: String,
}

/// ICE configuration handed to a client for connectivity negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceConfig {
    pub ice_servers: Vec<IceServer>,
    pub ice_transport_policy: String,
}

/// Produces the ordered ICE server list from the layered option set and the
/// current artifact snapshot, if any.
///
/// The one fatal missing input is a fallback-mode address: without it there
/// is no safe public address to advertise. Everything else defaults.
pub fn resolve_endpoints(
    options: &ResolveOptions,
    artifact: Option<&RelayConfig>,
) -> Result<IceConfig, ResolveError> {
    let policy = options::merge_str(
        options.ice_transport_policy.as_deref(),
        None,
        options::ENV_ICE_TRANSPORT_POLICY,
        options::DEFAULT_ICE_TRANSPORT_POLICY,
    );

    match artifact {
        Some(config) => from_listeners(options, config, policy),
        None => fallback(options, policy),
    }
}

fn server(address: &str, port: u16, transport: &str, cred: &Credential) -> IceServer {
    IceServer {
        url: format!("turn:{address}:{port}?transport={transport}"),
        username: cred.username.clone(),
        credential: cred.credential.clone(),
    }
}

/// Config mode: one descriptor per listener, all sharing a single resolved
/// credential.
fn from_listeners(
    options: &ResolveOptions,
    config: &RelayConfig,
    policy: String,
) -> Result<IceConfig, ResolveError> {
    let cred = resolve_credential(options, Some(config))?;

    let mut servers = Vec::with_capacity(config.listeners.len());
    for listener in &config.listeners {
        let address = match options::non_empty(options.address.as_deref())
            .or(options::non_empty(listener.public_address.as_deref()))
        {
            Some(a) => a.to_string(),
            None => {
                // A configuration error, but not fatal: emit the descriptor
                // so the count still matches the listener list.
                warn!("listener has no public address, its ICE url will be unusable");
                String::new()
            }
        };

        let port = options
            .port
            .or(listener.public_port)
            .or(listener.port)
            .or_else(|| options::env_parsed(options::ENV_PUBLIC_PORT))
            .unwrap_or(options::DEFAULT_PUBLIC_PORT);

        let protocol = options::merge_str(
            options.protocol.as_deref(),
            listener.protocol.as_deref(),
            options::ENV_PROTOCOL,
            options::DEFAULT_PROTOCOL,
        );

        servers.push(server(&address, port, &protocol, &cred));
    }

    Ok(IceConfig {
        ice_servers: servers,
        ice_transport_policy: policy,
    })
}

/// Fallback mode: environment and options only, one entry per enabled
/// transport, UDP before TCP.
fn fallback(options: &ResolveOptions, policy: String) -> Result<IceConfig, ResolveError> {
    let address = options::non_empty(options.address.as_deref())
        .map(str::to_owned)
        .or_else(|| options::env_string(options::ENV_PUBLIC_ADDR))
        .ok_or(ResolveError::MissingAddress)?;

    let port = options
        .port
        .or_else(|| options::env_parsed(options::ENV_PUBLIC_PORT))
        .unwrap_or(options::DEFAULT_PUBLIC_PORT);

    let udp_enable = options
        .transport_udp_enable
        .or_else(|| options::env_flag(options::ENV_UDP_ENABLE))
        .unwrap_or(options::DEFAULT_UDP_ENABLE);
    let tcp_enable = options
        .transport_tcp_enable
        .or_else(|| options::env_flag(options::ENV_TCP_ENABLE))
        .unwrap_or(options::DEFAULT_TCP_ENABLE);

    let cred = resolve_credential(options, None)?;

    let mut servers = Vec::new();
    if udp_enable {
        servers.push(server(&address, port, "udp", &cred));
    }
    if tcp_enable {
        servers.push(server(&address, port, "tcp", &cred));
    }

    Ok(IceConfig {
        ice_servers: servers,
        ice_transport_policy: policy,
    })
}
