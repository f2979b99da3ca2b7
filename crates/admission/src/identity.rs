use std::fmt;
use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// How a remote socket address maps onto a rate-limited identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerIdentity {
    /// Key on the remote IP only. Every connection from one host shares
    /// a window regardless of its ephemeral source port.
    #[default]
    Address,
    /// Key on `(ip, port)`. Each new connection normally arrives from a
    /// fresh ephemeral port, so this bounds bursts rather than sustained
    /// per-host rate. Kept for compatibility with older receivers.
    AddressAndPort,
}

impl PeerIdentity {
    /// Derives the window key for a remote address.
    pub fn key(self, peer: SocketAddr) -> PeerKey {
        match self {
            Self::Address => PeerKey {
                ip: peer.ip(),
                port: None,
            },
            Self::AddressAndPort => PeerKey {
                ip: peer.ip(),
                port: Some(peer.port()),
            },
        }
    }
}

/// Key of one sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerKey {
    ip: IpAddr,
    port: Option<u16>,
}

impl fmt::Display for PeerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}", SocketAddr::new(self.ip, port)),
            None => write!(f, "{}", self.ip),
        }
    }
}
