//! Peer registration options.
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::provider::{AcknowledgeStore, StoreServiceProvider};

/// The role of a registered peer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// The peer is a remote node which this node connects to.
    Client,
    /// The peer is an identity of this node,
    /// served on a listening socket.
    Server,
}

/// Options for registering a peer application entity
/// in a [`Connection`](crate::Connection).
///
/// # Example
///
/// ```
/// # use dcmnet_node::PeerOptions;
/// let remote = PeerOptions::new("STORE-SCP", "10.0.0.5", 104).default_peer(true);
/// let local = PeerOptions::new("STORE-SCU", "0.0.0.0", 11112)
///     .server(true)
///     .default_peer(true);
/// ```
#[derive(Clone)]
pub struct PeerOptions {
    pub(crate) ae_title: String,
    pub(crate) host: String,
    pub(crate) port: Option<u16>,
    pub(crate) role: Role,
    pub(crate) default: bool,
    pub(crate) close_on_disconnect: bool,
    pub(crate) promiscuous: bool,
    pub(crate) provider: Arc<dyn StoreServiceProvider>,
}

impl Default for PeerOptions {
    fn default() -> Self {
        PeerOptions {
            ae_title: String::new(),
            host: String::new(),
            port: None,
            role: Role::Client,
            default: false,
            close_on_disconnect: false,
            promiscuous: false,
            provider: Arc::new(AcknowledgeStore),
        }
    }
}

impl fmt::Debug for PeerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerOptions")
            .field("ae_title", &self.ae_title)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("role", &self.role)
            .field("default", &self.default)
            .field("close_on_disconnect", &self.close_on_disconnect)
            .field("promiscuous", &self.promiscuous)
            .finish_non_exhaustive()
    }
}

impl PeerOptions {
    /// Describe a client-role peer at the given address.
    pub fn new(ae_title: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        PeerOptions {
            ae_title: ae_title.into(),
            host: host.into(),
            port: Some(port),
            ..Default::default()
        }
    }

    pub fn ae_title(mut self, ae_title: impl Into<String>) -> Self {
        self.ae_title = ae_title.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port of the peer.
    ///
    /// Port 0 is only admitted for server-role peers,
    /// in which case the system picks a free port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Make this peer a server-role peer,
    /// so that the connection listens on its address.
    pub fn server(mut self, server: bool) -> Self {
        self.role = if server { Role::Server } else { Role::Client };
        self
    }

    /// Make this peer the default one of its role:
    /// the default association target for client-role peers,
    /// or the default calling AE title for server-role peers.
    pub fn default_peer(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    /// Stop listening as soon as the first accepted connection closes.
    ///
    /// By default, the listener outlives every accepted connection.
    pub fn close_on_disconnect(mut self, close: bool) -> Self {
        self.close_on_disconnect = close;
        self
    }

    /// Accept associations proposing any abstract syntax,
    /// not just the known storage SOP classes.
    pub fn promiscuous(mut self, promiscuous: bool) -> Self {
        self.promiscuous = promiscuous;
        self
    }

    /// Set the handler of incoming C-STORE requests of a server-role peer.
    pub fn provider<P>(mut self, provider: P) -> Self
    where
        P: StoreServiceProvider + 'static,
    {
        self.provider = Arc::new(provider);
        self
    }

    /// Whether the options hold everything needed to register the peer.
    pub(crate) fn is_complete(&self) -> bool {
        match (self.role, self.port) {
            _ if self.ae_title.is_empty() || self.host.is_empty() => false,
            (_, None) => false,
            (Role::Client, Some(0)) => false,
            _ => true,
        }
    }
}

/// A snapshot of a registered peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub ae_title: String,
    pub host: String,
    pub port: u16,
    pub role: Role,
    /// the identifiers of the sockets currently open with this peer
    pub sockets: Vec<u64>,
    /// the bound address of a server-role peer
    pub listen_addr: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PeerOptions::new("SCP", "localhost", 104), true)]
    #[case(PeerOptions::new("", "localhost", 104), false)]
    #[case(PeerOptions::new("SCP", "", 104), false)]
    #[case(PeerOptions::default().ae_title("SCP").host("localhost"), false)]
    #[case(PeerOptions::new("SCP", "localhost", 0), false)]
    #[case(PeerOptions::new("SCP", "localhost", 0).server(true), true)]
    fn peer_options_completeness(#[case] options: PeerOptions, #[case] complete: bool) {
        assert_eq!(options.is_complete(), complete);
    }
}
