use serde::{Deserialize, Serialize};

/// Liveness of a known peer as last observed by this node.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeerStatus {
    #[default]
    Online,
    Offline,
}

/// Entry of a node's peer table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerInfo {
    /// Unique node id; the registry key.
    pub node_id: String,
    /// `host:port` the peer listens on.
    pub address: String,
    /// Public key advertised during the handshake.
    pub public_key: String,
    /// Wire protocol version.
    pub version: String,
    pub status: PeerStatus,
    /// Operator-facing reputation in `[0, 100]`.
    pub reputation: f64,
    /// Unix timestamp (ms) of the last successful contact.
    pub last_heartbeat_ms: u64,
}

impl PeerInfo {
    /// Build an online peer with neutral reputation.
    pub fn new(
        node_id: impl Into<String>,
        address: impl Into<String>,
        public_key: impl Into<String>,
        last_heartbeat_ms: u64,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            address: address.into(),
            public_key: public_key.into(),
            version: PEER_PROTOCOL_VERSION.to_string(),
            status: PeerStatus::Online,
            reputation: 50.0,
            last_heartbeat_ms,
        }
    }
}

/// Wire protocol version spoken by this build.
pub const PEER_PROTOCOL_VERSION: &str = "1.0";

/// First message a connecting node sends to a peer.
///
/// Field names are snake_case on the wire so older nodes can read them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerHello {
    pub node_id: String,
    pub public_key: String,
    #[serde(default = "default_version")]
    pub version: String,
}

/// Reply to a [`PeerHello`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAck {
    /// `"ok"` on success.
    pub status: String,
    pub node_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key: String,
}

impl PeerAck {
    pub fn ok(node_id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            node_id: node_id.into(),
            public_key: public_key.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

fn default_version() -> String {
    PEER_PROTOCOL_VERSION.to_string()
}
