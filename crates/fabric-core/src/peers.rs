//! Per-node table of known peers.
use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use fabric_model::{PeerInfo, PeerStatus};
use tracing::{debug, info};

/// Keyed set of peers; ids are unique.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: RwLock<BTreeMap<String, PeerInfo>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `info`; returns `false` if a peer with the same id is already known.
    pub fn add_peer(&self, info: PeerInfo) -> bool {
        let mut peers = self.peers.write().unwrap_or_else(PoisonError::into_inner);
        if peers.contains_key(&info.node_id) {
            debug!(peer = %info.node_id, "duplicate peer rejected");
            return false;
        }
        info!(peer = %info.node_id, address = %info.address, reputation = info.reputation, "peer added");
        peers.insert(info.node_id.clone(), info);
        true
    }

    /// Remove a peer; returns `false` (and changes nothing) for an unknown id.
    pub fn remove_peer(&self, node_id: &str) -> bool {
        let removed = self
            .peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(node_id)
            .is_some();
        if removed {
            info!(peer = %node_id, "peer removed");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.peers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(node_id)
    }

    pub fn get(&self, node_id: &str) -> Option<PeerInfo> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(node_id)
            .cloned()
    }

    /// Known peer ids in ascending order.
    pub fn ids(&self) -> Vec<String> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Snapshot of every peer entry.
    pub fn list(&self) -> Vec<PeerInfo> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Record a successful contact; returns `false` for an unknown id.
    pub fn touch(&self, node_id: &str, now_ms: u64) -> bool {
        let mut peers = self.peers.write().unwrap_or_else(PoisonError::into_inner);
        match peers.get_mut(node_id) {
            Some(peer) => {
                peer.last_heartbeat_ms = now_ms;
                peer.status = PeerStatus::Online;
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.peers.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
