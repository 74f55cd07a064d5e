use libp2p::PeerId;
use std::collections::HashMap;

/// Information about a connected peer.
#[derive(Debug, Clone)]
pub struct PeerInfo {
    pub peer_id: PeerId,
    pub address: Option<String>,
    pub last_seen: u64,
    /// Reputation score: positive is good, negative is bad.
    pub score: i64,
}

/// Tracks connected peers and their reputation.
pub struct PeerManager {
    peers: HashMap<PeerId, PeerInfo>,
    /// Score below which a peer is considered banned.
    ban_threshold: i64,
}

impl PeerManager {
    pub fn new(ban_threshold: i64) -> Self {
        Self {
            peers: HashMap::new(),
            ban_threshold,
        }
    }

    /// Register a new peer or update an existing one's last_seen.
    pub fn add_peer(&mut self, peer_id: PeerId, address: Option<String>, now: u64) {
        self.peers
            .entry(peer_id)
            .and_modify(|info| {
                info.last_seen = now;
                if let Some(ref addr) = address {
                    info.address = Some(addr.clone());
                }
            })
            .or_insert(PeerInfo {
                peer_id,
                address,
                last_seen: now,
                score: 0,
            });
    }

    /// Remove a peer.
    pub fn remove_peer(&mut self, peer_id: &PeerId) -> Option<PeerInfo> {
        self.peers.remove(peer_id)
    }

    /// Adjust a peer's score by delta. Returns the new score.
    pub fn adjust_score(&mut self, peer_id: &PeerId, delta: i64) -> Option<i64> {
        self.peers.get_mut(peer_id).map(|info| {
            info.score = info.score.saturating_add(delta);
            info.score
        })
    }

    /// Check if a peer is banned (score below threshold).
    pub fn is_banned(&self, peer_id: &PeerId) -> bool {
        self.peers
            .get(peer_id)
            .map_or(false, |info| info.score < self.ban_threshold)
    }

    /// Get info for a specific peer.
    pub fn get_peer(&self, peer_id: &PeerId) -> Option<&PeerInfo> {
        self.peers.get(peer_id)
    }

    /// Return all connected peer IDs.
    pub fn connected_peers(&self) -> Vec<PeerId> {
        self.peers.keys().copied().collect()
    }

    /// Number of connected peers.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Prune peers not seen since `cutoff` timestamp.
    pub fn prune_stale(&mut self, cutoff: u64) -> Vec<PeerId> {
        let stale: Vec<PeerId> = self
            .peers
            .iter()
            .filter(|(_, info)| info.last_seen < cutoff)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            self.peers.remove(id);
        }
        stale
    }
}
