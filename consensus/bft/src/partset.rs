use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::block::Block;
use crate::types::BlockHash;

/// Largest serialized block a `PartSet` is built to support. A block larger
/// than this is rejected before being split, rather than silently producing
/// an enormous part count.
pub const MAX_BLOCK_BYTES: usize = 1_048_510;

/// Default gossip chunk size, matching common MTU-friendly gossip budgets.
pub const DEFAULT_PART_SIZE: usize = 65_536;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartSetError {
    #[error("block of {0} bytes exceeds the {1} byte maximum")]
    BlockTooLarge(usize, usize),
    #[error("part index {0} is out of range for a set of {1} parts")]
    IndexOutOfRange(u32, u32),
    #[error("part at index {0} failed Merkle membership verification")]
    InvalidProof(u32),
    #[error("reassembly attempted before all parts were received")]
    Incomplete,
    #[error("reassembled payload length does not match its length prefix")]
    LengthMismatch,
    #[error("reassembled payload's Merkle root does not match the committed header")]
    RootMismatch,
    #[error("failed to deserialize reassembled block: {0}")]
    Decode(String),
}

/// Commitment to a block's part split: how many parts it was split into and
/// the Merkle root over their byte hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSetHeader {
    pub total_count: u32,
    pub parts_merkle_root: BlockHash,
}

/// A single gossip-sized chunk of a part-set, carrying its own Merkle proof
/// so a receiver can verify membership before buffering it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub index: u32,
    pub bytes: Vec<u8>,
    /// Sibling hashes from this part's leaf up to the root, bottom to top.
    pub proof: Vec<[u8; 32]>,
}

fn leaf_hash(bytes: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

fn parent_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Builds every level of a binary Merkle tree over `leaves`, duplicating the
/// final leaf at each level with an odd count -- the same discipline
/// `Block::compute_tx_merkle_root` uses for transactions.
fn merkle_levels(leaves: Vec<[u8; 32]>) -> Vec<Vec<[u8; 32]>> {
    let mut levels = vec![leaves];
    while levels.last().unwrap().len() > 1 {
        let current = levels.last().unwrap();
        let mut next = Vec::with_capacity((current.len() + 1) / 2);
        for chunk in current.chunks(2) {
            let right = if chunk.len() == 2 { chunk[1] } else { chunk[0] };
            next.push(parent_hash(&chunk[0], &right));
        }
        levels.push(next);
    }
    levels
}

fn proof_for(levels: &[Vec<[u8; 32]>], mut index: usize) -> Vec<[u8; 32]> {
    let mut proof = Vec::with_capacity(levels.len().saturating_sub(1));
    for level in &levels[..levels.len() - 1] {
        let sibling_index = if index % 2 == 0 { index + 1 } else { index - 1 };
        let sibling = *level.get(sibling_index).unwrap_or(&level[index]);
        proof.push(sibling);
        index /= 2;
    }
    proof
}

/// Verify that `leaf` at `index` is a member of the tree rooted at `root`.
fn verify_proof(leaf: [u8; 32], mut index: usize, proof: &[[u8; 32]], root: [u8; 32]) -> bool {
    let mut current = leaf;
    for sibling in proof {
        current = if index % 2 == 0 {
            parent_hash(&current, sibling)
        } else {
            parent_hash(sibling, &current)
        };
        index /= 2;
    }
    current == root
}

/// Fragments a block into fixed-size, Merkle-committed parts for gossip and
/// reassembles them on the receiving side.
///
/// Used both to produce parts (via `from_block`, which already holds every
/// leaf and can hand out proofs on demand) and to receive them (via
/// `new_receiver`, which starts empty and fills in as verified parts arrive).
#[derive(Debug, Clone)]
pub struct PartSet {
    pub header: PartSetHeader,
    part_size: usize,
    received: Vec<bool>,
    parts: Vec<Vec<u8>>,
    /// Only present for a `PartSet` built via `from_block`: lets the sender
    /// regenerate a Merkle proof for any part without re-hashing the buffer
    /// it no longer has an external reference to.
    leaf_hashes: Option<Vec<[u8; 32]>>,
}

impl PartSet {
    /// Serialize `block` with an 8-byte length prefix, split into
    /// `part_size` chunks (the final one short), and commit to them with a
    /// binary Merkle tree.
    pub fn from_block(block: &Block, part_size: usize) -> Result<Self, PartSetError> {
        let payload = bincode::serialize(block).expect("block serialization should never fail");
        if payload.len() > MAX_BLOCK_BYTES {
            return Err(PartSetError::BlockTooLarge(payload.len(), MAX_BLOCK_BYTES));
        }

        let mut encoded = Vec::with_capacity(8 + payload.len());
        encoded.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        encoded.extend_from_slice(&payload);

        let parts: Vec<Vec<u8>> = encoded.chunks(part_size.max(1)).map(|c| c.to_vec()).collect();
        let total_count = parts.len() as u32;
        let leaf_hashes: Vec<[u8; 32]> = parts.iter().map(|p| leaf_hash(p)).collect();
        let levels = merkle_levels(leaf_hashes.clone());
        let root = levels.last().expect("tree always has at least one level")[0];

        Ok(Self {
            header: PartSetHeader {
                total_count,
                parts_merkle_root: BlockHash(root),
            },
            part_size,
            received: vec![true; parts.len()],
            parts,
            leaf_hashes: Some(leaf_hashes),
        })
    }

    /// Start an empty `PartSet` to receive parts for a block announced by
    /// `header`.
    pub fn new_receiver(header: PartSetHeader, part_size: usize) -> Self {
        let n = header.total_count as usize;
        Self {
            header,
            part_size,
            received: vec![false; n],
            parts: vec![Vec::new(); n],
            leaf_hashes: None,
        }
    }

    pub fn total_count(&self) -> u32 {
        self.header.total_count
    }

    pub fn part_size(&self) -> usize {
        self.part_size
    }

    pub fn is_complete(&self) -> bool {
        !self.received.is_empty() && self.received.iter().all(|r| *r)
    }

    /// Generate the gossip-ready `Part` (bytes + Merkle proof) for `index`.
    /// Only available on a `PartSet` built via `from_block`, which is the
    /// only side that holds every leaf up front.
    pub fn part(&self, index: u32) -> Option<Part> {
        let leaves = self.leaf_hashes.as_ref()?;
        let idx = index as usize;
        if idx >= self.parts.len() {
            return None;
        }
        let levels = merkle_levels(leaves.clone());
        Some(Part {
            index,
            bytes: self.parts[idx].clone(),
            proof: proof_for(&levels, idx),
        })
    }

    /// Accept an incoming part, verifying its Merkle membership before
    /// storing it. An already-received index is a no-op (idempotent under
    /// duplicate gossip, not an error); an out-of-range index or a part
    /// whose bytes don't hash to their committed leaf is rejected without
    /// disturbing parts already accepted.
    pub fn accept_part(&mut self, part: &Part) -> Result<(), PartSetError> {
        if part.index >= self.header.total_count {
            return Err(PartSetError::IndexOutOfRange(part.index, self.header.total_count));
        }
        let idx = part.index as usize;
        if self.received[idx] {
            return Ok(());
        }
        let leaf = leaf_hash(&part.bytes);
        if !verify_proof(leaf, idx, &part.proof, self.header.parts_merkle_root.0) {
            return Err(PartSetError::InvalidProof(part.index));
        }
        self.parts[idx] = part.bytes.clone();
        self.received[idx] = true;
        Ok(())
    }

    /// Reassemble the block once every part has been accepted, re-verifying
    /// the overall Merkle root and the encoded length prefix before
    /// decoding -- a tampered or truncated buffer is an error, never a
    /// silently-returned partial block.
    pub fn try_reassemble(&self) -> Result<Block, PartSetError> {
        if !self.is_complete() {
            return Err(PartSetError::Incomplete);
        }

        let leaves: Vec<[u8; 32]> = self.parts.iter().map(|p| leaf_hash(p)).collect();
        let levels = merkle_levels(leaves);
        let root = levels.last().expect("tree always has at least one level")[0];
        if BlockHash(root) != self.header.parts_merkle_root {
            return Err(PartSetError::RootMismatch);
        }

        let mut encoded = Vec::new();
        for part in &self.parts {
            encoded.extend_from_slice(part);
        }
        if encoded.len() < 8 {
            return Err(PartSetError::LengthMismatch);
        }
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&encoded[0..8]);
        let declared_len = u64::from_le_bytes(len_bytes) as usize;
        let payload = &encoded[8..];
        if payload.len() != declared_len {
            return Err(PartSetError::LengthMismatch);
        }

        bincode::deserialize(payload).map_err(|e| PartSetError::Decode(e.to_string()))
    }
}
