use ed25519_dalek::{Signature, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{BlockHash, Height, ValidatorId};

/// Block header containing metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: Height,
    pub timestamp: u64,
    pub parent_hash: BlockHash,
    pub proposer: ValidatorId,
    pub state_root: [u8; 32],
    pub tx_merkle_root: [u8; 32],
}

/// A single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub from: [u8; 32],
    pub to: [u8; 32],
    pub amount: u64,
    pub nonce: u64,
    pub signature: Vec<u8>,
    pub data: Vec<u8>,
    /// Declared gas this transaction may consume, checked against a block's
    /// gas limit at admission time.
    pub gas_limit: u64,
    /// Price the sender is willing to pay per unit of gas.
    pub gas_price: u64,
}

impl Transaction {
    /// Compute the signing message for this transaction.
    /// SHA256(from ++ to ++ amount.to_le_bytes() ++ nonce.to_le_bytes()
    ///   ++ gas_limit.to_le_bytes() ++ gas_price.to_le_bytes() ++ data)
    pub fn signing_message(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.from);
        hasher.update(self.to);
        hasher.update(self.amount.to_le_bytes());
        hasher.update(self.nonce.to_le_bytes());
        hasher.update(self.gas_limit.to_le_bytes());
        hasher.update(self.gas_price.to_le_bytes());
        hasher.update(&self.data);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }

    /// Sign this transaction with the given signing key.
    /// Stores the signature in self.signature.
    pub fn sign(&mut self, signing_key: &SigningKey) {
        use ed25519_dalek::Signer;
        let msg = self.signing_message();
        let sig = signing_key.sign(&msg);
        self.signature = sig.to_bytes().to_vec();
    }

    /// Verify the transaction signature.
    /// Returns true if the signature is valid for self.from as the public key.
    pub fn verify_signature(&self) -> bool {
        if self.signature.len() != 64 {
            return false;
        }
        let sig_bytes: [u8; 64] = match self.signature.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let sig = match Signature::from_bytes(&sig_bytes) {
            sig => sig,
        };
        let vk = match VerifyingKey::from_bytes(&self.from) {
            Ok(vk) => vk,
            Err(_) => return false,
        };
        let msg = self.signing_message();
        vk.verify(&msg, &sig).is_ok()
    }

    /// Compute a unique hash for this transaction.
    pub fn hash(&self) -> [u8; 32] {
        let encoded = bincode::serialize(self).expect("tx serialization should never fail");
        let digest = Sha256::digest(&encoded);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        hash
    }
}

/// A full block: header + body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Compute the SHA-256 hash of the block header.
    pub fn hash(&self) -> BlockHash {
        let encoded = bincode::serialize(&self.header)
            .expect("block header serialization should never fail");
        let digest = Sha256::digest(&encoded);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        BlockHash(hash)
    }

    /// Compute a Merkle root from the block's transactions.
    /// Uses a simple binary Merkle tree with SHA-256.
    pub fn compute_tx_merkle_root(transactions: &[Transaction]) -> [u8; 32] {
        if transactions.is_empty() {
            return [0u8; 32];
        }

        let mut leaves: Vec<[u8; 32]> = transactions
            .iter()
            .map(|tx| {
                let encoded = bincode::serialize(tx).expect("tx serialization should never fail");
                let digest = Sha256::digest(&encoded);
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&digest);
                hash
            })
            .collect();

        while leaves.len() > 1 {
            let mut next_level = Vec::new();
            for chunk in leaves.chunks(2) {
                let mut hasher = Sha256::new();
                hasher.update(chunk[0]);
                if chunk.len() == 2 {
                    hasher.update(chunk[1]);
                } else {
                    // Odd leaf: duplicate it
                    hasher.update(chunk[0]);
                }
                let digest = hasher.finalize();
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&digest);
                next_level.push(hash);
            }
            leaves = next_level;
        }

        leaves[0]
    }
}
