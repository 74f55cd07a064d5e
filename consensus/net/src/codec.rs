use serde::{Deserialize, Serialize};
use thiserror::Error;
use meridian_bft::ConsensusMessage;

/// Errors during network message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] bincode::Error),
}

/// A network-level wrapper around a consensus message,
/// including the sender's peer identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkMessage {
    /// The libp2p PeerId of the sender, serialized as bytes.
    pub sender: Vec<u8>,
    /// The inner consensus message.
    pub message: ConsensusMessage,
}

impl NetworkMessage {
    /// Encode a NetworkMessage to bytes using bincode.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a NetworkMessage from bytes.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(data)?)
    }
}

/// Encode a raw ConsensusMessage to bytes (for gossipsub publishing).
pub fn encode_consensus_message(msg: &ConsensusMessage) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serialize(msg)?)
}

/// Decode a raw ConsensusMessage from bytes.
pub fn decode_consensus_message(data: &[u8]) -> Result<ConsensusMessage, CodecError> {
    Ok(bincode::deserialize(data)?)
}
