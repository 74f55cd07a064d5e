pub mod network;
pub mod codec;
pub mod peer;

pub use network::{ConsensusNetwork, NetworkHandle, NetworkRunner, TRANSACTION_TOPIC};
