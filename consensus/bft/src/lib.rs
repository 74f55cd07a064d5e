pub mod types;
pub mod state_machine;
pub mod round;
pub mod vote;
pub mod block;
pub mod partset;
pub mod error;

pub use types::*;
pub use state_machine::BftStateMachine;
pub use block::{Block, BlockHeader, Transaction};
pub use round::{RoundState, RoundStep};
pub use vote::{
    ConflictingVote, HeightVoteSet, VoteAddOutcome, VoteSet, VoteSetError,
};
pub use partset::{Part, PartSet, PartSetError, PartSetHeader, MAX_BLOCK_BYTES};
pub use error::ConsensusError;
