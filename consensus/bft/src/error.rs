use thiserror::Error;

/// Errors surfaced by the round state machine itself (not vote aggregation,
/// which has its own `VoteSetError`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("validator set has zero total voting power")]
    EmptyValidatorSet,
}
