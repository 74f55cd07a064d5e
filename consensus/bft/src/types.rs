use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Wrapper around an ed25519 public key identifying a validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatorId(pub VerifyingKey);

impl ValidatorId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

/// A validator's identity plus its voting power for the current height.
///
/// Power is not folded into `ValidatorId` itself so that votes (which
/// reference a `ValidatorId`) stay independent of a particular validator
/// set snapshot -- the power lookup happens when a vote is added to a
/// `VoteSet`, against whatever set is active for that height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub id: ValidatorId,
    pub power: u64,
}

/// SHA-256 block hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl std::fmt::Display for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Block height (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Height(pub u64);

/// Consensus round within a height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Round(pub u32);

/// A vote cast by a validator (prevote or precommit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub vote_type: VoteType,
    pub height: Height,
    pub round: Round,
    /// None means a nil vote (no block proposed or timeout).
    pub block_hash: Option<BlockHash>,
    pub validator: ValidatorId,
    pub signature: Signature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteType {
    Prevote,
    Precommit,
}

/// A block proposal from the round's designated proposer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub height: Height,
    pub round: Round,
    pub block_hash: BlockHash,
    pub proposer: ValidatorId,
    pub signature: Signature,
    /// If set, the proposer is re-proposing a value it saw reach a +2/3
    /// prevote quorum (a Proof-of-Lock) at this earlier round.
    pub valid_round: Option<Round>,
}

/// Messages produced and consumed by the BFT state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConsensusMessage {
    ProposeBlock(Proposal),
    CastVote(Vote),
    CommitBlock {
        height: Height,
        block_hash: BlockHash,
    },
    /// Equivocation evidence detected while tallying an incoming vote: the
    /// validator signed two different non-nil block ids at the same
    /// (height, round, type). Surfaced for the slashing subsystem; it is
    /// not itself a network wire message, only an output of the state
    /// machine for the driver to forward.
    Equivocation(Box<crate::vote::ConflictingVote>),
    ScheduleTimeout(TimeoutEvent),
    /// One fragment of a proposal's part set, gossiped alongside the
    /// proposal so peers can reassemble the full block (spec C3).
    BlockPart {
        height: Height,
        round: Round,
        index: u32,
        bytes: Vec<u8>,
    },
    /// Announces this node's round/step so peers missing it can be caught
    /// up via a targeted request, mirroring `NewRoundStep` gossip.
    NewRoundStep {
        height: Height,
        round: Round,
    },
    /// Requests a catch-up: the highest round this peer has seen votes for
    /// at a given height, so the receiver can resend missed votes/parts.
    HeightVoteSetCatchup {
        height: Height,
        peer_round: Round,
    },
    /// A raw, mempool-encoded transaction relayed over the transaction
    /// gossip topic rather than the consensus topic.
    GossipTransaction(Vec<u8>),
}

/// Timeout events fed back into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutEvent {
    pub height: Height,
    pub round: Round,
    pub step: TimeoutStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutStep {
    Propose,
    Prevote,
    Precommit,
    Commit,
}

/// Timeout durations for each BFT phase.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    pub propose_ms: u64,
    pub prevote_ms: u64,
    pub precommit_ms: u64,
    pub commit_ms: u64,
    /// Additional ms per round increment (linear backoff), applied to
    /// propose/prevote/precommit so a stalled round gives the network
    /// progressively more time rather than spinning at a fixed timeout.
    pub increment_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            propose_ms: 3000,
            prevote_ms: 1000,
            precommit_ms: 1000,
            commit_ms: 1000,
            increment_ms: 500,
        }
    }
}

impl TimeoutConfig {
    /// Build a `TimeoutConfig` from genesis chain parameters, matching the
    /// `ChainParams` override pattern used elsewhere in this codebase.
    pub fn from_chain_params(
        propose_ms: u64,
        prevote_ms: u64,
        precommit_ms: u64,
        commit_ms: u64,
        increment_ms: u64,
    ) -> Self {
        Self {
            propose_ms,
            prevote_ms,
            precommit_ms,
            commit_ms,
            increment_ms,
        }
    }

    /// Compute the timeout for a given step and round, applying linear backoff.
    /// `Commit` does not back off with the round -- it is a fixed wait after
    /// a height has already been decided.
    pub fn timeout_for(&self, step: TimeoutStep, round: Round) -> u64 {
        match step {
            TimeoutStep::Commit => self.commit_ms,
            _ => {
                let base = match step {
                    TimeoutStep::Propose => self.propose_ms,
                    TimeoutStep::Prevote => self.prevote_ms,
                    TimeoutStep::Precommit => self.precommit_ms,
                    TimeoutStep::Commit => unreachable!(),
                };
                base + self.increment_ms * round.0 as u64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_backoff_increases_linearly_with_round() {
        let cfg = TimeoutConfig::default();
        assert_eq!(cfg.timeout_for(TimeoutStep::Propose, Round(0)), 3000);
        assert_eq!(cfg.timeout_for(TimeoutStep::Propose, Round(1)), 3500);
        assert_eq!(cfg.timeout_for(TimeoutStep::Propose, Round(4)), 5000);
    }

    #[test]
    fn commit_timeout_does_not_back_off() {
        let cfg = TimeoutConfig::default();
        assert_eq!(cfg.timeout_for(TimeoutStep::Commit, Round(0)), 1000);
        assert_eq!(cfg.timeout_for(TimeoutStep::Commit, Round(7)), 1000);
    }

    #[test]
    fn from_chain_params_overrides_defaults() {
        let cfg = TimeoutConfig::from_chain_params(4000, 1500, 1500, 2000, 750);
        assert_eq!(cfg.propose_ms, 4000);
        assert_eq!(cfg.prevote_ms, 1500);
        assert_eq!(cfg.precommit_ms, 1500);
        assert_eq!(cfg.commit_ms, 2000);
        assert_eq!(cfg.timeout_for(TimeoutStep::Propose, Round(1)), 4750);
    }
}
