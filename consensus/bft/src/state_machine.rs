use std::collections::HashMap;

use ed25519_dalek::SigningKey;
use sha2::{Digest, Sha256};

use crate::block::Block;
use crate::error::ConsensusError;
use crate::round::{RoundState, RoundStep};
use crate::types::*;
use crate::vote::{HeightVoteSet, VoteAddOutcome};

/// Pure BFT consensus state machine.
///
/// Takes input events (proposals, votes, timeouts) and returns output
/// messages (votes to cast, blocks to commit, timeouts to schedule).
/// No I/O — the caller is responsible for networking, signing key custody
/// beyond what's handed to `new`, and timers.
pub struct BftStateMachine {
    pub height: Height,
    pub round: Round,
    pub step: RoundStep,
    /// Our validator signing key index in the validator set. `None` for
    /// observer nodes that follow consensus without casting votes.
    pub validator_index: Option<usize>,
    /// The ordered, power-weighted validator set for the current height.
    pub validators: Vec<Validator>,
    /// Key used to sign our own votes. `None` for observer nodes.
    signing_key: Option<SigningKey>,
    /// Current round state (votes collected, proposal seen).
    pub round_state: RoundState,
    /// Full record of this height's vote sets across all rounds, plus
    /// per-peer catchup cursors for gossip.
    pub height_vote_set: HeightVoteSet,
    /// Locked value: the block hash we have precommitted for.
    pub locked_value: Option<BlockHash>,
    pub locked_round: Option<Round>,
    /// Valid value: the block hash we have seen a polka (2/3+ prevotes) for.
    pub valid_value: Option<BlockHash>,
    pub valid_round: Option<Round>,
    /// Timeout configuration.
    pub timeout_config: TimeoutConfig,
    /// Cache of blocks received with proposals, keyed by block hash.
    pub proposed_blocks: HashMap<BlockHash, Block>,
}

impl BftStateMachine {
    /// Create a new BFT state machine for the given height and validator set.
    pub fn new(
        height: Height,
        validators: Vec<Validator>,
        validator_index: Option<usize>,
        signing_key: Option<SigningKey>,
        timeout_config: TimeoutConfig,
    ) -> Self {
        let round = Round(0);
        Self {
            height,
            round,
            step: RoundStep::NewRound,
            validator_index,
            height_vote_set: HeightVoteSet::new(height, validators.clone()),
            round_state: RoundState::new(round, height, &validators),
            validators,
            signing_key,
            locked_value: None,
            locked_round: None,
            valid_value: None,
            valid_round: None,
            timeout_config,
            proposed_blocks: HashMap::new(),
        }
    }

    /// Deterministic proposer selection for a (height, round) pair, weighted
    /// by voting power. A pure function of the validator set and (H, R) --
    /// not of wall-clock time or arrival order, so every honest node agrees
    /// on the proposer without exchanging any messages.
    ///
    /// Derives a target point in `[0, total_power)` from a hash of (H, R)
    /// and walks the validator set's cumulative power to find which
    /// validator's share contains it, so higher-power validators are picked
    /// proportionally more often across many heights.
    pub fn proposer_for(
        validators: &[Validator],
        height: Height,
        round: Round,
    ) -> Result<usize, ConsensusError> {
        let total_power: u64 = validators.iter().map(|v| v.power).sum();
        if validators.is_empty() || total_power == 0 {
            return Err(ConsensusError::EmptyValidatorSet);
        }

        let mut hasher = Sha256::new();
        hasher.update(height.0.to_le_bytes());
        hasher.update(round.0.to_le_bytes());
        let digest = hasher.finalize();
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&digest[0..8]);
        let target = u64::from_le_bytes(seed_bytes) % total_power;

        let mut cumulative = 0u64;
        for (idx, v) in validators.iter().enumerate() {
            cumulative += v.power;
            if target < cumulative {
                return Ok(idx);
            }
        }
        // Unreachable: cumulative power always reaches total_power.
        Ok(validators.len() - 1)
    }

    /// The proposer index for the current height/round.
    pub fn proposer_index(&self) -> Result<usize, ConsensusError> {
        Self::proposer_for(&self.validators, self.height, self.round)
    }

    /// Whether we are the proposer for the current height/round.
    pub fn is_proposer(&self) -> bool {
        match (self.validator_index, self.proposer_index()) {
            (Some(idx), Ok(proposer)) => idx == proposer,
            _ => false,
        }
    }

    /// What this node should propose if it is the round's proposer: a
    /// previously locked or valid value to carry forward under a
    /// Proof-of-Lock (with the round it became valid at), or `None` meaning
    /// a fresh block should be built by the caller.
    pub fn decide_proposal(&self) -> (Option<BlockHash>, Option<Round>) {
        if let Some(locked) = self.locked_value {
            (Some(locked), self.locked_round)
        } else if let Some(valid) = self.valid_value {
            (Some(valid), self.valid_round)
        } else {
            (None, None)
        }
    }

    /// Sign a vote of our own for the current height/round, if we hold a
    /// signing key. Observer nodes (`signing_key: None`) never cast votes.
    fn sign_vote(&self, vote_type: VoteType, block_hash: Option<BlockHash>) -> Option<Vote> {
        let key = self.signing_key.as_ref()?;
        Some(Vote::new(vote_type, self.height, self.round, block_hash, key))
    }

    /// Sign a proposal of our own for the current height/round, if we hold
    /// a signing key.
    fn sign_proposal(&self, block_hash: BlockHash, valid_round: Option<Round>) -> Option<Proposal> {
        let key = self.signing_key.as_ref()?;
        Some(Proposal::new(self.height, self.round, block_hash, valid_round, key))
    }

    /// Enter a new round at the current height: resets round-scoped vote
    /// sets and moves straight into `Propose`, scheduling its timeout.
    pub fn enter_new_round(&mut self, round: Round) -> Vec<ConsensusMessage> {
        self.round = round;
        self.round_state = RoundState::new(round, self.height, &self.validators);
        self.step = RoundStep::NewRound;
        self.enter_propose()
    }

    /// Enter the `Propose` step of the current round. If we are the
    /// proposer and already hold a locked or valid value to carry forward
    /// (`decide_proposal`), broadcast it immediately. A proposer with
    /// neither must wait for the caller to assemble a fresh block and call
    /// `propose_fresh_block`.
    pub fn enter_propose(&mut self) -> Vec<ConsensusMessage> {
        self.step = RoundStep::Propose;
        let mut out = vec![ConsensusMessage::ScheduleTimeout(TimeoutEvent {
            height: self.height,
            round: self.round,
            step: TimeoutStep::Propose,
        })];

        if self.is_proposer() {
            if let (Some(block_hash), valid_round) = self.decide_proposal() {
                if let Some(proposal) = self.sign_proposal(block_hash, valid_round) {
                    out.push(ConsensusMessage::ProposeBlock(proposal));
                }
            }
        }

        out
    }

    /// Called by the driver once it has assembled a fresh block for a
    /// proposer with no locked or valid value to re-propose (C1 has no
    /// mempool access of its own). No-op outside the `Propose` step, for a
    /// non-proposer, or if a re-proposal already covers this round.
    pub fn propose_fresh_block(&mut self, block: Block) -> Vec<ConsensusMessage> {
        let mut out = Vec::new();
        if self.step != RoundStep::Propose || !self.is_proposer() {
            return out;
        }
        if self.decide_proposal().0.is_some() {
            return out;
        }

        let block_hash = block.hash();
        self.proposed_blocks.insert(block_hash, block);
        if let Some(proposal) = self.sign_proposal(block_hash, None) {
            out.push(ConsensusMessage::ProposeBlock(proposal));
        }
        out
    }

    /// Enter `NewHeight` after a commit: the commit-wait gate before round 0
    /// of `new_height` begins. Takes the validator set for the new height,
    /// since voting power can change across a height boundary (staking,
    /// slashing, epoch rotation).
    pub fn enter_new_height(
        &mut self,
        new_height: Height,
        validators: Vec<Validator>,
    ) -> Vec<ConsensusMessage> {
        self.height = new_height;
        self.round = Round(0);
        self.locked_value = None;
        self.locked_round = None;
        self.valid_value = None;
        self.valid_round = None;
        self.proposed_blocks.clear();
        self.validators = validators;
        self.height_vote_set = HeightVoteSet::new(new_height, self.validators.clone());
        self.round_state = RoundState::new(Round(0), new_height, &self.validators);
        self.step = RoundStep::NewHeight;

        vec![ConsensusMessage::ScheduleTimeout(TimeoutEvent {
            height: self.height,
            round: self.round,
            step: TimeoutStep::Commit,
        })]
    }

    /// Handle an incoming proposal, optionally with the full block data.
    pub fn on_proposal(&mut self, proposal: &Proposal, block: Option<&Block>) -> Vec<ConsensusMessage> {
        let mut out = Vec::new();

        if proposal.height != self.height || proposal.round != self.round {
            return out;
        }
        if self.step != RoundStep::Propose {
            return out;
        }

        let expected_idx = match self.proposer_index() {
            Ok(idx) => idx,
            Err(_) => return out,
        };
        if expected_idx >= self.validators.len() || proposal.proposer != self.validators[expected_idx].id {
            return out;
        }

        if let Some(blk) = block {
            if blk.hash() != proposal.block_hash {
                return out;
            }
            self.proposed_blocks.insert(proposal.block_hash, blk.clone());
        }

        self.round_state.proposal = Some(proposal.block_hash);

        // Decide prevote: respect locking rules. A locked node only
        // prevotes a proposal that matches its lock, or carries a POL at or
        // after the locked round.
        let prevote_hash = if let Some(locked) = self.locked_value {
            if proposal.block_hash == locked {
                Some(proposal.block_hash)
            } else if let (Some(prop_vr), Some(lr)) = (proposal.valid_round, self.locked_round) {
                if prop_vr >= lr {
                    Some(proposal.block_hash)
                } else {
                    None
                }
            } else {
                None
            }
        } else {
            Some(proposal.block_hash)
        };

        self.step = RoundStep::Prevote;

        if let Some(vote) = self.sign_vote(VoteType::Prevote, prevote_hash) {
            out.push(ConsensusMessage::CastVote(vote));
        }

        out
    }

    /// Handle an incoming prevote.
    pub fn on_prevote(&mut self, vote: &Vote) -> Vec<ConsensusMessage> {
        let mut out = Vec::new();

        if vote.height != self.height || vote.round != self.round {
            return out;
        }
        if vote.vote_type != VoteType::Prevote {
            return out;
        }
        match self.round_state.prevotes.add_vote(vote.clone()) {
            Ok(VoteAddOutcome::Equivocation(evidence)) => {
                out.push(ConsensusMessage::Equivocation(evidence));
            }
            Ok(_) => {}
            Err(_) => return out,
        }
        if let Ok(VoteAddOutcome::Equivocation(evidence)) = self.height_vote_set.add_vote(vote.clone()) {
            out.push(ConsensusMessage::Equivocation(evidence));
        }

        match self.step {
            RoundStep::Prevote | RoundStep::PrevoteWait => {
                if let Some(winner) = self.round_state.prevotes.quorum_block_id() {
                    match winner {
                        Some(block_hash) => {
                            // Polka for a real block: lock and precommit it.
                            self.valid_value = Some(block_hash);
                            self.valid_round = Some(self.round);
                            self.locked_value = Some(block_hash);
                            self.locked_round = Some(self.round);
                            self.step = RoundStep::Precommit;
                            if let Some(v) = self.sign_vote(VoteType::Precommit, Some(block_hash)) {
                                out.push(ConsensusMessage::CastVote(v));
                            }
                        }
                        None => {
                            // Polka for nil: precommit nil, no change to lock.
                            self.step = RoundStep::Precommit;
                            if let Some(v) = self.sign_vote(VoteType::Precommit, None) {
                                out.push(ConsensusMessage::CastVote(v));
                            }
                        }
                    }
                } else if self.round_state.prevotes.has_two_thirds_any() && self.step == RoundStep::Prevote {
                    // 2/3+ have voted but no single value has a quorum yet;
                    // wait a bounded time for the decisive vote before
                    // falling back to a nil precommit.
                    self.step = RoundStep::PrevoteWait;
                    out.push(ConsensusMessage::ScheduleTimeout(TimeoutEvent {
                        height: self.height,
                        round: self.round,
                        step: TimeoutStep::Prevote,
                    }));
                }
            }
            RoundStep::Precommit | RoundStep::PrecommitWait => {
                // A late polka can still update valid_value/valid_round even
                // after moving on to precommitting, per the locking rules.
                if let Some(block_hash) = self.round_state.prevotes.quorum_block() {
                    self.valid_value = Some(block_hash);
                    self.valid_round = Some(self.round);
                }
            }
            _ => {}
        }

        out
    }

    /// Handle an incoming precommit.
    pub fn on_precommit(&mut self, vote: &Vote) -> Vec<ConsensusMessage> {
        let mut out = Vec::new();

        if vote.height != self.height || vote.round != self.round {
            return out;
        }
        if vote.vote_type != VoteType::Precommit {
            return out;
        }
        if self.step == RoundStep::Commit || self.step == RoundStep::NewHeight {
            return out;
        }
        match self.round_state.precommits.add_vote(vote.clone()) {
            Ok(VoteAddOutcome::Equivocation(evidence)) => {
                out.push(ConsensusMessage::Equivocation(evidence));
            }
            Ok(_) => {}
            Err(_) => return out,
        }
        if let Ok(VoteAddOutcome::Equivocation(evidence)) = self.height_vote_set.add_vote(vote.clone()) {
            out.push(ConsensusMessage::Equivocation(evidence));
        }

        if let Some(winner) = self.round_state.precommits.quorum_block_id() {
            match winner {
                Some(block_hash) => {
                    self.step = RoundStep::Commit;
                    out.push(ConsensusMessage::CommitBlock {
                        height: self.height,
                        block_hash,
                    });
                }
                None => {
                    if self.step != RoundStep::PrecommitWait {
                        self.step = RoundStep::PrecommitWait;
                        out.push(ConsensusMessage::ScheduleTimeout(TimeoutEvent {
                            height: self.height,
                            round: self.round,
                            step: TimeoutStep::Precommit,
                        }));
                    }
                }
            }
        } else if self.round_state.precommits.has_two_thirds_any() && self.step == RoundStep::Precommit {
            self.step = RoundStep::PrecommitWait;
            out.push(ConsensusMessage::ScheduleTimeout(TimeoutEvent {
                height: self.height,
                round: self.round,
                step: TimeoutStep::Precommit,
            }));
        }

        out
    }

    /// Handle a timeout event.
    pub fn on_timeout(&mut self, event: TimeoutEvent) -> Vec<ConsensusMessage> {
        let mut out = Vec::new();

        if event.height != self.height || event.round != self.round {
            return out;
        }

        match event.step {
            TimeoutStep::Propose => {
                if self.step == RoundStep::Propose {
                    // No valid proposal arrived in time: prevote nil.
                    self.step = RoundStep::Prevote;
                    if let Some(v) = self.sign_vote(VoteType::Prevote, None) {
                        out.push(ConsensusMessage::CastVote(v));
                    }
                }
            }
            TimeoutStep::Prevote => {
                if self.step == RoundStep::PrevoteWait {
                    // The split vote never resolved in time: precommit nil.
                    self.step = RoundStep::Precommit;
                    if let Some(v) = self.sign_vote(VoteType::Precommit, None) {
                        out.push(ConsensusMessage::CastVote(v));
                    }
                }
            }
            TimeoutStep::Precommit => {
                if self.step == RoundStep::PrecommitWait {
                    let next_round = Round(self.round.0 + 1);
                    out.extend(self.enter_new_round(next_round));
                }
            }
            TimeoutStep::Commit => {
                if self.step == RoundStep::NewHeight {
                    out.extend(self.enter_new_round(Round(0)));
                }
            }
        }

        out
    }

    /// Retrieve a cached block by its hash (e.g., after commit).
    pub fn get_committed_block(&self, hash: &BlockHash) -> Option<&Block> {
        self.proposed_blocks.get(hash)
    }
}
