use ed25519_dalek::{Signer, SigningKey, Verifier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{BlockHash, Height, Proposal, Round, Validator, ValidatorId, Vote, VoteType};

impl Vote {
    /// Create and sign a vote.
    pub fn new(
        vote_type: VoteType,
        height: Height,
        round: Round,
        block_hash: Option<BlockHash>,
        signing_key: &SigningKey,
    ) -> Self {
        let validator = ValidatorId(signing_key.verifying_key());
        let sign_bytes = Self::sign_bytes(vote_type, height, round, block_hash.as_ref());
        let signature = signing_key.sign(&sign_bytes);
        Self {
            vote_type,
            height,
            round,
            block_hash,
            validator,
            signature,
        }
    }

    /// Canonical bytes to sign / verify.
    fn sign_bytes(
        vote_type: VoteType,
        height: Height,
        round: Round,
        block_hash: Option<&BlockHash>,
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(match vote_type {
            VoteType::Prevote => 0x01,
            VoteType::Precommit => 0x02,
        });
        buf.extend_from_slice(&height.0.to_le_bytes());
        buf.extend_from_slice(&round.0.to_le_bytes());
        match block_hash {
            Some(h) => {
                buf.push(0x01);
                buf.extend_from_slice(&h.0);
            }
            None => {
                buf.push(0x00);
            }
        }
        buf
    }

    /// Verify the vote signature against the validator's public key.
    pub fn verify(&self) -> bool {
        let sign_bytes = Self::sign_bytes(
            self.vote_type,
            self.height,
            self.round,
            self.block_hash.as_ref(),
        );
        self.validator.0.verify(&sign_bytes, &self.signature).is_ok()
    }
}

impl Proposal {
    /// Create and sign a proposal.
    pub fn new(
        height: Height,
        round: Round,
        block_hash: BlockHash,
        valid_round: Option<Round>,
        signing_key: &SigningKey,
    ) -> Self {
        let proposer = ValidatorId(signing_key.verifying_key());
        let sign_bytes = Self::sign_bytes(height, round, block_hash, valid_round);
        let signature = signing_key.sign(&sign_bytes);
        Self {
            height,
            round,
            block_hash,
            proposer,
            signature,
            valid_round,
        }
    }

    /// Canonical bytes to sign / verify.
    fn sign_bytes(height: Height, round: Round, block_hash: BlockHash, valid_round: Option<Round>) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&height.0.to_le_bytes());
        buf.extend_from_slice(&round.0.to_le_bytes());
        buf.extend_from_slice(&block_hash.0);
        match valid_round {
            Some(r) => {
                buf.push(0x01);
                buf.extend_from_slice(&r.0.to_le_bytes());
            }
            None => buf.push(0x00),
        }
        buf
    }

    /// Verify the proposal signature against the proposer's public key.
    pub fn verify(&self) -> bool {
        let sign_bytes = Self::sign_bytes(self.height, self.round, self.block_hash, self.valid_round);
        self.proposer.0.verify(&sign_bytes, &self.signature).is_ok()
    }
}

/// A pair of votes from the same validator, at the same (height, round,
/// type), for two different non-nil block ids. This is equivocation: proof
/// that the validator signed conflicting messages, to be handed to the
/// slashing subsystem. A second *nil* vote, or a second identical vote, is
/// not evidence and is handled separately by `VoteSet::add_vote`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictingVote {
    pub first: Vote,
    pub second: Vote,
}

/// Outcome of a successful (non-erroring) `add_vote` call.
#[derive(Debug, Clone, PartialEq)]
pub enum VoteAddOutcome {
    /// The vote was new and has been recorded.
    Added,
    /// An identical vote from this validator was already present; no-op.
    Duplicate,
    /// The validator already voted for a different non-nil block id this
    /// (height, round, type). The first vote still stands for quorum
    /// purposes; the evidence is handed back for the caller to forward to
    /// the slashing subsystem.
    Equivocation(Box<ConflictingVote>),
}

/// Errors from adding a vote to a `VoteSet`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VoteSetError {
    #[error("vote does not match this set's (height, round, type)")]
    Mismatch,
    #[error("vote signature does not verify")]
    InvalidSignature,
    #[error("validator is not a member of this vote set")]
    UnknownValidator,
}

/// Collects votes for a specific height/round/type and checks weighted quorum.
#[derive(Debug, Clone)]
pub struct VoteSet {
    pub vote_type: VoteType,
    pub height: Height,
    pub round: Round,
    /// Total voting power represented by the validator set this vote set
    /// was constructed against.
    pub total_power: u64,
    /// Voting power of each validator, by public key bytes.
    power_by_validator: HashMap<[u8; 32], u64>,
    /// Votes indexed by validator public key bytes.
    votes: HashMap<[u8; 32], Vote>,
    /// Accumulated power per distinct block id (`None` is the nil bucket).
    power_by_block: HashMap<Option<BlockHash>, u64>,
}

impl VoteSet {
    pub fn new(vote_type: VoteType, height: Height, round: Round, validators: &[Validator]) -> Self {
        let power_by_validator: HashMap<[u8; 32], u64> = validators
            .iter()
            .map(|v| (*v.id.as_bytes(), v.power))
            .collect();
        let total_power = validators.iter().map(|v| v.power).sum();
        Self {
            vote_type,
            height,
            round,
            total_power,
            power_by_validator,
            votes: HashMap::new(),
            power_by_block: HashMap::new(),
        }
    }

    /// Add a vote, checking signature, set membership and equivocation.
    ///
    /// An exact duplicate is a no-op (`Duplicate`). A second vote from a
    /// validator already recorded, for a *different* non-nil block id, is
    /// equivocation: the first vote stands for quorum purposes and the
    /// call still succeeds, returning `Equivocation` evidence rather than
    /// an error.
    pub fn add_vote(&mut self, vote: Vote) -> Result<VoteAddOutcome, VoteSetError> {
        if vote.vote_type != self.vote_type
            || vote.height != self.height
            || vote.round != self.round
        {
            return Err(VoteSetError::Mismatch);
        }
        if !vote.verify() {
            return Err(VoteSetError::InvalidSignature);
        }
        let key = *vote.validator.as_bytes();
        let power = *self
            .power_by_validator
            .get(&key)
            .ok_or(VoteSetError::UnknownValidator)?;

        if let Some(existing) = self.votes.get(&key) {
            if existing.block_hash == vote.block_hash {
                return Ok(VoteAddOutcome::Duplicate);
            }
            return Ok(VoteAddOutcome::Equivocation(Box::new(ConflictingVote {
                first: existing.clone(),
                second: vote,
            })));
        }

        *self.power_by_block.entry(vote.block_hash).or_insert(0) += power;
        self.votes.insert(key, vote);
        Ok(VoteAddOutcome::Added)
    }

    /// Check if there is a 2/3+ power quorum for a specific block hash.
    pub fn has_quorum_for(&self, block_hash: &BlockHash) -> bool {
        self.is_quorum(self.power_for(Some(*block_hash)))
    }

    /// Check if there is a 2/3+ power quorum for nil.
    pub fn has_quorum_for_nil(&self) -> bool {
        self.is_quorum(self.power_for(None))
    }

    /// Check if any block hash (non-nil) has a 2/3+ power quorum. Returns
    /// the winning hash if so.
    pub fn quorum_block(&self) -> Option<BlockHash> {
        self.power_by_block
            .iter()
            .filter_map(|(id, power)| id.as_ref().map(|h| (*h, *power)))
            .find(|(_, power)| self.is_quorum(*power))
            .map(|(h, _)| h)
    }

    /// Returns the block id (nil or not) holding a 2/3+ power quorum, if any.
    pub fn quorum_block_id(&self) -> Option<Option<BlockHash>> {
        self.power_by_block
            .iter()
            .find(|(_, power)| self.is_quorum(**power))
            .map(|(id, _)| *id)
    }

    /// Whether *some* block id (including nil) has reached 2/3+ power, even
    /// if which one has not yet been determined by the caller. Used to enter
    /// the PrevoteWait/PrecommitWait steps.
    pub fn has_quorum_any(&self) -> bool {
        self.power_by_block.values().any(|p| self.is_quorum(*p))
    }

    /// Whether 2/3+ of total power has voted at all (any value, any mix).
    pub fn has_two_thirds_any(&self) -> bool {
        self.is_quorum(self.votes_power())
    }

    pub fn count(&self) -> usize {
        self.votes.len()
    }

    fn votes_power(&self) -> u64 {
        self.power_by_block.values().sum()
    }

    fn power_for(&self, block_id: Option<BlockHash>) -> u64 {
        self.power_by_block.get(&block_id).copied().unwrap_or(0)
    }

    /// Check if `power` constitutes a strict 2/3+ quorum of `total_power`.
    fn is_quorum(&self, power: u64) -> bool {
        if self.total_power == 0 {
            return false;
        }
        power as u128 * 3 > self.total_power as u128 * 2
    }
}

/// Owns the prevote/precommit `VoteSet` pair for every round seen at a given
/// height, plus per-peer gossip catchup cursors.
///
/// Rounds are created lazily on first vote or first access, always sized
/// against the same validator set (the one active for this height).
#[derive(Debug, Clone)]
pub struct HeightVoteSet {
    pub height: Height,
    validators: Vec<Validator>,
    round_votes: HashMap<Round, (VoteSet, VoteSet)>,
    /// Highest round already gossiped to each peer, keyed by peer id bytes.
    peer_catchup: HashMap<Vec<u8>, Round>,
}

impl HeightVoteSet {
    pub fn new(height: Height, validators: Vec<Validator>) -> Self {
        Self {
            height,
            validators,
            round_votes: HashMap::new(),
            peer_catchup: HashMap::new(),
        }
    }

    fn ensure_round(&mut self, round: Round) -> &mut (VoteSet, VoteSet) {
        let (height, validators) = (self.height, &self.validators);
        self.round_votes.entry(round).or_insert_with(|| {
            (
                VoteSet::new(VoteType::Prevote, height, round, validators),
                VoteSet::new(VoteType::Precommit, height, round, validators),
            )
        })
    }

    /// Route a vote into the correct round's prevote or precommit set.
    pub fn add_vote(&mut self, vote: Vote) -> Result<VoteAddOutcome, VoteSetError> {
        if vote.height != self.height {
            return Err(VoteSetError::Mismatch);
        }
        let round = vote.round;
        let vote_type = vote.vote_type;
        let pair = self.ensure_round(round);
        match vote_type {
            VoteType::Prevote => pair.0.add_vote(vote),
            VoteType::Precommit => pair.1.add_vote(vote),
        }
    }

    pub fn prevotes(&mut self, round: Round) -> &VoteSet {
        &self.ensure_round(round).0
    }

    pub fn precommits(&mut self, round: Round) -> &VoteSet {
        &self.ensure_round(round).1
    }

    /// Record that `peer` has now been sent everything through `round`.
    /// Only moves the cursor forward.
    pub fn set_peer_catchup(&mut self, peer: Vec<u8>, round: Round) {
        let cursor = self.peer_catchup.entry(peer).or_insert(round);
        if round > *cursor {
            *cursor = round;
        }
    }

    /// Highest round already sent to `peer`, if any.
    pub fn get_peer_catchup(&self, peer: &[u8]) -> Option<Round> {
        self.peer_catchup.get(peer).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn make_validators(powers: &[u64]) -> (Vec<SigningKey>, Vec<Validator>) {
        let keys: Vec<SigningKey> = powers.iter().map(|_| SigningKey::generate(&mut OsRng)).collect();
        let validators = keys
            .iter()
            .zip(powers)
            .map(|(k, p)| Validator {
                id: ValidatorId(k.verifying_key()),
                power: *p,
            })
            .collect();
        (keys, validators)
    }

    #[test]
    fn test_vote_sign_and_verify() {
        let key = SigningKey::generate(&mut OsRng);
        let vote = Vote::new(
            VoteType::Prevote,
            Height(1),
            Round(0),
            Some(BlockHash([0xAB; 32])),
            &key,
        );
        assert!(vote.verify(), "valid vote should verify");
    }

    #[test]
    fn test_nil_vote_sign_and_verify() {
        let key = SigningKey::generate(&mut OsRng);
        let vote = Vote::new(VoteType::Prevote, Height(5), Round(2), None, &key);
        assert!(vote.verify());
        assert!(vote.block_hash.is_none());
    }

    #[test]
    fn test_vote_tampered_fails() {
        let key = SigningKey::generate(&mut OsRng);
        let mut vote = Vote::new(
            VoteType::Prevote,
            Height(1),
            Round(0),
            Some(BlockHash([0xAB; 32])),
            &key,
        );
        vote.block_hash = Some(BlockHash([0xCD; 32]));
        assert!(!vote.verify(), "tampered vote should fail verification");
    }

    #[test]
    fn test_voteset_quorum_4_equal_validators() {
        let (keys, validators) = make_validators(&[1, 1, 1, 1]);
        let hash = BlockHash([0x11; 32]);
        let mut vs = VoteSet::new(VoteType::Prevote, Height(1), Round(0), &validators);

        for key in &keys[0..2] {
            let vote = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash), key);
            assert_eq!(vs.add_vote(vote).unwrap(), VoteAddOutcome::Added);
        }
        assert!(!vs.has_quorum_for(&hash));

        let vote = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash), &keys[2]);
        vs.add_vote(vote).unwrap();
        assert!(vs.has_quorum_for(&hash));
    }

    #[test]
    fn test_voteset_weighted_quorum_single_heavy_validator() {
        // One validator holds 70% of power; that alone is not 2/3 of total
        // on its own once the other three vote for something else -- but
        // two more heavy votes should tip it.
        let (keys, validators) = make_validators(&[70, 10, 10, 10]);
        let hash = BlockHash([0x99; 32]);
        let mut vs = VoteSet::new(VoteType::Prevote, Height(1), Round(0), &validators);

        let vote = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash), &keys[0]);
        vs.add_vote(vote).unwrap();
        // 70/100, 70*3=210 > 100*2=200 -> already quorum with just the heavy validator.
        assert!(vs.has_quorum_for(&hash));
    }

    #[test]
    fn test_voteset_weighted_quorum_requires_combined_power() {
        let (keys, validators) = make_validators(&[40, 40, 10, 10]);
        let hash = BlockHash([0x22; 32]);
        let mut vs = VoteSet::new(VoteType::Prevote, Height(1), Round(0), &validators);

        let vote = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash), &keys[0]);
        vs.add_vote(vote).unwrap();
        // 40/100 is not quorum.
        assert!(!vs.has_quorum_for(&hash));

        let vote = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash), &keys[1]);
        vs.add_vote(vote).unwrap();
        // 80/100, 80*3=240 > 200 -> quorum.
        assert!(vs.has_quorum_for(&hash));
    }

    #[test]
    fn test_voteset_rejects_duplicate() {
        let (keys, validators) = make_validators(&[1, 1, 1, 1]);
        let hash = BlockHash([0x33; 32]);
        let mut vs = VoteSet::new(VoteType::Prevote, Height(1), Round(0), &validators);

        let vote1 = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash), &keys[0]);
        let vote2 = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash), &keys[0]);
        assert_eq!(vs.add_vote(vote1).unwrap(), VoteAddOutcome::Added);
        assert_eq!(vs.add_vote(vote2).unwrap(), VoteAddOutcome::Duplicate);
        assert_eq!(vs.count(), 1);
    }

    #[test]
    fn test_voteset_detects_conflicting_vote() {
        let (keys, validators) = make_validators(&[1, 1, 1, 1]);
        let hash_a = BlockHash([0x44; 32]);
        let hash_b = BlockHash([0x55; 32]);
        let mut vs = VoteSet::new(VoteType::Prevote, Height(1), Round(0), &validators);

        let vote1 = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash_a), &keys[0]);
        let vote2 = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash_b), &keys[0]);
        assert_eq!(vs.add_vote(vote1).unwrap(), VoteAddOutcome::Added);
        match vs.add_vote(vote2).unwrap() {
            VoteAddOutcome::Equivocation(evidence) => {
                assert_eq!(evidence.first.block_hash, Some(hash_a));
                assert_eq!(evidence.second.block_hash, Some(hash_b));
            }
            other => panic!("expected conflicting vote evidence, got {other:?}"),
        }
        // Only the first vote counts toward quorum.
        assert_eq!(vs.count(), 1);
    }

    #[test]
    fn test_voteset_rejects_wrong_round() {
        let (keys, validators) = make_validators(&[1, 1, 1, 1]);
        let hash = BlockHash([0x44; 32]);
        let mut vs = VoteSet::new(VoteType::Prevote, Height(1), Round(0), &validators);

        let vote = Vote::new(VoteType::Prevote, Height(1), Round(1), Some(hash), &keys[0]);
        assert!(matches!(vs.add_vote(vote), Err(VoteSetError::Mismatch)));
    }

    #[test]
    fn test_voteset_rejects_unknown_validator() {
        let (_keys, validators) = make_validators(&[1, 1, 1, 1]);
        let outsider = SigningKey::generate(&mut OsRng);
        let hash = BlockHash([0x66; 32]);
        let mut vs = VoteSet::new(VoteType::Prevote, Height(1), Round(0), &validators);

        let vote = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash), &outsider);
        assert!(matches!(vs.add_vote(vote), Err(VoteSetError::UnknownValidator)));
    }

    #[test]
    fn test_voteset_nil_quorum() {
        let (keys, validators) = make_validators(&[1, 1, 1, 1]);
        let mut vs = VoteSet::new(VoteType::Prevote, Height(1), Round(0), &validators);

        for key in &keys[0..3] {
            let vote = Vote::new(VoteType::Prevote, Height(1), Round(0), None, key);
            vs.add_vote(vote).unwrap();
        }
        assert!(vs.has_quorum_for_nil(), "3 of 4 nil should be quorum");
    }

    #[test]
    fn test_voteset_quorum_block() {
        let (keys, validators) = make_validators(&[1, 1, 1, 1]);
        let hash = BlockHash([0x55; 32]);
        let mut vs = VoteSet::new(VoteType::Precommit, Height(1), Round(0), &validators);

        for key in &keys[0..3] {
            let vote = Vote::new(VoteType::Precommit, Height(1), Round(0), Some(hash), key);
            vs.add_vote(vote).unwrap();
        }
        assert_eq!(vs.quorum_block(), Some(hash));
    }

    #[test]
    fn test_voteset_split_no_quorum_but_two_thirds_any() {
        let (keys, validators) = make_validators(&[1, 1, 1, 1]);
        let hash_a = BlockHash([0xAA; 32]);
        let hash_b = BlockHash([0xBB; 32]);
        let mut vs = VoteSet::new(VoteType::Prevote, Height(1), Round(0), &validators);

        for key in &keys[0..2] {
            let vote = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash_a), key);
            vs.add_vote(vote).unwrap();
        }
        for key in &keys[2..4] {
            let vote = Vote::new(VoteType::Prevote, Height(1), Round(0), Some(hash_b), key);
            vs.add_vote(vote).unwrap();
        }
        assert!(!vs.has_quorum_for(&hash_a));
        assert!(!vs.has_quorum_for(&hash_b));
        assert_eq!(vs.quorum_block(), None);
        assert!(vs.has_two_thirds_any());
        assert!(!vs.has_quorum_any());
    }

    #[test]
    fn test_voteset_zero_total_power_never_quorum() {
        let validators: Vec<Validator> = vec![];
        let vs = VoteSet::new(VoteType::Prevote, Height(1), Round(0), &validators);
        assert!(!vs.has_quorum_for_nil());
        assert!(!vs.has_two_thirds_any());
    }

    #[test]
    fn test_height_vote_set_routes_by_round_and_type() {
        let (keys, validators) = make_validators(&[1, 1, 1, 1]);
        let hash = BlockHash([0x77; 32]);
        let mut hvs = HeightVoteSet::new(Height(5), validators);

        for key in &keys[0..3] {
            let vote = Vote::new(VoteType::Prevote, Height(5), Round(2), Some(hash), key);
            hvs.add_vote(vote).unwrap();
        }
        assert!(hvs.prevotes(Round(2)).has_quorum_for(&hash));
        // A different round's vote set is untouched.
        assert_eq!(hvs.prevotes(Round(0)).count(), 0);
        assert_eq!(hvs.precommits(Round(2)).count(), 0);
    }

    #[test]
    fn test_height_vote_set_rejects_wrong_height() {
        let (keys, validators) = make_validators(&[1, 1, 1, 1]);
        let mut hvs = HeightVoteSet::new(Height(5), validators);
        let vote = Vote::new(VoteType::Prevote, Height(6), Round(0), None, &keys[0]);
        assert!(matches!(hvs.add_vote(vote), Err(VoteSetError::Mismatch)));
    }

    #[test]
    fn test_height_vote_set_peer_catchup_cursor_only_advances() {
        let mut hvs = HeightVoteSet::new(Height(1), vec![]);
        let peer = b"peer-a".to_vec();
        assert_eq!(hvs.get_peer_catchup(&peer), None);

        hvs.set_peer_catchup(peer.clone(), Round(3));
        assert_eq!(hvs.get_peer_catchup(&peer), Some(Round(3)));

        hvs.set_peer_catchup(peer.clone(), Round(1));
        assert_eq!(
            hvs.get_peer_catchup(&peer),
            Some(Round(3)),
            "catchup cursor must not move backwards"
        );

        hvs.set_peer_catchup(peer.clone(), Round(5));
        assert_eq!(hvs.get_peer_catchup(&peer), Some(Round(5)));
    }
}
