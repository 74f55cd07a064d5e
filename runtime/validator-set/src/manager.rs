use meridian_staking::StakingPool;

use crate::rotation;
use crate::types::*;

/// The maximum number of active validators.
pub const ACTIVE_SET_CAP: usize = 200;

/// Manages the validator set: registration, rotation, proposer selection.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidatorSetManager {
    state: ValidatorSetState,
}

impl ValidatorSetManager {
    /// Create a new validator set manager with default config.
    pub fn new() -> Self {
        Self {
            state: ValidatorSetState {
                config: ValidatorSetConfig::default(),
                ..Default::default()
            },
        }
    }

    /// Create with a custom config.
    pub fn with_config(config: ValidatorSetConfig) -> Self {
        Self {
            state: ValidatorSetState {
                config,
                ..Default::default()
            },
        }
    }

    /// Register a new validator. Placed into Active if room, otherwise Standby.
    pub fn register_validator(
        &mut self,
        pubkey: PublicKey,
        initial_stake: u64,
        commission_rate: u16,
        current_height: u64,
    ) -> ValidatorSetResult<ValidatorStatus> {
        if self.state.validators.contains_key(&pubkey) {
            return Err(ValidatorSetError::AlreadyRegistered(pubkey));
        }

        if initial_stake < self.state.config.min_stake {
            return Err(ValidatorSetError::InsufficientStake {
                have: initial_stake,
                need: self.state.config.min_stake,
            });
        }

        let active_count = self.active_count();
        let status = if active_count < self.state.config.active_set_cap {
            ValidatorStatus::Active
        } else {
            ValidatorStatus::Standby
        };

        let info = ValidatorInfo {
            pubkey,
            stake: initial_stake,
            commission_rate,
            status,
            performance_score: 10_000, // Start at perfect score.
            join_height: current_height,
        };

        self.state.validators.insert(pubkey, info);
        Ok(status)
    }

    /// Deregister a validator, removing them from the set entirely.
    pub fn deregister_validator(&mut self, pubkey: &PublicKey) -> ValidatorSetResult<ValidatorInfo> {
        self.state
            .validators
            .remove(pubkey)
            .ok_or(ValidatorSetError::NotFound(*pubkey))
    }

    /// Update the recorded stake for a validator.
    pub fn update_stake(
        &mut self,
        pubkey: &PublicKey,
        new_stake: u64,
    ) -> ValidatorSetResult<()> {
        let validator = self
            .state
            .validators
            .get_mut(pubkey)
            .ok_or(ValidatorSetError::NotFound(*pubkey))?;

        validator.stake = new_stake;
        Ok(())
    }

    /// Get the list of currently active validators, sorted by stake descending.
    pub fn get_active_set(&self, staking_pool: &StakingPool) -> Vec<ValidatorInfo> {
        let active: Vec<ValidatorInfo> = self
            .state
            .validators
            .values()
            .filter(|v| v.status == ValidatorStatus::Active)
            .cloned()
            .collect();

        let ranked = rotation::sort_by_stake(&active, staking_pool);
        ranked
            .iter()
            .filter_map(|r| self.state.validators.get(&r.pubkey).cloned())
            .collect()
    }

    /// Get the list of standby validators.
    pub fn get_standby_set(&self) -> Vec<ValidatorInfo> {
        self.state
            .validators
            .values()
            .filter(|v| v.status == ValidatorStatus::Standby)
            .cloned()
            .collect()
    }

    /// Get the list of jailed validators.
    pub fn get_jailed_set(&self) -> Vec<ValidatorInfo> {
        self.state
            .validators
            .values()
            .filter(|v| v.status == ValidatorStatus::Jailed)
            .cloned()
            .collect()
    }

    /// Trigger epoch rotation: swap standby validators in if they have higher
    /// effective stake than the weakest active validators.
    pub fn epoch_rotation(
        &mut self,
        staking_pool: &StakingPool,
    ) -> Vec<(PublicKey, PublicKey)> {
        let swaps = rotation::rotate(
            &mut self.state.validators,
            staking_pool,
            self.state.config.active_set_cap,
        );
        self.state.current_epoch += 1;
        swaps
    }

    /// Check if a validator is currently active.
    pub fn is_active(&self, pubkey: &PublicKey) -> bool {
        self.state
            .validators
            .get(pubkey)
            .map_or(false, |v| v.status == ValidatorStatus::Active)
    }

    /// Get information about a specific validator.
    pub fn get_validator(&self, pubkey: &PublicKey) -> Option<&ValidatorInfo> {
        self.state.validators.get(pubkey)
    }

    /// Get a mutable reference to a validator's info.
    pub fn get_validator_mut(&mut self, pubkey: &PublicKey) -> Option<&mut ValidatorInfo> {
        self.state.validators.get_mut(pubkey)
    }

    /// Jail a validator (move to Jailed status).
    pub fn jail(&mut self, pubkey: &PublicKey) -> ValidatorSetResult<()> {
        rotation::jail(&mut self.state.validators, pubkey)
    }

    /// Unjail a validator (move from Jailed to Standby).
    pub fn unjail(&mut self, pubkey: &PublicKey) -> ValidatorSetResult<()> {
        rotation::unjail(&mut self.state.validators, pubkey)
    }

    /// Deterministic proposer selection for a given block height.
    ///
    /// Uses weighted round-robin: validators are assigned contiguous ranges
    /// proportional to their voting power, and the height modulo total power
    /// determines who proposes.
    pub fn get_proposer(
        &self,
        height: u64,
        staking_pool: &StakingPool,
    ) -> Option<PublicKey> {
        let mut active: Vec<(PublicKey, u64)> = self
            .state
            .validators
            .values()
            .filter(|v| v.status == ValidatorStatus::Active)
            .map(|v| (v.pubkey, staking_pool.get_voting_power(&v.pubkey)))
            .collect();

        if active.is_empty() {
            return None;
        }

        // Sort deterministically by pubkey for consistent ordering.
        active.sort_by_key(|(pk, _)| *pk);

        let total_power: u64 = active.iter().map(|(_, p)| *p).sum();
        if total_power == 0 {
            return None;
        }

        let slot = height % total_power;
        let mut cumulative = 0u64;
        for (pubkey, power) in &active {
            cumulative += *power;
            if slot < cumulative {
                return Some(*pubkey);
            }
        }

        // Should not reach here, but return the last validator as fallback.
        active.last().map(|(pk, _)| *pk)
    }

    /// Current epoch.
    pub fn current_epoch(&self) -> u64 {
        self.state.current_epoch
    }

    /// Number of active validators.
    pub fn active_count(&self) -> usize {
        self.state
            .validators
            .values()
            .filter(|v| v.status == ValidatorStatus::Active)
            .count()
    }

    /// Total number of registered validators (all statuses).
    pub fn total_count(&self) -> usize {
        self.state.validators.len()
    }

    /// Access the full validators map (for slashing module).
    pub fn validators(&self) -> &std::collections::HashMap<PublicKey, ValidatorInfo> {
        &self.state.validators
    }

    /// Mutable access to the validators map (for slashing module).
    pub fn validators_mut(&mut self) -> &mut std::collections::HashMap<PublicKey, ValidatorInfo> {
        &mut self.state.validators
    }
}

impl Default for ValidatorSetManager {
    fn default() -> Self {
        Self::new()
    }
}
