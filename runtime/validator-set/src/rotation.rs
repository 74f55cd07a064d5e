use meridian_staking::StakingPool;

use crate::types::*;

/// A ranked entry pairing a validator with their effective stake.
#[derive(Debug, Clone)]
pub struct RankedValidator {
    pub pubkey: PublicKey,
    pub effective_stake: u64,
}

/// Sort validators by effective stake in descending order.
/// Uses the staking pool to look up each validator's vote weight.
pub fn sort_by_stake(
    validators: &[ValidatorInfo],
    staking_pool: &StakingPool,
) -> Vec<RankedValidator> {
    let mut ranked: Vec<RankedValidator> = validators
        .iter()
        .map(|v| {
            let voting_power = staking_pool.get_voting_power(&v.pubkey);
            RankedValidator {
                pubkey: v.pubkey,
                effective_stake: voting_power,
            }
        })
        .collect();

    // Sort descending by effective stake; ties broken by pubkey (lexicographic, for determinism).
    ranked.sort_by(|a, b| {
        b.effective_stake
            .cmp(&a.effective_stake)
            .then_with(|| a.pubkey.cmp(&b.pubkey))
    });

    ranked
}

/// Perform epoch rotation.
///
/// If any standby validator has higher effective stake than the lowest-ranked
/// active validator, swap them. Returns a list of (promoted, demoted) pairs.
pub fn rotate(
    validators: &mut std::collections::HashMap<PublicKey, ValidatorInfo>,
    staking_pool: &StakingPool,
    active_cap: usize,
) -> Vec<(PublicKey, PublicKey)> {
    let mut swaps = Vec::new();

    loop {
        // Gather active and standby validators.
        let active: Vec<ValidatorInfo> = validators
            .values()
            .filter(|v| v.status == ValidatorStatus::Active)
            .cloned()
            .collect();

        let standby: Vec<ValidatorInfo> = validators
            .values()
            .filter(|v| v.status == ValidatorStatus::Standby)
            .cloned()
            .collect();

        if active.is_empty() || standby.is_empty() {
            break;
        }

        // Find the weakest active validator.
        let active_ranked = sort_by_stake(&active, staking_pool);
        let weakest_active = active_ranked.last().unwrap();

        // Find the strongest standby validator.
        let standby_ranked = sort_by_stake(&standby, staking_pool);
        let strongest_standby = standby_ranked.first().unwrap();

        // Only swap if standby is strictly stronger.
        if strongest_standby.effective_stake > weakest_active.effective_stake {
            // Demote the weakest active validator.
            if let Some(v) = validators.get_mut(&weakest_active.pubkey) {
                v.status = ValidatorStatus::Standby;
            }
            // Promote the strongest standby validator.
            if let Some(v) = validators.get_mut(&strongest_standby.pubkey) {
                v.status = ValidatorStatus::Active;
            }
            swaps.push((strongest_standby.pubkey, weakest_active.pubkey));
        } else {
            break;
        }
    }

    // If active count is below cap, promote standby validators by stake order.
    let active_count = validators
        .values()
        .filter(|v| v.status == ValidatorStatus::Active)
        .count();

    if active_count < active_cap {
        let standby: Vec<ValidatorInfo> = validators
            .values()
            .filter(|v| v.status == ValidatorStatus::Standby)
            .cloned()
            .collect();

        let standby_ranked = sort_by_stake(&standby, staking_pool);
        let slots_available = active_cap - active_count;

        for ranked in standby_ranked.iter().take(slots_available) {
            if let Some(v) = validators.get_mut(&ranked.pubkey) {
                v.status = ValidatorStatus::Active;
            }
        }
    }

    swaps
}

/// Jail a validator — move them to Jailed status regardless of current status.
pub fn jail(
    validators: &mut std::collections::HashMap<PublicKey, ValidatorInfo>,
    pubkey: &PublicKey,
) -> ValidatorSetResult<()> {
    let validator = validators
        .get_mut(pubkey)
        .ok_or(ValidatorSetError::NotFound(*pubkey))?;

    validator.status = ValidatorStatus::Jailed;
    Ok(())
}

/// Unjail a validator — move them from Jailed back to Standby.
pub fn unjail(
    validators: &mut std::collections::HashMap<PublicKey, ValidatorInfo>,
    pubkey: &PublicKey,
) -> ValidatorSetResult<()> {
    let validator = validators
        .get_mut(pubkey)
        .ok_or(ValidatorSetError::NotFound(*pubkey))?;

    if validator.status != ValidatorStatus::Jailed {
        return Err(ValidatorSetError::NotJailed);
    }

    validator.status = ValidatorStatus::Standby;
    Ok(())
}
