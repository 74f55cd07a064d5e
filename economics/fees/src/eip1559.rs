use crate::types::*;

/// EIP-1559 dynamic fee market implementation.
///
/// The base fee adjusts up/down by up to 12.5% per block depending
/// on whether actual gas usage exceeds the target.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeeMarket {
    config: FeeConfig,
    base_fee: u64,
}

impl FeeMarket {
    /// Create a new fee market with the given config and initial base fee.
    pub fn new(config: FeeConfig, initial_base_fee: u64) -> Result<Self, FeeError> {
        if config.elasticity_multiplier == 0 {
            return Err(FeeError::ZeroElasticity);
        }
        if !config.split.validate() {
            let sum = config.split.burn_bps
                + config.split.validator_bps
                + config.split.treasury_bps
                + config.split.developer_bps;
            return Err(FeeError::InvalidSplitRatios(sum));
        }
        let base_fee = initial_base_fee.max(config.base_fee_floor);
        Ok(Self { config, base_fee })
    }

    /// Update the base fee after a block is produced.
    ///
    /// - If `gas_used > gas_target`: increase base fee proportionally (up to 12.5%).
    /// - If `gas_used < gas_target`: decrease base fee proportionally (up to 12.5%).
    /// - The base fee never drops below `base_fee_floor`.
    pub fn update_base_fee(&mut self, gas_used: u64) {
        let gas_target = self.config.target_gas_per_block;
        let elasticity = self.config.elasticity_multiplier;

        if gas_used == gas_target {
            // No adjustment needed.
            return;
        }

        if gas_used > gas_target {
            // Fee goes up: base_fee += base_fee * (gas_used - gas_target) / (gas_target * elasticity)
            let gas_delta = gas_used - gas_target;
            let fee_delta = (self.base_fee as u128 * gas_delta as u128)
                / (gas_target as u128 * elasticity as u128);
            // Ensure at least 1 unit increase if there is any excess.
            let fee_delta = fee_delta.max(1) as u64;
            self.base_fee = self.base_fee.saturating_add(fee_delta);
        } else {
            // Fee goes down: base_fee -= base_fee * (gas_target - gas_used) / (gas_target * elasticity)
            let gas_delta = gas_target - gas_used;
            let fee_delta = (self.base_fee as u128 * gas_delta as u128)
                / (gas_target as u128 * elasticity as u128);
            let fee_delta = fee_delta as u64;
            self.base_fee = self.base_fee.saturating_sub(fee_delta);
        }

        // Enforce floor.
        if self.base_fee < self.config.base_fee_floor {
            self.base_fee = self.config.base_fee_floor;
        }
    }

    /// Calculate the fee for a transaction.
    pub fn calculate_fee(&self, gas_units: u64, priority_fee_per_gas: u64) -> TransactionFee {
        let base_fee = self.base_fee.saturating_mul(gas_units);
        let priority_fee = priority_fee_per_gas.saturating_mul(gas_units);
        TransactionFee {
            base_fee,
            priority_fee,
            total: base_fee.saturating_add(priority_fee),
        }
    }

    /// Get the current base fee per gas unit.
    pub fn current_base_fee(&self) -> u64 {
        self.base_fee
    }

    /// Get the fee config.
    pub fn config(&self) -> &FeeConfig {
        &self.config
    }
}
