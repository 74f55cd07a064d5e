use crate::types::*;

/// Fee splitting logic: distributes fees to burn, validator, treasury, and developer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeeSplit {
    config: SplitConfig,
}

impl FeeSplit {
    /// Create a new FeeSplit with the default 40/30/20/10 ratio.
    pub fn new() -> Self {
        Self {
            config: SplitConfig::default(),
        }
    }

    /// Create a FeeSplit with custom ratios.
    /// Returns an error if ratios don't sum to 10,000 bps.
    pub fn with_config(config: SplitConfig) -> Result<Self, FeeError> {
        if !config.validate() {
            let sum = config.burn_bps + config.validator_bps + config.treasury_bps + config.developer_bps;
            return Err(FeeError::InvalidSplitRatios(sum));
        }
        Ok(Self { config })
    }

    /// Split a total fee into the 4-way distribution.
    ///
    /// Any remainder from integer rounding goes to the burn bucket
    /// to ensure the total always matches.
    pub fn split_fee(&self, total_fee: u64) -> SplitResult {
        let validator = (total_fee as u128 * self.config.validator_bps as u128 / 10_000) as u64;
        let treasury = (total_fee as u128 * self.config.treasury_bps as u128 / 10_000) as u64;
        let developer = (total_fee as u128 * self.config.developer_bps as u128 / 10_000) as u64;
        // Burn gets the remainder to ensure exact total.
        let burn = total_fee - validator - treasury - developer;

        SplitResult {
            burn,
            validator,
            treasury,
            developer,
        }
    }

    /// Get the current split configuration.
    pub fn config(&self) -> &SplitConfig {
        &self.config
    }
}

impl Default for FeeSplit {
    fn default() -> Self {
        Self::new()
    }
}
