use chrono::{DateTime, Utc};

use crate::config::GenesisConfig;
use crate::types::*;

/// Builder for constructing a `GenesisConfig` step by step.
pub struct GenesisBuilder {
    chain_id: String,
    genesis_time: DateTime<Utc>,
    chain_params: ChainParams,
    validators: Vec<GenesisValidator>,
    accounts: Vec<GenesisAccount>,
}

impl GenesisBuilder {
    /// Start building a genesis config with the given chain ID.
    pub fn new(chain_id: impl Into<String>) -> Self {
        let chain_id = chain_id.into();
        Self {
            chain_params: ChainParams {
                chain_id: chain_id.clone(),
                ..ChainParams::default()
            },
            chain_id,
            genesis_time: Utc::now(),
            validators: Vec::new(),
            accounts: Vec::new(),
        }
    }

    /// Set the genesis timestamp.
    pub fn with_genesis_time(mut self, time: DateTime<Utc>) -> Self {
        self.genesis_time = time;
        self
    }

    /// Add a validator to the genesis set.
    pub fn with_validator(
        mut self,
        pubkey: [u8; 32],
        stake: u64,
        commission_rate: u16,
    ) -> Self {
        self.validators.push(GenesisValidator {
            pubkey,
            initial_stake: stake,
            commission_rate,
        });
        self
    }

    /// Add an account with an initial balance.
    pub fn with_account(mut self, pubkey: [u8; 32], balance: u64) -> Self {
        self.accounts.push(GenesisAccount { pubkey, balance });
        self
    }

    /// Set the chain parameters.
    pub fn with_params(mut self, params: ChainParams) -> Self {
        self.chain_params = params;
        self
    }

    /// Build the final genesis configuration.
    /// Validates all invariants before returning.
    pub fn build(self) -> Result<GenesisConfig, GenesisError> {
        let mut config = GenesisConfig {
            chain_id: self.chain_id,
            genesis_time: self.genesis_time,
            chain_params: self.chain_params,
            validators: self.validators,
            accounts: self.accounts,
            genesis_hash: [0u8; 32],
        };

        config.validate()?;
        config.genesis_hash = config.compute_genesis_hash();
        Ok(config)
    }
}
