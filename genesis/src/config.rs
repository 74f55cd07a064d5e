use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::types::*;

/// The full genesis configuration for a Meridian chain.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GenesisConfig {
    /// Human-readable chain identifier.
    pub chain_id: String,
    /// Timestamp when the chain starts.
    pub genesis_time: DateTime<Utc>,
    /// Chain-wide parameters.
    pub chain_params: ChainParams,
    /// Initial validator set.
    pub validators: Vec<GenesisValidator>,
    /// Initial account balances.
    pub accounts: Vec<GenesisAccount>,
    /// Hash of the canonical genesis (computed, not stored from file).
    #[serde(with = "hex_bytes")]
    pub genesis_hash: [u8; 32],
}

impl GenesisConfig {
    /// Load a genesis config from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GenesisError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: GenesisConfig = serde_json::from_str(&contents)?;
        config.genesis_hash = config.compute_genesis_hash();
        Ok(config)
    }

    /// Save the genesis config to a JSON file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GenesisError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validate all invariants of the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisError> {
        // Must have at least one validator.
        if self.validators.is_empty() {
            return Err(GenesisError::NoValidators);
        }

        // Check for duplicate validator pubkeys.
        let mut seen = HashSet::new();
        for (i, v) in self.validators.iter().enumerate() {
            if !seen.insert(v.pubkey) {
                return Err(GenesisError::DuplicateValidator(i));
            }
            if v.initial_stake == 0 {
                return Err(GenesisError::ZeroStake { index: i });
            }
            if v.commission_rate > 10_000 {
                return Err(GenesisError::InvalidCommission { index: i });
            }
        }

        // Validate chain params.
        if self.chain_params.epoch_length == 0 {
            return Err(GenesisError::ZeroEpochLength);
        }
        if self.chain_params.block_time_ms == 0 {
            return Err(GenesisError::ZeroBlockTime);
        }
        if self.chain_params.max_validators == 0 {
            return Err(GenesisError::ZeroMaxValidators);
        }

        let launch_total = self.chain_params.fee_launch_burn_bps
            + self.chain_params.fee_launch_validator_bps
            + self.chain_params.fee_launch_treasury_bps
            + self.chain_params.fee_launch_developer_bps;
        if launch_total != 10_000 {
            return Err(GenesisError::InvalidFeeSplit(launch_total));
        }
        let maturity_total = self.chain_params.fee_maturity_burn_bps
            + self.chain_params.fee_maturity_validator_bps
            + self.chain_params.fee_maturity_treasury_bps
            + self.chain_params.fee_maturity_developer_bps;
        if maturity_total != 10_000 {
            return Err(GenesisError::InvalidFeeSplit(maturity_total));
        }

        Ok(())
    }

    /// Compute a SHA-256 hash of the canonical JSON representation.
    /// This provides a unique fingerprint for the genesis state.
    pub fn compute_genesis_hash(&self) -> [u8; 32] {
        // Create a canonical representation without the hash field itself.
        let canonical = CanonicalGenesis {
            chain_id: &self.chain_id,
            genesis_time: &self.genesis_time,
            chain_params: &self.chain_params,
            validators: &self.validators,
            accounts: &self.accounts,
        };
        let json = serde_json::to_string(&canonical).expect("genesis serialization should not fail");
        let digest = Sha256::digest(json.as_bytes());
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        hash
    }

    /// Create a default testnet configuration with 4 validators.
    pub fn default_testnet() -> Self {
        let validators: Vec<GenesisValidator> = (1..=4)
            .map(|i| {
                let mut pubkey = [0u8; 32];
                pubkey[0] = i;
                GenesisValidator {
                    pubkey,
                    initial_stake: 10_000_000,
                    commission_rate: 500,
                }
            })
            .collect();

        let accounts: Vec<GenesisAccount> = (1..=4)
            .map(|i| {
                let mut pubkey = [0u8; 32];
                pubkey[0] = i;
                GenesisAccount {
                    pubkey,
                    balance: 100_000_000,
                }
            })
            .collect();

        let mut config = GenesisConfig {
            chain_id: "meridian-testnet-1".to_string(),
            genesis_time: Utc::now(),
            chain_params: ChainParams {
                chain_id: "meridian-testnet-1".to_string(),
                ..ChainParams::default()
            },
            validators,
            accounts,
            genesis_hash: [0u8; 32],
        };
        config.genesis_hash = config.compute_genesis_hash();
        config
    }
}

/// Internal type for canonical hashing (excludes genesis_hash field).
#[derive(serde::Serialize)]
struct CanonicalGenesis<'a> {
    chain_id: &'a str,
    genesis_time: &'a DateTime<Utc>,
    chain_params: &'a ChainParams,
    validators: &'a [GenesisValidator],
    accounts: &'a [GenesisAccount],
}

/// Helper module for serializing [u8; 32] as hex in the top-level genesis hash.
mod hex_bytes {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}
