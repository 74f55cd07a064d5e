use serde::{Deserialize, Serialize};

/// Response for a block query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResponse {
    pub height: u64,
    pub timestamp: u64,
    pub parent_hash: String,
    pub proposer: String,
    pub tx_count: usize,
    pub block_hash: String,
}

/// Response for a validator query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorResponse {
    pub pubkey: String,
    pub stake: u64,
    pub commission_rate: u16,
    pub status: String,
    pub performance_score: u16,
}

/// Response for a staking info query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingInfoResponse {
    pub pubkey: String,
    pub total_staked: u64,
    pub voting_power: u64,
}

/// Response for fee market info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeInfoResponse {
    pub base_fee: u64,
    pub target_gas_per_block: u64,
    pub max_gas_per_block: u64,
}

/// Response for health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub current_height: u64,
    pub validator_count: usize,
    pub version: String,
}

/// Request to submit a signed transaction. Binary fields are hex-encoded
/// since JSON-RPC has no native byte-string type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTransactionRequest {
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub nonce: u64,
    pub signature: String,
    pub data: String,
    pub gas_limit: u64,
    pub gas_price: u64,
}

/// Response to a transaction submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTransactionResponse {
    pub tx_hash: String,
    pub accepted: bool,
}

/// Response for an account query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub pubkey: String,
    pub balance: u64,
    pub nonce: u64,
}

/// Response for a mempool size query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolInfoResponse {
    pub pending_count: usize,
}
