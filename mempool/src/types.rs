use serde::{Deserialize, Serialize};
use thiserror::Error;
use meridian_bft::block::Transaction;

/// Errors that can occur in the mempool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MempoolError {
    #[error("duplicate transaction")]
    DuplicateTransaction,

    #[error("mempool is full")]
    PoolFull,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("nonce too low: expected {expected}, got {got}")]
    NonceTooLow { expected: u64, got: u64 },

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("transaction of {size} bytes exceeds the {max} byte maximum")]
    TransactionTooLarge { size: usize, max: usize },

    #[error("gas limit {limit} exceeds the block gas limit of {max}")]
    GasLimitExceeded { limit: u64, max: u64 },

    #[error("gas price {price} is below the minimum of {min}")]
    GasPriceTooLow { price: u64, min: u64 },
}

/// Configuration for the transaction pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolConfig {
    /// Largest serialized transaction accepted into the pool.
    pub max_tx_bytes: usize,
    /// Maximum number of transactions in the pool, across all senders.
    pub max_size: usize,
    /// Maximum number of pending transactions per account.
    pub max_tx_per_account: usize,
    /// Minimum `gas_price` a non-local transaction must declare.
    pub min_gas_price: u64,
    /// Transactions whose declared `gas_limit` exceeds this are rejected
    /// outright rather than admitted and later dropped at block assembly.
    pub block_gas_limit: u64,
    /// Seconds a non-local transaction may sit in the pool before it
    /// becomes eligible for TTL eviction.
    pub tx_lifetime_secs: u64,
    /// When true, local submissions get no special treatment: they are
    /// subject to the gas price floor and to eviction like any other
    /// transaction.
    pub no_locals: bool,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_tx_bytes: 32 * 1024,
            max_size: 10_000,
            max_tx_per_account: 100,
            min_gas_price: 1,
            block_gas_limit: 10_000_000,
            tx_lifetime_secs: 3 * 60 * 60,
            no_locals: false,
        }
    }
}

impl MempoolConfig {
    /// Build a `MempoolConfig` from genesis chain parameters plus the block
    /// gas limit sourced from the fee market, matching the `ChainParams`
    /// override pattern used elsewhere in this codebase.
    pub fn from_chain_params(
        max_tx_bytes: usize,
        max_size: usize,
        max_tx_per_account: usize,
        min_gas_price: u64,
        block_gas_limit: u64,
        tx_lifetime_secs: u64,
    ) -> Self {
        Self {
            max_tx_bytes,
            max_size,
            max_tx_per_account,
            min_gas_price,
            block_gas_limit,
            tx_lifetime_secs,
            no_locals: false,
        }
    }
}

/// A transaction waiting in the mempool with metadata.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub tx: Transaction,
    /// Unix timestamp (seconds) this transaction was admitted.
    pub added_at: u64,
    /// True if submitted by this node's own user rather than received over
    /// the network; exempts the transaction from the price floor and from
    /// TTL/FIFO eviction unless `MempoolConfig::no_locals` is set.
    pub local: bool,
}

impl PendingTransaction {
    /// Wrap a transaction with mempool metadata.
    pub fn new(tx: Transaction, added_at: u64, local: bool) -> Self {
        Self {
            tx,
            added_at,
            local,
        }
    }
}
