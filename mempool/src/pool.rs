use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};
use meridian_bft::block::Transaction;
use meridian_state::StateDB;
use meridian_storage::{StorageKey, StorageValue, TieredStorage};

use crate::types::{MempoolConfig, MempoolError, PendingTransaction};
use crate::validation::{
    validate_gas_limit, validate_gas_price, validate_size, validate_transaction, verify_signature,
};

const JOURNAL_PREFIX: &str = "mempool/local/";

/// Transaction pool storing pending transactions awaiting inclusion in a block.
pub struct TransactionPool {
    config: MempoolConfig,
    /// Transactions grouped by sender pubkey.
    by_sender: HashMap<[u8; 32], Vec<PendingTransaction>>,
    /// Set of known tx hashes for dedup.
    known_hashes: HashSet<[u8; 32]>,
    /// Total number of pending transactions.
    total_count: usize,
    /// Durable journal for locally-submitted transactions, so a node
    /// restart does not silently drop a user's own submissions. Optional:
    /// a pool built without a storage backend simply skips journaling.
    storage: Option<Arc<TieredStorage>>,
}

impl std::fmt::Debug for TransactionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionPool")
            .field("config", &self.config)
            .field("total_count", &self.total_count)
            .field("senders", &self.by_sender.len())
            .finish()
    }
}

impl TransactionPool {
    /// Create a new transaction pool with the given configuration and no
    /// durable journal.
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            config,
            by_sender: HashMap::new(),
            known_hashes: HashSet::new(),
            total_count: 0,
            storage: None,
        }
    }

    /// Create a pool that journals local submissions to `storage`.
    pub fn with_storage(config: MempoolConfig, storage: Arc<TieredStorage>) -> Self {
        Self {
            storage: Some(storage),
            ..Self::new(config)
        }
    }

    /// Add a transaction to the pool after admission checks.
    ///
    /// Checks run in order: oversize, structural validity, gas limit versus
    /// the block gas limit, signature, gas price floor (skipped for a local
    /// submission unless `no_locals` is set), then duplicate-hash. On
    /// success the transaction is journaled (if local and storage is
    /// configured) and returns its canonical hash.
    pub fn add_transaction(
        &mut self,
        tx: Transaction,
        local: bool,
        now: u64,
    ) -> Result<[u8; 32], MempoolError> {
        validate_size(&tx, &self.config)?;
        validate_transaction(&tx)?;
        validate_gas_limit(&tx, &self.config)?;
        verify_signature(&tx)?;

        let exempt = local && !self.config.no_locals;
        validate_gas_price(&tx, &self.config, exempt)?;

        let tx_hash = tx.hash();
        if self.known_hashes.contains(&tx_hash) {
            return Err(MempoolError::DuplicateTransaction);
        }

        if self.total_count >= self.config.max_size {
            return Err(MempoolError::PoolFull);
        }

        let sender_txs = self.by_sender.entry(tx.from).or_default();
        if sender_txs.len() >= self.config.max_tx_per_account {
            return Err(MempoolError::PoolFull);
        }

        if exempt {
            self.journal(&tx, tx_hash);
        }

        let sender_txs = self.by_sender.entry(tx.from).or_default();
        sender_txs.push(PendingTransaction::new(tx, now, local));
        self.known_hashes.insert(tx_hash);
        self.total_count += 1;

        debug!(tx_hash = ?tx_hash, total = self.total_count, local, "transaction added to mempool");

        Ok(tx_hash)
    }

    /// Persist a locally-submitted transaction so it survives a restart.
    fn journal(&self, tx: &Transaction, tx_hash: [u8; 32]) {
        let Some(storage) = &self.storage else {
            return;
        };
        let key = StorageKey::new(format!("{JOURNAL_PREFIX}{}", hex::encode(tx_hash)).into_bytes());
        match bincode::serialize(tx) {
            Ok(bytes) => {
                if let Err(e) = storage.put(key, StorageValue::new(bytes)) {
                    warn!(tx_hash = ?tx_hash, error = %e, "failed to journal local transaction");
                }
            }
            Err(e) => warn!(tx_hash = ?tx_hash, error = %e, "failed to serialize local transaction"),
        }
    }

    /// Remove transactions that have been committed in a block.
    pub fn remove_committed(&mut self, tx_hashes: &[[u8; 32]]) {
        let remove_set: HashSet<[u8; 32]> = tx_hashes.iter().copied().collect();

        for sender_txs in self.by_sender.values_mut() {
            let before = sender_txs.len();
            sender_txs.retain(|ptx| !remove_set.contains(&ptx.tx.hash()));
            self.total_count -= before - sender_txs.len();
        }

        self.by_sender.retain(|_, txs| !txs.is_empty());

        for hash in tx_hashes {
            self.known_hashes.remove(hash);
        }
    }

    /// Rebind the pool to a new account-state view, evicting transactions
    /// whose nonce has fallen below the sender's now-current nonce (either
    /// because they were committed in the block that produced this state,
    /// or because a reorg invalidated them).
    pub fn reset(&mut self, new_head: &StateDB) {
        let mut removed = Vec::new();
        for (sender, txs) in self.by_sender.iter_mut() {
            let current_nonce = new_head.get_account(sender).map(|a| a.nonce).unwrap_or(0);
            let before = txs.len();
            txs.retain(|ptx| {
                let keep = ptx.tx.nonce >= current_nonce;
                if !keep {
                    removed.push(ptx.tx.hash());
                }
                keep
            });
            self.total_count -= before - txs.len();
        }
        self.by_sender.retain(|_, txs| !txs.is_empty());
        for hash in removed {
            self.known_hashes.remove(&hash);
        }
    }

    /// Evict transactions that have outstayed the configured TTL, then -- if
    /// the pool is still over `max_size` -- evict the oldest remaining
    /// non-local transactions first (FIFO). Local transactions are exempt
    /// from both passes unless `no_locals` is set.
    pub fn evict_expired(&mut self, now: u64) {
        let lifetime = self.config.tx_lifetime_secs;
        let no_locals = self.config.no_locals;
        let mut removed = Vec::new();

        for txs in self.by_sender.values_mut() {
            let before = txs.len();
            txs.retain(|ptx| {
                let exempt = ptx.local && !no_locals;
                let expired = !exempt && now.saturating_sub(ptx.added_at) > lifetime;
                if expired {
                    removed.push(ptx.tx.hash());
                }
                !expired
            });
            self.total_count -= before - txs.len();
        }
        self.by_sender.retain(|_, txs| !txs.is_empty());
        for hash in &removed {
            self.known_hashes.remove(hash);
        }

        if self.total_count <= self.config.max_size {
            return;
        }

        let mut evictable: Vec<(u64, [u8; 32], [u8; 32])> = self
            .by_sender
            .iter()
            .flat_map(|(sender, txs)| {
                txs.iter()
                    .filter(|ptx| no_locals || !ptx.local)
                    .map(move |ptx| (ptx.added_at, *sender, ptx.tx.hash()))
            })
            .collect();
        evictable.sort_by_key(|(added_at, _, _)| *added_at);

        let mut over = self.total_count - self.config.max_size;
        for (_, sender, hash) in evictable {
            if over == 0 {
                break;
            }
            if let Some(txs) = self.by_sender.get_mut(&sender) {
                let before = txs.len();
                txs.retain(|ptx| ptx.tx.hash() != hash);
                if txs.len() < before {
                    self.total_count -= 1;
                    self.known_hashes.remove(&hash);
                    over -= 1;
                }
            }
        }
        self.by_sender.retain(|_, txs| !txs.is_empty());
    }

    /// Ready-to-include transactions, ordered by ascending nonce within each
    /// sender and concatenated across senders, truncated to `limit`.
    ///
    /// A sender's transactions are re-validated against `state`: the first
    /// transaction must match the account's current nonce exactly, and each
    /// transaction's cost (value plus `gas_limit * gas_price`) is deducted
    /// from a running balance projection as the sequence is walked. The
    /// first gap in the nonce sequence, or the first transaction the
    /// projected balance can't cover, ends that sender's ready run --
    /// transactions after the gap are left pending, not skipped over.
    pub fn pending(&self, limit: usize, state: &StateDB) -> Vec<Transaction> {
        let mut senders: Vec<&[u8; 32]> = self.by_sender.keys().collect();
        senders.sort();

        let mut ready = Vec::new();
        for sender in senders {
            let txs = &self.by_sender[sender];
            let mut sorted: Vec<&PendingTransaction> = txs.iter().collect();
            sorted.sort_by_key(|ptx| ptx.tx.nonce);

            let account = state.get_account(sender);
            let mut expected_nonce = account.map(|a| a.nonce).unwrap_or(0);
            let mut balance = account.map(|a| a.balance).unwrap_or(0) as u128;

            for ptx in sorted {
                if ready.len() >= limit {
                    return ready;
                }
                if ptx.tx.nonce != expected_nonce {
                    break;
                }
                let cost = ptx.tx.amount as u128
                    + ptx.tx.gas_limit as u128 * ptx.tx.gas_price as u128;
                if cost > balance {
                    break;
                }
                balance -= cost;
                expected_nonce += 1;
                ready.push(ptx.tx.clone());
            }
        }
        ready
    }

    /// Total number of pending transactions.
    pub fn pending_count(&self) -> usize {
        self.total_count
    }

    /// Check if a transaction hash is already in the pool.
    pub fn contains(&self, tx_hash: &[u8; 32]) -> bool {
        self.known_hashes.contains(tx_hash)
    }

    /// Remove all pending transactions.
    pub fn clear(&mut self) {
        self.by_sender.clear();
        self.known_hashes.clear();
        self.total_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use meridian_state::AccountState;
    use rand::rngs::OsRng;

    fn make_tx(from: [u8; 32], to: [u8; 32], amount: u64, nonce: u64) -> Transaction {
        Transaction {
            from,
            to,
            amount,
            nonce,
            signature: vec![0u8; 64], // dummy sig for structural-rejection tests
            data: vec![],
            gas_limit: 21_000,
            gas_price: 1,
        }
    }

    fn make_real_signed_tx(
        signing_key: &SigningKey,
        to: [u8; 32],
        amount: u64,
        nonce: u64,
    ) -> Transaction {
        let from = signing_key.verifying_key().to_bytes();
        let mut tx = Transaction {
            from,
            to,
            amount,
            nonce,
            signature: vec![],
            data: vec![],
            gas_limit: 21_000,
            gas_price: 1,
        };
        tx.sign(signing_key);
        tx
    }

    fn default_pool() -> TransactionPool {
        TransactionPool::new(MempoolConfig::default())
    }

    fn small_pool() -> TransactionPool {
        TransactionPool::new(MempoolConfig {
            max_size: 3,
            max_tx_per_account: 2,
            ..MempoolConfig::default()
        })
    }

    #[test]
    fn test_add_and_count() {
        let mut pool = default_pool();
        let sk = SigningKey::generate(&mut OsRng);
        let tx = make_real_signed_tx(&sk, [2u8; 32], 100, 0);
        assert!(pool.add_transaction(tx, false, 0).is_ok());
        assert_eq!(pool.pending_count(), 1);
    }

    #[test]
    fn test_dedup_detection() {
        let mut pool = default_pool();
        let sk = SigningKey::generate(&mut OsRng);
        let tx = make_real_signed_tx(&sk, [2u8; 32], 100, 0);
        assert!(pool.add_transaction(tx.clone(), false, 0).is_ok());
        let err = pool.add_transaction(tx, false, 0).unwrap_err();
        assert_eq!(err, MempoolError::DuplicateTransaction);
        assert_eq!(pool.pending_count(), 1);
    }

    #[test]
    fn test_pool_full() {
        let mut pool = small_pool();
        let sk1 = SigningKey::generate(&mut OsRng);
        let sk2 = SigningKey::generate(&mut OsRng);
        let sk3 = SigningKey::generate(&mut OsRng);
        let sk4 = SigningKey::generate(&mut OsRng);
        pool.add_transaction(make_real_signed_tx(&sk1, [2u8; 32], 100, 0), false, 0)
            .unwrap();
        pool.add_transaction(make_real_signed_tx(&sk2, [3u8; 32], 200, 0), false, 0)
            .unwrap();
        pool.add_transaction(make_real_signed_tx(&sk3, [4u8; 32], 300, 0), false, 0)
            .unwrap();

        let err = pool
            .add_transaction(make_real_signed_tx(&sk4, [5u8; 32], 400, 0), false, 0)
            .unwrap_err();
        assert_eq!(err, MempoolError::PoolFull);
    }

    #[test]
    fn test_per_account_limit() {
        let mut pool = small_pool();
        let sk = SigningKey::generate(&mut OsRng);
        pool.add_transaction(make_real_signed_tx(&sk, [2u8; 32], 100, 0), false, 0)
            .unwrap();
        pool.add_transaction(make_real_signed_tx(&sk, [2u8; 32], 200, 1), false, 0)
            .unwrap();

        let err = pool
            .add_transaction(make_real_signed_tx(&sk, [2u8; 32], 300, 2), false, 0)
            .unwrap_err();
        assert_eq!(err, MempoolError::PoolFull);
    }

    #[test]
    fn test_local_exempt_from_price_floor() {
        let mut pool = TransactionPool::new(MempoolConfig {
            min_gas_price: 100,
            ..MempoolConfig::default()
        });
        let sk = SigningKey::generate(&mut OsRng);
        let mut tx = Transaction {
            from: sk.verifying_key().to_bytes(),
            to: [2u8; 32],
            amount: 10,
            nonce: 0,
            signature: vec![],
            data: vec![],
            gas_limit: 21_000,
            gas_price: 1,
        };
        tx.sign(&sk);

        assert!(matches!(
            pool.clone_config_add(tx.clone(), false),
            Err(MempoolError::GasPriceTooLow { .. })
        ));
        assert!(pool.add_transaction(tx, true, 0).is_ok());
    }

    #[test]
    fn test_no_locals_removes_exemption() {
        let mut pool = TransactionPool::new(MempoolConfig {
            min_gas_price: 100,
            no_locals: true,
            ..MempoolConfig::default()
        });
        let sk = SigningKey::generate(&mut OsRng);
        let mut tx = Transaction {
            from: sk.verifying_key().to_bytes(),
            to: [2u8; 32],
            amount: 10,
            nonce: 0,
            signature: vec![],
            data: vec![],
            gas_limit: 21_000,
            gas_price: 1,
        };
        tx.sign(&sk);

        let err = pool.add_transaction(tx, true, 0).unwrap_err();
        assert!(matches!(err, MempoolError::GasPriceTooLow { .. }));
    }

    #[test]
    fn test_contains() {
        let mut pool = default_pool();
        let sk = SigningKey::generate(&mut OsRng);
        let tx = make_real_signed_tx(&sk, [2u8; 32], 100, 0);
        let hash = tx.hash();
        assert!(!pool.contains(&hash));
        pool.add_transaction(tx, false, 0).unwrap();
        assert!(pool.contains(&hash));
    }

    #[test]
    fn test_remove_committed() {
        let mut pool = default_pool();
        let sk1 = SigningKey::generate(&mut OsRng);
        let sk2 = SigningKey::generate(&mut OsRng);
        let tx1 = make_real_signed_tx(&sk1, [2u8; 32], 100, 0);
        let tx2 = make_real_signed_tx(&sk2, [3u8; 32], 200, 0);
        let hash1 = tx1.hash();
        let hash2 = tx2.hash();

        pool.add_transaction(tx1, false, 0).unwrap();
        pool.add_transaction(tx2, false, 0).unwrap();
        assert_eq!(pool.pending_count(), 2);

        pool.remove_committed(&[hash1]);
        assert_eq!(pool.pending_count(), 1);
        assert!(!pool.contains(&hash1));
        assert!(pool.contains(&hash2));
    }

    #[test]
    fn test_clear() {
        let mut pool = default_pool();
        let sk1 = SigningKey::generate(&mut OsRng);
        let sk2 = SigningKey::generate(&mut OsRng);
        pool.add_transaction(make_real_signed_tx(&sk1, [2u8; 32], 100, 0), false, 0)
            .unwrap();
        pool.add_transaction(make_real_signed_tx(&sk2, [3u8; 32], 200, 0), false, 0)
            .unwrap();
        assert_eq!(pool.pending_count(), 2);

        pool.clear();
        assert_eq!(pool.pending_count(), 0);
    }

    #[test]
    fn test_reject_zero_sender() {
        let mut pool = default_pool();
        let tx = make_tx([0u8; 32], [2u8; 32], 100, 0);
        let err = pool.add_transaction(tx, false, 0).unwrap_err();
        assert!(matches!(err, MempoolError::InvalidTransaction(_)));
    }

    #[test]
    fn test_reject_empty_signature() {
        let mut pool = default_pool();
        let mut tx = make_tx([1u8; 32], [2u8; 32], 100, 0);
        tx.signature = vec![];
        let err = pool.add_transaction(tx, false, 0).unwrap_err();
        assert!(matches!(err, MempoolError::InvalidTransaction(_)));
    }

    #[test]
    fn test_reject_invalid_signature() {
        let mut pool = default_pool();
        let sk = SigningKey::generate(&mut OsRng);
        let mut tx = make_real_signed_tx(&sk, [2u8; 32], 100, 0);
        tx.amount = 999;
        let err = pool.add_transaction(tx, false, 0).unwrap_err();
        assert_eq!(err, MempoolError::InvalidSignature);
    }

    #[test]
    fn test_reject_oversize() {
        let mut pool = TransactionPool::new(MempoolConfig {
            max_tx_bytes: 32,
            ..MempoolConfig::default()
        });
        let sk = SigningKey::generate(&mut OsRng);
        let mut tx = Transaction {
            from: sk.verifying_key().to_bytes(),
            to: [2u8; 32],
            amount: 100,
            nonce: 0,
            signature: vec![],
            data: vec![0xAB; 500],
            gas_limit: 21_000,
            gas_price: 1,
        };
        tx.sign(&sk);
        let err = pool.add_transaction(tx, false, 0).unwrap_err();
        assert!(matches!(err, MempoolError::TransactionTooLarge { .. }));
    }

    #[test]
    fn test_reject_over_block_gas_limit() {
        let mut pool = TransactionPool::new(MempoolConfig {
            block_gas_limit: 21_000,
            ..MempoolConfig::default()
        });
        let sk = SigningKey::generate(&mut OsRng);
        let mut tx = Transaction {
            from: sk.verifying_key().to_bytes(),
            to: [2u8; 32],
            amount: 100,
            nonce: 0,
            signature: vec![],
            data: vec![],
            gas_limit: 50_000,
            gas_price: 1,
        };
        tx.sign(&sk);
        let err = pool.add_transaction(tx, false, 0).unwrap_err();
        assert!(matches!(err, MempoolError::GasLimitExceeded { .. }));
    }

    #[test]
    fn test_pending_orders_by_nonce_per_sender() {
        let mut pool = default_pool();
        let sk1 = SigningKey::generate(&mut OsRng);
        let sk2 = SigningKey::generate(&mut OsRng);

        pool.add_transaction(make_real_signed_tx(&sk1, [9u8; 32], 10, 1), false, 0)
            .unwrap();
        pool.add_transaction(make_real_signed_tx(&sk1, [9u8; 32], 10, 0), false, 0)
            .unwrap();
        pool.add_transaction(make_real_signed_tx(&sk2, [9u8; 32], 10, 0), false, 0)
            .unwrap();

        let mut state = StateDB::new();
        state.set_account(sk1.verifying_key().to_bytes(), AccountState::new(10_000));
        state.set_account(sk2.verifying_key().to_bytes(), AccountState::new(10_000));

        let ready = pool.pending(10, &state);
        assert_eq!(ready.len(), 3);
        assert_eq!(ready[0].from, sk1.verifying_key().to_bytes());
        assert_eq!(ready[0].nonce, 0);
        assert_eq!(ready[1].from, sk1.verifying_key().to_bytes());
        assert_eq!(ready[1].nonce, 1);
    }

    #[test]
    fn test_pending_stops_at_nonce_gap() {
        let mut pool = default_pool();
        let sk = SigningKey::generate(&mut OsRng);

        pool.add_transaction(make_real_signed_tx(&sk, [9u8; 32], 10, 0), false, 0)
            .unwrap();
        pool.add_transaction(make_real_signed_tx(&sk, [9u8; 32], 10, 2), false, 0)
            .unwrap();

        let mut state = StateDB::new();
        state.set_account(sk.verifying_key().to_bytes(), AccountState::new(10_000));

        let ready = pool.pending(10, &state);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].nonce, 0);
    }

    #[test]
    fn test_pending_stops_when_balance_exhausted() {
        let mut pool = default_pool();
        let sk = SigningKey::generate(&mut OsRng);

        pool.add_transaction(make_real_signed_tx(&sk, [9u8; 32], 800, 0), false, 0)
            .unwrap();
        pool.add_transaction(make_real_signed_tx(&sk, [9u8; 32], 800, 1), false, 0)
            .unwrap();

        let mut state = StateDB::new();
        state.set_account(sk.verifying_key().to_bytes(), AccountState::new(1_000));

        let ready = pool.pending(10, &state);
        // First tx costs 800 + 21_000*1 gas = 21_800 > balance of 1_000, so even
        // the first transaction cannot be afforded.
        assert_eq!(ready.len(), 0);
    }

    #[test]
    fn test_pending_respects_limit_across_senders() {
        let mut pool = default_pool();
        let sk1 = SigningKey::generate(&mut OsRng);
        let sk2 = SigningKey::generate(&mut OsRng);
        pool.add_transaction(make_real_signed_tx(&sk1, [9u8; 32], 1, 0), false, 0)
            .unwrap();
        pool.add_transaction(make_real_signed_tx(&sk2, [9u8; 32], 1, 0), false, 0)
            .unwrap();

        let mut state = StateDB::new();
        state.set_account(sk1.verifying_key().to_bytes(), AccountState::new(10_000));
        state.set_account(sk2.verifying_key().to_bytes(), AccountState::new(10_000));

        let ready = pool.pending(1, &state);
        assert_eq!(ready.len(), 1);
    }

    #[test]
    fn test_pending_zero_limit_returns_empty() {
        let mut pool = default_pool();
        let sk = SigningKey::generate(&mut OsRng);
        pool.add_transaction(make_real_signed_tx(&sk, [9u8; 32], 1, 0), false, 0)
            .unwrap();

        let mut state = StateDB::new();
        state.set_account(sk.verifying_key().to_bytes(), AccountState::new(10_000));

        let ready = pool.pending(0, &state);
        assert!(ready.is_empty(), "a zero limit must return no transactions");
    }

    #[test]
    fn test_reset_evicts_stale_nonces() {
        let mut pool = default_pool();
        let sk = SigningKey::generate(&mut OsRng);
        pool.add_transaction(make_real_signed_tx(&sk, [9u8; 32], 1, 0), false, 0)
            .unwrap();
        pool.add_transaction(make_real_signed_tx(&sk, [9u8; 32], 1, 1), false, 0)
            .unwrap();
        assert_eq!(pool.pending_count(), 2);

        let mut state = StateDB::new();
        let mut account = AccountState::new(10_000);
        account.nonce = 1;
        state.set_account(sk.verifying_key().to_bytes(), account);

        pool.reset(&state);
        assert_eq!(pool.pending_count(), 1);
    }

    #[test]
    fn test_evict_expired_removes_stale_nonlocal_tx() {
        let mut pool = TransactionPool::new(MempoolConfig {
            tx_lifetime_secs: 100,
            ..MempoolConfig::default()
        });
        let sk = SigningKey::generate(&mut OsRng);
        pool.add_transaction(make_real_signed_tx(&sk, [9u8; 32], 1, 0), false, 0)
            .unwrap();

        pool.evict_expired(50);
        assert_eq!(pool.pending_count(), 1);

        pool.evict_expired(201);
        assert_eq!(pool.pending_count(), 0);
    }

    #[test]
    fn test_evict_expired_exempts_local_tx() {
        let mut pool = TransactionPool::new(MempoolConfig {
            tx_lifetime_secs: 100,
            ..MempoolConfig::default()
        });
        let sk = SigningKey::generate(&mut OsRng);
        pool.add_transaction(make_real_signed_tx(&sk, [9u8; 32], 1, 0), true, 0)
            .unwrap();

        pool.evict_expired(10_000);
        assert_eq!(pool.pending_count(), 1);
    }

    #[test]
    fn test_evict_fifo_when_over_capacity() {
        let mut pool = TransactionPool::new(MempoolConfig {
            max_size: 2,
            tx_lifetime_secs: 1_000_000,
            ..MempoolConfig::default()
        });
        let sk1 = SigningKey::generate(&mut OsRng);
        let sk2 = SigningKey::generate(&mut OsRng);
        let sk3 = SigningKey::generate(&mut OsRng);

        pool.add_transaction(make_real_signed_tx(&sk1, [9u8; 32], 1, 0), false, 0)
            .unwrap();
        pool.add_transaction(make_real_signed_tx(&sk2, [9u8; 32], 1, 0), false, 5)
            .unwrap();
        // Directly push a third transaction past the configured max_size to
        // exercise eviction without add_transaction's own capacity check.
        pool.total_count += 1;
        pool.by_sender
            .entry(sk3.verifying_key().to_bytes())
            .or_default()
            .push(PendingTransaction::new(
                make_real_signed_tx(&sk3, [9u8; 32], 1, 0),
                10,
                false,
            ));

        assert_eq!(pool.pending_count(), 3);
        pool.evict_expired(10);
        assert_eq!(pool.pending_count(), 2);
    }

    impl TransactionPool {
        /// Test helper: run admission checks without committing, so a
        /// rejection can be asserted without mutating pool state.
        fn clone_config_add(&self, tx: Transaction, local: bool) -> Result<[u8; 32], MempoolError> {
            let mut scratch = TransactionPool::new(self.config.clone());
            scratch.add_transaction(tx, local, 0)
        }
    }
}
