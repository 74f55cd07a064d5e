use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::accounts::AccountState;
use crate::types::{StateError, TransactionReceipt};

/// In-memory account state database.
#[derive(Debug, Clone)]
pub struct StateDB {
    accounts: HashMap<[u8; 32], AccountState>,
}

impl StateDB {
    /// Create a new, empty state database.
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// Look up an account by public key.
    pub fn get_account(&self, pubkey: &[u8; 32]) -> Option<&AccountState> {
        self.accounts.get(pubkey)
    }

    /// Look up an account mutably by public key.
    pub fn get_account_mut(&mut self, pubkey: &[u8; 32]) -> Option<&mut AccountState> {
        self.accounts.get_mut(pubkey)
    }

    /// Get an existing account or create a zero-balance one.
    pub fn get_or_create_account(&mut self, pubkey: &[u8; 32]) -> &mut AccountState {
        self.accounts
            .entry(*pubkey)
            .or_insert_with(AccountState::default)
    }

    /// Insert or overwrite an account.
    pub fn set_account(&mut self, pubkey: [u8; 32], state: AccountState) {
        self.accounts.insert(pubkey, state);
    }

    /// Apply a single transfer: validate nonce, debit sender, credit receiver,
    /// then increment sender nonce.
    pub fn apply_transfer(
        &mut self,
        from: &[u8; 32],
        to: &[u8; 32],
        amount: u64,
        expected_nonce: u64,
    ) -> Result<(), StateError> {
        // Check sender exists
        let sender = self
            .accounts
            .get(from)
            .ok_or(StateError::AccountNotFound)?;

        // Validate nonce
        if sender.nonce != expected_nonce {
            return Err(StateError::InvalidNonce {
                expected: sender.nonce,
                got: expected_nonce,
            });
        }

        // Check balance (don't mutate yet in case credit fails for self-transfers)
        if sender.balance < amount {
            return Err(StateError::InsufficientBalance {
                needed: amount,
                available: sender.balance,
            });
        }

        // Handle self-transfer: just increment nonce
        if from == to {
            let sender = self.accounts.get_mut(from).unwrap();
            sender.increment_nonce();
            return Ok(());
        }

        // Debit sender
        let sender = self.accounts.get_mut(from).unwrap();
        sender.debit(amount)?;
        sender.increment_nonce();

        // Credit receiver (create if needed)
        let receiver = self.get_or_create_account(to);
        receiver.credit(amount)?;

        Ok(())
    }

    /// Apply all transactions in a block, returning a receipt for each.
    /// Failed transactions produce a receipt with `success=false` but do not
    /// revert other successful transactions.
    pub fn apply_block(
        &mut self,
        transactions: &[meridian_bft::block::Transaction],
    ) -> Vec<TransactionReceipt> {
        let mut receipts = Vec::with_capacity(transactions.len());

        for tx in transactions {
            let tx_hash = Self::hash_transaction(tx);

            match self.apply_transfer(&tx.from, &tx.to, tx.amount, tx.nonce) {
                Ok(()) => {
                    receipts.push(TransactionReceipt {
                        tx_hash,
                        success: true,
                        fee_paid: 0,
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(
                        tx_hash = ?tx_hash,
                        error = %e,
                        "transaction failed during block execution"
                    );
                    receipts.push(TransactionReceipt {
                        tx_hash,
                        success: false,
                        fee_paid: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        receipts
    }

    /// Compute a deterministic state root by hashing sorted serialized accounts.
    pub fn compute_state_root(&self) -> [u8; 32] {
        let mut entries: Vec<_> = self.accounts.iter().collect();
        entries.sort_by_key(|(k, _)| *k);

        let mut hasher = Sha256::new();
        for (pubkey, state) in &entries {
            hasher.update(pubkey);
            let serialized =
                serde_json::to_vec(state).expect("account state serialization should never fail");
            hasher.update(&serialized);
        }

        let digest = hasher.finalize();
        let mut root = [0u8; 32];
        root.copy_from_slice(&digest);
        root
    }

    /// Number of accounts in the state.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Sum of all account balances.
    pub fn total_supply(&self) -> u64 {
        self.accounts.values().map(|a| a.balance).sum()
    }

    /// SHA-256 hash of a transaction (used for receipts).
    fn hash_transaction(tx: &meridian_bft::block::Transaction) -> [u8; 32] {
        let encoded =
            serde_json::to_vec(tx).expect("transaction serialization should never fail");
        let digest = Sha256::digest(&encoded);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        hash
    }
}

impl Default for StateDB {
    fn default() -> Self {
        Self::new()
    }
}
