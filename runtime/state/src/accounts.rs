use serde::{Deserialize, Serialize};

use crate::types::StateError;

/// Per-account state: balance and nonce.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountState {
    pub balance: u64,
    pub nonce: u64,
}

impl AccountState {
    /// Create a new account with the given balance and nonce 0.
    pub fn new(balance: u64) -> Self {
        Self { balance, nonce: 0 }
    }

    /// Subtract `amount` from balance. Fails if insufficient.
    pub fn debit(&mut self, amount: u64) -> Result<(), StateError> {
        if self.balance < amount {
            return Err(StateError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Add `amount` to balance. Fails on overflow.
    pub fn credit(&mut self, amount: u64) -> Result<(), StateError> {
        self.balance = self.balance.checked_add(amount).ok_or(StateError::Overflow)?;
        Ok(())
    }

    /// Increment the nonce by 1.
    pub fn increment_nonce(&mut self) {
        self.nonce += 1;
    }
}
