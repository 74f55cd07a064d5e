use meridian_bft::block::Transaction;

use crate::types::{MempoolConfig, MempoolError};

/// Basic structural validation of a transaction, independent of pool config.
pub fn validate_transaction(tx: &Transaction) -> Result<(), MempoolError> {
    if tx.from == [0u8; 32] {
        return Err(MempoolError::InvalidTransaction(
            "sender cannot be zero address".into(),
        ));
    }

    if tx.signature.is_empty() {
        return Err(MempoolError::InvalidTransaction(
            "signature cannot be empty".into(),
        ));
    }

    Ok(())
}

/// Reject a transaction whose serialized size exceeds `config.max_tx_bytes`.
pub fn validate_size(tx: &Transaction, config: &MempoolConfig) -> Result<(), MempoolError> {
    let size = bincode::serialize(tx)
        .expect("transaction serialization should never fail")
        .len();
    if size > config.max_tx_bytes {
        return Err(MempoolError::TransactionTooLarge {
            size,
            max: config.max_tx_bytes,
        });
    }
    Ok(())
}

/// Reject a transaction whose declared gas exceeds the block gas limit.
pub fn validate_gas_limit(tx: &Transaction, config: &MempoolConfig) -> Result<(), MempoolError> {
    if tx.gas_limit > config.block_gas_limit {
        return Err(MempoolError::GasLimitExceeded {
            limit: tx.gas_limit,
            max: config.block_gas_limit,
        });
    }
    Ok(())
}

/// Verify the transaction's ed25519 signature, delegating to the canonical
/// signing-message format used by block execution (`Transaction::sign`) so
/// the mempool never disagrees with consensus about what was actually signed.
pub fn verify_signature(tx: &Transaction) -> Result<(), MempoolError> {
    if tx.verify_signature() {
        Ok(())
    } else {
        Err(MempoolError::InvalidSignature)
    }
}

/// Reject a non-exempt transaction whose gas price falls below the floor.
/// `exempt` is true for local submissions unless `no_locals` disables the
/// exemption.
pub fn validate_gas_price(
    tx: &Transaction,
    config: &MempoolConfig,
    exempt: bool,
) -> Result<(), MempoolError> {
    if exempt {
        return Ok(());
    }
    if tx.gas_price < config.min_gas_price {
        return Err(MempoolError::GasPriceTooLow {
            price: tx.gas_price,
            min: config.min_gas_price,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    fn make_signed_tx(signing_key: &SigningKey, to: [u8; 32], amount: u64, nonce: u64) -> Transaction {
        let from: [u8; 32] = signing_key.verifying_key().to_bytes();
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

    #[test]
    fn test_validate_zero_sender() {
        let tx = Transaction {
            from: [0u8; 32],
            to: [2u8; 32],
            amount: 100,
            nonce: 0,
            signature: vec![0u8; 64],
            data: vec![],
            gas_limit: 21_000,
            gas_price: 1,
        };
        let err = validate_transaction(&tx).unwrap_err();
        assert!(matches!(err, MempoolError::InvalidTransaction(_)));
    }

    #[test]
    fn test_validate_empty_signature() {
        let tx = Transaction {
            from: [1u8; 32],
            to: [2u8; 32],
            amount: 100,
            nonce: 0,
            signature: vec![],
            data: vec![],
            gas_limit: 21_000,
            gas_price: 1,
        };
        let err = validate_transaction(&tx).unwrap_err();
        assert!(matches!(err, MempoolError::InvalidTransaction(_)));
    }

    #[test]
    fn test_validate_valid_tx() {
        let tx = Transaction {
            from: [1u8; 32],
            to: [2u8; 32],
            amount: 100,
            nonce: 0,
            signature: vec![0u8; 64],
            data: vec![],
            gas_limit: 21_000,
            gas_price: 1,
        };
        assert!(validate_transaction(&tx).is_ok());
    }

    #[test]
    fn test_verify_signature_valid() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let tx = make_signed_tx(&signing_key, [2u8; 32], 100, 0);
        assert!(verify_signature(&tx).is_ok());
    }

    #[test]
    fn test_verify_signature_tampered_amount() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let mut tx = make_signed_tx(&signing_key, [2u8; 32], 100, 0);
        tx.amount = 999;
        assert!(matches!(
            verify_signature(&tx),
            Err(MempoolError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_signature_wrong_key() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let other_key = SigningKey::generate(&mut OsRng);
        let mut tx = make_signed_tx(&signing_key, [2u8; 32], 100, 0);
        tx.from = other_key.verifying_key().to_bytes();
        assert!(matches!(
            verify_signature(&tx),
            Err(MempoolError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_signature_bad_length() {
        let tx = Transaction {
            from: [1u8; 32],
            to: [2u8; 32],
            amount: 100,
            nonce: 0,
            signature: vec![0u8; 32],
            data: vec![],
            gas_limit: 21_000,
            gas_price: 1,
        };
        assert!(matches!(
            verify_signature(&tx),
            Err(MempoolError::InvalidSignature)
        ));
    }

    #[test]
    fn test_validate_size_rejects_oversize() {
        let config = MempoolConfig {
            max_tx_bytes: 32,
            ..MempoolConfig::default()
        };
        let tx = Transaction {
            from: [1u8; 32],
            to: [2u8; 32],
            amount: 100,
            nonce: 0,
            signature: vec![0u8; 64],
            data: vec![0xAB; 200],
            gas_limit: 21_000,
            gas_price: 1,
        };
        assert!(matches!(
            validate_size(&tx, &config),
            Err(MempoolError::TransactionTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_gas_limit_rejects_over_block_limit() {
        let config = MempoolConfig {
            block_gas_limit: 21_000,
            ..MempoolConfig::default()
        };
        let tx = Transaction {
            from: [1u8; 32],
            to: [2u8; 32],
            amount: 100,
            nonce: 0,
            signature: vec![0u8; 64],
            data: vec![],
            gas_limit: 50_000,
            gas_price: 1,
        };
        assert!(matches!(
            validate_gas_limit(&tx, &config),
            Err(MempoolError::GasLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_validate_gas_price_floor() {
        let config = MempoolConfig {
            min_gas_price: 10,
            ..MempoolConfig::default()
        };
        let tx = Transaction {
            from: [1u8; 32],
            to: [2u8; 32],
            amount: 100,
            nonce: 0,
            signature: vec![0u8; 64],
            data: vec![],
            gas_limit: 21_000,
            gas_price: 5,
        };
        assert!(matches!(
            validate_gas_price(&tx, &config, false),
            Err(MempoolError::GasPriceTooLow { .. })
        ));
        assert!(validate_gas_price(&tx, &config, true).is_ok());
    }
}
