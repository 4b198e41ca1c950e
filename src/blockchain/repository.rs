use dashmap::DashMap;
use log::info;

use std::sync::{Arc, RwLock};

use super::chain::{Blockchain, BlockchainError};
use super::crypto::Wallet;

/// Tenant key used by the single-ledger deployment.
pub const DEFAULT_LEDGER_KEY: &str = "blockchain";

/// Keyed in-memory store of ledger instances.
///
/// Each ledger sits behind its own `RwLock`: `add_transaction` and `mine`
/// take the write lock, read-only operations share the read lock. The
/// repository is constructed explicitly and passed to its consumers; there
/// is no process-wide singleton.
#[derive(Debug, Default)]
pub struct LedgerRepository {
    ledgers: DashMap<String, Arc<RwLock<Blockchain>>>,
}

impl LedgerRepository {
    pub fn new() -> Self {
        LedgerRepository {
            ledgers: DashMap::new(),
        }
    }

    /// Fetches the ledger for `key`, creating it on first access.
    ///
    /// A freshly created ledger gets its own miner wallet; that wallet's
    /// address receives the rewards for every block mined on the ledger.
    pub fn get_or_create(&self, key: &str) -> Result<Arc<RwLock<Blockchain>>, BlockchainError> {
        if let Some(ledger) = self.ledgers.get(key) {
            return Ok(ledger.clone());
        }

        let miner_wallet = Wallet::new();
        info!(
            "Created ledger {:?} with miner address {}",
            key,
            miner_wallet.address()
        );

        let ledger = Arc::new(RwLock::new(Blockchain::new(miner_wallet.address().clone())?));

        Ok(self.ledgers.entry(key.to_string()).or_insert(ledger).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_returns_same_ledger() {
        let repository = LedgerRepository::new();

        let first = repository.get_or_create("tenant").unwrap();
        let second = repository.get_or_create("tenant").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_distinct_keys_get_distinct_ledgers() {
        let repository = LedgerRepository::new();

        let a = repository.get_or_create("a").unwrap();
        let b = repository.get_or_create("b").unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(
            a.read().unwrap().miner_address(),
            b.read().unwrap().miner_address()
        );
    }
}
