// Ledger module
//
// This module contains the core ledger implementation including:
// - Block structure and canonical hashing
// - Blockchain structure with the pending transaction pool
// - Transaction structure
// - Cryptography utilities (keys, signatures, address derivation)
// - Proof of work algorithm
// - Keyed ledger repository

pub mod block;
pub mod chain;
pub mod crypto;
pub mod repository;
pub mod transaction;

// Re-export main components for easier access
pub use block::{Block, BlockHash};
pub use chain::{Blockchain, BlockchainError, MINING_DIFFICULTY, MINING_REWARD, MINING_SENDER};
pub use crypto::{Address, TransactionSignature, Wallet};
pub use repository::{LedgerRepository, DEFAULT_LEDGER_KEY};
pub use transaction::Transaction;
