use log::info;
use p256::ecdsa::VerifyingKey;
use thiserror::Error;

use super::block::{Block, BlockHash};
use super::crypto::{verify, Address, CryptoError, TransactionSignature};
use super::transaction::Transaction;

/// Reserved sender identity for mining rewards; not a real key holder, so
/// transactions from it bypass signature verification.
pub const MINING_SENDER: &str = "THE BLOCKCHAIN";

/// Amount credited to the miner's address for each sealed block.
pub const MINING_REWARD: f64 = 1.0;

/// Leading zero hex characters a block hash must have to seal a block.
pub const MINING_DIFFICULTY: usize = 3;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Invalid transaction signature")]
    InvalidSignature,

    #[error("No pending transactions to mine")]
    NothingToMine,

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The ledger: an append-only chain of blocks plus the pool of admitted,
/// not-yet-sealed transactions.
///
/// All methods run synchronously on the calling thread. A deployment that
/// shares one instance across concurrent callers must wrap it in an external
/// lock (see [`super::repository::LedgerRepository`]); mutators and readers
/// keep no hidden state that would break under that discipline.
#[derive(Debug, Clone)]
pub struct Blockchain {
    chain: Vec<Block>,
    transaction_pool: Vec<Transaction>,
    miner_address: Address,
    difficulty: usize,
}

impl Blockchain {
    /// Creates a ledger with a genesis block.
    ///
    /// The genesis block carries nonce 0, no transactions, and the hash of
    /// the zero-valued block as its previous hash. Rewards for blocks mined
    /// on this ledger are credited to `miner_address`.
    pub fn new(miner_address: Address) -> Result<Self, BlockchainError> {
        let initial_hash = Block::candidate(0, BlockHash::default(), Vec::new()).hash()?;

        let mut blockchain = Blockchain {
            chain: Vec::new(),
            transaction_pool: Vec::new(),
            miner_address,
            difficulty: MINING_DIFFICULTY,
        };
        blockchain.chain.push(Block::new(0, initial_hash, Vec::new()));

        Ok(blockchain)
    }

    /// Gets the address credited with mining rewards
    pub fn miner_address(&self) -> &Address {
        &self.miner_address
    }

    /// Gets the blocks in the chain, genesis first
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> &Block {
        // The chain is never empty: a genesis block is pushed at construction.
        self.chain.last().expect("chain must never be empty")
    }

    /// Verifies and admits a transaction into the pending pool.
    ///
    /// A fresh [`Transaction`] is constructed from the arguments; the
    /// caller's values cannot alias anything the ledger holds. Transactions
    /// from the reserved [`MINING_SENDER`] identity skip verification.
    pub fn add_transaction(
        &mut self,
        sender: &Address,
        recipient: &Address,
        amount: f64,
        sender_public_key: &VerifyingKey,
        signature: &TransactionSignature,
    ) -> Result<(), BlockchainError> {
        let transaction = Transaction::new(sender.clone(), recipient.clone(), amount);

        if sender.0 != MINING_SENDER && !verify(&transaction, signature, sender_public_key)? {
            return Err(BlockchainError::InvalidSignature);
        }

        self.transaction_pool.push(transaction);

        Ok(())
    }

    /// Returns independent copies of all pending transactions
    pub fn copy_transaction_pool(&self) -> Vec<Transaction> {
        self.transaction_pool.clone()
    }

    /// Checks whether a nonce satisfies the difficulty target.
    ///
    /// The candidate block is hashed in its deterministic zero-timestamp
    /// form and the hex rendering must start with `difficulty` zeros.
    pub fn valid_proof(
        nonce: u64,
        previous_hash: BlockHash,
        transactions: &[Transaction],
        difficulty: usize,
    ) -> Result<bool, BlockchainError> {
        let candidate = Block::candidate(nonce, previous_hash, transactions.to_vec());
        let rendered = candidate.hash()?.to_string();

        Ok(rendered.starts_with(&"0".repeat(difficulty)))
    }

    /// Searches for the smallest nonce satisfying the difficulty target.
    ///
    /// The search runs over a frozen copy of the pending pool and the hash
    /// of the current last block, so pool mutations after the snapshot
    /// cannot alter the result. Errors with [`BlockchainError::NothingToMine`]
    /// before searching if the pool is empty.
    pub fn proof_of_work(&self) -> Result<u64, BlockchainError> {
        if self.transaction_pool.is_empty() {
            return Err(BlockchainError::NothingToMine);
        }

        let transactions = self.copy_transaction_pool();
        let previous_hash = self.last_block().hash()?;

        let mut nonce = 0;
        while !Self::valid_proof(nonce, previous_hash, &transactions, self.difficulty)? {
            nonce += 1;
        }

        Ok(nonce)
    }

    /// Seals the pending pool into a new block.
    ///
    /// Runs the proof-of-work search, admits the reward transaction for the
    /// ledger's miner address, appends a block holding a copy of the pool
    /// (reward included) and clears the pool. Either the block is fully
    /// appended or, on error, nothing changes.
    pub fn mine(&mut self) -> Result<Block, BlockchainError> {
        let nonce = self.proof_of_work()?;
        let previous_hash = self.last_block().hash()?;

        let reward = Transaction::new(
            Address(MINING_SENDER.to_string()),
            self.miner_address.clone(),
            MINING_REWARD,
        );
        self.transaction_pool.push(reward);

        let block = Block::new(nonce, previous_hash, self.copy_transaction_pool());
        self.chain.push(block.clone());
        self.transaction_pool.clear();

        info!(
            "Sealed block {} with {} transactions (nonce {})",
            self.chain.len() - 1,
            block.transactions.len(),
            nonce
        );

        Ok(block)
    }

    /// Computes the balance of an address by scanning the whole chain.
    ///
    /// Amounts received add, amounts sent subtract. No balance index is
    /// kept; the chain itself is the only durable state.
    pub fn calculate_total_amount(&self, address: &Address) -> f64 {
        let mut total = 0.0;

        for block in &self.chain {
            for transaction in &block.transactions {
                if &transaction.recipient == address {
                    total += transaction.amount;
                }
                if &transaction.sender == address {
                    total -= transaction.amount;
                }
            }
        }

        total
    }

    /// Checks the hash-chaining invariant across the whole chain
    pub fn is_valid(&self) -> Result<bool, BlockchainError> {
        for i in 1..self.chain.len() {
            if self.chain[i].previous_hash != self.chain[i - 1].hash()? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
