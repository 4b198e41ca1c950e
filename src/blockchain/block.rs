use chrono::Utc;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use std::fmt;

use super::crypto::Canonical;
use super::transaction::Transaction;

/// A 32-byte SHA-256 block digest, rendered as 64 lowercase hex characters
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHash(pub [u8; 32]);

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(D::Error::custom)?;
        let digest: [u8; 32] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("expected a 32-byte hex digest"))?;

        Ok(BlockHash(digest))
    }
}

/// A sealed batch of transactions in the chain.
///
/// The block's own hash is never stored; it is recomputed from the canonical
/// serialization of the fields below, in this exact order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// Proof-of-work nonce
    pub nonce: u64,

    /// Hash of the previous block
    #[schema(value_type = String, example = "000d5f3d1f2c9a14c4b0a7e8c2d1b0a9f8e7d6c5b4a3928170605040302010ff")]
    pub previous_hash: BlockHash,

    /// Unix timestamp in nanoseconds, assigned at construction
    pub timestamp: i64,

    /// Transactions sealed into this block
    pub transactions: Vec<Transaction>,
}

impl Canonical for Block {}

impl Block {
    /// Creates a new block with the current wall-clock timestamp
    pub fn new(nonce: u64, previous_hash: BlockHash, transactions: Vec<Transaction>) -> Self {
        Block {
            nonce,
            previous_hash,
            timestamp: now_nanos(),
            transactions,
        }
    }

    /// Creates a candidate block with a zero timestamp.
    ///
    /// Proof-of-work validation hashes this deterministic form, so any party
    /// can recompute the same digest for the same nonce and transactions.
    pub fn candidate(nonce: u64, previous_hash: BlockHash, transactions: Vec<Transaction>) -> Self {
        Block {
            nonce,
            previous_hash,
            timestamp: 0,
            transactions,
        }
    }

    /// Computes the SHA-256 digest of the block's canonical serialization
    pub fn hash(&self) -> serde_json::Result<BlockHash> {
        let bytes = self.canonical_bytes()?;

        Ok(BlockHash(Sha256::digest(&bytes).into()))
    }
}

fn now_nanos() -> i64 {
    // Saturates for dates that no longer fit in i64 nanoseconds (year 2262).
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
