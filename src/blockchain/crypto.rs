use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::EncodedPoint;
use rand::rngs::OsRng;
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use utoipa::ToSchema;

use std::fmt;
use std::str::FromStr;

/// Version byte prepended to the RIPEMD-160 digest during address derivation.
const ADDRESS_VERSION: u8 = 0x00;

/// Number of checksum bytes appended to the versioned payload.
const ADDRESS_CHECKSUM_LEN: usize = 4;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Failed to sign message: {0}")]
    SigningError(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Canonical serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fixed, reproducible byte encoding shared by signing and hashing.
///
/// The encoding is JSON in struct declaration order, so the digest computed
/// at signing time is byte-identical to the digest recomputed at
/// verification time, on any node.
pub trait Canonical: Serialize {
    fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// A ledger account identifier derived from a public key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Address(pub String);

impl Address {
    /// Derives the Base58Check address for a public key.
    ///
    /// Pipeline: SHA-256 over the fixed-length X‖Y coordinates, RIPEMD-160
    /// over that digest, a version byte in front, a 4-byte double-SHA-256
    /// checksum behind, Base58 over the 25-byte result.
    pub fn from_public_key(public_key: &VerifyingKey) -> Self {
        let point = public_key.to_encoded_point(false);
        // Uncompressed SEC1 encoding is a 0x04 tag followed by X and Y,
        // 32 big-endian bytes each.
        let coordinates = &point.as_bytes()[1..];

        let sha = Sha256::digest(coordinates);
        let rip = Ripemd160::digest(sha);

        let mut payload = Vec::with_capacity(1 + rip.len() + ADDRESS_CHECKSUM_LEN);
        payload.push(ADDRESS_VERSION);
        payload.extend_from_slice(&rip);

        let checksum = Sha256::digest(Sha256::digest(&payload));
        payload.extend_from_slice(&checksum[..ADDRESS_CHECKSUM_LEN]);

        Address(bs58::encode(payload).into_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Address(s.to_string()))
    }
}

/// Hex wire form of an ECDSA signature: the 32-byte big-endian r and s
/// scalars concatenated, 128 lowercase hex characters in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransactionSignature(pub String);

impl TransactionSignature {
    pub fn from_signature(signature: &Signature) -> Self {
        TransactionSignature(hex::encode(signature.to_bytes()))
    }

    pub fn to_signature(&self) -> Result<Signature, CryptoError> {
        let bytes = hex::decode(&self.0).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        if bytes.len() != 64 {
            return Err(CryptoError::InvalidSignature(format!(
                "expected 64 bytes, got {}",
                bytes.len()
            )));
        }

        Signature::from_slice(&bytes).map_err(|e| CryptoError::InvalidSignature(e.to_string()))
    }
}

impl fmt::Display for TransactionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encodes a public key as 128 lowercase hex characters (X‖Y).
pub fn public_key_to_hex(public_key: &VerifyingKey) -> String {
    let point = public_key.to_encoded_point(false);
    hex::encode(&point.as_bytes()[1..])
}

/// Decodes a public key from its 128-hex-character X‖Y wire form.
///
/// Any other length is a format error, reported before the point is checked
/// against the curve.
pub fn public_key_from_hex(s: &str) -> Result<VerifyingKey, CryptoError> {
    if s.len() != 128 {
        return Err(CryptoError::InvalidPublicKey(format!(
            "expected 128 hex characters, got {}",
            s.len()
        )));
    }

    let x = decode_coordinate(&s[..64])?;
    let y = decode_coordinate(&s[64..])?;

    let point = EncodedPoint::from_affine_coordinates(&x.into(), &y.into(), false);
    VerifyingKey::from_encoded_point(&point)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

fn decode_coordinate(s: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = hex::decode(s).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey("coordinate must be 32 bytes".to_string()))
}

/// Encodes a private key scalar as lowercase hex.
pub fn private_key_to_hex(private_key: &SigningKey) -> String {
    hex::encode(private_key.to_bytes())
}

/// Decodes a private key from the hex encoding of its big-endian scalar
/// bytes. Inputs shorter than 32 bytes are left-padded; longer inputs are a
/// format error.
pub fn private_key_from_hex(s: &str) -> Result<SigningKey, CryptoError> {
    let bytes = hex::decode(s).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

    if bytes.len() > 32 {
        return Err(CryptoError::InvalidPrivateKey(format!(
            "scalar too large: {} bytes",
            bytes.len()
        )));
    }

    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(&bytes);

    SigningKey::from_bytes(&padded.into())
        .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
}

/// Signs a value's canonical byte form with ECDSA over P-256.
///
/// The per-signature nonce is derived with RFC 6979, which never repeats a
/// nonce across distinct messages under the same key.
pub fn sign<T: Canonical>(
    value: &T,
    private_key: &SigningKey,
) -> Result<TransactionSignature, CryptoError> {
    let message = value.canonical_bytes()?;

    let signature: Signature = private_key
        .try_sign(&message)
        .map_err(|e| CryptoError::SigningError(e.to_string()))?;

    Ok(TransactionSignature::from_signature(&signature))
}

/// Verifies a signature against a value's canonical byte form.
///
/// A structurally valid signature that does not match the key or the value
/// yields `Ok(false)`, never an error; malformed signature encodings fail
/// earlier in [`TransactionSignature::to_signature`].
pub fn verify<T: Canonical>(
    value: &T,
    signature: &TransactionSignature,
    public_key: &VerifyingKey,
) -> Result<bool, CryptoError> {
    let signature = signature.to_signature()?;
    let message = value.canonical_bytes()?;

    Ok(public_key.verify(&message, &signature).is_ok())
}

/// A key pair and the address derived from it at construction
#[derive(Debug, Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    address: Address,
}

impl Wallet {
    /// Creates a new wallet with a random P-256 key pair
    pub fn new() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = VerifyingKey::from(&signing_key);
        let address = Address::from_public_key(&verifying_key);

        Wallet {
            signing_key,
            verifying_key,
            address,
        }
    }

    /// Gets the wallet's address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Gets the wallet's public key
    pub fn public_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Gets the wallet's public key in its hex wire form
    pub fn public_key_hex(&self) -> String {
        public_key_to_hex(&self.verifying_key)
    }

    /// Gets the wallet's private key in its hex wire form
    pub fn private_key_hex(&self) -> String {
        private_key_to_hex(&self.signing_key)
    }

    /// Signs a value's canonical byte form with the wallet's private key
    pub fn sign<T: Canonical>(&self, value: &T) -> Result<TransactionSignature, CryptoError> {
        sign(value, &self.signing_key)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Wallet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::transaction::Transaction;

    fn transfer(amount: f64) -> Transaction {
        Transaction::new(
            Address("sender".to_string()),
            Address("recipient".to_string()),
            amount,
        )
    }

    #[test]
    fn test_wallet_creation() {
        let wallet = Wallet::new();

        assert!(!wallet.address().0.is_empty());
        assert_eq!(wallet.public_key_hex().len(), 128);
    }

    #[test]
    fn test_address_derivation_is_deterministic() {
        let wallet = Wallet::new();

        let first = Address::from_public_key(wallet.public_key());
        let second = Address::from_public_key(wallet.public_key());

        assert_eq!(first, second);
        assert_eq!(&first, wallet.address());
    }

    #[test]
    fn test_addresses_differ_between_wallets() {
        let a = Wallet::new();
        let b = Wallet::new();

        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_address_checksum() {
        let wallet = Wallet::new();

        // A version-0x00 Base58Check address starts with '1' and decodes to
        // 21 payload bytes plus a 4-byte checksum.
        assert!(wallet.address().0.starts_with('1'));

        let decoded = bs58::decode(&wallet.address().0).into_vec().unwrap();
        assert_eq!(decoded.len(), 25);
        assert_eq!(decoded[0], ADDRESS_VERSION);

        let checksum = Sha256::digest(Sha256::digest(&decoded[..21]));
        assert_eq!(&decoded[21..], &checksum[..ADDRESS_CHECKSUM_LEN]);
    }

    #[test]
    fn test_signing_and_verification() {
        let wallet = Wallet::new();
        let transaction = transfer(12.5);

        let signature = wallet.sign(&transaction).unwrap();

        assert!(verify(&transaction, &signature, wallet.public_key()).unwrap());
    }

    #[test]
    fn test_verification_fails_for_tampered_value() {
        let wallet = Wallet::new();
        let transaction = transfer(12.5);

        let signature = wallet.sign(&transaction).unwrap();
        let tampered = transfer(99.0);

        assert!(!verify(&tampered, &signature, wallet.public_key()).unwrap());
    }

    #[test]
    fn test_verification_fails_for_wrong_key() {
        let wallet = Wallet::new();
        let other = Wallet::new();
        let transaction = transfer(12.5);

        let signature = wallet.sign(&transaction).unwrap();

        assert!(!verify(&transaction, &signature, other.public_key()).unwrap());
    }

    #[test]
    fn test_public_key_hex_round_trip() {
        let wallet = Wallet::new();

        let decoded = public_key_from_hex(&wallet.public_key_hex()).unwrap();

        assert_eq!(&decoded, wallet.public_key());
    }

    #[test]
    fn test_public_key_wrong_length_rejected() {
        let err = public_key_from_hex("abcd").unwrap_err();

        assert!(matches!(err, CryptoError::InvalidPublicKey(_)));
    }

    #[test]
    fn test_private_key_hex_round_trip() {
        let wallet = Wallet::new();
        let transaction = transfer(1.0);

        let decoded = private_key_from_hex(&wallet.private_key_hex()).unwrap();
        let signature = sign(&transaction, &decoded).unwrap();

        assert!(verify(&transaction, &signature, wallet.public_key()).unwrap());
    }

    #[test]
    fn test_private_key_accepts_short_scalar() {
        // The wire form carries no fixed length; a stripped leading zero
        // still decodes to the same scalar.
        let key = private_key_from_hex("01").unwrap();

        assert_eq!(
            private_key_to_hex(&key),
            "0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_private_key_oversized_scalar_rejected() {
        let err = private_key_from_hex(&"ff".repeat(33)).unwrap_err();

        assert!(matches!(err, CryptoError::InvalidPrivateKey(_)));
    }

    #[test]
    fn test_malformed_signature_rejected_before_verification() {
        let err = TransactionSignature("zz".to_string())
            .to_signature()
            .unwrap_err();
        assert!(matches!(err, CryptoError::DecodingError(_)));

        let err = TransactionSignature("ab".repeat(10))
            .to_signature()
            .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidSignature(_)));
    }
}
