use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::crypto::{Address, Canonical};

/// A value transfer between two addresses.
///
/// Immutable once constructed; equality is by value. The serde field names
/// are pinned because signatures and block hashes are computed over this
/// exact encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Sender's address
    #[serde(rename = "sender_blockchain_address")]
    pub sender: Address,

    /// Recipient's address
    #[serde(rename = "recipient_blockchain_address")]
    pub recipient: Address,

    /// Amount being transferred
    #[serde(rename = "value")]
    pub amount: f64,
}

impl Transaction {
    /// Creates a new transaction
    pub fn new(sender: Address, recipient: Address, amount: f64) -> Self {
        Transaction {
            sender,
            recipient,
            amount,
        }
    }
}

impl Canonical for Transaction {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction() {
        let transaction = Transaction::new(
            Address("sender".to_string()),
            Address("recipient".to_string()),
            10.5,
        );

        assert_eq!(transaction.sender.0, "sender");
        assert_eq!(transaction.recipient.0, "recipient");
        assert_eq!(transaction.amount, 10.5);
    }

    #[test]
    fn test_equality_is_by_value() {
        let a = Transaction::new(Address("a".to_string()), Address("b".to_string()), 1.0);
        let b = Transaction::new(Address("a".to_string()), Address("b".to_string()), 1.0);

        assert_eq!(a, b);
    }

    #[test]
    fn test_canonical_bytes_field_order() {
        let transaction =
            Transaction::new(Address("a".to_string()), Address("b".to_string()), 10.0);

        let bytes = transaction.canonical_bytes().unwrap();

        assert_eq!(
            bytes,
            br#"{"sender_blockchain_address":"a","recipient_blockchain_address":"b","value":10.0}"#
        );
    }

    #[test]
    fn test_canonical_bytes_deterministic() {
        let transaction =
            Transaction::new(Address("a".to_string()), Address("b".to_string()), 3.25);

        assert_eq!(
            transaction.canonical_bytes().unwrap(),
            transaction.canonical_bytes().unwrap()
        );
    }
}
