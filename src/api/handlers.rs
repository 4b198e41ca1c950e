use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{
    crypto, Address, Block, BlockchainError, LedgerRepository, Transaction, Wallet,
    DEFAULT_LEDGER_KEY,
};

/// Shared ledger repository handed to every handler
pub type RepositoryData = web::Data<LedgerRepository>;

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The number of blocks in the chain
    pub length: usize,

    /// The blocks in the chain
    pub chain: Vec<Block>,

    /// Whether the hash-chaining invariant holds
    pub is_valid: bool,
}

/// Response for the pending transactions endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct PendingTransactionsResponse {
    /// Copies of the transactions awaiting inclusion in a block
    pub transactions: Vec<Transaction>,

    /// The number of pending transactions
    pub length: usize,
}

/// Request for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The sender's private key (hex encoded scalar)
    pub sender_private_key: String,

    /// The sender's public key (128 hex characters, X‖Y)
    pub sender_public_key: String,

    /// The sender's address
    pub sender_blockchain_address: String,

    /// The recipient's address
    pub recipient_blockchain_address: String,

    /// The amount to transfer
    pub value: f64,
}

/// Response for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    /// The message
    pub message: String,
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub message: String,

    /// The newly sealed block
    pub block: Block,
}

/// Response for the create wallet endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    /// The wallet's private key (hex encoded)
    pub private_key: String,

    /// The wallet's public key (128 hex characters, X‖Y)
    pub public_key: String,

    /// The wallet's derived address
    pub address: String,
}

/// Response for the balance endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    /// The address queried
    pub address: String,

    /// The balance computed from the full chain
    pub amount: f64,
}

/// Get the full chain state
///
/// Returns every block in the ledger and its validity status
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    responses(
        (status = 200, description = "Chain retrieved successfully", body = ChainResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_chain(repository: RepositoryData) -> impl Responder {
    let ledger = match repository.get_or_create(DEFAULT_LEDGER_KEY) {
        Ok(ledger) => ledger,
        Err(err) => return internal_error(err),
    };

    let ledger = ledger.read().unwrap();
    let chain = ledger.chain().to_vec();
    let is_valid = match ledger.is_valid() {
        Ok(is_valid) => is_valid,
        Err(err) => return internal_error(err),
    };

    HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        chain,
        is_valid,
    })
}

/// Get all pending transactions
///
/// Returns copies of the transactions waiting to be sealed into a block
#[utoipa::path(
    get,
    path = "/api/v1/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions retrieved successfully", body = PendingTransactionsResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_pending_transactions(repository: RepositoryData) -> impl Responder {
    let ledger = match repository.get_or_create(DEFAULT_LEDGER_KEY) {
        Ok(ledger) => ledger,
        Err(err) => return internal_error(err),
    };

    let transactions = ledger.read().unwrap().copy_transaction_pool();

    HttpResponse::Ok().json(PendingTransactionsResponse {
        length: transactions.len(),
        transactions,
    })
}

/// Create a new transaction
///
/// Signs the transfer with the supplied key pair and submits it to the ledger
#[utoipa::path(
    post,
    path = "/api/v1/transactions/new",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction admitted to the pending pool", body = TransactionResponse),
        (status = 400, description = "Malformed key material or failed signature verification"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn new_transaction(
    repository: RepositoryData,
    request: web::Json<TransactionRequest>,
) -> impl Responder {
    // Format errors are reported before any cryptographic operation.
    let public_key = match crypto::public_key_from_hex(&request.sender_public_key) {
        Ok(key) => key,
        Err(err) => return bad_request(err),
    };

    let private_key = match crypto::private_key_from_hex(&request.sender_private_key) {
        Ok(key) => key,
        Err(err) => return bad_request(err),
    };

    let sender = Address(request.sender_blockchain_address.clone());
    let recipient = Address(request.recipient_blockchain_address.clone());

    let transaction = Transaction::new(sender.clone(), recipient.clone(), request.value);
    let signature = match crypto::sign(&transaction, &private_key) {
        Ok(signature) => signature,
        Err(err) => return bad_request(err),
    };

    let ledger = match repository.get_or_create(DEFAULT_LEDGER_KEY) {
        Ok(ledger) => ledger,
        Err(err) => return internal_error(err),
    };

    let result = ledger.write().unwrap().add_transaction(
        &sender,
        &recipient,
        request.value,
        &public_key,
        &signature,
    );

    match result {
        Ok(()) => HttpResponse::Created().json(TransactionResponse {
            message: "Transaction will be added to the next block".to_string(),
        }),
        Err(err @ BlockchainError::InvalidSignature) => bad_request(err),
        Err(err) => internal_error(err),
    }
}

/// Mine a new block
///
/// Seals all pending transactions plus the mining reward into a new block
#[utoipa::path(
    post,
    path = "/api/v1/mine",
    responses(
        (status = 200, description = "Block mined successfully", body = MineResponse),
        (status = 400, description = "No pending transactions to mine"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn mine_block(repository: RepositoryData) -> impl Responder {
    let ledger = match repository.get_or_create(DEFAULT_LEDGER_KEY) {
        Ok(ledger) => ledger,
        Err(err) => return internal_error(err),
    };

    let result = ledger.write().unwrap().mine();

    match result {
        Ok(block) => HttpResponse::Ok().json(MineResponse {
            message: "New block mined".to_string(),
            block,
        }),
        Err(err @ BlockchainError::NothingToMine) => bad_request(err),
        Err(err) => internal_error(err),
    }
}

/// Create a new wallet
///
/// Generates a key pair and its derived address; nothing is persisted
///
/// The private key must be stored by the caller
#[utoipa::path(
    post,
    path = "/api/v1/wallet/new",
    responses(
        (status = 201, description = "Wallet created successfully", body = WalletResponse)
    )
)]
pub async fn create_wallet() -> impl Responder {
    let wallet = Wallet::new();

    HttpResponse::Created().json(WalletResponse {
        private_key: wallet.private_key_hex(),
        public_key: wallet.public_key_hex(),
        address: wallet.address().to_string(),
    })
}

/// Get the balance of an address
///
/// Computes the balance by a full scan of the chain
#[utoipa::path(
    get,
    path = "/api/v1/wallet/balance/{address}",
    responses(
        (status = 200, description = "Balance retrieved successfully", body = BalanceResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_balance(repository: RepositoryData, address: web::Path<String>) -> impl Responder {
    let ledger = match repository.get_or_create(DEFAULT_LEDGER_KEY) {
        Ok(ledger) => ledger,
        Err(err) => return internal_error(err),
    };

    let address = Address(address.into_inner());
    let amount = ledger.read().unwrap().calculate_total_amount(&address);

    HttpResponse::Ok().json(BalanceResponse {
        address: address.0,
        amount,
    })
}

fn bad_request(err: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": err.to_string()
    }))
}

fn internal_error(err: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": err.to_string()
    }))
}
