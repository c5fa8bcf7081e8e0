use reqwest::StatusCode;
use serde_json::{json, Value};
use vault_api_integration::harness::TestHarness;
use vault_common::keys;
use vault_common::transaction::{Transaction, TransactionKind, TransactionStatus};
use vault_common::wallet::Wallet;

/// Fresh wallet has a valid phrase, one address and nothing in it.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_wallet_starts_empty() {
    let h = TestHarness::setup().await;
    let resp = h.post("/api/wallet", json!({})).await;
    assert_eq!(resp.body["currentAddress"], resp.body["addresses"][0]);

    let wallet: Wallet = resp.ok();
    assert_eq!(wallet.id.0, 1);
    assert_eq!(wallet.balance, 0);
    assert_eq!(wallet.lightning_balance, 0);
    assert!(!wallet.lightning_enabled);
    assert!(keys::validate_mnemonic(&wallet.mnemonic));
}

/// POST /api/wallet replaces the previous wallet and its history.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_wallet_replaces_existing() {
    let h = TestHarness::setup().await;
    let first = h.funded_wallet(10_000).await;
    let second: Wallet = h.post("/api/wallet", json!({})).await.ok();

    assert_eq!(second.id, first.id);
    assert_ne!(second.mnemonic, first.mnemonic);
    assert_eq!(second.balance, 0);
    let txs: Vec<Transaction> = h
        .get(&format!("/api/wallet/{}/transactions", second.id))
        .await
        .ok();
    assert!(txs.is_empty());
}

/// Example flow: deposit 100000, send 50000 with fee 1000 → 49000 left.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn send_debits_amount_and_fee() {
    let h = TestHarness::setup().await;
    let wallet = h.funded_wallet(100_000).await;
    assert_eq!(wallet.balance, 100_000);

    let address = keys::generate_address();
    let tx: Transaction = h
        .post(
            &format!("/api/wallet/{}/send", wallet.id),
            json!({ "address": address, "amount": 50_000, "fee": 1_000 }),
        )
        .await
        .ok();
    assert_eq!(tx.kind, TransactionKind::Send);
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.address, address);

    assert_eq!(h.wallet(&wallet).await.balance, 49_000);

    let txs: Vec<Transaction> = h
        .get(&format!("/api/wallet/{}/transactions", wallet.id))
        .await
        .ok();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0], tx, "newest first");
    assert_eq!(txs[1].kind, TransactionKind::Receive);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overdraft_is_rejected() {
    let h = TestHarness::setup().await;
    let wallet = h.funded_wallet(10_000).await;

    let resp = h
        .post(
            &format!("/api/wallet/{}/send", wallet.id),
            json!({ "address": keys::generate_address(), "amount": 10_000, "fee": 1 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.message().contains("insufficient balance"));

    assert_eq!(h.wallet(&wallet).await.balance, 10_000);
    let txs: Vec<Value> = h
        .get(&format!("/api/wallet/{}/transactions", wallet.id))
        .await
        .ok();
    assert_eq!(txs.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_wallet_is_404() {
    let h = TestHarness::setup().await;
    let resp = h.get("/api/wallet/1").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.message(), "wallet 1 not found");

    let resp = h
        .post(
            "/api/wallet/1/send",
            json!({ "address": keys::generate_address(), "amount": 1, "fee": 0 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn restore_validates_phrase() {
    let h = TestHarness::setup().await;

    let resp = h
        .post("/api/wallet/restore", json!({ "mnemonic": "abandon ability able" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(h.get("/api/wallet/1").await.status, StatusCode::NOT_FOUND);

    let phrase = keys::generate_mnemonic();
    let wallet: Wallet = h
        .post("/api/wallet/restore", json!({ "mnemonic": phrase }))
        .await
        .ok();
    assert_eq!(wallet.mnemonic, phrase);
    assert_eq!(wallet.balance, 0);
}

/// Restoring over a live wallet fails until the user logs out.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn restore_requires_logout() {
    let h = TestHarness::setup().await;
    h.funded_wallet(5_000).await;
    let phrase = keys::generate_mnemonic();

    let resp = h
        .post("/api/wallet/restore", json!({ "mnemonic": phrase }))
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = h.delete("/api/wallet").await;
    assert!(resp.status.is_success());
    assert_eq!(h.get("/api/wallet/1").await.status, StatusCode::NOT_FOUND);

    let wallet: Wallet = h
        .post("/api/wallet/restore", json!({ "mnemonic": phrase }))
        .await
        .ok();
    assert_eq!(wallet.id.0, 1);
    assert_eq!(wallet.balance, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn new_address_is_appended() {
    let h = TestHarness::setup().await;
    let wallet = h.funded_wallet(0).await;
    let rotated: Wallet = h
        .post(&format!("/api/wallet/{}/address", wallet.id), json!({}))
        .await
        .ok();
    assert_eq!(rotated.addresses.len(), 2);
    assert_eq!(rotated.addresses[0], wallet.current_address);
    assert_eq!(rotated.addresses[1], rotated.current_address);
    assert!(keys::validate_address(&rotated.current_address));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fee_estimate() {
    let h = TestHarness::setup().await;
    let resp = h.get("/api/fee-estimate?amount=250000").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["fee"], 2_500);
    assert_eq!(resp.body["amountBtc"], "0.00250000");

    let resp = h.get("/api/fee-estimate?amount=5000").await;
    assert_eq!(resp.body["fee"], 1_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_reports_gateway() {
    let h = TestHarness::setup().await;
    let resp = h.get("/health").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "ok");
    assert_eq!(resp.body["gateway"], "lnbits");
}

/// Malformed bodies, paths and queries come back as JSON 400s like any other bad input.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_requests_are_invalid_input() {
    let h = TestHarness::setup().await;
    let wallet = h.funded_wallet(10_000).await;

    let resp = h
        .post(
            &format!("/api/wallet/{}/send", wallet.id),
            json!({ "address": keys::generate_address(), "amount": "abc", "fee": 0 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.message().starts_with("invalid input"), "{}", resp.body);
    assert_eq!(h.wallet(&wallet).await.balance, 10_000);

    let resp = h.get("/api/wallet/abc").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.message().starts_with("invalid input"), "{}", resp.body);

    let resp = h.get("/api/fee-estimate").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.message().starts_with("invalid input"), "{}", resp.body);
}
