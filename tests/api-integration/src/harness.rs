use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use vault_common::wallet::Wallet;
use vault_server::lnbits::{LnbitsConfig, LnbitsGateway};
use vault_server::Ledger;

use crate::fake_lnbits::{FakeLnbits, ADMIN_KEY, READ_KEY};

const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(2);

/// A wallet server wired to a fake LNbits, both on ephemeral ports.
pub struct TestHarness {
    pub base_url: String,
    pub client: reqwest::Client,
    pub lnbits: FakeLnbits,
}

/// Status and decoded JSON body of one API call.
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// Decode a successful body, panicking with the error message otherwise.
    pub fn ok<T: DeserializeOwned>(self) -> T {
        assert!(
            self.status.is_success(),
            "Expected success, got {}: {}",
            self.status,
            self.body
        );
        serde_json::from_value(self.body).expect("Response did not match expected type")
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

impl TestHarness {
    pub async fn setup() -> Self {
        Self::with_provider_timeout(DEFAULT_PROVIDER_TIMEOUT).await
    }

    pub async fn with_provider_timeout(provider_timeout: Duration) -> Self {
        crate::init_tracing();
        let lnbits = FakeLnbits::start().await;

        let gateway = LnbitsGateway::connect(LnbitsConfig {
            endpoint: lnbits.url.clone(),
            api_key: READ_KEY.to_string(),
            admin_key: ADMIN_KEY.to_string(),
            request_timeout: provider_timeout,
        })
        .expect("Failed to build LNbits gateway");
        let ledger = Arc::new(Ledger::new(Box::new(gateway), provider_timeout));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind wallet server");
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            vault_server::serve(listener, ledger)
                .await
                .expect("Wallet server failed");
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            lnbits,
        }
    }

    async fn decode(resp: reqwest::Response) -> ApiResponse {
        let status = resp.status();
        let text = resp.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        ApiResponse { status, body }
    }

    pub async fn get(&self, path: &str) -> ApiResponse {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET failed");
        Self::decode(resp).await
    }

    pub async fn post(&self, path: &str, body: Value) -> ApiResponse {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .expect("POST failed");
        Self::decode(resp).await
    }

    pub async fn delete(&self, path: &str) -> ApiResponse {
        let resp = self
            .client
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("DELETE failed");
        Self::decode(resp).await
    }

    /// Create a wallet and deposit `balance` sats into it.
    pub async fn funded_wallet(&self, balance: u64) -> Wallet {
        let wallet: Wallet = self.post("/api/wallet", serde_json::json!({})).await.ok();
        if balance > 0 {
            self.post(
                &format!("/api/wallet/{}/receive", wallet.id),
                serde_json::json!({ "amount": balance }),
            )
            .await
            .ok::<Value>();
        }
        self.wallet(&wallet).await
    }

    /// Funded wallet with Lightning on and `lightning_balance` sats moved into a channel.
    pub async fn lightning_wallet(&self, lightning_balance: u64) -> Wallet {
        let wallet = self.funded_wallet(lightning_balance).await;
        if lightning_balance > 0 {
            self.post(
                &format!("/api/wallet/{}/lightning/channels", wallet.id),
                serde_json::json!({
                    "capacity": lightning_balance,
                    "localBalance": lightning_balance,
                }),
            )
            .await
            .ok::<Value>();
        }
        self.post(
            &format!("/api/wallet/{}/lightning/toggle", wallet.id),
            serde_json::json!({ "enabled": true }),
        )
        .await
        .ok()
    }

    /// Re-read a wallet's current state.
    pub async fn wallet(&self, wallet: &Wallet) -> Wallet {
        self.get(&format!("/api/wallet/{}", wallet.id)).await.ok()
    }
}
