//! A stand-in LNbits server for end-to-end tests.
//!
//! Implements just enough of `/api/v1/payments` to exercise the gateway:
//! key checks, invoice creation, outgoing payments with scripted failures,
//! and paid-status lookups.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

pub const READ_KEY: &str = "test-read-key";
pub const ADMIN_KEY: &str = "test-admin-key";

const BECH32_CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// What the fake does with the next outgoing payment.
#[derive(Clone, Debug)]
pub enum PayBehaviour {
    Succeed,
    /// 400 with `{"detail": …}`.
    Reject(String),
    /// 2xx with an `error` field in the body.
    ErrorInBody(String),
    /// Sleep before answering.
    Hang(Duration),
}

/// One call observed by the fake.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub key: String,
    pub body: Value,
}

struct FakeState {
    invoices: HashMap<String, u64>,
    paid: HashSet<String>,
    pay_behaviour: PayBehaviour,
    requests: Vec<RecordedRequest>,
    counter: u64,
}

type Shared = Arc<Mutex<FakeState>>;

#[derive(Deserialize)]
struct PaymentsBody {
    out: bool,
    amount: Option<u64>,
    bolt11: Option<String>,
}

pub struct FakeLnbits {
    pub url: String,
    state: Shared,
}

impl FakeLnbits {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState {
            invoices: HashMap::new(),
            paid: HashSet::new(),
            pay_behaviour: PayBehaviour::Succeed,
            requests: Vec::new(),
            counter: 0,
        }));

        let app = Router::new()
            .route("/api/v1/payments", post(payments_handler))
            .route("/api/v1/payments/{hash}", get(status_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake LNbits");
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake LNbits failed");
        });

        Self { url, state }
    }

    pub fn set_pay_behaviour(&self, behaviour: PayBehaviour) {
        self.state.lock().unwrap().pay_behaviour = behaviour;
    }

    /// Simulate a counterparty paying one of our invoices.
    pub fn mark_paid(&self, payment_hash: &str) {
        self.state.lock().unwrap().paid.insert(payment_hash.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn api_key(headers: &HeaderMap) -> String {
    headers
        .get("X-Api-Key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Invalid key" })),
    )
}

async fn payments_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let key = api_key(&headers);
    let behaviour = {
        let mut s = state.lock().unwrap();
        s.requests.push(RecordedRequest {
            key: key.clone(),
            body: raw.clone(),
        });
        s.pay_behaviour.clone()
    };
    if key != ADMIN_KEY {
        return unauthorized();
    }
    let Ok(body) = serde_json::from_value::<PaymentsBody>(raw) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "bad body" })),
        );
    };

    if !body.out {
        let amount = body.amount.unwrap_or_default();
        let mut s = state.lock().unwrap();
        s.counter += 1;
        let payment_hash = format!("{:064x}", s.counter);
        let data: String = (0..40)
            .map(|i| BECH32_CHARSET[((s.counter as usize) + i) % 32] as char)
            .collect();
        let payment_request = format!("lnbc{}n1p{}", amount * 10, data);
        s.invoices.insert(payment_hash.clone(), amount);
        return (
            StatusCode::CREATED,
            Json(json!({
                "payment_hash": payment_hash,
                "payment_request": payment_request,
                "checking_id": payment_hash,
            })),
        );
    }

    let bolt11 = body.bolt11.unwrap_or_default();
    match behaviour {
        PayBehaviour::Succeed => {
            let mut s = state.lock().unwrap();
            s.counter += 1;
            (
                StatusCode::CREATED,
                Json(json!({
                    "payment_hash": format!("{:064x}", s.counter),
                    "payment_preimage": format!("{:064x}", s.counter + 1_000),
                    "paid": true,
                    "bolt11": bolt11,
                })),
            )
        }
        PayBehaviour::Reject(detail) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail })))
        }
        PayBehaviour::ErrorInBody(error) => (
            StatusCode::CREATED,
            Json(json!({ "payment_hash": "", "error": error })),
        ),
        PayBehaviour::Hang(delay) => {
            tokio::time::sleep(delay).await;
            (StatusCode::CREATED, Json(json!({ "payment_hash": "late" })))
        }
    }
}

async fn status_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(hash): Path<String>,
) -> (StatusCode, Json<Value>) {
    let key = api_key(&headers);
    if key != READ_KEY && key != ADMIN_KEY {
        return unauthorized();
    }
    let s = state.lock().unwrap();
    if !s.invoices.contains_key(&hash) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Payment does not exist." })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "paid": s.paid.contains(&hash) })),
    )
}
