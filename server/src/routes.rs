//! JSON HTTP surface over the ledger.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;
use vault_common::amount::{estimate_fee, sats_to_btc};
use vault_common::channel::LightningChannel;
use vault_common::lightning_gateway::GatewayError;
use vault_common::payment::{LightningPayment, PaymentId};
use vault_common::transaction::Transaction;
use vault_common::wallet::{Wallet, WalletId};
use vault_common::LedgerError;

use crate::ledger::{Ledger, SendRequest};

type AppState = Arc<Ledger>;

// ─── API types ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RestoreRequest {
    mnemonic: String,
}

#[derive(Deserialize)]
struct SendBody {
    address: String,
    amount: u64,
    #[serde(default)]
    fee: u64,
}

#[derive(Deserialize)]
struct ReceiveBody {
    amount: u64,
    address: Option<String>,
}

#[derive(Deserialize)]
struct ToggleRequest {
    enabled: bool,
}

#[derive(Deserialize)]
struct InvoiceRequest {
    amount: u64,
    #[serde(default)]
    memo: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceResponse {
    id: PaymentId,
    payment_hash: String,
    payment_request: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayRequest {
    payment_request: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenChannelRequest {
    capacity: u64,
    local_balance: u64,
}

#[derive(Deserialize)]
struct FeeEstimateQuery {
    amount: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeeEstimateResponse {
    amount: u64,
    fee: u64,
    amount_btc: String,
    fee_btc: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    gateway: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    /// Raw provider text, only for failures the user can act on.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct LogoutResponse {
    ok: bool,
}

// ─── Errors ─────────────────────────────────────────────────────────────────

pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::AlreadyExists => StatusCode::CONFLICT,
            LedgerError::InvalidInput(_)
            | LedgerError::InsufficientBalance { .. }
            | LedgerError::Disabled => StatusCode::BAD_REQUEST,
            LedgerError::Provider(GatewayError::Rejected(_))
            | LedgerError::Provider(GatewayError::PrivateNodeUnreachable(_)) => {
                StatusCode::BAD_REQUEST
            }
            LedgerError::Provider(GatewayError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            LedgerError::Provider(GatewayError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        let error = match &self.0 {
            LedgerError::Provider(GatewayError::PrivateNodeUnreachable(raw)) => Some(raw.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            message: self.0.to_string(),
            error,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(LedgerError::InvalidInput(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(LedgerError::InvalidInput(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(LedgerError::InvalidInput(rejection.body_text()))
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// Extractors whose failures go through `ApiError` instead of axum's plain-text rejections.

#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
struct ApiPath<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
struct ApiQuery<T>(T);

// ─── Wallet handlers ────────────────────────────────────────────────────────

async fn create_wallet_handler(State(ledger): State<AppState>) -> ApiResult<Wallet> {
    Ok(Json(ledger.new_wallet().await?))
}

async fn logout_handler(State(ledger): State<AppState>) -> Json<LogoutResponse> {
    ledger.clear().await;
    Json(LogoutResponse { ok: true })
}

async fn restore_wallet_handler(
    State(ledger): State<AppState>,
    ApiJson(req): ApiJson<RestoreRequest>,
) -> ApiResult<Wallet> {
    Ok(Json(ledger.restore_wallet(&req.mnemonic).await?))
}

async fn get_wallet_handler(
    State(ledger): State<AppState>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<Wallet> {
    Ok(Json(ledger.wallet(WalletId(id)).await?))
}

async fn transactions_handler(
    State(ledger): State<AppState>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<Vec<Transaction>> {
    Ok(Json(ledger.transactions(WalletId(id)).await?))
}

async fn send_handler(
    State(ledger): State<AppState>,
    ApiPath(id): ApiPath<u32>,
    ApiJson(body): ApiJson<SendBody>,
) -> ApiResult<Transaction> {
    let req = SendRequest {
        address: body.address,
        amount: body.amount,
        fee: body.fee,
    };
    Ok(Json(ledger.send(WalletId(id), req).await?))
}

async fn receive_handler(
    State(ledger): State<AppState>,
    ApiPath(id): ApiPath<u32>,
    ApiJson(body): ApiJson<ReceiveBody>,
) -> ApiResult<Transaction> {
    Ok(Json(
        ledger.receive(WalletId(id), body.amount, body.address).await?,
    ))
}

async fn new_address_handler(
    State(ledger): State<AppState>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<Wallet> {
    Ok(Json(ledger.new_address(WalletId(id)).await?))
}

// ─── Lightning handlers ─────────────────────────────────────────────────────

async fn toggle_lightning_handler(
    State(ledger): State<AppState>,
    ApiPath(id): ApiPath<u32>,
    ApiJson(req): ApiJson<ToggleRequest>,
) -> ApiResult<Wallet> {
    Ok(Json(
        ledger.set_lightning_enabled(WalletId(id), req.enabled).await?,
    ))
}

async fn create_invoice_handler(
    State(ledger): State<AppState>,
    ApiPath(id): ApiPath<u32>,
    ApiJson(req): ApiJson<InvoiceRequest>,
) -> ApiResult<InvoiceResponse> {
    let payment = ledger
        .create_invoice(WalletId(id), req.amount, &req.memo)
        .await?;
    Ok(Json(InvoiceResponse {
        id: payment.id,
        payment_hash: payment.payment_hash,
        payment_request: payment.payment_request,
    }))
}

async fn check_invoice_handler(
    State(ledger): State<AppState>,
    ApiPath((id, payment_id)): ApiPath<(u32, u32)>,
) -> ApiResult<LightningPayment> {
    Ok(Json(
        ledger
            .check_invoice(WalletId(id), PaymentId(payment_id))
            .await?,
    ))
}

async fn pay_invoice_handler(
    State(ledger): State<AppState>,
    ApiPath(id): ApiPath<u32>,
    ApiJson(req): ApiJson<PayRequest>,
) -> ApiResult<LightningPayment> {
    Ok(Json(
        ledger
            .pay_invoice(WalletId(id), &req.payment_request)
            .await?,
    ))
}

async fn payments_handler(
    State(ledger): State<AppState>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<Vec<LightningPayment>> {
    Ok(Json(ledger.payments(WalletId(id)).await?))
}

async fn channels_handler(
    State(ledger): State<AppState>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<Vec<LightningChannel>> {
    Ok(Json(ledger.channels(WalletId(id)).await?))
}

async fn open_channel_handler(
    State(ledger): State<AppState>,
    ApiPath(id): ApiPath<u32>,
    ApiJson(req): ApiJson<OpenChannelRequest>,
) -> ApiResult<LightningChannel> {
    Ok(Json(
        ledger
            .open_channel(WalletId(id), req.capacity, req.local_balance)
            .await?,
    ))
}

// ─── Misc ───────────────────────────────────────────────────────────────────

async fn fee_estimate_handler(
    ApiQuery(query): ApiQuery<FeeEstimateQuery>,
) -> Json<FeeEstimateResponse> {
    let fee = estimate_fee(query.amount);
    Json(FeeEstimateResponse {
        amount: query.amount,
        fee,
        amount_btc: sats_to_btc(query.amount),
        fee_btc: sats_to_btc(fee),
    })
}

async fn health_handler(State(ledger): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        gateway: ledger.gateway_name().to_string(),
    })
}

pub fn router(ledger: Arc<Ledger>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/wallet",
            post(create_wallet_handler).delete(logout_handler),
        )
        .route("/api/wallet/restore", post(restore_wallet_handler))
        .route("/api/wallet/{id}", get(get_wallet_handler))
        .route("/api/wallet/{id}/transactions", get(transactions_handler))
        .route("/api/wallet/{id}/send", post(send_handler))
        .route("/api/wallet/{id}/receive", post(receive_handler))
        .route("/api/wallet/{id}/address", post(new_address_handler))
        .route(
            "/api/wallet/{id}/lightning/toggle",
            post(toggle_lightning_handler),
        )
        .route(
            "/api/wallet/{id}/lightning/invoice",
            post(create_invoice_handler),
        )
        .route(
            "/api/wallet/{id}/lightning/invoice/{payment_id}/check",
            post(check_invoice_handler),
        )
        .route("/api/wallet/{id}/lightning/pay", post(pay_invoice_handler))
        .route(
            "/api/wallet/{id}/lightning/payments",
            get(payments_handler),
        )
        .route(
            "/api/wallet/{id}/lightning/channels",
            get(channels_handler).post(open_channel_handler),
        )
        .route("/api/fee-estimate", get(fee_estimate_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(ledger)
}
