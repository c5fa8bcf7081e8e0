//! LNbits Lightning gateway.
//!
//! Talks to a hosted LNbits wallet over its REST API. Invoice creation and
//! payment use the admin key, status lookups the read-only invoice key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vault_common::lightning_gateway::{GatewayError, LightningGateway, LnInvoice, PaymentOutcome};

pub const DEFAULT_ENDPOINT: &str = "https://legend.lnbits.com";

/// Configuration for the LNbits connection.
#[derive(Clone)]
pub struct LnbitsConfig {
    pub endpoint: String,
    /// Invoice/read key: status lookups only.
    pub api_key: String,
    /// Admin key: creates invoices and spends.
    pub admin_key: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for LnbitsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LnbitsConfig")
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct CreateInvoiceRequest<'a> {
    out: bool,
    amount: u64,
    memo: &'a str,
    unit: &'static str,
}

#[derive(Serialize)]
struct PayInvoiceRequest<'a> {
    out: bool,
    bolt11: &'a str,
}

#[derive(Deserialize)]
struct CreateInvoiceResponse {
    payment_hash: Option<String>,
    payment_request: Option<String>,
}

#[derive(Deserialize)]
struct PayInvoiceResponse {
    payment_hash: Option<String>,
    payment_preimage: Option<String>,
    paid: Option<bool>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct PaymentStatusResponse {
    #[serde(default)]
    paid: bool,
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: serde_json::Value,
}

/// LNbits gateway wrapping a shared `reqwest` client.
pub struct LnbitsGateway {
    client: Client,
    config: LnbitsConfig,
}

impl LnbitsGateway {
    pub fn connect(config: LnbitsConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        info!("Using LNbits at {}", config.endpoint);

        Ok(Self { client, config })
    }

    fn payments_url(&self) -> String {
        format!("{}/api/v1/payments", self.config.endpoint.trim_end_matches('/'))
    }

    /// Send a request and return its status and raw body.
    async fn execute(&self, request: RequestBuilder) -> Result<(StatusCode, String), GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!("LNbits responded {}: {}", status, body);
        Ok((status, body))
    }

    fn transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.config.request_timeout)
        } else {
            GatewayError::Unavailable(format!("LNbits request failed: {}", e))
        }
    }
}

/// Human-readable failure text from a non-2xx LNbits response.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorDetail>(body) {
        Ok(ErrorDetail {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorDetail { detail }) => detail.to_string(),
        Err(_) => format!("LNbits API error: {} - {}", status.as_u16(), body),
    }
}

#[async_trait]
impl LightningGateway for LnbitsGateway {
    async fn create_invoice(
        &mut self,
        amount_sats: u64,
        memo: &str,
    ) -> Result<LnInvoice, GatewayError> {
        let request = self
            .client
            .post(self.payments_url())
            .header("X-Api-Key", &self.config.admin_key)
            .json(&CreateInvoiceRequest {
                out: false,
                amount: amount_sats,
                memo,
                unit: "sat",
            });
        let (status, body) = self.execute(request).await?;
        if !status.is_success() {
            return Err(GatewayError::Rejected(error_message(status, &body)));
        }

        let parsed: CreateInvoiceResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Unavailable(format!("Invalid LNbits response: {}", e)))?;
        match (parsed.payment_hash, parsed.payment_request) {
            (Some(payment_hash), Some(bolt11)) => Ok(LnInvoice {
                payment_hash,
                bolt11,
            }),
            _ => Err(GatewayError::Unavailable(
                "Invalid response format from LNbits API".to_string(),
            )),
        }
    }

    async fn pay_invoice(&mut self, bolt11: &str) -> Result<PaymentOutcome, GatewayError> {
        let request = self
            .client
            .post(self.payments_url())
            .header("X-Api-Key", &self.config.admin_key)
            .json(&PayInvoiceRequest { out: true, bolt11 });
        let (status, body) = self.execute(request).await?;
        if !status.is_success() {
            return Ok(PaymentOutcome::Failed {
                error: error_message(status, &body),
            });
        }

        let parsed: PayInvoiceResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Unavailable(format!("Invalid LNbits response: {}", e)))?;
        if let Some(error) = parsed.error {
            return Ok(PaymentOutcome::Failed { error });
        }
        // Older LNbits versions report `paid`; newer ones only answer 2xx once the payment went out.
        match (parsed.paid, parsed.payment_hash) {
            (Some(false), _) => Ok(PaymentOutcome::Failed {
                error: "Payment was not completed".to_string(),
            }),
            (_, Some(payment_hash)) => Ok(PaymentOutcome::Complete {
                payment_hash,
                preimage: parsed.payment_preimage.unwrap_or_default(),
            }),
            (_, None) => Err(GatewayError::Unavailable(
                "Invalid response format from LNbits API".to_string(),
            )),
        }
    }

    async fn check_payment(&self, payment_hash: &str) -> Result<bool, GatewayError> {
        let request = self
            .client
            .get(format!("{}/{}", self.payments_url(), payment_hash))
            .header("X-Api-Key", &self.config.api_key);
        let (status, body) = self.execute(request).await?;
        if !status.is_success() {
            return Err(GatewayError::Rejected(error_message(status, &body)));
        }
        let parsed: PaymentStatusResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Unavailable(format!("Invalid LNbits response: {}", e)))?;
        Ok(parsed.paid)
    }

    fn gateway_name(&self) -> &str {
        "lnbits"
    }
}
