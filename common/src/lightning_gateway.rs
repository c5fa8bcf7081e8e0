use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A Lightning invoice issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LnInvoice {
    pub payment_hash: String,
    pub bolt11: String,
}

/// Terminal result of paying an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOutcome {
    Complete {
        payment_hash: String,
        preimage: String,
    },
    Failed {
        error: String,
    },
}

/// Errors from gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayError {
    /// The provider answered and refused.
    Rejected(String),
    /// The payee is a private node and the invoice carries no route hints.
    PrivateNodeUnreachable(String),
    /// No answer within the deadline.
    Timeout(Duration),
    /// Transport failure or an answer we could not make sense of.
    Unavailable(String),
}

impl GatewayError {
    /// Classify a provider failure message.
    pub fn from_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("private node") || message.contains("route hints") {
            Self::PrivateNodeUnreachable(message)
        } else {
            Self::Rejected(message)
        }
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(msg) => write!(f, "provider rejected request: {msg}"),
            Self::PrivateNodeUnreachable(_) => write!(
                f,
                "payment failed: invoice was created by a private node that cannot be reached; \
                 the invoice creator needs to include route hints"
            ),
            Self::Timeout(after) => {
                write!(f, "gateway timed out after {}s", after.as_secs_f32())
            }
            Self::Unavailable(msg) => write!(f, "gateway unavailable: {msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Abstraction over Lightning payment providers (LNbits, mock, etc.).
///
/// Implementations do not retry. Callers bound every call with their own deadline.
#[async_trait]
pub trait LightningGateway: Send + Sync {
    /// Create a new invoice for receiving payment.
    async fn create_invoice(&mut self, amount_sats: u64, memo: &str)
        -> Result<LnInvoice, GatewayError>;

    /// Pay a BOLT11 invoice.
    ///
    /// A provider-side refusal is `Ok(PaymentOutcome::Failed)`; `Err` is reserved
    /// for not getting a usable answer at all.
    async fn pay_invoice(&mut self, bolt11: &str) -> Result<PaymentOutcome, GatewayError>;

    /// Whether the invoice with this payment hash has been paid.
    async fn check_payment(&self, payment_hash: &str) -> Result<bool, GatewayError>;

    /// Human-readable name of this gateway backend.
    fn gateway_name(&self) -> &str;
}
