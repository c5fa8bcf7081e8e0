use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wallet::WalletId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Send,
    Receive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

impl PaymentStatus {
    /// Settled payments are final.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Succeeded)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
        )
    }
}

/// A Lightning payment or invoice, incoming or outgoing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightningPayment {
    pub id: PaymentId,
    pub wallet_id: WalletId,
    #[serde(rename = "type")]
    pub kind: PaymentKind,
    pub amount: u64,
    pub fee: u64,
    pub payment_hash: String,
    /// BOLT11 invoice string.
    pub payment_request: String,
    pub status: PaymentStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub wallet_id: WalletId,
    pub kind: PaymentKind,
    pub amount: u64,
    pub fee: u64,
    pub payment_hash: String,
    pub payment_request: String,
    pub status: PaymentStatus,
}
