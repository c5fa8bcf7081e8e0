use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wallet::WalletId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Send,
    Receive,
}

/// On-chain confirmation state. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
}

impl TransactionStatus {
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (TransactionStatus::Pending, TransactionStatus::Confirmed)
        )
    }
}

/// An on-chain ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub address: String,
    pub amount: u64,
    /// Miner fee in sats. Zero for receives.
    pub fee: u64,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub wallet_id: WalletId,
    pub kind: TransactionKind,
    pub address: String,
    pub amount: u64,
    pub fee: u64,
    pub status: TransactionStatus,
}
