use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wallet::WalletId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u32);

/// Monotonic channel lifecycle: opening → active → closing → closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Opening,
    Active,
    Closing,
    Closed,
}

impl ChannelStatus {
    pub fn ordinal(self) -> u8 {
        match self {
            ChannelStatus::Opening => 0,
            ChannelStatus::Active => 1,
            ChannelStatus::Closing => 2,
            ChannelStatus::Closed => 3,
        }
    }

    /// Forward moves only. Skipping ahead (a force close from `Active`) is allowed.
    pub fn can_transition_to(self, next: ChannelStatus) -> bool {
        next.ordinal() > self.ordinal()
    }
}

/// A payment channel between this wallet and a remote node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightningChannel {
    pub id: ChannelId,
    pub wallet_id: WalletId,
    pub remote_node_id: String,
    pub capacity: u64,
    /// Our side of the channel. Never exceeds `capacity`.
    pub local_balance: u64,
    pub status: ChannelStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChannel {
    pub wallet_id: WalletId,
    pub remote_node_id: String,
    pub capacity: u64,
    pub local_balance: u64,
    pub status: ChannelStatus,
}
