use std::fmt;

use serde::{Deserialize, Serialize};

/// Wallet identifier, allocated by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(pub u32);

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single wallet aggregate. Transactions, channels and payments hang off it by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: WalletId,
    /// 12-word recovery phrase. Never changes after creation.
    pub mnemonic: String,
    pub current_address: String,
    /// Every receive address handed out so far, oldest first.
    pub addresses: Vec<String>,
    /// On-chain balance in sats.
    pub balance: u64,
    pub lightning_enabled: bool,
    /// Off-chain balance in sats, a separate pool from `balance`.
    pub lightning_balance: u64,
}

/// Fields needed to create a wallet.
#[derive(Debug, Clone)]
pub struct NewWallet {
    pub mnemonic: String,
    pub current_address: String,
    pub addresses: Vec<String>,
    pub balance: u64,
}

impl NewWallet {
    /// A zero-balance wallet whose first address is also its current one.
    pub fn with_address(mnemonic: String, address: String) -> Self {
        Self {
            mnemonic,
            current_address: address.clone(),
            addresses: vec![address],
            balance: 0,
        }
    }
}

/// Partial update applied by `Store::update_wallet`. `None` leaves a field as is.
///
/// The mnemonic is deliberately absent: it is immutable.
#[derive(Debug, Clone, Default)]
pub struct WalletUpdate {
    pub balance: Option<u64>,
    pub lightning_enabled: Option<bool>,
    pub lightning_balance: Option<u64>,
    /// Rotates `current_address` and appends it to `addresses`.
    pub next_address: Option<String>,
}

impl Wallet {
    pub(crate) fn apply(&mut self, update: WalletUpdate) {
        if let Some(balance) = update.balance {
            self.balance = balance;
        }
        if let Some(enabled) = update.lightning_enabled {
            self.lightning_enabled = enabled;
        }
        if let Some(lightning_balance) = update.lightning_balance {
            self.lightning_balance = lightning_balance;
        }
        if let Some(address) = update.next_address {
            self.addresses.push(address.clone());
            self.current_address = address;
        }
    }
}
