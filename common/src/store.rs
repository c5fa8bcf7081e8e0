//! In-memory record store for the wallet and its child records.
//!
//! The store owns every record. It enforces referential integrity (children
//! must point at the wallet), the single-wallet rule and status monotonicity,
//! but knows nothing about balances; that is the ledger's job.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::channel::{ChannelId, ChannelStatus, LightningChannel, NewChannel};
use crate::error::{LedgerError, LedgerResult};
use crate::payment::{LightningPayment, NewPayment, PaymentId, PaymentStatus};
use crate::transaction::{NewTransaction, Transaction, TransactionId, TransactionStatus};
use crate::wallet::{NewWallet, Wallet, WalletId, WalletUpdate};

/// Monotonically increasing identifiers for one record type, starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSequence {
    next: u32,
}

impl IdSequence {
    pub const FIRST: u32 = 1;

    pub fn new() -> Self {
        Self { next: Self::FIRST }
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn reset(&mut self) {
        self.next = Self::FIRST;
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct Store {
    wallets: BTreeMap<WalletId, Wallet>,
    transactions: BTreeMap<TransactionId, Transaction>,
    channels: BTreeMap<ChannelId, LightningChannel>,
    payments: BTreeMap<PaymentId, LightningPayment>,
    wallet_ids: IdSequence,
    transaction_ids: IdSequence,
    channel_ids: IdSequence,
    payment_ids: IdSequence,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every record and rewind all identifier sequences.
    pub fn clear(&mut self) {
        self.wallets.clear();
        self.transactions.clear();
        self.channels.clear();
        self.payments.clear();
        self.wallet_ids.reset();
        self.transaction_ids.reset();
        self.channel_ids.reset();
        self.payment_ids.reset();
    }

    // ─── Wallets ─────────────────────────────────────────────────────────────

    pub fn has_wallet(&self) -> bool {
        !self.wallets.is_empty()
    }

    /// Single tenant: fails with `AlreadyExists` while any wallet is present.
    pub fn create_wallet(&mut self, new: NewWallet) -> LedgerResult<Wallet> {
        if self.has_wallet() {
            return Err(LedgerError::AlreadyExists);
        }
        let wallet = Wallet {
            id: WalletId(self.wallet_ids.next_id()),
            mnemonic: new.mnemonic,
            current_address: new.current_address,
            addresses: new.addresses,
            balance: new.balance,
            lightning_enabled: false,
            lightning_balance: 0,
        };
        self.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    pub fn wallet(&self, id: WalletId) -> LedgerResult<&Wallet> {
        self.wallets
            .get(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("wallet {id}")))
    }

    pub fn update_wallet(&mut self, id: WalletId, update: WalletUpdate) -> LedgerResult<Wallet> {
        let wallet = self
            .wallets
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("wallet {id}")))?;
        wallet.apply(update);
        Ok(wallet.clone())
    }

    // ─── On-chain transactions ───────────────────────────────────────────────

    pub fn create_transaction(&mut self, new: NewTransaction) -> LedgerResult<Transaction> {
        self.wallet(new.wallet_id)?;
        let tx = Transaction {
            id: TransactionId(self.transaction_ids.next_id()),
            wallet_id: new.wallet_id,
            kind: new.kind,
            address: new.address,
            amount: new.amount,
            fee: new.fee,
            status: new.status,
            timestamp: Utc::now(),
        };
        self.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    pub fn transaction(&self, id: TransactionId) -> LedgerResult<&Transaction> {
        self.transactions
            .get(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {}", id.0)))
    }

    pub fn update_transaction_status(
        &mut self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> LedgerResult<Transaction> {
        let tx = self
            .transactions
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {}", id.0)))?;
        if !tx.status.can_transition_to(status) {
            return Err(LedgerError::InvalidInput(format!(
                "transaction {} cannot move from {:?} to {:?}",
                id.0, tx.status, status
            )));
        }
        tx.status = status;
        Ok(tx.clone())
    }

    /// Newest first.
    pub fn transactions_by_wallet(&self, wallet_id: WalletId) -> Vec<Transaction> {
        let mut txs: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|tx| tx.wallet_id == wallet_id)
            .cloned()
            .collect();
        txs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        txs
    }

    // ─── Channels ────────────────────────────────────────────────────────────

    pub fn create_channel(&mut self, new: NewChannel) -> LedgerResult<LightningChannel> {
        self.wallet(new.wallet_id)?;
        if new.local_balance > new.capacity {
            return Err(LedgerError::InvalidInput(format!(
                "local balance {} exceeds capacity {}",
                new.local_balance, new.capacity
            )));
        }
        let channel = LightningChannel {
            id: ChannelId(self.channel_ids.next_id()),
            wallet_id: new.wallet_id,
            remote_node_id: new.remote_node_id,
            capacity: new.capacity,
            local_balance: new.local_balance,
            status: new.status,
            created_at: Utc::now(),
        };
        self.channels.insert(channel.id, channel.clone());
        Ok(channel)
    }

    pub fn channel(&self, id: ChannelId) -> LedgerResult<&LightningChannel> {
        self.channels
            .get(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("channel {}", id.0)))
    }

    pub fn update_channel_status(
        &mut self,
        id: ChannelId,
        status: ChannelStatus,
    ) -> LedgerResult<LightningChannel> {
        let channel = self
            .channels
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("channel {}", id.0)))?;
        if !channel.status.can_transition_to(status) {
            return Err(LedgerError::InvalidInput(format!(
                "channel {} cannot move from {:?} to {:?}",
                id.0, channel.status, status
            )));
        }
        channel.status = status;
        Ok(channel.clone())
    }

    /// Newest first.
    pub fn channels_by_wallet(&self, wallet_id: WalletId) -> Vec<LightningChannel> {
        let mut channels: Vec<LightningChannel> = self
            .channels
            .values()
            .filter(|ch| ch.wallet_id == wallet_id)
            .cloned()
            .collect();
        channels.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        channels
    }

    // ─── Lightning payments ──────────────────────────────────────────────────

    pub fn create_payment(&mut self, new: NewPayment) -> LedgerResult<LightningPayment> {
        self.wallet(new.wallet_id)?;
        let payment = LightningPayment {
            id: PaymentId(self.payment_ids.next_id()),
            wallet_id: new.wallet_id,
            kind: new.kind,
            amount: new.amount,
            fee: new.fee,
            payment_hash: new.payment_hash,
            payment_request: new.payment_request,
            status: new.status,
            timestamp: Utc::now(),
        };
        self.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    pub fn payment(&self, id: PaymentId) -> LedgerResult<&LightningPayment> {
        self.payments
            .get(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("payment {}", id.0)))
    }

    pub fn update_payment_status(
        &mut self,
        id: PaymentId,
        status: PaymentStatus,
    ) -> LedgerResult<LightningPayment> {
        let payment = self
            .payments
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("payment {}", id.0)))?;
        if !payment.status.can_transition_to(status) {
            return Err(LedgerError::InvalidInput(format!(
                "payment {} cannot move from {:?} to {:?}",
                id.0, payment.status, status
            )));
        }
        payment.status = status;
        Ok(payment.clone())
    }

    /// Newest first.
    pub fn payments_by_wallet(&self, wallet_id: WalletId) -> Vec<LightningPayment> {
        let mut payments: Vec<LightningPayment> = self
            .payments
            .values()
            .filter(|p| p.wallet_id == wallet_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        payments
    }
}
