//! Balance-affecting wallet operations.
//!
//! Every read→compute→write sequence runs under the store mutex, so
//! concurrent requests can never lose a balance update. Provider round-trips
//! happen with the store unlocked: Lightning operations validate under the
//! lock, release it for the call, then lock again to commit. A payment
//! reserves its amount from the Lightning balance before the call and gives
//! it back if the provider does not complete it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};
use vault_common::bolt11::invoice_amount_sats;
use vault_common::channel::{ChannelStatus, LightningChannel, NewChannel};
use vault_common::keys;
use vault_common::lightning_gateway::{GatewayError, LightningGateway, PaymentOutcome};
use vault_common::payment::{LightningPayment, NewPayment, PaymentId, PaymentKind, PaymentStatus};
use vault_common::store::Store;
use vault_common::transaction::{NewTransaction, Transaction, TransactionKind, TransactionStatus};
use vault_common::wallet::{NewWallet, Wallet, WalletId, WalletUpdate};
use vault_common::{LedgerError, LedgerResult};

/// Default deadline for a single provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// An on-chain send request.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub address: String,
    pub amount: u64,
    pub fee: u64,
}

struct LedgerState {
    store: Store,
    /// Bumped on every clear. Ids restart after a clear, so a wallet id alone
    /// cannot tell the wallet a provider call started for from its successor.
    generation: u64,
}

impl LedgerState {
    fn reset(&mut self) {
        self.store.clear();
        self.generation += 1;
    }

    fn ensure_generation(&self, generation: u64, id: WalletId) -> LedgerResult<()> {
        if self.generation == generation {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("wallet {id}")))
        }
    }

    fn set_lightning_balance(&mut self, id: WalletId, lightning_balance: u64) -> LedgerResult<()> {
        self.store.update_wallet(
            id,
            WalletUpdate {
                lightning_balance: Some(lightning_balance),
                ..Default::default()
            },
        )?;
        Ok(())
    }

    /// Give a payment reservation back, unless the wallet is gone.
    fn release(&mut self, generation: u64, id: WalletId, amount: u64) -> LedgerResult<()> {
        if self.generation != generation || amount == 0 {
            return Ok(());
        }
        let lightning_balance = self.store.wallet(id)?.lightning_balance.saturating_add(amount);
        self.set_lightning_balance(id, lightning_balance)
    }
}

pub struct Ledger {
    state: Mutex<LedgerState>,
    gateway: Mutex<Box<dyn LightningGateway>>,
    gateway_name: String,
    provider_timeout: Duration,
}

impl Ledger {
    pub fn new(gateway: Box<dyn LightningGateway>, provider_timeout: Duration) -> Self {
        let gateway_name = gateway.gateway_name().to_string();
        Self {
            state: Mutex::new(LedgerState {
                store: Store::new(),
                generation: 0,
            }),
            gateway: Mutex::new(gateway),
            gateway_name,
            provider_timeout,
        }
    }

    pub fn gateway_name(&self) -> &str {
        &self.gateway_name
    }

    // ─── Wallet lifecycle ────────────────────────────────────────────────────

    pub async fn create_wallet(&self, new: NewWallet) -> LedgerResult<Wallet> {
        let mut state = self.state.lock().await;
        let wallet = state.store.create_wallet(new)?;
        info!("Created wallet {}", wallet.id);
        Ok(wallet)
    }

    /// Replace whatever wallet exists with a freshly generated one.
    pub async fn new_wallet(&self) -> LedgerResult<Wallet> {
        let mut state = self.state.lock().await;
        state.reset();
        let wallet = state.store.create_wallet(NewWallet::with_address(
            keys::generate_mnemonic(),
            keys::generate_address(),
        ))?;
        info!("Generated new wallet {}", wallet.id);
        Ok(wallet)
    }

    /// Recreate a wallet from its phrase. The balance starts at zero: there is no chain to rescan.
    pub async fn restore_wallet(&self, mnemonic: &str) -> LedgerResult<Wallet> {
        let mut state = self.state.lock().await;
        if state.store.has_wallet() {
            return Err(LedgerError::AlreadyExists);
        }
        let mnemonic = keys::normalize_mnemonic(mnemonic).ok_or_else(|| {
            LedgerError::InvalidInput(
                "invalid recovery phrase, check your words and try again".to_string(),
            )
        })?;
        let wallet = state
            .store
            .create_wallet(NewWallet::with_address(mnemonic, keys::generate_address()))?;
        info!("Restored wallet {}", wallet.id);
        Ok(wallet)
    }

    /// Forget the wallet and every record hanging off it.
    pub async fn clear(&self) {
        self.state.lock().await.reset();
        info!("Store cleared");
    }

    pub async fn wallet(&self, id: WalletId) -> LedgerResult<Wallet> {
        let state = self.state.lock().await;
        state.store.wallet(id).cloned()
    }

    pub async fn new_address(&self, id: WalletId) -> LedgerResult<Wallet> {
        let mut state = self.state.lock().await;
        state.store.update_wallet(
            id,
            WalletUpdate {
                next_address: Some(keys::generate_address()),
                ..Default::default()
            },
        )
    }

    // ─── On-chain ────────────────────────────────────────────────────────────

    pub async fn transactions(&self, id: WalletId) -> LedgerResult<Vec<Transaction>> {
        let state = self.state.lock().await;
        state.store.wallet(id)?;
        Ok(state.store.transactions_by_wallet(id))
    }

    /// Debit `amount + fee` and record a pending send. Nothing is broadcast.
    pub async fn send(&self, id: WalletId, req: SendRequest) -> LedgerResult<Transaction> {
        let mut state = self.state.lock().await;
        let wallet = state.store.wallet(id)?;

        if req.amount == 0 {
            return Err(LedgerError::InvalidInput("amount must be positive".to_string()));
        }
        if !keys::validate_address(&req.address) {
            return Err(LedgerError::InvalidInput(format!(
                "not a valid address: {}",
                req.address
            )));
        }
        let total = req
            .amount
            .checked_add(req.fee)
            .ok_or_else(|| LedgerError::InvalidInput("amount overflow".to_string()))?;
        if wallet.balance < total {
            return Err(LedgerError::InsufficientBalance {
                available: wallet.balance,
                requested: total,
            });
        }
        let balance = wallet.balance - total;

        let tx = state.store.create_transaction(NewTransaction {
            wallet_id: id,
            kind: TransactionKind::Send,
            address: req.address,
            amount: req.amount,
            fee: req.fee,
            status: TransactionStatus::Pending,
        })?;
        state.store.update_wallet(
            id,
            WalletUpdate {
                balance: Some(balance),
                ..Default::default()
            },
        )?;
        info!(
            "Wallet {}: sent {} sats (fee {}) to {}",
            id, tx.amount, tx.fee, tx.address
        );
        Ok(tx)
    }

    /// Credit an on-chain deposit. Stands in for a chain watcher, so it is recorded as confirmed.
    pub async fn receive(
        &self,
        id: WalletId,
        amount: u64,
        address: Option<String>,
    ) -> LedgerResult<Transaction> {
        let mut state = self.state.lock().await;
        let wallet = state.store.wallet(id)?;

        if amount == 0 {
            return Err(LedgerError::InvalidInput("amount must be positive".to_string()));
        }
        let address = address.unwrap_or_else(|| wallet.current_address.clone());
        let balance = wallet
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidInput("balance overflow".to_string()))?;

        let tx = state.store.create_transaction(NewTransaction {
            wallet_id: id,
            kind: TransactionKind::Receive,
            address,
            amount,
            fee: 0,
            status: TransactionStatus::Confirmed,
        })?;
        state.store.update_wallet(
            id,
            WalletUpdate {
                balance: Some(balance),
                ..Default::default()
            },
        )?;
        info!("Wallet {}: received {} sats", id, amount);
        Ok(tx)
    }

    // ─── Lightning ───────────────────────────────────────────────────────────

    /// Idempotent. Does not touch the Lightning balance.
    pub async fn set_lightning_enabled(&self, id: WalletId, enabled: bool) -> LedgerResult<Wallet> {
        let mut state = self.state.lock().await;
        let wallet = state.store.update_wallet(
            id,
            WalletUpdate {
                lightning_enabled: Some(enabled),
                ..Default::default()
            },
        )?;
        info!("Wallet {}: lightning enabled = {}", id, enabled);
        Ok(wallet)
    }

    pub async fn channels(&self, id: WalletId) -> LedgerResult<Vec<LightningChannel>> {
        let state = self.state.lock().await;
        state.store.wallet(id)?;
        Ok(state.store.channels_by_wallet(id))
    }

    pub async fn payments(&self, id: WalletId) -> LedgerResult<Vec<LightningPayment>> {
        let state = self.state.lock().await;
        state.store.wallet(id)?;
        Ok(state.store.payments_by_wallet(id))
    }

    /// Move `capacity` out of the on-chain balance and `local_balance` into the Lightning pool.
    pub async fn open_channel(
        &self,
        id: WalletId,
        capacity: u64,
        local_balance: u64,
    ) -> LedgerResult<LightningChannel> {
        let mut state = self.state.lock().await;
        let wallet = state.store.wallet(id)?;

        if capacity == 0 {
            return Err(LedgerError::InvalidInput("capacity must be positive".to_string()));
        }
        if local_balance > capacity {
            return Err(LedgerError::InvalidInput(format!(
                "local balance {local_balance} exceeds capacity {capacity}"
            )));
        }
        if wallet.balance < capacity {
            return Err(LedgerError::InsufficientBalance {
                available: wallet.balance,
                requested: capacity,
            });
        }
        let balance = wallet.balance - capacity;
        let lightning_balance = wallet
            .lightning_balance
            .checked_add(local_balance)
            .ok_or_else(|| LedgerError::InvalidInput("lightning balance overflow".to_string()))?;

        let channel = state.store.create_channel(NewChannel {
            wallet_id: id,
            remote_node_id: keys::generate_node_id(),
            capacity,
            local_balance,
            status: ChannelStatus::Opening,
        })?;
        state.store.update_wallet(
            id,
            WalletUpdate {
                balance: Some(balance),
                lightning_balance: Some(lightning_balance),
                ..Default::default()
            },
        )?;
        info!(
            "Wallet {}: opening channel {} with {} (capacity {}, local {})",
            id, channel.id.0, channel.remote_node_id, capacity, local_balance
        );
        Ok(channel)
    }

    /// Ask the provider for an invoice and record it as a pending receive.
    ///
    /// Nothing is credited here; see [`Ledger::check_invoice`].
    pub async fn create_invoice(
        &self,
        id: WalletId,
        amount: u64,
        memo: &str,
    ) -> LedgerResult<LightningPayment> {
        let generation = {
            let state = self.state.lock().await;
            require_lightning(state.store.wallet(id)?)?;
            if amount == 0 {
                return Err(LedgerError::InvalidInput("amount must be positive".to_string()));
            }
            state.generation
        };

        info!("Wallet {}: creating invoice for {} sats", id, amount);
        let invoice = with_deadline(self.provider_timeout, async {
            self.gateway.lock().await.create_invoice(amount, memo).await
        })
        .await
        .inspect_err(|e| warn!("Wallet {}: invoice creation failed: {}", id, e))?;

        let mut state = self.state.lock().await;
        state.ensure_generation(generation, id).inspect_err(|_| {
            warn!(
                "Wallet {}: gone before invoice {} was recorded",
                id, invoice.payment_hash
            )
        })?;
        state.store.create_payment(NewPayment {
            wallet_id: id,
            kind: PaymentKind::Receive,
            amount,
            fee: 0,
            payment_hash: invoice.payment_hash,
            payment_request: invoice.bolt11,
            status: PaymentStatus::Pending,
        })
    }

    /// Poll the provider for a pending invoice and credit the Lightning balance once it is paid.
    pub async fn check_invoice(
        &self,
        id: WalletId,
        payment_id: PaymentId,
    ) -> LedgerResult<LightningPayment> {
        let (generation, payment_hash) = {
            let state = self.state.lock().await;
            require_lightning(state.store.wallet(id)?)?;
            let payment = state.store.payment(payment_id)?;
            if payment.wallet_id != id {
                return Err(LedgerError::NotFound(format!("payment {}", payment_id.0)));
            }
            if payment.kind != PaymentKind::Receive {
                return Err(LedgerError::InvalidInput(format!(
                    "payment {} is not an invoice",
                    payment_id.0
                )));
            }
            if payment.status != PaymentStatus::Pending {
                return Ok(payment.clone());
            }
            (state.generation, payment.payment_hash.clone())
        };

        let paid = with_deadline(self.provider_timeout, async {
            self.gateway.lock().await.check_payment(&payment_hash).await
        })
        .await?;

        let mut state = self.state.lock().await;
        state.ensure_generation(generation, id)?;
        let payment = state.store.payment(payment_id)?;
        // A concurrent check may have settled it while the store was unlocked.
        if !paid || payment.status != PaymentStatus::Pending {
            return Ok(payment.clone());
        }
        let amount = payment.amount;

        let lightning_balance = state
            .store
            .wallet(id)?
            .lightning_balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidInput("lightning balance overflow".to_string()))?;
        let payment = state
            .store
            .update_payment_status(payment_id, PaymentStatus::Succeeded)?;
        state.set_lightning_balance(id, lightning_balance)?;
        info!("Wallet {}: invoice {} settled, +{} sats", id, payment_id.0, amount);
        Ok(payment)
    }

    /// Pay a BOLT11 invoice through the provider.
    ///
    /// The debit is the amount encoded in the invoice; amountless invoices are
    /// recorded with amount 0 and debit nothing. Provider fees are not reported
    /// back, so the recorded fee is 0.
    pub async fn pay_invoice(&self, id: WalletId, bolt11: &str) -> LedgerResult<LightningPayment> {
        let bolt11 = bolt11.trim();
        let (generation, amount) = {
            let mut state = self.state.lock().await;
            let wallet = state.store.wallet(id)?;
            require_lightning(wallet)?;
            let lightning_balance = wallet.lightning_balance;

            if bolt11.is_empty() {
                return Err(LedgerError::InvalidInput("payment request is empty".to_string()));
            }
            let amount = invoice_amount_sats(bolt11)?.unwrap_or(0);
            if amount > lightning_balance {
                return Err(LedgerError::InsufficientBalance {
                    available: lightning_balance,
                    requested: amount,
                });
            }
            state.set_lightning_balance(id, lightning_balance - amount)?;
            (state.generation, amount)
        };

        info!("Wallet {}: paying invoice for {} sats", id, amount);
        let outcome = with_deadline(self.provider_timeout, async {
            self.gateway.lock().await.pay_invoice(bolt11).await
        })
        .await;
        let result = match outcome {
            Ok(PaymentOutcome::Complete { payment_hash, .. }) => Ok(payment_hash),
            Ok(PaymentOutcome::Failed { error }) => Err(GatewayError::from_failure(error)),
            Err(e) => Err(e),
        };

        let mut state = self.state.lock().await;
        let payment_hash = match result {
            Ok(payment_hash) => payment_hash,
            Err(e) => {
                warn!("Wallet {}: payment did not complete: {}", id, e);
                state.release(generation, id, amount)?;
                return Err(e.into());
            }
        };
        state.ensure_generation(generation, id).inspect_err(|_| {
            warn!(
                "Wallet {}: paid {} but the wallet is gone",
                id, payment_hash
            )
        })?;

        state.store.create_payment(NewPayment {
            wallet_id: id,
            kind: PaymentKind::Send,
            amount,
            fee: 0,
            payment_hash,
            payment_request: bolt11.to_string(),
            status: PaymentStatus::Succeeded,
        })
    }
}

fn require_lightning(wallet: &Wallet) -> LedgerResult<()> {
    if wallet.lightning_enabled {
        Ok(())
    } else {
        Err(LedgerError::Disabled)
    }
}

/// Run a provider call, turning an elapsed deadline into `GatewayError::Timeout`.
///
/// Waiting for the gateway lock counts against the deadline.
async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    tokio::time::timeout(deadline, call)
        .await
        .unwrap_or(Err(GatewayError::Timeout(deadline)))
}
