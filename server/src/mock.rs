use std::collections::HashMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use vault_common::lightning_gateway::{GatewayError, LightningGateway, LnInvoice, PaymentOutcome};

/// Characters allowed in the data part of a bech32 string.
const BECH32_CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Mock Lightning gateway for development.
///
/// All invoices are instantly "paid" and every payment succeeds. No real
/// Lightning network involved. Invoice strings carry a well-formed amount
/// prefix so the ledger can decode them like real ones.
pub struct MockGateway {
    /// payment hash → preimage
    invoices: HashMap<String, String>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            invoices: HashMap::new(),
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// Random preimage and its SHA-256 payment hash, both hex.
fn preimage_pair() -> (String, String) {
    let preimage: [u8; 32] = rand::random();
    let hash = Sha256::digest(preimage);
    (hex::encode(preimage), hex::encode(hash))
}

#[async_trait]
impl LightningGateway for MockGateway {
    async fn create_invoice(
        &mut self,
        amount_sats: u64,
        _memo: &str,
    ) -> Result<LnInvoice, GatewayError> {
        let (preimage, payment_hash) = preimage_pair();
        let data: String = Sha256::digest(payment_hash.as_bytes())
            .iter()
            .map(|b| BECH32_CHARSET[(*b % 32) as usize] as char)
            .collect();
        // 1 sat = 10 nano-BTC
        let bolt11 = format!("lnbc{}n1p{}", amount_sats.saturating_mul(10), data);
        self.invoices.insert(payment_hash.clone(), preimage);
        Ok(LnInvoice {
            payment_hash,
            bolt11,
        })
    }

    async fn pay_invoice(&mut self, _bolt11: &str) -> Result<PaymentOutcome, GatewayError> {
        let (preimage, payment_hash) = preimage_pair();
        Ok(PaymentOutcome::Complete {
            payment_hash,
            preimage,
        })
    }

    async fn check_payment(&self, payment_hash: &str) -> Result<bool, GatewayError> {
        if self.invoices.contains_key(payment_hash) {
            Ok(true)
        } else {
            Err(GatewayError::Rejected(format!(
                "unknown payment hash: {}",
                payment_hash
            )))
        }
    }

    fn gateway_name(&self) -> &str {
        "mock"
    }
}
