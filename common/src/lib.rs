pub mod amount;
pub mod bolt11;
pub mod channel;
pub mod error;
pub mod keys;
pub mod lightning_gateway;
pub mod payment;
pub mod store;
pub mod transaction;
pub mod wallet;

pub use error::{LedgerError, LedgerResult};
