//! Amount extraction from the human-readable part of a BOLT11 invoice.
//!
//! Only the prefix is read (`ln` + currency + optional amount + multiplier).
//! The signed data part is not decoded or verified.

use crate::error::{LedgerError, LedgerResult};

const MSAT_PER_BTC: u64 = 100_000_000_000;

/// Amount the invoice asks for, in sats (rounded up), or `None` for an amountless invoice.
pub fn invoice_amount_sats(invoice: &str) -> LedgerResult<Option<u64>> {
    let invoice = invoice.trim().to_lowercase();
    let invoice = invoice.strip_prefix("lightning:").unwrap_or(&invoice);

    let separator = invoice
        .rfind('1')
        .filter(|&pos| pos > 0 && pos + 1 < invoice.len())
        .ok_or_else(|| invalid("missing separator"))?;
    let hrp = &invoice[..separator];
    let rest = hrp
        .strip_prefix("ln")
        .ok_or_else(|| invalid("not a lightning invoice"))?;

    let amount = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    if rest.len() == amount.len() {
        return Err(invalid("missing currency prefix"));
    }
    if amount.is_empty() {
        return Ok(None);
    }

    let (digits, multiplier) = match amount.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&amount[..i], Some(c)),
        _ => (amount, None),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("malformed amount"));
    }
    let value: u64 = digits.parse().map_err(|_| invalid("amount out of range"))?;

    let msat = match multiplier {
        None => value.checked_mul(MSAT_PER_BTC),
        Some('m') => value.checked_mul(MSAT_PER_BTC / 1_000),
        Some('u') => value.checked_mul(MSAT_PER_BTC / 1_000_000),
        Some('n') => value.checked_mul(MSAT_PER_BTC / 1_000_000_000),
        Some('p') if value % 10 == 0 => Some(value / 10),
        Some('p') => return Err(invalid("sub-millisatoshi amount")),
        Some(other) => return Err(invalid(&format!("unknown multiplier '{other}'"))),
    }
    .ok_or_else(|| invalid("amount out of range"))?;

    Ok(Some(msat.div_ceil(1_000)))
}

fn invalid(reason: &str) -> LedgerError {
    LedgerError::InvalidInput(format!("invoice: {reason}"))
}
