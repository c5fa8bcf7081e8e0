/// Satoshis per whole coin.
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Floor for the mock fee estimate.
pub const MIN_FEE_SATS: u64 = 1_000;

/// Mock fee estimate: 1% of the amount, never below [`MIN_FEE_SATS`].
pub fn estimate_fee(amount_sats: u64) -> u64 {
    (amount_sats / 100).max(MIN_FEE_SATS)
}

/// Format sats as a coin amount with 8 decimals, e.g. `0.00050000`.
pub fn sats_to_btc(sats: u64) -> String {
    format!("{}.{:08}", sats / SATS_PER_BTC, sats % SATS_PER_BTC)
}

/// Parse a decimal coin amount into sats. Digits past the 8th decimal are truncated.
pub fn btc_to_sats(btc: &str) -> Option<u64> {
    let btc = btc.trim();
    let (whole, frac) = match btc.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (btc, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut frac: String = frac.chars().take(8).collect();
    while frac.len() < 8 {
        frac.push('0');
    }
    let frac: u64 = frac.parse().ok()?;

    whole.checked_mul(SATS_PER_BTC)?.checked_add(frac)
}
