//! Mock key material for the demo wallet.
//!
//! These only reproduce the outward shape of real wallet data: a 12-word phrase,
//! a legacy-looking address, a node pubkey. There is no derivation behind them.

use rand::seq::SliceRandom;
use rand::Rng;

/// Number of words in a recovery phrase.
pub const MNEMONIC_WORDS: usize = 12;

/// Base58 alphabet (no 0, O, I, l).
const ADDRESS_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Characters after the leading version char in a generated address.
const ADDRESS_BODY_LEN: usize = 33;

pub const WORD_LIST: &[&str] = &[
    "abandon", "ability", "able", "about", "above", "absent", "absorb", "abstract",
    "absurd", "abuse", "access", "accident", "account", "accuse", "achieve", "acid",
    "acoustic", "acquire", "across", "act", "action", "actor", "actress", "actual",
    "adapt", "add", "addict", "address", "adjust", "admit", "adult", "advance",
    "advice", "aerobic", "affair", "afford", "afraid", "again", "age", "agent",
    "agree", "ahead", "aim", "air", "airport", "aisle", "alarm", "album", "alcohol",
    "alert", "alien", "all", "alley", "allow", "almost", "alone", "alpha", "already",
    "also", "alter", "always", "amateur", "amazing", "among", "amount", "amused",
    "analyst", "anchor", "ancient", "anger", "angle", "angry", "animal", "ankle",
    "announce", "annual", "another", "answer", "antenna", "antique", "anxiety",
    "any", "apart", "apology", "appear", "apple", "approve", "april", "arch",
    "arctic", "area", "arena", "argue", "arm", "armed", "armor", "army", "around",
    "arrange", "arrest", "arrive", "arrow", "art", "artefact", "artist", "artwork",
];

/// Draw a fresh 12-word phrase from the word list.
pub fn generate_mnemonic() -> String {
    let mut rng = rand::thread_rng();
    (0..MNEMONIC_WORDS)
        .filter_map(|_| WORD_LIST.choose(&mut rng).copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase and re-join a phrase with single spaces, if it is a valid one.
///
/// Valid means exactly 12 words, each in [`WORD_LIST`].
pub fn normalize_mnemonic(phrase: &str) -> Option<String> {
    let words: Vec<String> = phrase
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    if words.len() != MNEMONIC_WORDS {
        return None;
    }
    if !words.iter().all(|w| WORD_LIST.contains(&w.as_str())) {
        return None;
    }
    Some(words.join(" "))
}

pub fn validate_mnemonic(phrase: &str) -> bool {
    normalize_mnemonic(phrase).is_some()
}

/// A random P2PKH-looking address: `1` followed by 33 base58 characters.
pub fn generate_address() -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..ADDRESS_BODY_LEN)
        .map(|_| ADDRESS_ALPHABET[rng.gen_range(0..ADDRESS_ALPHABET.len())] as char)
        .collect();
    format!("1{body}")
}

/// Shape check for legacy addresses: leading `1` or `3`, then 25 to 34 base58 characters.
pub fn validate_address(address: &str) -> bool {
    let mut chars = address.chars();
    match chars.next() {
        Some('1') | Some('3') => {}
        _ => return false,
    }
    let body = chars.as_str();
    (25..=34).contains(&body.len()) && body.bytes().all(|b| ADDRESS_ALPHABET.contains(&b))
}

/// Placeholder remote node id: a compressed-pubkey-shaped hex string.
pub fn generate_node_id() -> String {
    let key: [u8; 32] = rand::random();
    let body: String = key.iter().map(|b| format!("{:02x}", b)).collect();
    format!("02{body}")
}
