//! Report code derivation: a per-user sequential label joined with a short
//! hex identifier derived from the username.

const ALPHABET: u32 = 26;

/// Report codes carry this prefix, e.g. `CI-1F2E3E-A1`.
pub const CODE_PREFIX: &str = "CI";

/// Labels run A..Z then A1..Z9, so each user gets 26 + 26*9 slots.
pub const MAX_REPORTS_PER_USER: u32 = 260;

/// Map a zero-based submission count to its label.
///
/// Indices 0-25 yield a bare letter; 26 and up yield a letter plus a digit
/// suffix starting at 1 (`26 → "A1"`, `51 → "Z1"`, `52 → "A2"`). Returns
/// `None` once the suffix would pass 9, i.e. for any index >= 260.
pub fn counter_label(index: u32) -> Option<String> {
    if index < ALPHABET {
        return Some(letter(index).to_string());
    }
    let shifted = index - ALPHABET;
    let suffix = shifted / ALPHABET + 1;
    if suffix > 9 {
        return None; // limit reached (Z9)
    }
    Some(format!("{}{suffix}", letter(shifted % ALPHABET)))
}

fn letter(index: u32) -> char {
    char::from(b'A' + index as u8)
}

/// Derive the 6-hex-digit user identifier from a username.
///
/// Polynomial hash (accumulator * 31 + code unit) over UTF-16 code units with
/// 32-bit signed wraparound, masked to the low 24 bits. Deterministic, not
/// cryptographic; distinct usernames can collide.
pub fn user_hex(username: &str) -> String {
    let mut hash: i32 = 0;
    for unit in username.encode_utf16() {
        hash = (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    format!("{:06X}", hash & 0xFF_FFFF)
}

/// Join a user hex and a counter label into the displayed report code.
pub fn format_report_code(user_hex: &str, label: &str) -> String {
    format!("{CODE_PREFIX}-{user_hex}-{label}")
}
