//! The 16-byte option key and its ASCII-encoded component fields.

use std::fmt;

/// Fixed-width, equality-hashable identity for a listed option.
///
/// Byte-packed per the wire's expiry/strike encoding so that `OptionKey`
/// can be derived directly from decoded FAST fields without an
/// intermediate allocation. Structural equality defines identity; see
/// `table::tests` for the round-trip and hash-collision properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionKey {
    /// Root symbol, up to 5 ASCII characters, zero-padded on the right.
    pub root: [u8; 5],
    /// Expiration year, two digits (0-99).
    pub exp_year: u8,
    /// Expiration month, 1-12.
    pub exp_month: u8,
    /// Expiration day, 1-31.
    pub exp_day: u8,
    /// `b'P'` or `b'C'`.
    pub put_call: u8,
    /// Reporting exchange participant id.
    pub exchange: u8,
    /// Strike price decimal (whole-units) portion.
    pub strike_decimal: u32,
    /// Strike price fractional portion.
    pub strike_fraction: u16,
}

impl OptionKey {
    /// Builds a key from a root symbol slice, zero-padding or truncating to 5 bytes.
    pub fn new(
        root: &[u8],
        exp_year: u8,
        exp_month: u8,
        exp_day: u8,
        put_call: u8,
        exchange: u8,
        strike_decimal: u32,
        strike_fraction: u16,
    ) -> Self {
        let mut padded = [0u8; 5];
        let n = root.len().min(5);
        padded[..n].copy_from_slice(&root[..n]);
        OptionKey {
            root: padded,
            exp_year,
            exp_month,
            exp_day,
            put_call,
            exchange,
            strike_decimal,
            strike_fraction,
        }
    }

    /// Root symbol with trailing zero padding trimmed.
    pub fn root_str(&self) -> &str {
        let end = self.root.iter().position(|&b| b == 0).unwrap_or(5);
        std::str::from_utf8(&self.root[..end]).unwrap_or("")
    }

    /// `true` if this key identifies a put.
    pub fn is_put(&self) -> bool {
        self.put_call == b'P'
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{:02}{:02}{:02}{}/{}.{}/{}",
            self.root_str(),
            self.exp_year,
            self.exp_month,
            self.exp_day,
            self.put_call as char,
            self.strike_decimal,
            self.strike_fraction,
            self.exchange as char
        )
    }
}

/// 32-bit mixing hash over the 16-byte key, used by the option table's
/// external-chaining index. Not a cryptographic hash; collisions are
/// expected and resolved by full-key comparison in the chain.
pub fn mix_hash(key: &OptionKey) -> u32 {
    let mut h: u32 = 0x811c_9dc5; // FNV-1a offset basis, 32-bit
    let mut fold = |b: u8, h: &mut u32| {
        *h ^= b as u32;
        *h = h.wrapping_mul(0x0100_0193);
    };
    for &b in &key.root {
        fold(b, &mut h);
    }
    fold(key.exp_year, &mut h);
    fold(key.exp_month, &mut h);
    fold(key.exp_day, &mut h);
    fold(key.put_call, &mut h);
    fold(key.exchange, &mut h);
    for &b in &key.strike_decimal.to_be_bytes() {
        fold(b, &mut h);
    }
    for &b in &key.strike_fraction.to_be_bytes() {
        fold(b, &mut h);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_str_trims_padding() {
        let k = OptionKey::new(b"MSFT", 25, 1, 17, b'C', b'N', 300, 0);
        assert_eq!(k.root_str(), "MSFT");
    }

    #[test]
    fn equality_is_structural() {
        let a = OptionKey::new(b"MSFT", 25, 1, 17, b'C', b'N', 300, 0);
        let b = OptionKey::new(b"MSFT", 25, 1, 17, b'C', b'N', 300, 0);
        assert_eq!(a, b);
        assert_eq!(mix_hash(&a), mix_hash(&b));
    }

    #[test]
    fn differing_strike_changes_identity() {
        let a = OptionKey::new(b"MSFT", 25, 1, 17, b'C', b'N', 300, 0);
        let b = OptionKey::new(b"MSFT", 25, 1, 17, b'C', b'N', 305, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn is_put_reads_put_call_byte() {
        let p = OptionKey::new(b"MSFT", 25, 1, 17, b'P', b'N', 300, 0);
        let c = OptionKey::new(b"MSFT", 25, 1, 17, b'C', b'N', 300, 0);
        assert!(p.is_put());
        assert!(!c.is_put());
    }
}
