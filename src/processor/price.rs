//! Price-field normalization (spec.md §4.4 "Price normalization").
//!
//! OPRA transmits prices as `(raw_integer, denominator_code)`; every price
//! field is normalized into a single fixed-point convention ("ISE format")
//! independent of the source denominator, by shifting the decimal point.

use crate::table::PRICE_SCALE;

/// Denominator-code base for price fields (distinct from the strike
/// denominator base `'@'` used in [`super::expiry`]).
const PRICE_DENOM_BASE: u8 = b'D';

/// Normalizes `raw` (as carried on the wire under `denom_code`) into the
/// core's fixed-point representation: an `i64` scaled by
/// `10^PRICE_SCALE`. `n = denom_code - 'D'`; the wire value is multiplied
/// by `10^n` (or divided, for negative `n`) before scaling.
pub fn normalize(raw: i32, denom_code: u8) -> i64 {
    let n = denom_code as i32 - PRICE_DENOM_BASE as i32;
    let exp = n + PRICE_SCALE as i32;
    let raw = raw as i64;
    if exp >= 0 {
        raw.saturating_mul(10i64.pow(exp as u32))
    } else {
        raw / 10i64.pow((-exp) as u32)
    }
}

/// Inverse of [`normalize`] for non-negative decimal shifts (spec.md §8
/// property 6: "round-trip recovers `v` when the decimal shift is
/// non-negative"). Negative shifts are lossy by construction and have no
/// exact inverse.
pub fn denormalize(scaled: i64, denom_code: u8) -> i32 {
    let n = denom_code as i32 - PRICE_DENOM_BASE as i32;
    let exp = n + PRICE_SCALE as i32;
    debug_assert!(exp >= 0, "denormalize is only exact for non-negative shifts");
    (scaled / 10i64.pow(exp.max(0) as u32)) as i32
}
