//! Expiry month-letter decoding and strike decimal/fraction splitting
//! (spec.md §4.4 "Expiry parsing").

use crate::error::WireError;

/// Strike denominator base; codes below this are out of range (spec.md
/// §9 Open Question: "treat out-of-range denominators as a wire error
/// and drop the message rather than silently normalize").
const STRIKE_DENOM_BASE: u8 = b'@';

/// Decodes OPRA's single-letter calendar-month encoding: `A..L` are call
/// months 1..12, `M..X` are put months 1..12. Returns `(month, is_put)`.
pub fn parse_month_letter(letter: u8) -> Result<(u8, bool), WireError> {
    match letter {
        b'A'..=b'L' => Ok((letter - b'A' + 1, false)),
        b'M'..=b'X' => Ok((letter - b'M' + 1, true)),
        _ => Err(WireError::InvalidExpiryMonth),
    }
}

/// Encodes `(month, is_put)` back to OPRA's letter convention, the
/// inverse of [`parse_month_letter`]. `month` must be `1..=12`.
pub fn month_letter(month: u8, is_put: bool) -> u8 {
    debug_assert!((1..=12).contains(&month));
    let base = if is_put { b'M' } else { b'A' };
    base + month - 1
}

/// `10^(denom_code - '@')`, guarding the zero case per the source's
/// ad-hoc default (spec.md §4.4: "if n is zero the divisor defaults to
/// 1"). Denominator codes below `'@'` are rejected rather than silently
/// normalized (resolving spec.md §9's Open Question).
pub fn strike_denominator(denom_code: u8) -> Result<u32, WireError> {
    if denom_code < STRIKE_DENOM_BASE {
        return Err(WireError::InvalidDenominator);
    }
    let n = denom_code - STRIKE_DENOM_BASE;
    if n == 0 {
        Ok(1)
    } else {
        Ok(10u32.pow(n as u32))
    }
}

/// Splits an explicit-strike wire integer into `(decimal, fraction)`
/// parts using the denominator implied by `denom_code` (spec.md §4.4:
/// "fractional = strike mod 10^n, decimal = strike / 10^n").
pub fn split_strike(value: u32, denom_code: u8) -> Result<(u32, u16), WireError> {
    let divisor = strike_denominator(denom_code)?;
    let decimal = value / divisor;
    let fraction = value % divisor;
    Ok((decimal, fraction as u16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_months_span_a_through_l() {
        assert_eq!(parse_month_letter(b'A').unwrap(), (1, false));
        assert_eq!(parse_month_letter(b'L').unwrap(), (12, false));
    }

    #[test]
    fn put_months_span_m_through_x() {
        assert_eq!(parse_month_letter(b'M').unwrap(), (1, true));
        assert_eq!(parse_month_letter(b'X').unwrap(), (12, true));
    }

    #[test]
    fn month_letter_round_trips_parse_month_letter() {
        for month in 1..=12u8 {
            for is_put in [false, true] {
                let letter = month_letter(month, is_put);
                assert_eq!(parse_month_letter(letter).unwrap(), (month, is_put));
            }
        }
    }

    #[test]
    fn out_of_range_letter_is_rejected() {
        assert_eq!(parse_month_letter(b'Z' + 1), Err(WireError::InvalidExpiryMonth));
    }

    #[test]
    fn zero_exponent_denominator_defaults_to_one() {
        assert_eq!(strike_denominator(b'@').unwrap(), 1);
    }

    #[test]
    fn below_base_denominator_is_a_wire_error() {
        assert_eq!(strike_denominator(b'@' - 1), Err(WireError::InvalidDenominator));
    }

    #[test]
    fn split_strike_divides_by_denom_power() {
        let (decimal, fraction) = split_strike(12345123, b'C').unwrap(); // n = 'C'-'@' = 2
        assert_eq!(decimal, 123451);
        assert_eq!(fraction, 23);
    }
}
