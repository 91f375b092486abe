/*
[INPUT]:  Caller-supplied f64 prices, sizes, and USD amounts
[OUTPUT]: Decimal-exact wire strings and scaled integers
[POS]:    Signing layer - precision-enforced numeric conversion
[UPDATE]: When wire precision rules change
*/

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::errors::{HyperliquidError, Result};

/// Maximum representation error tolerated when rendering a price/size
/// to 8 fractional digits.
const WIRE_EPSILON: f64 = 1e-12;

/// Maximum representation error tolerated for integer-scaled amounts.
const INT_EPSILON: f64 = 1e-3;

/// Convert a float to its decimal-exact wire string: at most 8 fractional
/// digits, trailing zeros stripped, negative zero normalized to "0".
/// Values that cannot be represented exactly at that precision are a hard
/// error, never silently rounded.
pub fn float_to_wire(x: f64) -> Result<String> {
    let rounded = format!("{x:.8}");
    let parsed = rounded
        .parse::<f64>()
        .map_err(|_| HyperliquidError::FloatRounding { value: x })?;
    if (parsed - x).abs() >= WIRE_EPSILON {
        return Err(HyperliquidError::FloatRounding { value: x });
    }
    if parsed == 0.0 {
        // covers -0.0 as well
        return Ok("0".to_string());
    }
    let normalized = Decimal::from_str(&rounded)
        .map_err(|_| HyperliquidError::FloatRounding { value: x })?
        .normalize();
    Ok(normalized.to_string())
}

/// Scale a float by 10^8 into an integer for hash-oriented amounts.
pub fn float_to_int_for_hashing(x: f64) -> Result<i64> {
    float_to_int(x, 8)
}

/// Scale a float by 10^6 into an integer for USD amounts.
pub fn float_to_usd_int(x: f64) -> Result<i64> {
    float_to_int(x, 6)
}

fn float_to_int(x: f64, power: i32) -> Result<i64> {
    let with_decimals = x * 10f64.powi(power);
    if (with_decimals.round() - with_decimals).abs() >= INT_EPSILON {
        return Err(HyperliquidError::FloatRounding { value: x });
    }
    Ok(with_decimals.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100.12345678, "100.12345678")]
    #[case(1.5, "1.5")]
    #[case(0.00000001, "0.00000001")]
    #[case(100.0, "100")]
    #[case(0.0, "0")]
    #[case(-0.0, "0")]
    #[case(-1.25, "-1.25")]
    fn test_float_to_wire(#[case] input: f64, #[case] expected: &str) {
        assert_eq!(float_to_wire(input).unwrap(), expected);
    }

    #[test]
    fn test_float_to_wire_rejects_excess_precision() {
        // 9 fractional digits cannot round-trip within 1e-12
        assert!(float_to_wire(0.123456789).is_err());
        assert!(float_to_wire(1e-9).is_err());
    }

    #[test]
    fn test_float_to_int_for_hashing() {
        assert_eq!(float_to_int_for_hashing(1.5).unwrap(), 150_000_000);
        assert_eq!(float_to_int_for_hashing(0.00000001).unwrap(), 1);
        assert!(float_to_int_for_hashing(0.000000001).is_err());
    }

    #[test]
    fn test_float_to_usd_int() {
        assert_eq!(float_to_usd_int(10.25).unwrap(), 10_250_000);
        assert_eq!(float_to_usd_int(-3.5).unwrap(), -3_500_000);
        assert!(float_to_usd_int(0.0000001).is_err());
    }
}
