//! Fixed point conversions between on-chain integers and decimal USD values.
//!
//! All multiplication and division happens on integers; a [`Decimal`] is only
//! produced from the final integer result.

use std::str::FromStr;

use alloy::primitives::{U256, U512};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    constants::{Q96, USDC_DECIMALS},
    error::MathError,
};

/// Converts `amount_raw` at `decimals` precision into a [`Decimal`].
///
/// Exact for raw values up to 2^96 - 1, the largest `Decimal` mantissa. From
/// 2^96 on the integer part is kept and the trailing fractional digits that no
/// longer fit are rounded, so `2^96` at 6 decimals loses its last digit.
pub fn amount_to_decimal(amount_raw: U256, decimals: u32) -> Result<Decimal, MathError> {
    raw_digits_to_decimal(&amount_raw.to_string(), decimals)
}

/// Fully diluted valuation in USD implied by a Q96 price:
/// `floor(price_q96 * total_supply_raw / 2^96)` in settlement units, projected
/// with the settlement currency precision.
pub fn price_q96_to_fdv_usd(price_q96: U256, total_supply_raw: U256) -> Result<Decimal, MathError> {
    raw_digits_to_decimal(&fdv_raw(price_q96, total_supply_raw).to_string(), USDC_DECIMALS)
}

/// Integer part of the valuation, still in settlement currency units.
pub fn fdv_raw(price_q96: U256, total_supply_raw: U256) -> U512 {
    let product = U512::from(price_q96) * U512::from(total_supply_raw);
    product / U512::from(Q96)
}

fn raw_digits_to_decimal(digits: &str, decimals: u32) -> Result<Decimal, MathError> {
    if decimals > Decimal::MAX_SCALE {
        return Err(MathError::ScaleTooLarge(decimals));
    }

    if let Ok(mut exact) = Decimal::from_str_exact(digits) {
        exact
            .set_scale(decimals)
            .map_err(|_| MathError::ScaleTooLarge(decimals))?;
        return Ok(exact);
    }

    let split = digits.len().saturating_sub(decimals as usize);
    let (integer, fraction) = digits.split_at(split);
    let integer = if integer.is_empty() { "0" } else { integer };
    let fraction = format!("{fraction:0>width$}", width = decimals as usize);

    Decimal::from_str(&format!("{integer}.{fraction}"))
        .map_err(|_| MathError::Overflow(digits.to_string()))
}

/// `1234567.891` -> `"1,234,567.89"`.
pub fn format_usd(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}

pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn floor_price_fdv_truncates() {
        let floor_price = U256::from(1_980_704_062_800u64);
        let total_supply = U256::from(10u64).pow(U256::from(27u64));

        let fdv = price_q96_to_fdv_usd(floor_price, total_supply).unwrap();
        assert_eq!(fdv, dec("24999.999999"));
    }

    #[test]
    fn fdv_matches_integer_floor_for_wide_products() {
        // price * supply needs 189 bits; f64 would drop the low digits.
        let price = U256::from_str("33954926791827573254375978715").unwrap();
        let supply = U256::from_str("12345678901234567890123456789").unwrap();

        assert_eq!(
            fdv_raw(price, supply),
            U512::from_str("5291005243386243381481481480").unwrap()
        );
        assert_eq!(
            price_q96_to_fdv_usd(price, supply).unwrap(),
            Decimal::from_str("5291005243386243381481.481480").unwrap()
        );
    }

    #[test]
    fn fdv_of_one_whole_token_at_unit_price() {
        assert_eq!(price_q96_to_fdv_usd(Q96, U256::from(1_000_000u64)).unwrap(), dec("1"));
        assert_eq!(price_q96_to_fdv_usd(U256::ZERO, U256::MAX).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn amounts_below_two_pow_96_are_exact() {
        let raw = (U256::from(1u64) << 96) - U256::from(1u64);
        let value = amount_to_decimal(raw, 6).unwrap();
        assert_eq!(value.to_string(), "79228162514264337593543.950335");

        assert_eq!(amount_to_decimal(U256::from(1_500_000u64), 6).unwrap(), dec("1.5"));
        assert_eq!(amount_to_decimal(U256::from(7u64), 6).unwrap(), dec("0.000007"));
    }

    #[test]
    fn two_pow_96_rounds_last_fractional_digit() {
        let value = amount_to_decimal(U256::from(1u64) << 96, 6).unwrap();
        assert_eq!(value.trunc(), dec("79228162514264337593543"));
        assert!(value.scale() < 6, "{value}");
        assert_eq!(value.round_dp(4), dec("79228162514264337593543.9503"));
    }

    #[test]
    fn amounts_beyond_decimal_range_round_fraction_only() {
        let raw = U256::from(1u64) << 100;
        let value = amount_to_decimal(raw, 18).unwrap();
        assert_eq!(value.trunc(), Decimal::from_str("1267650600228").unwrap());

        let huge = U256::MAX;
        assert!(matches!(amount_to_decimal(huge, 0), Err(MathError::Overflow(_))));
    }

    #[test]
    fn formats_usd_with_grouping() {
        assert_eq!(format_usd(dec("24999.999999")), "25,000.00");
        assert_eq!(format_usd(dec("1234567.891")), "1,234,567.89");
        assert_eq!(format_usd(dec("999")), "999.00");
        assert_eq!(format_usd(dec("0.005")), "0.01");
        assert_eq!(format_usd(dec("-1000.5")), "-1,000.50");
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(3723), "1h 2m 3s");
    }
}
