//! Monetary amounts at the ledger's fixed scale.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Balances and ledger entries are `rust_decimal::Decimal` values carried at
//! exactly [`BALANCE_SCALE`] fractional digits.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Number of fractional digits stored for balances and ledger entries.
pub const BALANCE_SCALE: u32 = 5;

/// Exclusive bound on the magnitude of a stored amount (10^23).
///
/// Larger values cannot carry [`BALANCE_SCALE`] fractional digits within the
/// 28 significant digits of a `Decimal`.
pub const AMOUNT_LIMIT: Decimal = Decimal::from_parts(4_135_583_744, 46_653_770, 5421, false, 0);

/// Errors produced while parsing a textual amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The input was empty or whitespace.
    #[error("amount is required")]
    Empty,

    /// The input is not a decimal number.
    #[error("invalid decimal amount: {0}")]
    Invalid(String),
}

/// Rounds `value` to [`BALANCE_SCALE`] digits, half away from zero.
///
/// For the non-negative amounts the ledger accepts this is round-half-up:
/// `100.1234599999` becomes `100.12346` and `100.1234549999` becomes
/// `100.12345`. Any value below [`AMOUNT_LIMIT`] comes back with exactly five
/// fractional digits; larger values keep the widest scale they can hold and
/// are refused by the stores.
#[must_use]
pub fn round_amount(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(BALANCE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(BALANCE_SCALE);
    rounded
}

/// Parses a decimal amount from its string form.
///
/// Accepts plain (`"100.5"`, `"-3"`) and scientific (`"1.5e2"`) notation.
/// The value is returned unrounded; sign checks belong to the caller.
pub fn parse_amount(input: &str) -> Result<Decimal, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| AmountError::Invalid(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(100.1234599999), dec!(100.12346))]
    #[case(dec!(100.1234549999), dec!(100.12345))]
    #[case(dec!(100.123455), dec!(100.12346))]
    #[case(dec!(100.12345), dec!(100.12345))]
    #[case(dec!(0), dec!(0))]
    #[case(dec!(10.0), dec!(10))]
    fn test_round_amount(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_amount(input), expected);
    }

    #[test]
    fn test_round_amount_fixes_scale() {
        assert_eq!(round_amount(dec!(10.0)).scale(), BALANCE_SCALE);
        assert_eq!(round_amount(dec!(1.123456789)).scale(), BALANCE_SCALE);
        assert_eq!(round_amount(dec!(10.0)).to_string(), "10.00000");
    }

    #[test]
    fn test_amount_limit() {
        assert_eq!(AMOUNT_LIMIT, Decimal::from_i128_with_scale(10_i128.pow(23), 0));

        let largest = round_amount(AMOUNT_LIMIT - dec!(0.00001));
        assert_eq!(largest.scale(), BALANCE_SCALE);
        assert_eq!(largest.to_string(), "99999999999999999999999.99999");
    }

    #[test]
    fn test_round_amount_beyond_limit_keeps_value() {
        let rounded = round_amount(Decimal::MAX);
        assert_eq!(rounded, Decimal::MAX);
        assert!(rounded.scale() < BALANCE_SCALE);
    }

    #[test]
    fn test_round_amount_is_idempotent() {
        let once = round_amount(dec!(7.777777));
        assert_eq!(round_amount(once), once);
    }

    #[rstest]
    #[case("100.12345", dec!(100.12345))]
    #[case("  42 ", dec!(42))]
    #[case("-100.5", dec!(-100.5))]
    #[case("1.5e2", dec!(150))]
    fn test_parse_amount(#[case] input: &str, #[case] expected: Decimal) {
        assert_eq!(parse_amount(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_amount_rejects_empty() {
        assert_eq!(parse_amount(""), Err(AmountError::Empty));
        assert_eq!(parse_amount("   "), Err(AmountError::Empty));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(
            parse_amount("ten dollars"),
            Err(AmountError::Invalid("ten dollars".to_string()))
        );
    }
}
