//! Exact conversions between human readable decimal amounts and integer
//! amounts of a token's smallest unit.
//!
//! Amounts are parsed as [`BigDecimal`]s so `"0.1"` stays exactly one tenth,
//! floats never enter the picture.

use {
    alloy::primitives::{U256, utils},
    bigdecimal::{
        BigDecimal,
        num_bigint::{BigUint, ToBigInt},
    },
    std::str::FromStr,
    thiserror::Error,
};

/// Decimals of the native token of EVM chains (1 ether = 10^18 wei).
pub const NATIVE_DECIMALS: u8 = 18;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("amount is empty")]
    Empty,
    #[error("negative amount {0:?}")]
    Negative(String),
    #[error("malformed decimal amount {0:?}")]
    Malformed(String),
    #[error("{amount:?} has more than {decimals} fractional digits")]
    TooPrecise { amount: String, decimals: u8 },
    #[error("{0:?} does not fit into 256 bits")]
    Overflow(String),
    #[error("{0} decimals are not supported")]
    UnsupportedDecimals(u8),
}

/// Converts a decimal string (e.g. `"0.1"`) into the integer amount of the
/// smallest unit of a token with `decimals` fractional digits.
///
/// Amounts that cannot be represented exactly are rejected instead of being
/// truncated.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, Error> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(Error::Empty);
    }
    if amount.starts_with('-') {
        return Err(Error::Negative(amount.to_string()));
    }
    // `BigDecimal` also accepts signs and exponents, amounts are plain
    // decimals only.
    let well_formed = amount.chars().all(|c| c.is_ascii_digit() || c == '.')
        && amount.chars().filter(|c| *c == '.').count() <= 1
        && amount != ".";
    if !well_formed {
        return Err(Error::Malformed(amount.to_string()));
    }

    let normalized = match amount.strip_suffix('.') {
        Some(integer) => integer.to_string(),
        None if amount.starts_with('.') => format!("0{amount}"),
        None => amount.to_string(),
    };
    let value = BigDecimal::from_str(&normalized)
        .map_err(|_| Error::Malformed(amount.to_string()))?;

    // value * 10^decimals
    let scaled = value * BigDecimal::new(1.into(), -i64::from(decimals));
    big_decimal_to_u256(&scaled).map_err(|err| match err {
        Inexact::Fraction => Error::TooPrecise {
            amount: amount.to_string(),
            decimals,
        },
        Inexact::Range => Error::Overflow(amount.to_string()),
    })
}

enum Inexact {
    Fraction,
    Range,
}

fn big_decimal_to_u256(value: &BigDecimal) -> Result<U256, Inexact> {
    if !value.is_integer() {
        return Err(Inexact::Fraction);
    }
    let unsigned = value
        .to_bigint()
        .and_then(|int| BigUint::try_from(int).ok())
        .ok_or(Inexact::Range)?;
    U256::try_from_be_slice(&unsigned.to_bytes_be()).ok_or(Inexact::Range)
}

/// Inverse of [`parse_units`]: renders an integer amount of the smallest unit
/// as a decimal string without trailing zeros.
pub fn format_units(value: U256, decimals: u8) -> Result<String, Error> {
    let formatted =
        utils::format_units(value, decimals).map_err(|_| Error::UnsupportedDecimals(decimals))?;
    if !formatted.contains('.') {
        return Ok(formatted);
    }
    Ok(formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string())
}

/// Shorthand for [`parse_units`] with the native token's decimals.
pub fn parse_ether(amount: &str) -> Result<U256, Error> {
    parse_units(amount, NATIVE_DECIMALS)
}

/// Shorthand for [`format_units`] with the native token's decimals.
pub fn format_ether(wei: U256) -> String {
    // 18 decimals are always supported.
    format_units(wei, NATIVE_DECIMALS).unwrap_or_else(|_| wei.to_string())
}
