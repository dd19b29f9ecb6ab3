//! Decimal price to integer minor-unit conversion

use crate::{Result, X402Error};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Decimal places of USDC-like assets
pub const USDC_DECIMALS: u32 = 6;

/// Convert a decimal price string into minor units at [`USDC_DECIMALS`].
///
/// The result is `floor(price * 10^6)`: sub-unit remainders are truncated, never rounded.
/// Digits past the sixth decimal are cut from the string itself, since `Decimal`
/// parsing rounds inputs longer than its 28-digit precision.
pub fn to_minor_units(price: &str) -> Result<String> {
    parse_price(price)?;

    let digits: String = price
        .trim()
        .trim_start_matches('+')
        .chars()
        .filter(|c| *c != '_')
        .collect();
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
    let fraction: String = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(USDC_DECIMALS as usize)
        .collect();

    let scaled = Decimal::from_str_exact(&format!("{}{}", whole, fraction))
        .map_err(|_| X402Error::config(format!("Price {} is out of range", price)))?;

    Ok(scaled.normalize().to_string())
}

/// Parse and sanity-check a configured price
pub fn parse_price(price: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(price.trim())
        .map_err(|e| X402Error::config(format!("Invalid price {:?}: {}", price, e)))?;

    if amount.is_sign_negative() {
        return Err(X402Error::config(format!(
            "Price {:?} must not be negative",
            price
        )));
    }

    Ok(amount)
}
