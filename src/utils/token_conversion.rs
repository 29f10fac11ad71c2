// src/utils/token_conversion.rs
use ethers::types::U256;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use thiserror::Error;

/// Decimals assumed when token metadata is unavailable (native asset, failed lookup).
pub const DEFAULT_DECIMALS: u8 = 18;

/// Largest decimals count whose scale factor still fits in a uint256.
pub const MAX_DECIMALS: u8 = 77;

// en-US locale default for maximumFractionDigits
const LOCALE_MAX_FRACTION_DIGITS: u32 = 3;

// Abbreviated values are settled to this many places before truncation so that
// binary noise (2.3 stored as 2.2999…) does not drop a digit.
const SHORT_TIERS: [(f64, &str); 4] = [(1.0, ""), (1e3, "K"), (1e6, "M"), (1e9, "B")];

lazy_static! {
    static ref REDUNDANT_ZEROS: Regex = Regex::new(r"\.0+$|(\.[0-9]*[1-9])0+$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid decimals: {0} (expected 0..=77)")]
    InvalidDecimals(u8),
    #[error("Amount does not fit in uint256: {0}")]
    Overflow(String),
}

/// A token amount as callers hand it over: decimal text, a float, or a base-unit integer.
#[derive(Debug, Clone, PartialEq)]
pub enum Numberish {
    Text(String),
    Float(f64),
    Integer(U256),
}

impl Numberish {
    /// Reads the amount as a finite, non-negative float.
    pub fn to_f64(&self) -> Result<f64, ConversionError> {
        let value = match self {
            Numberish::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| ConversionError::InvalidAmount(text.clone()))?,
            Numberish::Float(value) => *value,
            Numberish::Integer(value) => value
                .to_string()
                .parse::<f64>()
                .map_err(|_| ConversionError::InvalidAmount(value.to_string()))?,
        };

        if !value.is_finite() || value < 0.0 {
            return Err(ConversionError::InvalidAmount(self.to_string()));
        }
        Ok(value)
    }
}

impl fmt::Display for Numberish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numberish::Text(text) => write!(f, "{}", text),
            Numberish::Float(value) => write!(f, "{}", value),
            Numberish::Integer(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for Numberish {
    fn from(value: &str) -> Self {
        Numberish::Text(value.to_string())
    }
}

impl From<String> for Numberish {
    fn from(value: String) -> Self {
        Numberish::Text(value)
    }
}

impl From<f64> for Numberish {
    fn from(value: f64) -> Self {
        Numberish::Float(value)
    }
}

impl From<u64> for Numberish {
    fn from(value: u64) -> Self {
        Numberish::Integer(U256::from(value))
    }
}

impl From<u128> for Numberish {
    fn from(value: u128) -> Self {
        Numberish::Integer(U256::from(value))
    }
}

impl From<U256> for Numberish {
    fn from(value: U256) -> Self {
        Numberish::Integer(value)
    }
}

pub fn check_decimals(decimals: u8) -> Result<(), ConversionError> {
    if decimals > MAX_DECIMALS {
        return Err(ConversionError::InvalidDecimals(decimals));
    }
    Ok(())
}

fn scale(decimals: u8) -> f64 {
    10f64.powi(decimals as i32)
}

/// Given a base-unit token count, returns the fractional display value.
pub fn denormalize_tokens(
    amount: impl Into<Numberish>,
    decimals: u8,
) -> Result<f64, ConversionError> {
    check_decimals(decimals)?;
    Ok(amount.into().to_f64()? / scale(decimals))
}

/// Converts a display amount back to a base-unit token count, rounding to the nearest unit.
pub fn normalize_tokens(
    amount: impl Into<Numberish>,
    decimals: u8,
) -> Result<U256, ConversionError> {
    check_decimals(decimals)?;
    let amount = amount.into();
    let scaled = (amount.to_f64()? * scale(decimals)).round();
    if !scaled.is_finite() {
        return Err(ConversionError::Overflow(amount.to_string()));
    }

    U256::from_dec_str(&format!("{:.0}", scaled))
        .map_err(|_| ConversionError::Overflow(amount.to_string()))
}

/// Formats a base-unit amount with en-US grouping, or the fractional policy below 1.
pub fn token_to_human(
    amount: impl Into<Numberish>,
    decimals: u8,
) -> Result<String, ConversionError> {
    let value = denormalize_tokens(amount, decimals)?;
    if value < 1.0 {
        return Ok(format_fractional_value(value));
    }
    Ok(to_locale_string(value))
}

/// Abbreviates an already denormalized value (`1.5K`, `2M`).
pub fn shorten_human_value(amount: impl Into<Numberish>) -> Result<String, ConversionError> {
    let value = amount.into().to_f64()?;
    if value < 1.0 {
        return Ok(format_fractional_value(value));
    }
    Ok(format_largish_value(value))
}

pub fn token_to_human_short(
    amount: impl Into<Numberish>,
    decimals: u8,
) -> Result<String, ConversionError> {
    shorten_human_value(denormalize_tokens(amount, decimals)?)
}

pub fn format_fractional_value(value: f64) -> String {
    if value >= 0.01 {
        to_fixed(value, 2)
    } else if value == 0.0 {
        "0".to_string()
    } else {
        "<0.01".to_string()
    }
}

pub fn format_largish_value(num: f64) -> String {
    SHORT_TIERS
        .iter()
        .rev()
        .find(|(threshold, _)| num >= *threshold)
        .map(|(threshold, suffix)| {
            let scaled = truncate_fixed(num / threshold, 1);
            format!("{}{}", REDUNDANT_ZEROS.replace(&scaled, "$1"), suffix)
        })
        .unwrap_or_else(|| "0".to_string())
}

/// Number.prototype.toFixed semantics: ties round away from zero on the exact binary value.
pub fn to_fixed(value: f64, digits: u32) -> String {
    match Decimal::from_f64_retain(value) {
        Some(exact) => format!(
            "{:.*}",
            digits as usize,
            exact.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero)
        ),
        None => format!("{:.*}", digits as usize, value),
    }
}

// Cuts the shortest round-trip text: 2300 / 1e3 reads "2.3", 999.9999996 stays below 1000
fn truncate_fixed(value: f64, digits: u32) -> String {
    let text = value.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    if digits == 0 {
        return int_part.to_string();
    }

    let mut fraction: String = frac_part.chars().take(digits as usize).collect();
    while fraction.len() < digits as usize {
        fraction.push('0');
    }
    format!("{}.{}", int_part, fraction)
}

/// en-US rendering: comma thousands separators, at most three fraction digits.
pub fn to_locale_string(value: f64) -> String {
    to_grouped_string(value, LOCALE_MAX_FRACTION_DIGITS)
}

pub(crate) fn to_grouped_string(value: f64, max_fraction_digits: u32) -> String {
    let fixed = to_fixed(value, max_fraction_digits);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');
    let grouped = group_thousands(int_part);

    if frac_part.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, frac_part)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Exact decimal rendering of a base-unit amount, without going through floats.
pub fn format_units(amount: U256, decimals: u8) -> Result<String, ConversionError> {
    check_decimals(decimals)?;
    let digits = amount.to_string();
    let places = decimals as usize;
    if places == 0 {
        return Ok(digits);
    }

    let padded = format!("{:0>width$}", digits, width = places + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - places);
    let frac_part = frac_part.trim_end_matches('0');

    if frac_part.is_empty() {
        Ok(int_part.to_string())
    } else {
        Ok(format!("{}.{}", int_part, frac_part))
    }
}

/// Exact parse of a decimal string into base units. Fraction digits beyond
/// `decimals` are rounded half-up.
pub fn parse_units(input: &str, decimals: u8) -> Result<U256, ConversionError> {
    check_decimals(decimals)?;
    let invalid = || ConversionError::InvalidAmount(input.to_string());

    let trimmed = input.trim();
    let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let places = decimals as usize;
    let (kept, dropped) = if frac_part.len() > places {
        frac_part.split_at(places)
    } else {
        (frac_part, "")
    };

    let mut digits = format!("{}{:0<width$}", int_part, kept, width = places);
    if digits.is_empty() {
        digits.push('0');
    }

    let value = U256::from_dec_str(&digits).map_err(|_| ConversionError::Overflow(input.to_string()))?;
    match dropped.chars().next() {
        Some(first) if first >= '5' => value
            .checked_add(U256::one())
            .ok_or_else(|| ConversionError::Overflow(input.to_string())),
        _ => Ok(value),
    }
}

/// Completes half-typed form input: `.5` becomes `0.5`, `5.` becomes `5.0`.
pub fn transform_number_input(input: &str) -> String {
    let mut value = input.trim().to_string();
    if value.starts_with('.') {
        value.insert(0, '0');
    }
    if value.ends_with('.') {
        value.push('0');
    }
    value
}
