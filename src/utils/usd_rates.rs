// src/utils/usd_rates.rs
use std::sync::Arc;
use dashmap::DashMap;
use crate::utils::token_conversion::{
    denormalize_tokens, to_grouped_string, token_to_human, ConversionError, Numberish,
};

// lowercase symbol -> USD price
pub type UsdRates = Arc<DashMap<String, f64>>;

pub fn token_to_usd(
    symbol: &str,
    decimals: u8,
    amount: impl Into<Numberish>,
    rates: &DashMap<String, f64>,
) -> Result<Option<String>, ConversionError> {
    let rate = match rates.get(&symbol.to_lowercase()) {
        Some(rate) => *rate,
        None => return Ok(None),
    };

    let tokens = denormalize_tokens(amount, decimals)?;
    Ok(Some(to_grouped_string(rate * tokens, 0)))
}

/// One-line summary such as `1.5 ETH (About $3,000)`; the USD part is left
/// out when no rate is known for the symbol.
pub fn token_summary(
    symbol: &str,
    decimals: u8,
    amount: impl Into<Numberish>,
    rates: &DashMap<String, f64>,
) -> Result<String, ConversionError> {
    let amount = amount.into();
    let human = token_to_human(amount.clone(), decimals)?;

    match token_to_usd(symbol, decimals, amount, rates)? {
        Some(usd) => Ok(format!("{} {} (About ${})", human, symbol, usd)),
        None => Ok(format!("{} {}", human, symbol)),
    }
}
