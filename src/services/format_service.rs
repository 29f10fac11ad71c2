//src/services/format_service.rs
use std::sync::Arc;
use ethers::types::U256;
use serde::Serialize;
use tracing::{debug, info};
use crate::load_resources::AppState;
use crate::paths::format::AmountParams;
use crate::utils::fetch_token_details::{resolve_display_token, DisplayToken};
use crate::utils::token_conversion::{
    denormalize_tokens, format_units, normalize_tokens, parse_units, token_to_human, token_to_human_short,
    transform_number_input, ConversionError, Numberish,
};
use crate::utils::usd_rates::{token_summary, token_to_usd};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedAmount {
    pub amount: String,
    pub decimals: u8,
    pub symbol: Option<String>,
    pub native: bool,
    pub value: f64,
    pub human: String,
    pub short: String,
    pub usd: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAmount {
    pub amount: String,
    pub exact: String,
    pub decimals: u8,
    pub symbol: Option<String>,
    pub native: bool,
}

// Plain digit strings stay integers so amounts above 2^53 are not parsed through a float first
fn parse_amount(raw: &str) -> Numberish {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(value) = U256::from_dec_str(trimmed) {
            return Numberish::Integer(value);
        }
    }
    Numberish::from(trimmed)
}

async fn resolve_token(params: &AmountParams, state: &Arc<AppState>) -> DisplayToken {
    let mut token =
        resolve_display_token(params.token_address.as_deref(), params.chain_id, state).await;
    if let Some(decimals) = params.decimals {
        token.decimals = decimals;
    }
    token
}

fn format_amount(
    amount: &Numberish,
    token: &DisplayToken,
    state: &AppState,
) -> Result<FormattedAmount, ConversionError> {
    let decimals = token.decimals;
    let value = denormalize_tokens(amount.clone(), decimals)?;
    let human = token_to_human(amount.clone(), decimals)?;
    let short = token_to_human_short(amount.clone(), decimals)?;

    let (usd, summary) = match token.symbol.as_deref() {
        Some(symbol) => (
            token_to_usd(symbol, decimals, amount.clone(), &state.rates)?,
            Some(token_summary(symbol, decimals, amount.clone(), &state.rates)?),
        ),
        None => (None, None),
    };

    Ok(FormattedAmount {
        amount: amount.to_string(),
        decimals,
        symbol: token.symbol.clone(),
        native: token.native,
        value,
        human,
        short,
        usd,
        summary,
    })
}

pub async fn process_format(
    params: &AmountParams,
    state: &Arc<AppState>,
) -> Result<FormattedAmount, String> {
    info!("Formatting amount {} (token: {:?}, chain: {:?})", params.amount, params.token_address, params.chain_id);

    let token = resolve_token(params, state).await;
    let amount = parse_amount(&params.amount);

    let formatted = format_amount(&amount, &token, state).map_err(|e| e.to_string())?;

    debug!("Formatted amount: {:?}", formatted);
    Ok(formatted)
}

/// Exact parse first; scientific notation and other float-only spellings go
/// through the rounding float path.
pub fn normalize_input(input: &str, decimals: u8) -> Result<U256, ConversionError> {
    let input = transform_number_input(input);
    match parse_units(&input, decimals) {
        Ok(value) => Ok(value),
        Err(ConversionError::InvalidAmount(_)) => normalize_tokens(input.as_str(), decimals),
        Err(e) => Err(e),
    }
}

pub async fn process_normalize(
    params: &AmountParams,
    state: &Arc<AppState>,
) -> Result<NormalizedAmount, String> {
    info!("Normalizing amount {} (token: {:?}, chain: {:?})", params.amount, params.token_address, params.chain_id);

    let token = resolve_token(params, state).await;
    let amount = normalize_input(&params.amount, token.decimals).map_err(|e| e.to_string())?;
    let exact = format_units(amount, token.decimals).map_err(|e| e.to_string())?;

    Ok(NormalizedAmount {
        amount: amount.to_string(),
        exact,
        decimals: token.decimals,
        symbol: token.symbol,
        native: token.native,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_resources::test_state;

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    fn params(amount: &str, decimals: Option<u8>, token_address: Option<&str>) -> AmountParams {
        AmountParams {
            amount: amount.to_string(),
            decimals,
            chain_id: token_address.map(|_| 1),
            token_address: token_address.map(str::to_string),
        }
    }

    #[test]
    fn digit_strings_become_integers() {
        assert_eq!(parse_amount("1000000000000000000000000"), Numberish::Integer(U256::exp10(24)));
        assert_eq!(parse_amount("1.5"), Numberish::Text("1.5".to_string()));
    }

    #[tokio::test]
    async fn formats_known_token_with_usd() {
        let state = Arc::new(test_state());
        let formatted = process_format(&params("1234567890", None, Some(USDC)), &state).await.unwrap();

        assert_eq!(formatted.decimals, 6);
        assert_eq!(formatted.symbol.as_deref(), Some("USDC"));
        assert_eq!(formatted.human, "1,234.568");
        assert_eq!(formatted.short, "1.2K");
        assert_eq!(formatted.usd.as_deref(), Some("1,235"));
        assert_eq!(formatted.summary.as_deref(), Some("1,234.568 USDC (About $1,235)"));
        assert!(!formatted.native);
    }

    #[tokio::test]
    async fn explicit_decimals_override_lookup() {
        let state = Arc::new(test_state());
        let formatted = process_format(&params("1500", Some(0), None), &state).await.unwrap();

        assert_eq!(formatted.decimals, 0);
        assert_eq!(formatted.human, "1,500");
        assert_eq!(formatted.short, "1.5K");
        assert_eq!(formatted.symbol, None);
        assert_eq!(formatted.usd, None);
        assert!(formatted.native);
    }

    #[tokio::test]
    async fn native_amount_uses_default_decimals() {
        let state = Arc::new(test_state());
        let formatted = process_format(&params("5000000000000000", None, None), &state).await.unwrap();
        assert_eq!(formatted.decimals, 18);
        assert_eq!(formatted.human, "<0.01");
    }

    #[tokio::test]
    async fn format_reports_bad_amounts() {
        let state = Arc::new(test_state());
        let err = process_format(&params("-5", None, None), &state).await.unwrap_err();
        assert_eq!(err, "Invalid amount: -5");
    }

    #[tokio::test]
    async fn normalizes_form_input() {
        let state = Arc::new(test_state());
        let normalized = process_normalize(&params(".5", None, Some(USDC)), &state).await.unwrap();
        assert_eq!(normalized.amount, "500000");
        assert_eq!(normalized.exact, "0.5");
        assert_eq!(normalized.symbol.as_deref(), Some("USDC"));
    }

    #[test]
    fn normalize_input_falls_back_to_float_path() {
        assert_eq!(normalize_input("1e3", 0).unwrap(), U256::from(1000u64));
        assert_eq!(normalize_input("2.", 2).unwrap(), U256::from(200u64));
        assert!(normalize_input("abc", 18).is_err());
        assert!(matches!(normalize_input("1", 99), Err(ConversionError::InvalidDecimals(99))));
    }
}
