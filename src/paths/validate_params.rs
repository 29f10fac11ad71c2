//src/paths/validate_params.rs
use lazy_static::lazy_static;
use regex::Regex;
use crate::load_resources::AppState;
use crate::paths::format::AmountParams;
use crate::utils::token_conversion::MAX_DECIMALS;

lazy_static! {
    static ref ADDRESS_REGEX: Regex = Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap();
}

pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
}

impl ValidationResult {
    fn valid() -> Self {
        ValidationResult {
            valid: true,
            message: "Valid parameters".to_string(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        ValidationResult {
            valid: false,
            message: message.into(),
        }
    }
}

pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_REGEX.is_match(address)
}

pub fn validate_amount_params(params: &AmountParams, state: &AppState) -> ValidationResult {
    if params.amount.trim().is_empty() {
        return ValidationResult::invalid("Missing mandatory parameter: amount");
    }

    if let Some(decimals) = params.decimals {
        if decimals > MAX_DECIMALS {
            return ValidationResult::invalid(format!("Invalid decimals: {} (expected 0..={})", decimals, MAX_DECIMALS));
        }
    }

    if let Some(chain_id) = params.chain_id {
        if !state.is_known_chain(chain_id) {
            return ValidationResult::invalid("Invalid chainId");
        }
    }

    if let Some(token_address) = params.token_address.as_deref() {
        if params.chain_id.is_none() {
            return ValidationResult::invalid("Missing mandatory parameter: chainId");
        }
        if !is_valid_address(token_address) {
            return ValidationResult::invalid("Invalid address format");
        }
    }

    ValidationResult::valid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_resources::test_state;

    fn params(amount: &str, decimals: Option<u8>, chain_id: Option<u64>, token_address: Option<&str>) -> AmountParams {
        AmountParams {
            amount: amount.to_string(),
            decimals,
            chain_id,
            token_address: token_address.map(str::to_string),
        }
    }

    fn message(result: ValidationResult) -> Option<String> {
        if result.valid {
            None
        } else {
            Some(result.message)
        }
    }

    #[test]
    fn accepts_minimal_and_full_params() {
        let state = test_state();
        assert!(validate_amount_params(&params("1", None, None, None), &state).valid);
        assert!(
            validate_amount_params(
                &params("1", Some(6), Some(1), Some("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")),
                &state
            )
            .valid
        );
    }

    #[test]
    fn rejects_missing_amount() {
        let state = test_state();
        assert_eq!(
            message(validate_amount_params(&params("  ", None, None, None), &state)).as_deref(),
            Some("Missing mandatory parameter: amount")
        );
    }

    #[test]
    fn rejects_decimals_out_of_range() {
        let state = test_state();
        assert!(!validate_amount_params(&params("1", Some(78), None, None), &state).valid);
    }

    #[test]
    fn rejects_unknown_chain() {
        let state = test_state();
        assert_eq!(
            message(validate_amount_params(&params("1", None, Some(999), None), &state)).as_deref(),
            Some("Invalid chainId")
        );
    }

    #[test]
    fn token_address_needs_chain_and_format() {
        let state = test_state();
        let address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
        assert_eq!(
            message(validate_amount_params(&params("1", None, None, Some(address)), &state)).as_deref(),
            Some("Missing mandatory parameter: chainId")
        );
        assert_eq!(
            message(validate_amount_params(&params("1", None, Some(1), Some("0x1234")), &state)).as_deref(),
            Some("Invalid address format")
        );
    }
}
