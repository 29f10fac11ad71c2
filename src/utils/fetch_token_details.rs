// src/utils/fetch_token_details.rs
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use dashmap::DashMap;
use ethers::{
    prelude::*,
    types::H160,
};
use serde::{Deserialize, Serialize};
use tokio::task;
use tracing::{debug, info, warn};
use crate::load_resources::{AppState, FETCHED_TOKENS_FILE};
use crate::utils::utils::get_random_rpc_provider;

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
const EEEE_ADDRESS: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

abigen!(
    ERC20Metadata,
    r#"[
        {"constant":true,"inputs":[],"name":"symbol","outputs":[{"name":"","type":"string"}],"type":"function"},
        {"constant":true,"inputs":[],"name":"decimals","outputs":[{"name":"","type":"uint8"}],"type":"function"}
    ]"#
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    #[serde(rename = "chainId", default)]
    pub chain_id: u64,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "logoURI", default)]
    pub logo_uri: String,
}

/// What a caller needs to render an amount of some token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayToken {
    pub decimals: u8,
    pub symbol: Option<String>,
    pub native: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("No RPC provider available for chain ID: {0}")]
    NoProvider(u64),
    #[error("Invalid token address: {0}")]
    InvalidAddress(String),
    #[error("Contract call failed: {0}")]
    Contract(#[from] ContractError<Provider<Http>>),
    #[error("Failed to persist fetched tokens: {0}")]
    Persist(String),
}

pub fn normalize_token_address(token_address: &str) -> String {
    let lowered = token_address.trim().to_lowercase();
    if lowered == EEEE_ADDRESS {
        ZERO_ADDRESS.to_string()
    } else {
        lowered
    }
}

pub fn is_native_address(token_address: &str) -> bool {
    normalize_token_address(token_address) == ZERO_ADDRESS
}

pub fn token_key(chain_id: u64, token_address: &str) -> String {
    format!("{}:{}", chain_id, normalize_token_address(token_address))
}

pub fn find_cached_token(
    tokens: &DashMap<String, TokenInfo>,
    chain_id: u64,
    token_address: &str,
) -> Option<TokenInfo> {
    tokens.get(&token_key(chain_id, token_address)).map(|entry| entry.clone())
}

/// Groups a token map back into the on-disk `{ chainId: [token, ...] }` layout,
/// sorted by address within each chain.
pub fn group_tokens_by_chain(
    tokens: &DashMap<String, TokenInfo>,
) -> BTreeMap<String, Vec<TokenInfo>> {
    let mut grouped: BTreeMap<String, Vec<TokenInfo>> = BTreeMap::new();
    for entry in tokens.iter() {
        grouped.entry(entry.chain_id.to_string()).or_default().push(entry.value().clone());
    }
    for chain_tokens in grouped.values_mut() {
        chain_tokens.sort_by(|a, b| a.address.to_lowercase().cmp(&b.address.to_lowercase()));
    }
    grouped
}

/// Looks a token up in the token list first and falls back to the chain.
/// Returns `Ok(None)` for the native asset.
pub async fn fetch_token_details(
    token_address: &str,
    chain_id: u64,
    state: &Arc<AppState>,
) -> Result<Option<TokenInfo>, MetadataError> {
    if is_native_address(token_address) {
        return Ok(None);
    }

    if let Some(token_info) = find_cached_token(&state.tokens, chain_id, token_address) {
        debug!("Token {} on chain {} found in cache", token_address, chain_id);
        return Ok(Some(token_info));
    }

    let token_info = fetch_token_from_network(token_address, chain_id, state).await?;
    save_fetched_token(&token_info, state).await;
    Ok(Some(token_info))
}

async fn fetch_token_from_network(
    token_address: &str,
    chain_id: u64,
    state: &Arc<AppState>,
) -> Result<TokenInfo, MetadataError> {
    let provider = get_random_rpc_provider(chain_id, &state.rpc_providers)
        .ok_or(MetadataError::NoProvider(chain_id))?;

    let address = token_address
        .parse::<H160>()
        .map_err(|_| MetadataError::InvalidAddress(token_address.to_string()))?;

    let token_contract = ERC20Metadata::new(address, provider);
    let symbol: String = token_contract.symbol().call().await?;
    let decimals: u8 = token_contract.decimals().call().await?;

    info!("Fetched token from network: {} (symbol: {}, decimals: {})", token_address, symbol, decimals);

    Ok(TokenInfo {
        address: normalize_token_address(token_address),
        chain_id,
        symbol: symbol.clone(),
        decimals,
        name: symbol,
        logo_uri: String::new(),
    })
}

async fn save_fetched_token(token_info: &TokenInfo, state: &Arc<AppState>) {
    let key = token_key(token_info.chain_id, &token_info.address);
    state.tokens.insert(key.clone(), token_info.clone());
    state.fetched_tokens.insert(key, token_info.clone());

    if !state.settings.persist_fetched_tokens {
        return;
    }

    let state = Arc::clone(state);
    match task::spawn_blocking(move || persist_fetched_tokens(&state)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("{}", e),
        Err(e) => warn!("Persist task failed: {}", e),
    }
}

/// Writes the fetched tokens to a temp file and renames it over new_tokens.json,
/// so readers never see a partial file.
pub(crate) fn persist_fetched_tokens(state: &AppState) -> Result<(), MetadataError> {
    let _guard = state
        .persist_lock
        .lock()
        .map_err(|_| MetadataError::Persist("persist lock poisoned".to_string()))?;

    let body = serde_json::json!({ "tokens": group_tokens_by_chain(&state.fetched_tokens) });
    let bytes = serde_json::to_vec_pretty(&body).map_err(|e| MetadataError::Persist(e.to_string()))?;

    let file_path = state.config_dir.join(FETCHED_TOKENS_FILE);
    let tmp_path = file_path.with_extension("json.tmp");
    fs::write(&tmp_path, &bytes)
        .map_err(|e| MetadataError::Persist(format!("{}: {}", tmp_path.display(), e)))?;
    fs::rename(&tmp_path, &file_path)
        .map_err(|e| MetadataError::Persist(format!("{}: {}", file_path.display(), e)))
}

/// Decimals and symbol to render an amount with. The native asset, a missing
/// address and any lookup failure all fall back to the default decimals
/// without a symbol.
pub async fn resolve_display_token(
    token_address: Option<&str>,
    chain_id: Option<u64>,
    state: &Arc<AppState>,
) -> DisplayToken {
    let fallback = |native: bool| DisplayToken {
        decimals: state.settings.default_decimals,
        symbol: None,
        native,
    };

    let (token_address, chain_id) = match (token_address, chain_id) {
        (Some(address), Some(chain_id)) => (address, chain_id),
        (None, _) => return fallback(true),
        (Some(address), None) => return fallback(is_native_address(address)),
    };

    match fetch_token_details(token_address, chain_id, state).await {
        Ok(Some(token_info)) => DisplayToken {
            decimals: token_info.decimals,
            symbol: Some(token_info.symbol),
            native: false,
        },
        Ok(None) => fallback(true),
        Err(e) => {
            warn!("Token metadata lookup failed for {} on chain {}: {}", token_address, chain_id, e);
            fallback(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_resources::{load_json, test_state, TokenList};

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    #[test]
    fn native_addresses() {
        assert!(is_native_address(ZERO_ADDRESS));
        assert!(is_native_address("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE"));
        assert!(!is_native_address(USDC));
    }

    #[test]
    fn keys_ignore_address_case() {
        assert_eq!(token_key(1, USDC), token_key(1, &USDC.to_lowercase()));
        assert_ne!(token_key(1, USDC), token_key(10, USDC));
    }

    #[test]
    fn grouping_sorts_by_address() {
        let tokens = DashMap::new();
        for (address, chain_id) in [("0x02", 1u64), ("0x01", 1), ("0x03", 10)] {
            tokens.insert(
                token_key(chain_id, address),
                TokenInfo {
                    address: address.to_string(),
                    chain_id,
                    symbol: "T".to_string(),
                    decimals: 18,
                    name: String::new(),
                    logo_uri: String::new(),
                },
            );
        }

        let grouped = group_tokens_by_chain(&tokens);
        assert_eq!(grouped.len(), 2);
        let addresses: Vec<_> = grouped["1"].iter().map(|t| t.address.as_str()).collect();
        assert_eq!(addresses, vec!["0x01", "0x02"]);
    }

    #[tokio::test]
    async fn cached_token_resolves_without_network() {
        let state = Arc::new(test_state());
        let token = resolve_display_token(Some(USDC), Some(1), &state).await;
        assert_eq!(token, DisplayToken { decimals: 6, symbol: Some("USDC".to_string()), native: false });
    }

    #[tokio::test]
    async fn native_token_defaults_to_eighteen_decimals() {
        let state = Arc::new(test_state());
        let token = resolve_display_token(Some(ZERO_ADDRESS), Some(1), &state).await;
        assert_eq!(token, DisplayToken { decimals: 18, symbol: None, native: true });

        let token = resolve_display_token(None, None, &state).await;
        assert_eq!(token, DisplayToken { decimals: 18, symbol: None, native: true });
    }

    #[tokio::test]
    async fn failed_lookup_falls_back_to_defaults() {
        let state = Arc::new(test_state());
        let unknown = "0x1111111111111111111111111111111111111111";

        let err = fetch_token_details(unknown, 1, &state).await.unwrap_err();
        assert!(matches!(err, MetadataError::NoProvider(1)));

        let token = resolve_display_token(Some(unknown), Some(1), &state).await;
        assert_eq!(token, DisplayToken { decimals: 18, symbol: None, native: false });
    }

    fn persisting_state() -> AppState {
        let dir = std::env::temp_dir().join(format!("token-display-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        AppState::new(Default::default(), dir, Vec::new(), Arc::new(DashMap::new()))
    }

    fn fetched(index: u64) -> TokenInfo {
        TokenInfo {
            address: format!("0x{:040x}", index),
            chain_id: 1,
            symbol: format!("TKN{}", index),
            decimals: 8,
            name: String::new(),
            logo_uri: String::new(),
        }
    }

    #[test]
    fn persisted_tokens_load_back() {
        let state = persisting_state();
        let token = fetched(7);
        state.fetched_tokens.insert(token_key(1, &token.address), token.clone());

        persist_fetched_tokens(&state).unwrap();

        let file_path = state.config_dir.join(FETCHED_TOKENS_FILE);
        let list: TokenList = load_json(&file_path).unwrap();
        assert_eq!(list.tokens["1"], vec![token]);
        assert!(!file_path.with_extension("json.tmp").exists());
    }

    #[test]
    fn concurrent_persists_leave_a_complete_file() {
        let state = persisting_state();

        std::thread::scope(|scope| {
            for index in 1..=8u64 {
                let state = &state;
                scope.spawn(move || {
                    let token = fetched(index);
                    state.fetched_tokens.insert(token_key(1, &token.address), token);
                    persist_fetched_tokens(state).unwrap();
                });
            }
        });

        let list: TokenList = load_json(&state.config_dir.join(FETCHED_TOKENS_FILE)).unwrap();
        assert_eq!(list.tokens["1"].len(), 8);
    }
}
