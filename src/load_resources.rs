// src/load_resources.rs
use anyhow::{Context, Result};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::time::{interval, Duration};
use tracing::{info, warn};
use crate::create_clients::{create_http_client, create_rpc_providers, RpcProviderMap};
use crate::utils::fetch_token_details::{token_key, TokenInfo};
use crate::utils::token_conversion::{check_decimals, DEFAULT_DECIMALS};
use crate::utils::usd_rates::UsdRates;

pub const SETTINGS_FILE: &str = "settings.json";
pub const CHAINS_FILE: &str = "chains.json";
pub const TOKENS_FILE: &str = "tokens.json";
pub const FETCHED_TOKENS_FILE: &str = "new_tokens.json";
pub const RATES_FILE: &str = "rates.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub listen_addr: String,
    pub log_filter: String,
    pub default_decimals: u8,
    pub reload_interval_secs: u64,
    pub rpc_timeout_secs: u64,
    pub persist_fetched_tokens: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            log_filter: "info".to_string(),
            default_decimals: DEFAULT_DECIMALS,
            reload_interval_secs: 300,
            rpc_timeout_secs: 10,
            persist_fetched_tokens: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub native_symbol: Option<String>,
    #[serde(default)]
    pub rpc_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChainList {
    chains: Vec<ChainInfo>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokenList {
    pub tokens: HashMap<String, Vec<TokenInfo>>,
}

pub struct AppState {
    pub settings: Settings,
    pub config_dir: PathBuf,
    pub chains: Vec<ChainInfo>,
    pub tokens: Arc<DashMap<String, TokenInfo>>,
    pub fetched_tokens: Arc<DashMap<String, TokenInfo>>,
    pub rates: UsdRates,
    pub rpc_providers: RpcProviderMap,
    /// Serializes writes of new_tokens.json.
    pub persist_lock: Mutex<()>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        config_dir: PathBuf,
        chains: Vec<ChainInfo>,
        rpc_providers: RpcProviderMap,
    ) -> Self {
        Self {
            settings,
            config_dir,
            chains,
            tokens: Arc::new(DashMap::new()),
            fetched_tokens: Arc::new(DashMap::new()),
            rates: Arc::new(DashMap::new()),
            rpc_providers,
            persist_lock: Mutex::new(()),
        }
    }

    pub fn is_known_chain(&self, chain_id: u64) -> bool {
        self.chains.iter().any(|chain| chain.id == chain_id)
    }
}

pub fn load_json<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let content = fs::read_to_string(file_path)
        .with_context(|| format!("File not found: {}", file_path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON: {}", file_path.display()))
}

fn load_optional_json<T: DeserializeOwned + Default>(file_path: &Path) -> Result<T> {
    if !file_path.exists() {
        return Ok(T::default());
    }
    load_json(file_path)
}

pub fn load_settings(config_dir: &Path) -> Result<Settings> {
    let settings: Settings = load_optional_json(&config_dir.join(SETTINGS_FILE))?;
    check_decimals(settings.default_decimals).context("Invalid defaultDecimals in settings.json")?;
    Ok(settings)
}

/// Inserts every entry of a token list under its `chainId:address` key and
/// returns how many were indexed.
pub fn index_token_list(list: TokenList, tokens: &DashMap<String, TokenInfo>) -> usize {
    let mut indexed = 0;
    for (chain_id, chain_tokens) in list.tokens {
        let chain_id = match chain_id.parse::<u64>() {
            Ok(id) => id,
            Err(_) => {
                warn!("Skipping token list entry with invalid chain ID: {}", chain_id);
                continue;
            }
        };

        for mut token in chain_tokens {
            token.chain_id = chain_id;
            tokens.insert(token_key(chain_id, &token.address), token);
            indexed += 1;
        }
    }
    indexed
}

// Rebuilds the token map from disk; entries dropped from the files are dropped from the map
fn load_tokens(
    config_dir: &Path,
    tokens: &DashMap<String, TokenInfo>,
    fetched: &DashMap<String, TokenInfo>,
) -> Result<usize> {
    let list: TokenList = load_json(&config_dir.join(TOKENS_FILE))?;
    let fresh = DashMap::new();
    index_token_list(list, &fresh);

    // Tokens fetched over RPC in earlier runs
    match load_optional_json::<TokenList>(&config_dir.join(FETCHED_TOKENS_FILE)) {
        Ok(previously_fetched) => {
            index_token_list(previously_fetched, fetched);
        }
        Err(e) => warn!("Skipping {}: {:#}", FETCHED_TOKENS_FILE, e),
    }
    for entry in fetched.iter() {
        if !fresh.contains_key(entry.key()) {
            fresh.insert(entry.key().clone(), entry.value().clone());
        }
    }

    tokens.retain(|key, _| fresh.contains_key(key));
    let count = fresh.len();
    for (key, token) in fresh {
        tokens.insert(key, token);
    }

    Ok(count)
}

fn load_rates(config_dir: &Path, rates: &DashMap<String, f64>) -> Result<usize> {
    let loaded: HashMap<String, f64> = load_optional_json(&config_dir.join(RATES_FILE))?;
    let loaded: HashMap<String, f64> = loaded
        .into_iter()
        .map(|(symbol, rate)| (symbol.to_lowercase(), rate))
        .collect();

    rates.retain(|symbol, _| loaded.contains_key(symbol));
    let count = loaded.len();
    for (symbol, rate) in loaded {
        rates.insert(symbol, rate);
    }
    Ok(count)
}

pub fn create_app_state(config_dir: PathBuf, settings: Settings) -> Result<AppState> {
    info!("Loading configuration from {}", config_dir.display());

    let chains: ChainList = load_json(&config_dir.join(CHAINS_FILE))?;
    let client = create_http_client(&settings).context("Failed to build HTTP client")?;
    let rpc_providers = create_rpc_providers(&chains.chains, &client);
    info!("Loaded {} chains and {} RPC providers", chains.chains.len(), rpc_providers.len());

    let state = AppState::new(settings, config_dir, chains.chains, rpc_providers);

    let token_count = load_tokens(&state.config_dir, &state.tokens, &state.fetched_tokens)?;
    info!("Loaded {} tokens", token_count);

    let rate_count = load_rates(&state.config_dir, &state.rates)?;
    info!("Loaded {} USD rates", rate_count);

    Ok(state)
}

/// Re-reads tokens.json and rates.json into the shared maps. A file that
/// fails to load leaves its map untouched.
pub fn reload_from_disk(state: &AppState) {
    match load_tokens(&state.config_dir, &state.tokens, &state.fetched_tokens) {
        Ok(count) => tracing::debug!("Reloaded {} tokens", count),
        Err(e) => warn!("Failed to reload {}: {:#}", TOKENS_FILE, e),
    }

    match load_rates(&state.config_dir, &state.rates) {
        Ok(count) => tracing::debug!("Reloaded {} USD rates", count),
        Err(e) => warn!("Failed to reload {}: {:#}", RATES_FILE, e),
    }
}

// Periodically re-reads the token list and rates so edits apply without a restart
pub async fn reload_resources(state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(state.settings.reload_interval_secs.max(1)));
    interval.tick().await;

    loop {
        interval.tick().await;
        reload_from_disk(&state);
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    let chains = vec![ChainInfo {
        id: 1,
        name: "Ethereum".to_string(),
        native_symbol: Some("ETH".to_string()),
        rpc_urls: Vec::new(),
    }];
    let state = AppState::new(
        Settings { persist_fetched_tokens: false, ..Settings::default() },
        std::env::temp_dir(),
        chains,
        Arc::new(DashMap::new()),
    );

    let usdc = TokenInfo {
        address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
        chain_id: 1,
        symbol: "USDC".to_string(),
        decimals: 6,
        name: "USD Coin".to_string(),
        logo_uri: String::new(),
    };
    state.tokens.insert(token_key(1, &usdc.address), usdc);
    state.rates.insert("usdc".to_string(), 1.0);
    state
}
