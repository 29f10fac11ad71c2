// src/create_clients.rs
use std::sync::Arc;
use std::time::Duration;
use dashmap::DashMap;
use ethers::providers::{Http, Provider};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;
use crate::load_resources::{ChainInfo, Settings};

// (chain id, rpc url) -> provider
pub type RpcProviderMap = Arc<DashMap<(u64, String), Arc<Provider<Http>>>>;

pub fn create_http_client(settings: &Settings) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(settings.rpc_timeout_secs))
        .build()
}

// All providers share one reqwest client so connections are pooled across chains
pub fn create_rpc_providers(chains: &[ChainInfo], client: &Client) -> RpcProviderMap {
    let providers = Arc::new(DashMap::new());

    for chain in chains {
        for rpc_url_str in &chain.rpc_urls {
            let rpc_url = match Url::parse(rpc_url_str) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Skipping invalid RPC URL for chain {}: {} ({})", chain.id, rpc_url_str, e);
                    continue;
                }
            };

            let provider = Provider::new(Http::new_with_client(rpc_url.clone(), client.clone()));
            providers.insert((chain.id, rpc_url.to_string()), Arc::new(provider));
            debug!("Registered RPC provider for chain {}: {}", chain.id, rpc_url);
        }
    }

    providers
}
