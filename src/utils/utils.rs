// src/utils/utils.rs
use std::sync::Arc;
use ethers::providers::{Http, Provider};
use rand::prelude::IteratorRandom;
use rand::thread_rng;
use crate::create_clients::RpcProviderMap;

pub fn get_random_rpc_provider(
    chain_id: u64,
    rpc_providers: &RpcProviderMap,
) -> Option<Arc<Provider<Http>>> {
    rpc_providers
        .iter()
        .filter(|entry| entry.key().0 == chain_id)
        .choose(&mut thread_rng())
        .map(|entry| Arc::clone(entry.value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    #[test]
    fn picks_only_providers_for_the_chain() {
        let providers: RpcProviderMap = Arc::new(DashMap::new());
        let provider = Provider::<Http>::try_from("https://eth.example.org").unwrap();
        providers.insert((1, "https://eth.example.org".to_string()), Arc::new(provider));

        assert!(get_random_rpc_provider(1, &providers).is_some());
        assert!(get_random_rpc_provider(137, &providers).is_none());
    }
}
