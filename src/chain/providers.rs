use anyhow::Context;
use ethers::prelude::*;
use std::sync::Arc;

pub fn create_provider(rpc_url: &str) -> anyhow::Result<Arc<Provider<Http>>> {
    let provider = Provider::<Http>::try_from(rpc_url)
        .with_context(|| format!("invalid RPC url: {rpc_url}"))?;
    // Could add middleware for retries, timeouts, etc.
    Ok(Arc::new(provider))
}
