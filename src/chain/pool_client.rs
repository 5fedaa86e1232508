use chrono::Utc;
use ethers::contract::abigen;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::sync::Arc;

use crate::chain::u256_to_bigint;
use crate::engine::executor::ChainStateReader;
use crate::error::ChainError;
use crate::models::{PoolKey, PoolObservation};

abigen!(
    PoolFactory,
    r#"[
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool)
    ]"#
);

abigen!(
    LiquidityPool,
    r#"[
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked)
    ]"#
);

/// Reads pool snapshots over JSON-RPC: factory lookup, then slot0.
pub struct RpcStateReader {
    provider: Arc<Provider<Http>>,
    factory: Address,
}

impl RpcStateReader {
    pub fn new(provider: Arc<Provider<Http>>, factory: Address) -> Self {
        Self { provider, factory }
    }

    async fn resolve_pool(&self, key: &PoolKey) -> Result<Address, ChainError> {
        let factory = PoolFactory::new(self.factory, self.provider.clone());
        let pool = factory
            .get_pool(key.token0, key.token1, key.fee)
            .call()
            .await
            .map_err(|e| ChainError::Unavailable(format!("getPool failed: {e}")))?;
        if pool == Address::zero() {
            return Err(ChainError::Unavailable(format!(
                "no pool deployed for {:?}/{:?} at fee {}",
                key.token0, key.token1, key.fee
            )));
        }
        Ok(pool)
    }
}

impl ChainStateReader for RpcStateReader {
    async fn get_observation(&self, key: &PoolKey) -> Result<PoolObservation, ChainError> {
        let pool_address = self.resolve_pool(key).await?;
        let pool = LiquidityPool::new(pool_address, self.provider.clone());
        let (sqrt_price_x96, tick, ..) = pool
            .slot_0()
            .call()
            .await
            .map_err(|e| ChainError::Unavailable(format!("slot0 failed: {e}")))?;

        log::debug!("pool {pool_address:?} slot0 — tick {tick}, sqrtPriceX96 {sqrt_price_x96}");

        Ok(PoolObservation {
            tick,
            sqrt_price_x96: u256_to_bigint(sqrt_price_x96),
            observed_at: Utc::now(),
        })
    }
}
