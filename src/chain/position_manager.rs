use ethers::contract::abigen;
use ethers::middleware::SignerMiddleware;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use ethers::signers::LocalWallet;
use std::sync::Arc;

use crate::chain::bigint_to_u256;
use crate::engine::executor::TransactionSubmitter;
use crate::error::ChainError;
use crate::models::{MintRequest, SubmissionReceipt};

abigen!(
    PositionManager,
    r#"[
        {
            "name": "mint",
            "type": "function",
            "stateMutability": "payable",
            "inputs": [
                {
                    "name": "params",
                    "type": "tuple",
                    "components": [
                        { "name": "token0", "type": "address" },
                        { "name": "token1", "type": "address" },
                        { "name": "fee", "type": "uint24" },
                        { "name": "tickLower", "type": "int24" },
                        { "name": "tickUpper", "type": "int24" },
                        { "name": "amount0Desired", "type": "uint256" },
                        { "name": "amount1Desired", "type": "uint256" },
                        { "name": "amount0Min", "type": "uint256" },
                        { "name": "amount1Min", "type": "uint256" },
                        { "name": "recipient", "type": "address" },
                        { "name": "deadline", "type": "uint256" }
                    ]
                }
            ],
            "outputs": [
                { "name": "tokenId", "type": "uint256" },
                { "name": "liquidity", "type": "uint128" },
                { "name": "amount0", "type": "uint256" },
                { "name": "amount1", "type": "uint256" }
            ]
        }
    ]"#
);

abigen!(
    Erc20,
    r#"[
        function balanceOf(address owner) view returns (uint256)
        function allowance(address owner, address spender) view returns (uint256)
    ]"#
);

/// Gas shaping applied to every submission. Headroom on the estimate absorbs
/// tick movement between estimation and inclusion; the price bump buys a
/// faster slot in the block.
#[derive(Debug, Clone)]
pub struct GasSettings {
    pub limit_headroom_percent: u64,
    pub price_bump_percent: u64,
    pub fallback_gas_price_gwei: u64,
}

impl Default for GasSettings {
    fn default() -> Self {
        Self {
            limit_headroom_percent: 150,
            price_bump_percent: 150,
            fallback_gas_price_gwei: 5,
        }
    }
}

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Signs and submits position-manager mints, with a balance/allowance
/// preflight so doomed transactions never leave the machine.
pub struct MintSubmitter {
    client: Arc<SignerClient>,
    position_manager: Address,
    gas: GasSettings,
}

impl MintSubmitter {
    pub fn new(
        provider: Arc<Provider<Http>>,
        wallet: LocalWallet,
        position_manager: Address,
        gas: GasSettings,
    ) -> Self {
        let client = Arc::new(SignerMiddleware::new((*provider).clone(), wallet));
        Self {
            client,
            position_manager,
            gas,
        }
    }

    async fn check_funding(&self, request: &MintRequest) -> Result<(), ChainError> {
        let owner = self.client.address();
        let sides = [
            (request.token0, &request.amount0_desired, "token0"),
            (request.token1, &request.amount1_desired, "token1"),
        ];

        for (token, needed, label) in sides {
            let needed = bigint_to_u256(needed).ok_or_else(|| {
                ChainError::Rejected(format!("{label} desired amount exceeds uint256"))
            })?;
            if needed.is_zero() {
                continue;
            }

            let erc20 = Erc20::new(token, self.client.clone());
            let balance = erc20
                .balance_of(owner)
                .call()
                .await
                .map_err(|e| ChainError::Unavailable(format!("balanceOf failed: {e}")))?;
            if balance < needed {
                return Err(ChainError::Rejected(format!(
                    "insufficient {label} balance: have {balance}, need {needed}"
                )));
            }

            let allowance = erc20
                .allowance(owner, self.position_manager)
                .call()
                .await
                .map_err(|e| ChainError::Unavailable(format!("allowance failed: {e}")))?;
            if allowance < needed {
                return Err(ChainError::Rejected(format!(
                    "insufficient {label} allowance: approved {allowance}, need {needed}"
                )));
            }
            log::debug!("{label} preflight ok: balance {balance}, allowance {allowance}");
        }

        Ok(())
    }

    async fn shaped_gas_price(&self) -> U256 {
        let base = match self.client.get_gas_price().await {
            Ok(price) if !price.is_zero() => price,
            _ => {
                log::warn!(
                    "node reported no gas price; falling back to {} gwei",
                    self.gas.fallback_gas_price_gwei
                );
                U256::from(self.gas.fallback_gas_price_gwei) * U256::exp10(9)
            }
        };
        base * U256::from(self.gas.price_bump_percent) / U256::from(100u64)
    }
}

impl TransactionSubmitter for MintSubmitter {
    async fn submit(&self, request: &MintRequest) -> Result<SubmissionReceipt, ChainError> {
        self.check_funding(request).await?;

        let widen = |value, label: &str| {
            bigint_to_u256(value)
                .ok_or_else(|| ChainError::Rejected(format!("{label} exceeds uint256")))
        };
        let params = (
            request.token0,
            request.token1,
            request.fee,
            request.tick_lower,
            request.tick_upper,
            widen(&request.amount0_desired, "amount0Desired")?,
            widen(&request.amount1_desired, "amount1Desired")?,
            widen(&request.amount0_min, "amount0Min")?,
            widen(&request.amount1_min, "amount1Min")?,
            request.recipient,
            U256::from(request.deadline),
        );

        let manager = PositionManager::new(self.position_manager, self.client.clone());
        let call = manager.mint(params);

        let estimated = call
            .estimate_gas()
            .await
            .map_err(|e| ChainError::Rejected(format!("gas estimation failed: {e}")))?;
        let gas_limit =
            estimated * U256::from(self.gas.limit_headroom_percent) / U256::from(100u64);
        let gas_price = self.shaped_gas_price().await;
        log::debug!("mint gas: limit {gas_limit} (estimate {estimated}), price {gas_price} wei");

        let call = call.gas(gas_limit).gas_price(gas_price);
        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::Rejected(format!("mint send failed: {e}")))?;
        let tx_hash = *pending;
        log::info!("mint submitted: {tx_hash:?}");

        let receipt = pending
            .await
            .map_err(|e| ChainError::Unavailable(format!("confirmation failed: {e}")))?
            .ok_or_else(|| ChainError::Unavailable("transaction dropped from the mempool".into()))?;

        if receipt.status != Some(U64::one()) {
            return Err(ChainError::Rejected(format!(
                "mint reverted in block {:?}",
                receipt.block_number
            )));
        }

        log::info!(
            "mint confirmed in block {:?}, gas used {:?}",
            receipt.block_number,
            receipt.gas_used
        );
        Ok(SubmissionReceipt {
            tx_hash,
            gas_used: receipt.gas_used,
        })
    }
}
