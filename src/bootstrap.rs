use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context};
use ethers::prelude::*;
use ethers::utils::parse_units;
use num_bigint::BigInt;

use crate::chain::position_manager::{GasSettings, MintSubmitter};
use crate::chain::pool_client::RpcStateReader;
use crate::chain::{providers, u256_to_bigint};
use crate::config::Config;
use crate::models::{PoolKey, PositionPlan, RangeSpec, TokenSide};

pub struct AppState {
    pub provider: Arc<Provider<Http>>,
    pub reader: RpcStateReader,
    pub submitter: MintSubmitter,
    pub plan: PositionPlan,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let provider = providers::create_provider(&config.rpc_url)?;

        let factory = Address::from_str(&config.factory_address).context("FACTORY_ADDRESS")?;
        let position_manager = Address::from_str(&config.position_manager_address)
            .context("POSITION_MANAGER_ADDRESS")?;
        let token0 = Address::from_str(&config.token0_address).context("TOKEN0_ADDRESS")?;
        let token1 = Address::from_str(&config.token1_address).context("TOKEN1_ADDRESS")?;

        let wallet: LocalWallet = config
            .wallet_private_key
            .parse()
            .context("WALLET_PRIVATE_KEY")?;
        let wallet = wallet.with_chain_id(config.chain_id);

        let recipient = match &config.recipient_address {
            Some(raw) => Address::from_str(raw).context("RECIPIENT_ADDRESS")?,
            None => wallet.address(),
        };

        let input_side = match config.input_token.as_str() {
            "token0" => TokenSide::Token0,
            "token1" => TokenSide::Token1,
            other => bail!("unsupported INPUT_TOKEN {other:?}"),
        };
        let input_decimals = match input_side {
            TokenSide::Token0 => config.token0_decimals,
            TokenSide::Token1 => config.token1_decimals,
        };
        let input_amount = parse_input_amount(&config.input_amount, input_decimals)?;

        let plan = PositionPlan {
            pool: PoolKey {
                token0,
                token1,
                fee: config.pool_fee,
            },
            input_side,
            input_amount,
            range_spec: resolve_range_spec(config, input_side)?,
            base_slippage_percent: config.base_slippage_percent,
            recipient,
        };

        let reader = RpcStateReader::new(provider.clone(), factory);
        let submitter = MintSubmitter::new(
            provider.clone(),
            wallet,
            position_manager,
            GasSettings {
                limit_headroom_percent: config.gas_limit_headroom_percent,
                price_bump_percent: config.gas_price_bump_percent,
                fallback_gas_price_gwei: config.fallback_gas_price_gwei,
            },
        );

        Ok(AppState {
            provider,
            reader,
            submitter,
            plan,
        })
    }
}

fn parse_input_amount(raw: &str, decimals: u32) -> anyhow::Result<BigInt> {
    let parsed = parse_units(raw, decimals)
        .with_context(|| format!("INPUT_AMOUNT {raw:?} is not a valid decimal amount"))?;
    Ok(u256_to_bigint(parsed.into()))
}

/// Explicit range specs pass through; "auto" falls back to the historical
/// defaults — a tight two-sided band, or a single-sided shelf next to the
/// current price on the side the input token can fill.
fn resolve_range_spec(config: &Config, input_side: TokenSide) -> anyhow::Result<RangeSpec> {
    let bounds = || -> anyhow::Result<(f64, f64)> {
        match (config.range_lower, config.range_upper) {
            (Some(lower), Some(upper)) => Ok((lower, upper)),
            _ => bail!("RANGE_TYPE {:?} requires RANGE_LOWER and RANGE_UPPER", config.range_type),
        }
    };

    match config.range_type.as_str() {
        "percentage" => {
            let (lower, upper) = bounds()?;
            Ok(RangeSpec::Percentage { lower, upper })
        }
        "relative" => {
            let (lower, upper) = bounds()?;
            Ok(RangeSpec::RelativeTicks {
                lower: lower as i32,
                upper: upper as i32,
            })
        }
        "absolute" => {
            let (lower, upper) = bounds()?;
            Ok(RangeSpec::AbsoluteTicks {
                lower: lower as i32,
                upper: upper as i32,
            })
        }
        "auto" => {
            if config.liquidity_mode == "double" {
                return Ok(RangeSpec::Percentage {
                    lower: -0.5,
                    upper: 0.5,
                });
            }
            Ok(match input_side {
                TokenSide::Token0 => RangeSpec::RelativeTicks {
                    lower: 10,
                    upper: 200,
                },
                TokenSide::Token1 => RangeSpec::RelativeTicks {
                    lower: -200,
                    upper: -10,
                },
            })
        }
        other => bail!("unsupported RANGE_TYPE {other:?}"),
    }
}
