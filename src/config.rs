use std::env;

use anyhow::{bail, Context};

/// Immutable runtime configuration, read once at startup. Everything the
/// planning engine needs travels in an explicit `PositionPlan` built from
/// this; nothing global survives past `from_env`.
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub chain_id: u64,

    // Contract addresses
    pub factory_address: String,
    pub position_manager_address: String,

    // Pool
    pub token0_address: String,
    pub token1_address: String,
    pub pool_fee: u32,
    pub token0_decimals: u32,
    pub token1_decimals: u32,

    // Position sizing
    pub liquidity_mode: String, // "single" | "double"
    pub input_token: String,    // "token0" | "token1"
    pub input_amount: String,   // human units, scaled by the side's decimals

    // Range selection; "auto" derives a default band from the liquidity mode
    pub range_type: String, // "auto" | "percentage" | "relative" | "absolute"
    pub range_lower: Option<f64>,
    pub range_upper: Option<f64>,

    // Execution
    pub base_slippage_percent: f64,
    pub wallet_private_key: String,
    pub recipient_address: Option<String>,

    // Gas shaping
    pub gas_limit_headroom_percent: u64,
    pub gas_price_bump_percent: u64,
    pub fallback_gas_price_gwei: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load configuration files (secrets first, then public config)
        dotenv::from_filename("secrets.env").ok();
        dotenv::from_filename("config/pool.env").ok();
        dotenv::dotenv().ok();

        let config = Config {
            rpc_url: required("RPC_URL")?,
            chain_id: parse_or("CHAIN_ID", 56)?,

            factory_address: required("FACTORY_ADDRESS")?,
            position_manager_address: required("POSITION_MANAGER_ADDRESS")?,

            token0_address: required("TOKEN0_ADDRESS")?,
            token1_address: required("TOKEN1_ADDRESS")?,
            pool_fee: parse_or("POOL_FEE", 100)?,
            token0_decimals: parse_or("TOKEN0_DECIMALS", 18)?,
            token1_decimals: parse_or("TOKEN1_DECIMALS", 18)?,

            liquidity_mode: env::var("LIQUIDITY_MODE").unwrap_or_else(|_| "single".to_string()),
            input_token: env::var("INPUT_TOKEN").unwrap_or_else(|_| "token0".to_string()),
            input_amount: env::var("INPUT_AMOUNT").unwrap_or_else(|_| "0.1".to_string()),

            range_type: env::var("RANGE_TYPE").unwrap_or_else(|_| "auto".to_string()),
            range_lower: parse_opt("RANGE_LOWER")?,
            range_upper: parse_opt("RANGE_UPPER")?,

            base_slippage_percent: parse_or("BASE_SLIPPAGE_PERCENT", 1.0)?,
            wallet_private_key: required("WALLET_PRIVATE_KEY")?,
            recipient_address: env::var("RECIPIENT_ADDRESS").ok(),

            gas_limit_headroom_percent: parse_or("GAS_LIMIT_HEADROOM_PERCENT", 150)?,
            gas_price_bump_percent: parse_or("GAS_PRICE_BUMP_PERCENT", 150)?,
            fallback_gas_price_gwei: parse_or("FALLBACK_GAS_PRICE_GWEI", 5)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self.liquidity_mode.as_str() {
            "single" | "double" => {}
            other => bail!("LIQUIDITY_MODE must be \"single\" or \"double\", got {other:?}"),
        }
        match self.input_token.as_str() {
            "token0" | "token1" => {}
            other => bail!("INPUT_TOKEN must be \"token0\" or \"token1\", got {other:?}"),
        }
        match self.range_type.as_str() {
            "auto" => {}
            "percentage" | "relative" | "absolute" => {
                let (lower, upper) = match (self.range_lower, self.range_upper) {
                    (Some(l), Some(u)) => (l, u),
                    _ => bail!(
                        "RANGE_TYPE {:?} requires RANGE_LOWER and RANGE_UPPER",
                        self.range_type
                    ),
                };
                if lower >= upper {
                    bail!("RANGE_LOWER must be below RANGE_UPPER ({lower} >= {upper})");
                }
            }
            other => bail!(
                "RANGE_TYPE must be auto, percentage, relative or absolute, got {other:?}"
            ),
        }
        if !(0.0..=10.0).contains(&self.base_slippage_percent) {
            bail!(
                "BASE_SLIPPAGE_PERCENT must be within 0..=10, got {}",
                self.base_slippage_percent
            );
        }
        Ok(())
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value")),
        Err(_) => Ok(default),
    }
}

fn parse_opt<T: std::str::FromStr>(key: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => Ok(Some(
            raw.parse()
                .with_context(|| format!("{key} has an invalid value"))?,
        )),
        Err(_) => Ok(None),
    }
}
