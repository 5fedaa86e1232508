use chrono::{DateTime, Utc};
use ethers::types::{Address, TxHash, U256};
use num_bigint::BigInt;
use serde::Serialize;

/// Identifies a pool to the chain adapters: ordered token pair plus fee tier
/// in hundredths of a bip (100 = 0.01%).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolKey {
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
}

/// One read of a pool's slot0. Never mutated; the executor compares two of
/// these to measure price drift.
#[derive(Debug, Clone)]
pub struct PoolObservation {
    pub tick: i32,
    pub sqrt_price_x96: BigInt,
    pub observed_at: DateTime<Utc>,
}

/// Which side of the pair the known input amount is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSide {
    Token0,
    Token1,
}

/// How the caller describes the wanted price range. Percentages use the
/// legacy linear scale of 100 ticks per 1%; the tick variants are exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeSpec {
    Percentage { lower: f64, upper: f64 },
    RelativeTicks { lower: i32, upper: i32 },
    AbsoluteTicks { lower: i32, upper: i32 },
}

/// A planned, spacing-aligned tick range. `tick_lower < tick_upper` always
/// holds for values produced by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub tick_lower: i32,
    pub tick_upper: i32,
}

/// Token amounts in base units. At most one side is zero when the current
/// price sits strictly outside the range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountPair {
    pub amount0: BigInt,
    pub amount1: BigInt,
}

/// Everything one execution attempt needs, fixed up front. Built once by the
/// caller and passed by reference into every planning call; the engine keeps
/// no ambient configuration.
#[derive(Debug, Clone)]
pub struct PositionPlan {
    pub pool: PoolKey,
    pub input_side: TokenSide,
    pub input_amount: BigInt,
    pub range_spec: RangeSpec,
    pub base_slippage_percent: f64,
    pub recipient: Address,
}

/// Range, liquidity and amounts derived from a single observation.
#[derive(Debug, Clone)]
pub struct PositionQuote {
    pub range: PriceRange,
    pub liquidity: BigInt,
    pub amounts: AmountPair,
}

/// The fully-built mint call, constructed once per attempt from the latest
/// observation only.
#[derive(Debug, Clone)]
pub struct MintRequest {
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: BigInt,
    pub amount1_desired: BigInt,
    pub amount0_min: BigInt,
    pub amount1_min: BigInt,
    pub recipient: Address,
    pub deadline: u64,
}

/// Returned by the submitter once the mint landed.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub tx_hash: TxHash,
    pub gas_used: Option<U256>,
}

/// Result of one successful drift-aware execution cycle.
#[derive(Debug, Clone)]
pub struct MintOutcome {
    pub request: MintRequest,
    pub receipt: SubmissionReceipt,
    pub initial_tick: i32,
    pub final_tick: i32,
    pub drift_ticks: i32,
    pub slippage_percent: f64,
}

#[derive(Debug, Serialize)]
pub struct ExecutionReport {
    pub timestamp_utc: String,
    pub tick_initial: i32,
    pub tick_final: i32,
    pub drift_ticks: i32,
    pub final_slippage_percent: f64,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: String,
    pub amount1_desired: String,
    pub amount0_min: String,
    pub amount1_min: String,
    pub tx_hash: String,
    pub gas_used: Option<String>,
}

impl ExecutionReport {
    pub fn from_outcome(outcome: &MintOutcome) -> Self {
        Self {
            timestamp_utc: Utc::now().to_rfc3339(),
            tick_initial: outcome.initial_tick,
            tick_final: outcome.final_tick,
            drift_ticks: outcome.drift_ticks,
            final_slippage_percent: outcome.slippage_percent,
            tick_lower: outcome.request.tick_lower,
            tick_upper: outcome.request.tick_upper,
            amount0_desired: outcome.request.amount0_desired.to_string(),
            amount1_desired: outcome.request.amount1_desired.to_string(),
            amount0_min: outcome.request.amount0_min.to_string(),
            amount1_min: outcome.request.amount1_min.to_string(),
            tx_hash: format!("{:?}", outcome.receipt.tx_hash),
            gas_used: outcome.receipt.gas_used.map(|g| g.to_string()),
        }
    }
}
