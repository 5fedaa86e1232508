// Two-phase mint execution: observe, preview, re-observe, recompute, submit.
//
// The price can move between parameter computation and on-chain inclusion;
// a previously valid mint then trips its minimum-amount guards. Recomputing
// everything from a second observation taken immediately before submission
// narrows that staleness window, and the measured tick drift between the two
// observations widens the slippage tolerance for whatever window remains.

use chrono::Utc;
use num_bigint::BigInt;

use crate::engine::{position, range};
use crate::error::{ChainError, PositionError};
use crate::models::{
    MintOutcome, MintRequest, PoolKey, PoolObservation, PositionPlan, PositionQuote,
    SubmissionReceipt,
};

/// Where pool snapshots come from. Implementations may suspend; a failure is
/// fatal for the current attempt (no internal retry).
pub trait ChainStateReader {
    async fn get_observation(&self, pool: &PoolKey) -> Result<PoolObservation, ChainError>;
}

/// Accepts a fully-built mint request. Failure reasons are opaque strings
/// carried back to the caller untouched.
pub trait TransactionSubmitter {
    async fn submit(&self, request: &MintRequest) -> Result<SubmissionReceipt, ChainError>;
}

/// Maps observed tick drift to a final slippage tolerance.
pub trait DriftPolicy {
    fn slippage_percent(&self, base_percent: f64, drift_ticks: i32) -> f64;
}

/// Hard ceiling on the tolerance, never exceeded regardless of drift.
pub const MAX_SLIPPAGE_PERCENT: f64 = 10.0;

/// Stepped additive bumps: >=10 ticks -> +2.0, >=5 -> +1.0, >=2 -> +0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteppedSlippage;

impl DriftPolicy for SteppedSlippage {
    fn slippage_percent(&self, base_percent: f64, drift_ticks: i32) -> f64 {
        let bump = if drift_ticks >= 10 {
            2.0
        } else if drift_ticks >= 5 {
            1.0
        } else if drift_ticks >= 2 {
            0.5
        } else {
            0.0
        };
        (base_percent + bump).min(MAX_SLIPPAGE_PERCENT)
    }
}

/// Mint attempts stay valid for 20 minutes after submission.
const DEADLINE_SECS: i64 = 1200;

/// Orchestrates one observe -> recompute -> submit cycle. All math is
/// delegated to the pure modules; the only suspension points are the two
/// reader calls and the final submission.
pub struct DriftAwareExecutor<R, S, P = SteppedSlippage> {
    reader: R,
    submitter: S,
    policy: P,
}

impl<R, S> DriftAwareExecutor<R, S, SteppedSlippage> {
    pub fn new(reader: R, submitter: S) -> Self {
        Self {
            reader,
            submitter,
            policy: SteppedSlippage,
        }
    }
}

impl<R, S, P> DriftAwareExecutor<R, S, P>
where
    R: ChainStateReader,
    S: TransactionSubmitter,
    P: DriftPolicy,
{
    pub fn with_policy(reader: R, submitter: S, policy: P) -> Self {
        Self {
            reader,
            submitter,
            policy,
        }
    }

    /// Runs one full cycle. The mint request is always built from the second
    /// observation; the first one only anchors the drift measurement and a
    /// diagnostic preview.
    pub async fn execute(&self, plan: &PositionPlan) -> Result<MintOutcome, PositionError> {
        let tick_spacing = range::tick_spacing_for_fee(plan.pool.fee);

        let initial = self
            .reader
            .get_observation(&plan.pool)
            .await
            .map_err(PositionError::Unavailable)?;
        let preview = position::quote_position(plan, &initial, tick_spacing)?;
        log::info!(
            "initial state: tick {}, range [{}, {}), amounts ({}, {})",
            initial.tick,
            preview.range.tick_lower,
            preview.range.tick_upper,
            preview.amounts.amount0,
            preview.amounts.amount1
        );

        let fresh = self
            .reader
            .get_observation(&plan.pool)
            .await
            .map_err(PositionError::StaleState)?;
        let quote = position::quote_position(plan, &fresh, tick_spacing)?;

        let drift = (fresh.tick - initial.tick).abs();
        let slippage = self
            .policy
            .slippage_percent(plan.base_slippage_percent, drift);
        log::info!(
            "tick drift {} -> {} ({} ticks), slippage {:.2}%",
            initial.tick,
            fresh.tick,
            drift,
            slippage
        );

        let request = build_mint_request(plan, &quote, slippage);
        log::debug!(
            "submission window so far: {} ms",
            (Utc::now() - fresh.observed_at).num_milliseconds()
        );

        match self.submitter.submit(&request).await {
            Ok(receipt) => Ok(MintOutcome {
                request,
                receipt,
                initial_tick: initial.tick,
                final_tick: fresh.tick,
                drift_ticks: drift,
                slippage_percent: slippage,
            }),
            Err(err) => Err(PositionError::Submission {
                reason: err.to_string(),
                drift,
                slippage_percent: slippage,
            }),
        }
    }
}

fn build_mint_request(plan: &PositionPlan, quote: &PositionQuote, slippage_percent: f64) -> MintRequest {
    MintRequest {
        token0: plan.pool.token0,
        token1: plan.pool.token1,
        fee: plan.pool.fee,
        tick_lower: quote.range.tick_lower,
        tick_upper: quote.range.tick_upper,
        amount0_desired: quote.amounts.amount0.clone(),
        amount1_desired: quote.amounts.amount1.clone(),
        amount0_min: min_amount_after_slippage(&quote.amounts.amount0, slippage_percent),
        amount1_min: min_amount_after_slippage(&quote.amounts.amount1, slippage_percent),
        recipient: plan.recipient,
        deadline: (Utc::now().timestamp() + DEADLINE_SECS) as u64,
    }
}

/// floor(amount * (100 - slippage) / 100), computed in integer space. The
/// retained fraction is scaled to parts-per-million once, which is exact for
/// every tolerance the stepped policy can produce.
fn min_amount_after_slippage(amount: &BigInt, slippage_percent: f64) -> BigInt {
    let keep_ppm = ((100.0 - slippage_percent) * 10_000.0).round() as u64;
    (amount * BigInt::from(keep_ppm)) / BigInt::from(1_000_000u64)
}
