// tests/drift_executor_integration.rs
// =========================================
// Drives the two-phase executor against scripted reader/submitter doubles:
// drift widens the tolerance, the cap holds, the request is always built
// from the second observation, and failures carry their context.

use std::sync::{Arc, Mutex};

use arrakis_liquidity::engine::executor::{
    ChainStateReader, DriftAwareExecutor, DriftPolicy, TransactionSubmitter,
};
use arrakis_liquidity::error::{ChainError, PositionError};
use arrakis_liquidity::math::tick_math::sqrt_ratio_at_tick;
use arrakis_liquidity::models::{
    MintRequest, PoolKey, PoolObservation, PositionPlan, RangeSpec, SubmissionReceipt, TokenSide,
};

use chrono::Utc;
use ethers::types::{Address, TxHash, U256};
use num_bigint::BigInt;
use num_traits::Zero;

// ====== Test doubles ======

/// Replays a fixed sequence of observation results.
struct ScriptedReader {
    observations: Mutex<Vec<Result<PoolObservation, ChainError>>>,
}

impl ScriptedReader {
    fn new(results: Vec<Result<PoolObservation, ChainError>>) -> Self {
        Self {
            observations: Mutex::new(results),
        }
    }

    fn at_ticks(ticks: &[i32]) -> Self {
        Self::new(ticks.iter().map(|&t| Ok(observation(t))).collect())
    }
}

impl ChainStateReader for ScriptedReader {
    async fn get_observation(&self, _pool: &PoolKey) -> Result<PoolObservation, ChainError> {
        self.observations
            .lock()
            .expect("observation script poisoned")
            .remove(0)
    }
}

type SubmissionLog = Arc<Mutex<Vec<MintRequest>>>;

/// Records every submitted request and answers with a canned result. The
/// log handle survives the executor taking ownership of the double.
struct RecordingSubmitter {
    seen: SubmissionLog,
    failure: Option<String>,
}

impl RecordingSubmitter {
    fn accepting() -> (Self, SubmissionLog) {
        let seen: SubmissionLog = Arc::default();
        (
            Self {
                seen: seen.clone(),
                failure: None,
            },
            seen,
        )
    }

    fn rejecting(reason: &str) -> (Self, SubmissionLog) {
        let seen: SubmissionLog = Arc::default();
        (
            Self {
                seen: seen.clone(),
                failure: Some(reason.to_string()),
            },
            seen,
        )
    }
}

impl TransactionSubmitter for RecordingSubmitter {
    async fn submit(&self, request: &MintRequest) -> Result<SubmissionReceipt, ChainError> {
        self.seen
            .lock()
            .expect("submission log poisoned")
            .push(request.clone());
        match &self.failure {
            Some(reason) => Err(ChainError::Rejected(reason.clone())),
            None => Ok(SubmissionReceipt {
                tx_hash: TxHash::from([0xab; 32]),
                gas_used: Some(U256::from(210_000u64)),
            }),
        }
    }
}

fn observation(tick: i32) -> PoolObservation {
    PoolObservation {
        tick,
        sqrt_price_x96: sqrt_ratio_at_tick(tick).expect("tick in range"),
        observed_at: Utc::now(),
    }
}

fn test_plan(base_slippage_percent: f64) -> PositionPlan {
    PositionPlan {
        pool: PoolKey {
            token0: Address::from([0x11; 20]),
            token1: Address::from([0x22; 20]),
            fee: 500,
        },
        input_side: TokenSide::Token0,
        input_amount: BigInt::from(1_000_000_000_000_000_000u64),
        range_spec: RangeSpec::Percentage {
            lower: -2.0,
            upper: 2.0,
        },
        base_slippage_percent,
        recipient: Address::from([0x33; 20]),
    }
}

// ====== Scenarios ======

#[tokio::test]
async fn steady_pool_keeps_the_base_slippage() {
    let reader = ScriptedReader::at_ticks(&[1000, 1000]);
    let (submitter, log) = RecordingSubmitter::accepting();
    let executor = DriftAwareExecutor::new(reader, submitter);

    let outcome = executor.execute(&test_plan(1.0)).await.unwrap();

    assert_eq!(outcome.drift_ticks, 0);
    assert_eq!(outcome.slippage_percent, 1.0);
    assert_eq!(outcome.request.tick_lower, 800);
    assert_eq!(outcome.request.tick_upper, 1200);

    // amount_min = floor(desired * 99%)
    let expected_min0 =
        (&outcome.request.amount0_desired * BigInt::from(99u8)) / BigInt::from(100u8);
    assert_eq!(outcome.request.amount0_min, expected_min0);

    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn large_drift_widens_the_tolerance_and_rebuilds_from_the_fresh_read() {
    let reader = ScriptedReader::at_ticks(&[1000, 1012]);
    let (submitter, _log) = RecordingSubmitter::accepting();
    let executor = DriftAwareExecutor::new(reader, submitter);

    let outcome = executor.execute(&test_plan(1.0)).await.unwrap();

    assert_eq!(outcome.drift_ticks, 12);
    assert_eq!(outcome.slippage_percent, 3.0);
    assert_eq!(outcome.initial_tick, 1000);
    assert_eq!(outcome.final_tick, 1012);

    // The range comes from the second observation (1012 ± 200, aligned at
    // spacing 10), not from the first.
    assert_eq!(outcome.request.tick_lower, 810);
    assert_eq!(outcome.request.tick_upper, 1210);

    // amount_min = floor(desired * 97%)
    let expected_min1 =
        (&outcome.request.amount1_desired * BigInt::from(97u8)) / BigInt::from(100u8);
    assert_eq!(outcome.request.amount1_min, expected_min1);
}

#[tokio::test]
async fn slippage_never_exceeds_the_hard_cap() {
    let reader = ScriptedReader::at_ticks(&[1000, 1010]);
    let (submitter, _log) = RecordingSubmitter::accepting();
    let executor = DriftAwareExecutor::new(reader, submitter);

    let outcome = executor.execute(&test_plan(9.5)).await.unwrap();

    assert_eq!(outcome.drift_ticks, 10);
    assert_eq!(outcome.slippage_percent, 10.0);

    let expected_min0 =
        (&outcome.request.amount0_desired * BigInt::from(90u8)) / BigInt::from(100u8);
    assert_eq!(outcome.request.amount0_min, expected_min0);
}

#[tokio::test]
async fn request_carries_the_plan_identity_and_a_future_deadline() {
    let reader = ScriptedReader::at_ticks(&[1000, 1000]);
    let (submitter, log) = RecordingSubmitter::accepting();
    let executor = DriftAwareExecutor::new(reader, submitter);
    let plan = test_plan(1.0);

    let before = Utc::now().timestamp();
    let outcome = executor.execute(&plan).await.unwrap();

    assert_eq!(outcome.request.token0, plan.pool.token0);
    assert_eq!(outcome.request.token1, plan.pool.token1);
    assert_eq!(outcome.request.fee, plan.pool.fee);
    assert_eq!(outcome.request.recipient, plan.recipient);

    // 20-minute deadline measured from submission time.
    let deadline = outcome.request.deadline as i64;
    assert!(deadline >= before + 1200);
    assert!(deadline <= Utc::now().timestamp() + 1200);

    assert!(outcome.request.amount0_desired > BigInt::zero());
    assert!(outcome.request.amount1_desired > BigInt::zero());

    // What went over the wire is exactly what the outcome reports.
    let submitted = log.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].deadline, outcome.request.deadline);
    assert_eq!(submitted[0].amount0_min, outcome.request.amount0_min);
}

#[tokio::test]
async fn unavailable_first_read_aborts_the_attempt() {
    let reader = ScriptedReader::new(vec![Err(ChainError::Unavailable(
        "connection refused".into(),
    ))]);
    let (submitter, log) = RecordingSubmitter::accepting();
    let executor = DriftAwareExecutor::new(reader, submitter);

    let err = executor.execute(&test_plan(1.0)).await.unwrap_err();
    assert!(matches!(err, PositionError::Unavailable(_)));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_refresh_is_a_stale_state_error_and_nothing_is_submitted() {
    let reader = ScriptedReader::new(vec![
        Ok(observation(1000)),
        Err(ChainError::Unavailable("timeout".into())),
    ]);
    let (submitter, log) = RecordingSubmitter::accepting();
    let executor = DriftAwareExecutor::new(reader, submitter);

    let err = executor.execute(&test_plan(1.0)).await.unwrap_err();
    assert!(matches!(err, PositionError::StaleState(_)));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn submission_failure_surfaces_drift_and_slippage_context() {
    let reader = ScriptedReader::at_ticks(&[1000, 1006]);
    let (submitter, _log) = RecordingSubmitter::rejecting("STF: slippage guard");
    let executor = DriftAwareExecutor::new(reader, submitter);

    let err = executor.execute(&test_plan(1.0)).await.unwrap_err();
    match err {
        PositionError::Submission {
            reason,
            drift,
            slippage_percent,
        } => {
            assert!(reason.contains("STF"), "reason passed through: {reason}");
            assert_eq!(drift, 6);
            assert_eq!(slippage_percent, 2.0);
        }
        other => panic!("expected a submission failure, got {other:?}"),
    }
}

/// Custom drift policies slot in without touching the math.
struct FlatTolerance(f64);

impl DriftPolicy for FlatTolerance {
    fn slippage_percent(&self, _base_percent: f64, _drift_ticks: i32) -> f64 {
        self.0
    }
}

#[tokio::test]
async fn alternative_drift_policies_are_substitutable() {
    let reader = ScriptedReader::at_ticks(&[1000, 1050]);
    let (submitter, _log) = RecordingSubmitter::accepting();
    let executor = DriftAwareExecutor::with_policy(reader, submitter, FlatTolerance(0.25));

    let outcome = executor.execute(&test_plan(1.0)).await.unwrap();
    assert_eq!(outcome.drift_ticks, 50);
    assert_eq!(outcome.slippage_percent, 0.25);
}

#[tokio::test]
async fn intermediate_drift_steps_apply_their_bumps() {
    for (final_tick, expected) in [(1001, 1.0), (1002, 1.5), (1005, 2.0)] {
        let reader = ScriptedReader::at_ticks(&[1000, final_tick]);
        let (submitter, _log) = RecordingSubmitter::accepting();
        let executor = DriftAwareExecutor::new(reader, submitter);

        let outcome = executor.execute(&test_plan(1.0)).await.unwrap();
        assert_eq!(
            outcome.slippage_percent, expected,
            "drift to {final_tick} should land at {expected}%"
        );
        assert!(outcome.request.amount0_min <= outcome.request.amount0_desired);
        assert!(outcome.request.amount1_min <= outcome.request.amount1_desired);
    }
}
