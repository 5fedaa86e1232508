use anyhow::Context;

use arrakis_liquidity::bootstrap::AppState;
use arrakis_liquidity::config::Config;
use arrakis_liquidity::engine::executor::DriftAwareExecutor;
use arrakis_liquidity::error::PositionError;
use arrakis_liquidity::models::ExecutionReport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Build application state
    let state = AppState::new(&config).context("Failed to initialize application state")?;

    log::info!(
        "planning {:?}-side mint on {:?}/{:?} fee {}, base slippage {:.2}%",
        state.plan.input_side,
        state.plan.pool.token0,
        state.plan.pool.token1,
        state.plan.pool.fee,
        state.plan.base_slippage_percent
    );

    let plan = state.plan.clone();
    let executor = DriftAwareExecutor::new(state.reader, state.submitter);

    match executor.execute(&plan).await {
        Ok(outcome) => {
            let report = ExecutionReport::from_outcome(&outcome);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(PositionError::Submission {
            reason,
            drift,
            slippage_percent,
        }) => {
            log::error!(
                "mint failed after {drift} ticks of drift at {slippage_percent:.2}% slippage: {reason}"
            );
            Err(anyhow::anyhow!("mint submission failed: {reason}"))
        }
        Err(err) => Err(err.into()),
    }
}
