// Pure observation -> quote glue: plan the range, size the liquidity from
// the known input side, expand to the full amount pair. No I/O here; the
// executor decides which observation is binding.

use num_traits::Zero;

use crate::engine::range;
use crate::error::PositionError;
use crate::math::liquidity;
use crate::math::tick_math::{max_sqrt_ratio, min_sqrt_ratio, sqrt_ratio_at_tick};
use crate::models::{PoolObservation, PositionPlan, PositionQuote, TokenSide};

pub fn quote_position(
    plan: &PositionPlan,
    observation: &PoolObservation,
    tick_spacing: i32,
) -> Result<PositionQuote, PositionError> {
    let sqrt_price = &observation.sqrt_price_x96;
    if *sqrt_price < min_sqrt_ratio() || *sqrt_price > max_sqrt_ratio() {
        return Err(PositionError::Range(format!(
            "observed sqrt price {sqrt_price} outside the representable ratio range"
        )));
    }

    let planned = range::plan(observation.tick, &plan.range_spec, tick_spacing)?;
    let sqrt_ratio_lower = sqrt_ratio_at_tick(planned.tick_lower)?;
    let sqrt_ratio_upper = sqrt_ratio_at_tick(planned.tick_upper)?;

    let liquidity = match plan.input_side {
        TokenSide::Token0 => liquidity::liquidity_for_amount0(
            sqrt_price,
            &sqrt_ratio_lower,
            &sqrt_ratio_upper,
            &plan.input_amount,
        )?,
        TokenSide::Token1 => liquidity::liquidity_for_amount1(
            sqrt_price,
            &sqrt_ratio_lower,
            &sqrt_ratio_upper,
            &plan.input_amount,
        )?,
    };

    if liquidity.is_zero() {
        log::warn!(
            "input side contributes nothing at tick {}; range [{}, {}) yields zero liquidity",
            observation.tick,
            planned.tick_lower,
            planned.tick_upper
        );
    }

    let amounts = liquidity::amounts_for_liquidity(
        sqrt_price,
        &sqrt_ratio_lower,
        &sqrt_ratio_upper,
        &liquidity,
    )?;

    log::debug!(
        "quoted tick {} -> range [{}, {}), liquidity {}, amounts ({}, {})",
        observation.tick,
        planned.tick_lower,
        planned.tick_upper,
        liquidity,
        amounts.amount0,
        amounts.amount1
    );

    Ok(PositionQuote {
        range: planned,
        liquidity,
        amounts,
    })
}
