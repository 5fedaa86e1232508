// Turns a range specification plus the current tick into an aligned,
// non-empty [tick_lower, tick_upper) pair.

use num_integer::div_floor;

use crate::error::PositionError;
use crate::math::tick_math::{MAX_TICK, MIN_TICK};
use crate::models::{PriceRange, RangeSpec};

/// Legacy linear percent-to-tick scale: 100 ticks per 1% price move. An
/// approximation of the true logarithmic relationship, kept deliberately —
/// matching the established behavior matters more than exactness here.
const TICKS_PER_PERCENT: f64 = 100.0;

/// Minimum tick granularity for a fee tier (hundredths of a bip).
pub fn tick_spacing_for_fee(fee: u32) -> i32 {
    match fee {
        100 => 1,
        500 => 10,
        2_500 => 50,
        10_000 => 200,
        _ => 1,
    }
}

/// Plans an aligned tick range around `current_tick`.
///
/// Bounds are floored to the spacing grid (toward negative infinity). If
/// alignment collapses the range, the upper bound is pushed one spacing up so
/// a non-empty range always comes back.
pub fn plan(
    current_tick: i32,
    spec: &RangeSpec,
    tick_spacing: i32,
) -> Result<PriceRange, PositionError> {
    if tick_spacing <= 0 {
        return Err(PositionError::InvariantViolation(format!(
            "tick spacing must be positive, got {tick_spacing}"
        )));
    }

    let (raw_lower, raw_upper) = match *spec {
        RangeSpec::Percentage { lower, upper } => {
            let lower_offset = (lower * TICKS_PER_PERCENT).floor() as i64;
            let upper_offset = (upper * TICKS_PER_PERCENT).floor() as i64;
            (
                current_tick as i64 + lower_offset,
                current_tick as i64 + upper_offset,
            )
        }
        RangeSpec::RelativeTicks { lower, upper } => (
            current_tick as i64 + lower as i64,
            current_tick as i64 + upper as i64,
        ),
        RangeSpec::AbsoluteTicks { lower, upper } => (lower as i64, upper as i64),
    };

    let spacing = tick_spacing as i64;
    let tick_lower = div_floor(raw_lower, spacing) * spacing;
    let mut tick_upper = div_floor(raw_upper, spacing) * spacing;

    if tick_lower >= tick_upper {
        tick_upper = tick_lower + spacing;
    }

    if tick_lower < MIN_TICK as i64 || tick_upper > MAX_TICK as i64 {
        return Err(PositionError::Range(format!(
            "planned range [{tick_lower}, {tick_upper}] leaves [{MIN_TICK}, {MAX_TICK}]"
        )));
    }

    Ok(PriceRange {
        tick_lower: tick_lower as i32,
        tick_upper: tick_upper as i32,
    })
}
