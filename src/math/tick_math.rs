// Tick <-> sqrtPriceX96 conversion, ported with the canonical per-bit
// constants so the forward direction matches the pool contract bit-for-bit.

use num_bigint::BigInt;
use num_traits::{One, ToPrimitive};

use crate::error::PositionError;
use crate::math::fixed_point::Q96_U128;

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// sqrt ratio at MIN_TICK, Q64.96.
pub fn min_sqrt_ratio() -> BigInt {
    BigInt::from(4_295_128_739u64)
}

/// sqrt ratio at MAX_TICK, Q64.96.
pub fn max_sqrt_ratio() -> BigInt {
    BigInt::parse_bytes(
        b"1461446703485210103287273052203988822378723970342",
        10,
    )
    .expect("Failed to parse BigInt constant")
}

// One Q128.128 multiplier per bit of |tick|, bits 1..=19. Bit 0 selects the
// base ratio inside sqrt_ratio_at_tick.
const BIT_RATIOS: [(u32, &str); 19] = [
    (0x2, "fff97272373d413259a46990580e213a"),
    (0x4, "fff2e50f5f656932ef12357cf3c7fdcc"),
    (0x8, "ffe5caca7e10e4e61c3624eaa0941cd0"),
    (0x10, "ffcb9843d60f6159c9db58835c926644"),
    (0x20, "ff973b41fa98c081472e6896dfb254c0"),
    (0x40, "ff2ea16466c96a3843ec78b326b52861"),
    (0x80, "fe5dee046a99a2a811c461f1969c3053"),
    (0x100, "fcbe86c7900a88aedcffc83b479aa3a4"),
    (0x200, "f987a7253ac413176f2b074cf7815e54"),
    (0x400, "f3392b0822b70005940c7a398e4b70f3"),
    (0x800, "e7159475a2c29b7443b29c7fa6e889d9"),
    (0x1000, "d097f3bdfd2022b8845ad8f792aa5825"),
    (0x2000, "a9f746462d870fdf8a65dc1f90e061e5"),
    (0x4000, "70d869a156d2a1b890bb3df62baf32f7"),
    (0x8000, "31be135f97d08fd981231505542fcfa6"),
    (0x10000, "9aa508b5b7a84e1c677de54f3e99bc9"),
    (0x20000, "5d6af8dedb81196699c329225ee604"),
    (0x40000, "2216e584f5fa1ea926041bedfe98"),
    (0x80000, "48a170391f7dc42444e8fa2"),
];

fn bit_ratio(hex: &str) -> BigInt {
    BigInt::parse_bytes(hex.as_bytes(), 16).expect("Failed to parse BigInt constant")
}

/// Exact tick -> sqrtPriceX96 (Q64.96).
///
/// Binary exponentiation over the set bits of |tick|: each set bit multiplies
/// the running Q128.128 ratio by a fixed constant and shifts right by 128.
/// Positive ticks invert the ratio; the final shift to Q96 rounds up so the
/// grid endpoints land exactly on MIN_SQRT_RATIO / MAX_SQRT_RATIO.
pub fn sqrt_ratio_at_tick(tick: i32) -> Result<BigInt, PositionError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(PositionError::Range(format!(
            "tick {tick} outside [{MIN_TICK}, {MAX_TICK}]"
        )));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        bit_ratio("fffcb933bd6fad37aa2d162d1a594001")
    } else {
        BigInt::one() << 128
    };

    for (bit, hex) in BIT_RATIOS {
        if abs_tick & bit != 0 {
            ratio = (&ratio * bit_ratio(hex)) >> 128;
        }
    }

    if tick > 0 {
        ratio = ((BigInt::one() << 256) - 1) / ratio;
    }

    // Q128.128 -> Q64.96, rounding up.
    Ok((ratio + ((BigInt::one() << 32) - 1)) >> 32)
}

/// Approximate inverse of [`sqrt_ratio_at_tick`].
///
/// Projects the Q96 value onto an f64 and takes a logarithm, so round-trips
/// through this function are NOT exact. Callers that need exactness must use
/// the forward direction only.
pub fn tick_at_sqrt_ratio(sqrt_price_x96: &BigInt) -> Result<i32, PositionError> {
    if *sqrt_price_x96 < min_sqrt_ratio() || *sqrt_price_x96 > max_sqrt_ratio() {
        return Err(PositionError::Range(format!(
            "sqrt price {sqrt_price_x96} outside the representable ratio range"
        )));
    }
    let sqrt_price = sqrt_price_x96.to_f64().ok_or_else(|| {
        PositionError::Range(format!("sqrt price {sqrt_price_x96} not projectable"))
    })? / Q96_U128 as f64;
    let price = sqrt_price * sqrt_price;
    let tick = (price.ln() / 1.0001f64.ln()).round() as i32;
    Ok(tick.clamp(MIN_TICK, MAX_TICK))
}
