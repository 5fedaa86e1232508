// Liquidity <-> token-amount conversions for a price range.
//
// Three price-position cases throughout: current at/below the lower bound
// (position is all token0), strictly inside (both tokens), current at/above
// the upper bound (all token1). The unneeded side of a single-sided position
// is exactly zero, never merely small.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::error::PositionError;
use crate::math::fixed_point::{ensure_uint128, mul_div, mul_shr96, q96, shl96};
use crate::models::AmountPair;

fn sorted<'a>(a: &'a BigInt, b: &'a BigInt) -> (&'a BigInt, &'a BigInt) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Liquidity obtainable from a known token0 amount.
///
/// Zero when the current price sits at or above the range: such a position
/// holds no token0 at all.
pub fn liquidity_for_amount0(
    sqrt_price_x96: &BigInt,
    sqrt_ratio_a_x96: &BigInt,
    sqrt_ratio_b_x96: &BigInt,
    amount0: &BigInt,
) -> Result<BigInt, PositionError> {
    ensure_uint128(amount0, "amount0")?;
    let (sa, sb) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    let liquidity = if sqrt_price_x96 <= sa {
        mul_div(&(amount0 * sa), sb, &shl96(&(sb - sa)))?
    } else if sqrt_price_x96 < sb {
        mul_div(&(amount0 * sqrt_price_x96), sb, &shl96(&(sb - sqrt_price_x96)))?
    } else {
        BigInt::zero()
    };

    ensure_uint128(&liquidity, "liquidity")?;
    Ok(liquidity)
}

/// Liquidity obtainable from a known token1 amount.
///
/// Zero when the current price sits at or below the range.
pub fn liquidity_for_amount1(
    sqrt_price_x96: &BigInt,
    sqrt_ratio_a_x96: &BigInt,
    sqrt_ratio_b_x96: &BigInt,
    amount1: &BigInt,
) -> Result<BigInt, PositionError> {
    ensure_uint128(amount1, "amount1")?;
    let (sa, sb) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    let liquidity = if sqrt_price_x96 >= sb {
        mul_div(amount1, &q96(), &(sb - sa))?
    } else if sqrt_price_x96 > sa {
        mul_div(amount1, &q96(), &(sqrt_price_x96 - sa))?
    } else {
        BigInt::zero()
    };

    ensure_uint128(&liquidity, "liquidity")?;
    Ok(liquidity)
}

/// Token amounts a given liquidity occupies across the range.
pub fn amounts_for_liquidity(
    sqrt_price_x96: &BigInt,
    sqrt_ratio_a_x96: &BigInt,
    sqrt_ratio_b_x96: &BigInt,
    liquidity: &BigInt,
) -> Result<AmountPair, PositionError> {
    ensure_uint128(liquidity, "liquidity")?;
    let (sa, sb) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    let (amount0, amount1) = if sqrt_price_x96 <= sa {
        let amount0 = mul_div(&shl96(liquidity), &(sb - sa), &(sa * sb))?;
        (amount0, BigInt::zero())
    } else if sqrt_price_x96 < sb {
        let amount0 = mul_div(
            &shl96(liquidity),
            &(sb - sqrt_price_x96),
            &(sqrt_price_x96 * sb),
        )?;
        let amount1 = mul_shr96(liquidity, &(sqrt_price_x96 - sa));
        (amount0, amount1)
    } else {
        (BigInt::zero(), mul_shr96(liquidity, &(sb - sa)))
    };

    ensure_uint128(&amount0, "amount0")?;
    ensure_uint128(&amount1, "amount1")?;
    Ok(AmountPair { amount0, amount1 })
}
