// Q96 fixed-point primitives shared by the tick and liquidity math.
//
// All financial arithmetic in this crate runs through BigInt so intermediates
// cannot wrap; fixed contract widths (uint128 liquidity, uint160 sqrt price)
// are enforced explicitly via the ensure_* guards, and violating them is a
// fatal range error rather than a silent truncation.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::error::PositionError;

pub const Q96_SHIFT: u32 = 96;
pub const Q96_U128: u128 = 1u128 << 96;

/// 2^96 as a BigInt.
pub fn q96() -> BigInt {
    BigInt::one() << Q96_SHIFT
}

/// `(a * b) / denominator`, division truncating toward zero — the EVM's
/// integer-division semantics. A zero denominator is a logic defect upstream.
pub fn mul_div(a: &BigInt, b: &BigInt, denominator: &BigInt) -> Result<BigInt, PositionError> {
    if denominator.is_zero() {
        return Err(PositionError::InvariantViolation(
            "mul_div denominator is zero".into(),
        ));
    }
    Ok((a * b) / denominator)
}

/// `(a * b) >> 96`.
pub fn mul_shr96(a: &BigInt, b: &BigInt) -> BigInt {
    (a * b) >> Q96_SHIFT
}

/// `a << 96`.
pub fn shl96(a: &BigInt) -> BigInt {
    a << Q96_SHIFT
}

/// Guard: `value` must be a non-negative integer fitting 128 bits.
pub fn ensure_uint128(value: &BigInt, what: &str) -> Result<(), PositionError> {
    ensure_width(value, 128, what)
}

/// Guard: `value` must be a non-negative integer fitting 160 bits.
pub fn ensure_uint160(value: &BigInt, what: &str) -> Result<(), PositionError> {
    ensure_width(value, 160, what)
}

fn ensure_width(value: &BigInt, bits: u64, what: &str) -> Result<(), PositionError> {
    if value.is_negative() || value.bits() > bits {
        return Err(PositionError::Range(format!(
            "{what} does not fit {bits} unsigned bits: {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_truncates_toward_zero() {
        let seven = BigInt::from(7);
        let three = BigInt::from(3);
        let two = BigInt::from(2);

        assert_eq!(mul_div(&seven, &three, &two).unwrap(), BigInt::from(10));
        // Negative results also truncate toward zero, not toward -inf.
        assert_eq!(
            mul_div(&(-seven.clone()), &three, &two).unwrap(),
            BigInt::from(-10)
        );
    }

    #[test]
    fn mul_div_rejects_zero_denominator() {
        let err = mul_div(&BigInt::one(), &BigInt::one(), &BigInt::zero());
        assert!(matches!(err, Err(PositionError::InvariantViolation(_))));
    }

    #[test]
    fn shifts_are_inverse_on_q96_multiples() {
        let v = BigInt::from(123_456_789u64);
        assert_eq!(mul_shr96(&shl96(&v), &BigInt::one()), v);
        assert_eq!(shl96(&BigInt::one()), q96());
        assert_eq!(q96(), BigInt::from(Q96_U128));
    }

    #[test]
    fn width_guards_accept_boundaries_and_reject_beyond() {
        let max_u128 = (BigInt::one() << 128) - 1;
        assert!(ensure_uint128(&max_u128, "liquidity").is_ok());
        assert!(ensure_uint128(&(max_u128 + 1), "liquidity").is_err());

        let max_u160 = (BigInt::one() << 160) - 1;
        assert!(ensure_uint160(&max_u160, "sqrt price").is_ok());
        assert!(ensure_uint160(&(max_u160 + 1), "sqrt price").is_err());

        assert!(ensure_uint128(&BigInt::from(-1), "liquidity").is_err());
        assert!(ensure_uint128(&BigInt::zero(), "liquidity").is_ok());
    }
}
