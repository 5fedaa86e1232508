pub mod pool_client;
pub mod position_manager;
pub mod providers;

use ethers::types::U256;
use num_bigint::{BigInt, Sign};

/// Widen a U256 into the BigInt domain the math core runs in.
pub fn u256_to_bigint(value: U256) -> BigInt {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    BigInt::from_bytes_be(Sign::Plus, &buf)
}

/// Narrow a BigInt back to U256 for the wire. None when the value is
/// negative or too wide, which callers treat as a fatal request defect.
pub fn bigint_to_u256(value: &BigInt) -> Option<U256> {
    let (sign, bytes) = value.to_bytes_be();
    if sign == Sign::Minus || bytes.len() > 32 {
        return None;
    }
    Some(U256::from_big_endian(&bytes))
}
