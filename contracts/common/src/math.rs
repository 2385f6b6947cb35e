//! Fixed-Point Math for the BondFund Protocol
//!
//! Checked integer helpers plus the binary logarithm / exponent primitives
//! the pricing curve is built on.
//!
//! Fixed-point values are `U256` numbers scaled by `2^127` ("Q127"). Every
//! primitive here truncates, so `log2_fixed` and `exp2_fixed` never return
//! more than the exact value. The curve relies on that direction.

use std::sync::OnceLock;

use ruint::aliases::U256;

use crate::constants::curve::{FIXED_POINT_BITS, MAX_EXP2_INTEGER, MAX_PRECISION_BITS};
use crate::errors::{BondFundError, BondFundResult};

/// 1.0 in Q127
pub const FIXED_ONE: U256 = U256::from_limbs([0, 0x8000_0000_0000_0000, 0, 0]);

/// 2.0 in Q127
pub const FIXED_TWO: U256 = U256::from_limbs([0, 0, 1, 0]);

// ============================================================================
// Checked integer helpers
// ============================================================================

/// `a * b / c` rounded down, computed in u128
pub fn mul_div(a: u64, b: u64, c: u64) -> BondFundResult<u64> {
    if c == 0 {
        return Err(BondFundError::DivisionByZero);
    }
    let result = (a as u128)
        .checked_mul(b as u128)
        .ok_or(BondFundError::Overflow)?
        / c as u128;
    u64::try_from(result).map_err(|_| BondFundError::Overflow)
}

/// Narrow a `U256` to `u64`
pub fn to_u64(value: U256) -> BondFundResult<u64> {
    if value.bit_len() > 64 {
        return Err(BondFundError::Overflow);
    }
    Ok(value.as_limbs()[0])
}

/// Floor of the square root
pub fn isqrt(n: U256) -> U256 {
    if n.is_zero() {
        return n;
    }
    // Start above the root so Newton's iteration decreases monotonically
    let mut x = U256::from(1u64) << n.bit_len().div_ceil(2);
    loop {
        let y = (x + n / x) >> 1usize;
        if y >= x {
            return x;
        }
        x = y;
    }
}

// ============================================================================
// Binary logarithm / exponent
// ============================================================================

/// Lookup table: entry `i` holds `2^(2^-i)` in Q127, rounded down.
///
/// Entry 1 is `sqrt(2)`, every next entry is the square root of the previous
/// one. Built once and shared.
fn exp2_table() -> &'static [U256] {
    static TABLE: OnceLock<Vec<U256>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = Vec::with_capacity(MAX_PRECISION_BITS + 1);
        table.push(FIXED_TWO);
        // 2 * ONE * ONE = 2^255 fits in 256 bits
        let mut entry = isqrt(FIXED_TWO << FIXED_POINT_BITS);
        for _ in 1..=MAX_PRECISION_BITS {
            table.push(entry);
            // entry < 2^128, so entry * ONE < 2^255
            entry = isqrt(entry << FIXED_POINT_BITS);
        }
        table
    })
}

/// `log2(numerator / denominator)` in Q127, for `numerator >= denominator > 0`.
///
/// The integer part comes from the bit length; each of the `precision`
/// fractional bits is resolved by squaring the normalised mantissa.
pub fn log2_fixed(numerator: U256, denominator: U256, precision: usize) -> BondFundResult<U256> {
    if denominator.is_zero() {
        return Err(BondFundError::DivisionByZero);
    }
    if numerator < denominator {
        return Err(BondFundError::CurveDomain {
            param: "base",
            reason: "log2 base below one",
        });
    }
    if numerator.bit_len() > 128 || precision > MAX_PRECISION_BITS {
        return Err(BondFundError::Overflow);
    }

    let x = (numerator << FIXED_POINT_BITS) / denominator;
    let integer = x.bit_len() - 1 - FIXED_POINT_BITS;
    let mut mantissa = x >> integer;
    let mut result = U256::from(integer as u64) << FIXED_POINT_BITS;

    for i in 1..=precision {
        // mantissa < 2^128, the square fits
        mantissa = (mantissa * mantissa) >> FIXED_POINT_BITS;
        if mantissa >= FIXED_TWO {
            mantissa = mantissa >> 1usize;
            result = result | (FIXED_ONE >> i);
        }
    }

    Ok(result)
}

/// `2^(exponent)` for a Q127 exponent, returned in Q127.
///
/// Fractional bits beyond `precision` are dropped.
pub fn exp2_fixed(exponent: U256, precision: usize) -> BondFundResult<U256> {
    if precision > MAX_PRECISION_BITS {
        return Err(BondFundError::Overflow);
    }
    let integer = exponent >> FIXED_POINT_BITS;
    if integer > U256::from(MAX_EXP2_INTEGER as u64) {
        return Err(BondFundError::Overflow);
    }
    let integer = integer.as_limbs()[0] as usize;
    let fraction = exponent - (U256::from(integer as u64) << FIXED_POINT_BITS);

    let table = exp2_table();
    let mut result = FIXED_ONE;
    for (i, factor) in table.iter().enumerate().take(precision + 1).skip(1) {
        if !(fraction & (FIXED_ONE >> i)).is_zero() {
            // result < 2^128 and factor < 2^128
            result = (result * *factor) >> FIXED_POINT_BITS;
        }
    }

    // result < 2^128 and integer <= 127
    Ok(result << integer)
}

/// `exponent * numerator / denominator` for a Q127 exponent, rounded down
pub fn scale_fixed(exponent: U256, numerator: u64, denominator: u64) -> BondFundResult<U256> {
    if denominator == 0 {
        return Err(BondFundError::DivisionByZero);
    }
    let scaled = exponent
        .checked_mul(U256::from(numerator))
        .ok_or(BondFundError::Overflow)?;
    Ok(scaled / U256::from(denominator))
}
