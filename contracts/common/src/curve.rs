//! Bonding Curve Pricing
//!
//! Converts reserve deposits into minted shares and share sales into reserve
//! payouts. Price per share scales as `reserve / (supply * ratio)`:
//!
//! ```text
//! purchase = supply  * ((1 + deposit / reserve) ^ ratio - 1)
//! sale     = reserve * (1 - (1 - amount / supply) ^ (1 / ratio))
//! ```
//!
//! ## Rounding
//!
//! Both directions are computed with truncating fixed-point log2/exp2 (see
//! [`crate::math`]). The power used for a purchase is never above the exact
//! value, and on a sale the part of the reserve that stays behind is rounded
//! up. Shares are never over-issued and the reserve is never over-paid, so
//! selling what a deposit bought can never return more than the deposit.
//!
//! ## Precision
//!
//! With `p` precision bits the internal power carries a relative error below
//! `(exponent + 2) * 2^-p`, where `exponent` is the ratio on purchases and its
//! inverse on sales. A ratio of exactly one uses the linear formulas and is
//! exact up to the final floor.

use ruint::aliases::U256;

use crate::constants::curve::{
    DEFAULT_PRECISION_BITS, FIXED_POINT_BITS, MAX_PRECISION_BITS, MAX_RESERVE_RATIO_PPM,
    MIN_PRECISION_BITS,
};
use crate::errors::{BondFundError, BondFundResult};
use crate::math::{exp2_fixed, log2_fixed, mul_div, scale_fixed, to_u64, FIXED_ONE};
use crate::types::ReserveRatio;

/// A pricing strategy. Implementations must be pure and deterministic.
pub trait PricingCurve: Send + Sync {
    /// Shares minted for `deposit` given the current reserve and supply
    fn purchase_return(
        &self,
        reserve_balance: u64,
        supply: u64,
        reserve_ratio_ppm: u32,
        deposit: u64,
    ) -> BondFundResult<u64>;

    /// Reserve paid out for selling `sell_amount` shares
    fn sale_return(
        &self,
        reserve_balance: u64,
        supply: u64,
        reserve_ratio_ppm: u32,
        sell_amount: u64,
    ) -> BondFundResult<u64>;
}

/// Fixed-point log2/exp2 bonding curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPointCurve {
    precision_bits: usize,
}

impl FixedPointCurve {
    /// Create a curve resolving `precision_bits` fractional bits
    pub fn new(precision_bits: usize) -> BondFundResult<Self> {
        if !(MIN_PRECISION_BITS..=MAX_PRECISION_BITS).contains(&precision_bits) {
            return Err(BondFundError::InvalidPrecision {
                bits: precision_bits,
            });
        }
        Ok(Self { precision_bits })
    }

    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }
}

impl Default for FixedPointCurve {
    fn default() -> Self {
        Self {
            precision_bits: DEFAULT_PRECISION_BITS,
        }
    }
}

fn check_domain(
    reserve_balance: u64,
    supply: u64,
    reserve_ratio_ppm: u32,
) -> BondFundResult<ReserveRatio> {
    let ratio = ReserveRatio::from_ppm(reserve_ratio_ppm).map_err(|_| BondFundError::CurveDomain {
        param: "reserve_ratio",
        reason: "outside (0, 1]",
    })?;
    if reserve_balance == 0 {
        return Err(BondFundError::CurveDomain {
            param: "reserve_balance",
            reason: "zero reserve",
        });
    }
    if supply == 0 {
        return Err(BondFundError::CurveDomain {
            param: "supply",
            reason: "zero supply",
        });
    }
    Ok(ratio)
}

impl PricingCurve for FixedPointCurve {
    fn purchase_return(
        &self,
        reserve_balance: u64,
        supply: u64,
        reserve_ratio_ppm: u32,
        deposit: u64,
    ) -> BondFundResult<u64> {
        let ratio = check_domain(reserve_balance, supply, reserve_ratio_ppm)?;
        if deposit == 0 {
            return Ok(0);
        }
        if ratio.is_linear() {
            return mul_div(supply, deposit, reserve_balance);
        }

        let reserve = U256::from(reserve_balance);
        let base = reserve + U256::from(deposit);
        let log = log2_fixed(base, reserve, self.precision_bits)?;
        let exponent = scale_fixed(log, ratio.ppm() as u64, MAX_RESERVE_RATIO_PPM as u64)?;
        let power = exp2_fixed(exponent, self.precision_bits)?;

        let minted = U256::from(supply)
            .checked_mul(power - FIXED_ONE)
            .ok_or(BondFundError::Overflow)?
            >> FIXED_POINT_BITS;
        to_u64(minted)
    }

    fn sale_return(
        &self,
        reserve_balance: u64,
        supply: u64,
        reserve_ratio_ppm: u32,
        sell_amount: u64,
    ) -> BondFundResult<u64> {
        let ratio = check_domain(reserve_balance, supply, reserve_ratio_ppm)?;
        if sell_amount > supply {
            return Err(BondFundError::CurveDomain {
                param: "sell_amount",
                reason: "exceeds supply",
            });
        }
        if sell_amount == 0 {
            return Ok(0);
        }
        if sell_amount == supply {
            return Ok(reserve_balance);
        }
        if ratio.is_linear() {
            return mul_div(reserve_balance, sell_amount, supply);
        }

        // q = (supply / (supply - amount)) ^ (1 / ratio); payout = reserve - reserve / q
        let log = log2_fixed(
            U256::from(supply),
            U256::from(supply - sell_amount),
            self.precision_bits,
        )?;
        let exponent = scale_fixed(log, MAX_RESERVE_RATIO_PPM as u64, ratio.ppm() as u64)?;

        // Once q exceeds 2^bits(reserve) the remainder is below one unit;
        // keep a single unit so the reserve is never emptied by rounding
        let reserve_bits = 64 - reserve_balance.leading_zeros() as u64;
        if exponent >> FIXED_POINT_BITS >= U256::from(reserve_bits) {
            return Ok(reserve_balance - 1);
        }

        let q = exp2_fixed(exponent, self.precision_bits)?;
        let reserve = U256::from(reserve_balance);
        // ceil(reserve * ONE / q); q >= ONE keeps this at or below reserve
        let remainder = ((reserve << FIXED_POINT_BITS) + q - U256::from(1u64)) / q;
        let payout = reserve.checked_sub(remainder).ok_or(BondFundError::Underflow)?;
        to_u64(payout)
    }
}

/// Shares minted for `deposit`, using the default curve
pub fn purchase_return(
    reserve_balance: u64,
    supply: u64,
    reserve_ratio_ppm: u32,
    deposit: u64,
) -> BondFundResult<u64> {
    FixedPointCurve::default().purchase_return(reserve_balance, supply, reserve_ratio_ppm, deposit)
}

/// Reserve paid for selling `sell_amount` shares, using the default curve
pub fn sale_return(
    reserve_balance: u64,
    supply: u64,
    reserve_ratio_ppm: u32,
    sell_amount: u64,
) -> BondFundResult<u64> {
    FixedPointCurve::default().sale_return(reserve_balance, supply, reserve_ratio_ppm, sell_amount)
}
