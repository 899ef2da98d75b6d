//! Checked fixed-point arithmetic.
//!
//! Indices, rates and factors are `u128` scaled by [`WAD`]. Token amounts stay in
//! their native decimals. Products go through a 256-bit intermediate so a result
//! only fails when it does not fit in 128 bits.

use anchor_lang::prelude::*;

use crate::constants::WAD;
use crate::error::MarketError;

const LOW_MASK: u128 = u64::MAX as u128;

/// Full 256-bit product of two `u128`s as `(high, low)` words.
fn full_mul(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & LOW_MASK);
    let (b_hi, b_lo) = (b >> 64, b & LOW_MASK);

    let lo_lo = a_lo * b_lo;
    let hi_lo = a_hi * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_hi = a_hi * b_hi;

    let middle = (lo_lo >> 64) + (hi_lo & LOW_MASK) + (lo_hi & LOW_MASK);
    let low = (middle << 64) | (lo_lo & LOW_MASK);
    let high = hi_hi + (hi_lo >> 64) + (lo_hi >> 64) + (middle >> 64);
    (high, low)
}

/// Divides the 256-bit value `(high, low)` by `divisor`.
/// `None` when the quotient does not fit in 128 bits.
fn div_rem_wide(high: u128, low: u128, divisor: u128) -> Option<(u128, u128)> {
    if high == 0 {
        return Some((low / divisor, low % divisor));
    }
    if high >= divisor {
        return None;
    }

    let mut rem = high;
    let mut quot = 0u128;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((low >> bit) & 1);
        quot <<= 1;
        if carry == 1 || rem >= divisor {
            rem = rem.wrapping_sub(divisor);
            quot |= 1;
        }
    }
    Some((quot, rem))
}

fn mul_div(a: u128, b: u128, c: u128) -> Result<(u128, u128)> {
    require!(c != 0, MarketError::DivisionByZero);
    let (high, low) = full_mul(a, b);
    Ok(div_rem_wide(high, low, c).ok_or(MarketError::MathOverflow)?)
}

/// `a * b / c`, rounded down.
pub fn mul_div_down(a: u128, b: u128, c: u128) -> Result<u128> {
    Ok(mul_div(a, b, c)?.0)
}

/// `a * b / c`, rounded up.
pub fn mul_div_up(a: u128, b: u128, c: u128) -> Result<u128> {
    let (quot, rem) = mul_div(a, b, c)?;
    if rem == 0 {
        return Ok(quot);
    }
    Ok(quot.checked_add(1).ok_or(MarketError::MathOverflow)?)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

pub fn mul_div_rounded(a: u128, b: u128, c: u128, rounding: Rounding) -> Result<u128> {
    match rounding {
        Rounding::Down => mul_div_down(a, b, c),
        Rounding::Up => mul_div_up(a, b, c),
    }
}

pub fn w_mul_down(a: u128, b: u128) -> Result<u128> {
    mul_div_down(a, b, WAD)
}

pub fn w_mul_up(a: u128, b: u128) -> Result<u128> {
    mul_div_up(a, b, WAD)
}

pub fn w_div_down(a: u128, b: u128) -> Result<u128> {
    mul_div_down(a, WAD, b)
}

pub fn w_div_up(a: u128, b: u128) -> Result<u128> {
    mul_div_up(a, WAD, b)
}

/// Third-order Taylor expansion of `e^(x*n) - 1`, where `x` is a per-second WAD
/// rate and `n` a number of seconds.
pub fn w_taylor_compounded(x: u128, n: u128) -> Result<u128> {
    let first = x.checked_mul(n).ok_or(MarketError::MathOverflow)?;
    let second = mul_div_down(first, first, 2 * WAD)?;
    let third = mul_div_down(second, first, 3 * WAD)?;
    Ok(first
        .checked_add(second)
        .and_then(|v| v.checked_add(third))
        .ok_or(MarketError::MathOverflow)?)
}

pub fn pow10(exponent: u32) -> Result<u128> {
    Ok(10u128
        .checked_pow(exponent)
        .ok_or(MarketError::MathOverflow)?)
}

/// Narrows a native-unit amount back to `u64`.
pub fn to_u64(value: u128) -> Result<u64> {
    Ok(u64::try_from(value).map_err(|_| MarketError::MathOverflow)?)
}

pub fn checked_add_u64(a: u64, b: u64) -> Result<u64> {
    Ok(a.checked_add(b).ok_or(MarketError::MathOverflow)?)
}

pub fn checked_sub_u64(a: u64, b: u64) -> Result<u64> {
    Ok(a.checked_sub(b).ok_or(MarketError::MathUnderflow)?)
}

pub fn checked_add_u128(a: u128, b: u128) -> Result<u128> {
    Ok(a.checked_add(b).ok_or(MarketError::MathOverflow)?)
}

pub fn checked_sub_u128(a: u128, b: u128) -> Result<u128> {
    Ok(a.checked_sub(b).ok_or(MarketError::MathUnderflow)?)
}
