//! Fixed-point arithmetic over 256-bit unsigned integers.
//!
//! Two scales are used throughout the engine:
//! - **WAD** (10^18) for prices and token-normalised amounts
//! - **RAY** (10^27) for decay factors and exponentiation
//!
//! Every function is pure and reports overflow or a zero divisor as a
//! [`MathError`]. Nothing here saturates or wraps: a silent numeric error in
//! this module would corrupt every price derived from it.

use alloy_primitives::{U256, U512};

use crate::constants::{HALF_RAY, RAY, WAD};
use crate::error::MathError;

/// `x * y / d`, truncating.
pub fn mul_div(x: U256, y: U256, d: U256) -> Result<U256, MathError> {
    if d.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = x.checked_mul(y).ok_or(MathError::Overflow)?;
    Ok(product / d)
}

/// `x * y / d`, rounding up.
pub fn mul_div_up(x: U256, y: U256, d: U256) -> Result<U256, MathError> {
    if d.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = x.checked_mul(y).ok_or(MathError::Overflow)?;
    let quotient = product / d;
    if (product % d).is_zero() {
        Ok(quotient)
    } else {
        quotient.checked_add(U256::from(1u64)).ok_or(MathError::Overflow)
    }
}

/// `x * y / WAD`, truncating.
pub fn wmul(x: U256, y: U256) -> Result<U256, MathError> {
    mul_div(x, y, WAD)
}

/// `x * WAD / y`, truncating.
///
/// # Examples
///
/// ```
/// use alloy_primitives::U256;
/// use auction_core::constants::WAD;
/// use auction_core::error::MathError;
/// use auction_core::math::wdiv;
///
/// let half = wdiv(U256::from(1u64), U256::from(2u64)).unwrap();
/// assert_eq!(half, WAD / U256::from(2u64));
/// assert_eq!(wdiv(WAD, U256::ZERO), Err(MathError::DivisionByZero));
/// ```
pub fn wdiv(x: U256, y: U256) -> Result<U256, MathError> {
    mul_div(x, WAD, y)
}

/// `x * y / RAY`, truncating.
pub fn rmul(x: U256, y: U256) -> Result<U256, MathError> {
    mul_div(x, y, RAY)
}

/// `x * RAY / y`, truncating.
pub fn rdiv(x: U256, y: U256) -> Result<U256, MathError> {
    mul_div(x, RAY, y)
}

/// Want-token base units owed for `amount` from-token base units at `price`.
///
/// `price` is WAD-scaled want per whole from token, so the result is
/// `amount * price * 10^want_decimals / (10^from_decimals * WAD)`, rounded up
/// so that rounding never favours the payer.
///
/// The powers of ten cancel to a single scale factor and the product is
/// formed in 512 bits, so only a result that does not fit in 256 bits fails
/// with [`MathError::Overflow`].
///
/// # Examples
///
/// ```
/// use alloy_primitives::U256;
/// use auction_core::constants::WAD;
/// use auction_core::math::payment_for;
///
/// // 1.5 whole 6-decimal tokens at 2.0 want (18 decimals) each costs 3.0 want.
/// let owed = payment_for(U256::from(1_500_000u64), U256::from(2u64) * WAD, 6, 18).unwrap();
/// assert_eq!(owed, U256::from(3u64) * WAD);
/// ```
pub fn payment_for(
    amount: U256,
    price: U256,
    from_decimals: u8,
    want_decimals: u8,
) -> Result<U256, MathError> {
    let product = widen(amount)
        .checked_mul(widen(price))
        .ok_or(MathError::Overflow)?;
    if product.is_zero() {
        return Ok(U256::ZERO);
    }
    // Net decimal shift after dividing out the from-token scale and WAD.
    let shift = i32::from(want_decimals) - i32::from(from_decimals) - WAD_DECIMALS;
    let owed = if shift >= 0 {
        wide_pow10(shift.unsigned_abs())
            .and_then(|scale| product.checked_mul(scale))
            .ok_or(MathError::Overflow)?
    } else {
        match wide_pow10(shift.unsigned_abs()) {
            Some(divisor) => {
                let quotient = product / divisor;
                if (product % divisor).is_zero() {
                    quotient
                } else {
                    quotient + U512::from(1u64)
                }
            }
            // A divisor beyond 512 bits exceeds any product: a nonzero
            // fraction of one unit, rounded up.
            None => U512::from(1u64),
        }
    };
    narrow(owed)
}

const WAD_DECIMALS: i32 = 18;

fn widen(x: U256) -> U512 {
    let [a, b, c, d] = *x.as_limbs();
    U512::from_limbs([a, b, c, d, 0, 0, 0, 0])
}

fn narrow(x: U512) -> Result<U256, MathError> {
    if x.bit_len() > 256 {
        return Err(MathError::Overflow);
    }
    let limbs = x.as_limbs();
    Ok(U256::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3]]))
}

fn wide_pow10(exponent: u32) -> Option<U512> {
    U512::from(10u64).checked_pow(U512::from(exponent))
}

#[cfg(test)]
fn pow10(decimals: u8) -> Result<U256, MathError> {
    U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or(MathError::Overflow)
}

/// `(x * y + RAY/2) / RAY`: one rounded step of [`rpow`].
fn rmul_half_up(x: U256, y: U256) -> Result<U256, MathError> {
    let product = x.checked_mul(y).ok_or(MathError::Overflow)?;
    // The product must divide back to the factor it came from.
    if !x.is_zero() && product / x != y {
        return Err(MathError::Overflow);
    }
    let rounded = product.checked_add(HALF_RAY).ok_or(MathError::Overflow)?;
    Ok(rounded / RAY)
}

/// `base^exponent` at RAY precision by binary exponentiation.
///
/// `base` and the result are RAY-scaled, so `rpow(RAY, n) == RAY` and
/// `rpow(x, 0) == RAY`. `rpow(0, 0)` is defined as `RAY` and `rpow(0, n)` for
/// `n > 0` is zero. Each intermediate multiply rounds half-up and fails with
/// [`MathError::Overflow`] the moment it would exceed 256 bits. The loop runs
/// `log2(exponent)` times.
///
/// # Examples
///
/// ```
/// use alloy_primitives::U256;
/// use auction_core::constants::RAY;
/// use auction_core::math::rpow;
///
/// let ninety_nine = RAY * U256::from(99u64) / U256::from(100u64);
/// let squared = rpow(ninety_nine, 2).unwrap();
/// assert_eq!(squared, RAY * U256::from(9801u64) / U256::from(10_000u64));
/// ```
pub fn rpow(base: U256, exponent: u64) -> Result<U256, MathError> {
    if base.is_zero() {
        return Ok(if exponent == 0 { RAY } else { U256::ZERO });
    }

    let mut result = if exponent & 1 == 1 { base } else { RAY };
    let mut x = base;
    let mut n = exponent >> 1;

    while n > 0 {
        x = rmul_half_up(x, x)?;
        if n & 1 == 1 {
            result = rmul_half_up(result, x)?;
        }
        n >>= 1;
    }

    Ok(result)
}
