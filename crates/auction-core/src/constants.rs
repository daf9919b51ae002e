//! Protocol constants. Fixed-point values use the RAY (1e27) and WAD (1e18) scales.

use alloy_primitives::U256;

/// 10^27, the precision of decay factors and `rpow` results.
pub const RAY: U256 = U256::from_limbs([11_515_845_246_265_065_472, 54_210_108, 0, 0]);

/// 10^18, the precision of prices.
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// `RAY / 2`, added before each truncating division in `rpow` to round half-up.
pub const HALF_RAY: U256 = U256::from_limbs([5_757_922_623_132_532_736, 27_105_054, 0, 0]);

/// Basis-point denominator used by configuration shorthands.
pub const BPS_PRECISION: u64 = 10_000;

/// Largest token decimals accepted when enabling a token.
///
/// `10^36 * WAD` fits in 256 bits, and payment math widens its product to
/// 512 bits, so any pair of decimals up to this bound settles exactly.
pub const MAX_TOKEN_DECIMALS: u8 = 36;

/// Default length of a price step in seconds.
pub const DEFAULT_UPDATE_INTERVAL: u64 = 60;

/// Default maximum round duration in seconds (one day).
pub const DEFAULT_AUCTION_LENGTH: u64 = 86_400;

/// Default decay per step in basis points (0.5%).
pub const DEFAULT_DECAY_RATE_BPS: u64 = 50;

/// Default starting price in whole want tokens per whole from token.
pub const DEFAULT_STARTING_PRICE: u64 = 1_000_000;

/// Default decimals of the want token.
pub const DEFAULT_WANT_DECIMALS: u8 = 18;

/// Default JSON-RPC port for the auction node.
pub const DEFAULT_RPC_PORT: u16 = 18_545;

/// Capacity of the event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 1_024;

/// Convert a basis-point rate into a RAY-scaled fraction.
///
/// # Examples
///
/// ```
/// use auction_core::constants::{bps_to_ray, RAY};
/// use alloy_primitives::U256;
/// assert_eq!(bps_to_ray(10_000), RAY);
/// assert_eq!(bps_to_ray(100), RAY / U256::from(100u64));
/// ```
pub fn bps_to_ray(bps: u64) -> U256 {
    RAY * U256::from(bps) / U256::from(BPS_PRECISION)
}

/// `10^decimals` as a U256.
pub fn pow10(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_is_ten_to_the_27() {
        assert_eq!(RAY, pow10(27));
        assert_eq!(RAY.to_string(), "1000000000000000000000000000");
    }

    #[test]
    fn wad_is_ten_to_the_18() {
        assert_eq!(WAD, pow10(18));
    }

    #[test]
    fn half_ray_is_half() {
        assert_eq!(HALF_RAY * U256::from(2u64), RAY);
    }

    #[test]
    fn bps_conversion() {
        assert_eq!(bps_to_ray(0), U256::ZERO);
        assert_eq!(bps_to_ray(1), pow10(23));
        assert_eq!(bps_to_ray(DEFAULT_DECAY_RATE_BPS), pow10(24) * U256::from(5u64));
    }

    #[test]
    fn max_decimals_fit_with_wad() {
        let scaled = pow10(MAX_TOKEN_DECIMALS).checked_mul(WAD);
        assert!(scaled.is_some());
    }
}
