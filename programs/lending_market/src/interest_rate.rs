use anchor_lang::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{CURVE_STEEPNESS, RATE_AT_TARGET, TARGET_UTILIZATION, WAD};
use crate::error::MarketError;
use crate::math::w_div_down;

/// Kinked borrow-rate curve.
///
/// The rate equals `rate_at_target` at `target_utilization`, falls linearly to
/// `rate_at_target / curve_steepness` at zero utilization and rises linearly to
/// `rate_at_target * curve_steepness` at full utilization. Rates are per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterestRateModel {
    pub rate_at_target: u128,
    pub target_utilization: u128,
    pub curve_steepness: u128,
}

impl Default for InterestRateModel {
    fn default() -> Self {
        Self {
            rate_at_target: RATE_AT_TARGET,
            target_utilization: TARGET_UTILIZATION,
            curve_steepness: CURVE_STEEPNESS,
        }
    }
}

impl InterestRateModel {
    pub fn is_valid(&self) -> bool {
        self.target_utilization > 0
            && self.target_utilization < WAD
            && self.curve_steepness >= WAD
            && self.rate_at_target <= WAD
    }

    pub fn borrow_rate(&self, utilization: u128) -> Result<u128> {
        let wad = WAD as i128;
        let target = self.target_utilization as i128;
        let utilization = utilization.min(WAD) as i128;

        let distance = if utilization > target { wad - target } else { target };
        let err_norm = (utilization - target)
            .checked_mul(wad)
            .ok_or(MarketError::MathOverflow)?
            .checked_div(distance)
            .ok_or(MarketError::DivisionByZero)?;

        let coeff = if err_norm < 0 {
            wad - wad
                .checked_mul(wad)
                .ok_or(MarketError::MathOverflow)?
                .checked_div(self.curve_steepness as i128)
                .ok_or(MarketError::DivisionByZero)?
        } else {
            self.curve_steepness as i128 - wad
        };

        let scale = coeff
            .checked_mul(err_norm)
            .ok_or(MarketError::MathOverflow)?
            / wad
            + wad;
        let rate = scale
            .checked_mul(self.rate_at_target as i128)
            .ok_or(MarketError::MathOverflow)?
            / wad;
        Ok(u128::try_from(rate).map_err(|_| MarketError::MathUnderflow)?)
    }
}

/// Borrowed share of supplied assets, capped at 1.0. Zero when nothing is supplied.
pub fn utilization(total_borrow_assets: u64, total_supply_assets: u64) -> Result<u128> {
    if total_supply_assets == 0 {
        return Ok(0);
    }
    Ok(w_div_down(total_borrow_assets as u128, total_supply_assets as u128)?.min(WAD))
}
