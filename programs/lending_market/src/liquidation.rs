use anchor_lang::prelude::*;

use crate::config::RiskParameters;
use crate::constants::WAD;
use crate::error::MarketError;
use crate::math::{
    checked_sub_u128, checked_sub_u64, to_u64, w_div_down, w_div_up, w_mul_down, Rounding,
};
use crate::oracle::{collateral_to_quote, quote_to_collateral, ValidatedPrice};
use crate::shares::{to_assets_down, to_assets_up, to_shares_up};
use crate::solvency::is_solvent;
use crate::state::{BorrowPosition, Market};

/// The side of a liquidation fixed by the liquidator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiquidationRequest {
    SeizeCollateral(u64),
    RepayShares(u128),
}

impl LiquidationRequest {
    pub fn from_pair(seized_collateral: u64, repay_shares: u128) -> Result<Self> {
        match (seized_collateral, repay_shares) {
            (0, 0) => err!(MarketError::AssetShareValueMismatch),
            (seized, 0) => Ok(LiquidationRequest::SeizeCollateral(seized)),
            (0, shares) => Ok(LiquidationRequest::RepayShares(shares)),
            _ => err!(MarketError::AssetShareValueMismatch),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LiquidationOutcome {
    pub incentive_factor: u128,
    pub seized_collateral: u64,
    pub repaid_shares: u128,
    /// Quote the liquidator pays in.
    pub repaid_assets: u64,
    pub bad_debt_shares: u128,
    pub bad_debt_assets: u64,
}

/// `min(max_factor, 1 / (1 - cursor * (1 - ltv)))`
pub fn liquidation_incentive_factor(ltv_factor: u128, params: &RiskParameters) -> Result<u128> {
    let gap = checked_sub_u128(WAD, ltv_factor)?;
    let discount = checked_sub_u128(WAD, w_mul_down(params.liquidation_cursor, gap)?)?;
    Ok(w_div_down(WAD, discount)?.min(params.max_liquidation_incentive_factor))
}

struct Pricing {
    upper: u64,
    exponent: i32,
    incentive: u128,
}

impl Pricing {
    /// Collateral handed out for repaying `shares`, incentive included.
    fn collateral_for_shares(&self, market: &Market, shares: u128) -> Result<u64> {
        let assets = to_assets_down(
            shares,
            market.total_borrow_assets,
            market.total_borrow_shares,
        )?;
        let value = w_mul_down(assets as u128, self.incentive)?;
        to_u64(quote_to_collateral(
            market,
            value,
            self.upper,
            self.exponent,
            Rounding::Down,
        )?)
    }

    /// Borrow shares that must be repaid to take `collateral`.
    fn shares_for_collateral(&self, market: &Market, collateral: u64) -> Result<u128> {
        let quoted = collateral_to_quote(market, collateral, self.upper, self.exponent, Rounding::Up)?;
        let repaid = to_u64(w_div_up(quoted, self.incentive)?)?;
        to_shares_up(
            repaid,
            market.total_borrow_assets,
            market.total_borrow_shares,
        )
    }
}

/// Liquidates an insolvent position in place.
///
/// The requested side must exist in full. The derived side is capped at what the
/// position holds, and the requested side is then recomputed from the cap. When
/// the collateral runs out before the debt does, the remaining debt is written
/// off against supplied assets.
pub fn liquidate_position(
    market: &mut Market,
    position: &mut BorrowPosition,
    price: &ValidatedPrice,
    request: LiquidationRequest,
    params: &RiskParameters,
) -> Result<LiquidationOutcome> {
    require!(
        !is_solvent(position, market, price)?,
        MarketError::BorrowerIsSolvent
    );

    let pricing = Pricing {
        upper: price.upper()?,
        exponent: price.exponent,
        incentive: liquidation_incentive_factor(market.ltv_factor, params)?,
    };

    let (seized_collateral, repaid_shares) = match request {
        LiquidationRequest::SeizeCollateral(requested) => {
            require!(
                requested <= position.collateral,
                MarketError::InsufficientCollateral
            );
            let shares = pricing.shares_for_collateral(market, requested)?;
            if shares > position.borrow_shares {
                let shares = position.borrow_shares;
                let seized = pricing.collateral_for_shares(market, shares)?.min(requested);
                (seized, shares)
            } else {
                (requested, shares)
            }
        }
        LiquidationRequest::RepayShares(requested) => {
            require!(
                requested <= position.borrow_shares,
                MarketError::RepayExceedsDebt
            );
            let seized = pricing.collateral_for_shares(market, requested)?;
            if seized > position.collateral {
                let seized = position.collateral;
                let shares = pricing.shares_for_collateral(market, seized)?.min(requested);
                (seized, shares)
            } else {
                (seized, requested)
            }
        }
    };

    let quoted_assets = to_assets_up(
        repaid_shares,
        market.total_borrow_assets,
        market.total_borrow_shares,
    )?;
    position.borrow_shares = checked_sub_u128(position.borrow_shares, repaid_shares)?;
    position.collateral = checked_sub_u64(position.collateral, seized_collateral)?;
    market.total_collateral = checked_sub_u64(market.total_collateral, seized_collateral)?;
    let repaid_assets = market.release_debt(repaid_shares, quoted_assets)?;

    let mut bad_debt_shares = 0;
    let mut bad_debt_assets = 0;
    if position.collateral == 0 && position.borrow_shares > 0 {
        bad_debt_shares = position.borrow_shares;
        let owed = to_assets_up(
            bad_debt_shares,
            market.total_borrow_assets,
            market.total_borrow_shares,
        )?
        .min(market.total_borrow_assets);
        bad_debt_assets = market.release_debt(bad_debt_shares, owed)?;
        market.total_supply_assets = checked_sub_u64(market.total_supply_assets, bad_debt_assets)?;
        position.borrow_shares = 0;
        msg!(
            "Bad debt of {} written off on market {}",
            bad_debt_assets,
            market.id
        );
    }

    Ok(LiquidationOutcome {
        incentive_factor: pricing.incentive,
        seized_collateral,
        repaid_shares,
        repaid_assets,
        bad_debt_shares,
        bad_debt_assets,
    })
}
