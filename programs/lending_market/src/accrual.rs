use anchor_lang::prelude::*;

use crate::constants::WAD;
use crate::error::MarketError;
use crate::events::InterestAccrued;
use crate::interest_rate::{utilization, InterestRateModel};
use crate::math::{
    checked_add_u128, checked_add_u64, checked_sub_u64, mul_div_down, to_u64, w_mul_down,
    w_taylor_compounded,
};
use crate::shares::to_shares_down;
use crate::state::Market;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccrualOutcome {
    pub elapsed: i64,
    pub borrow_rate: u128,
    pub interest: u64,
    pub fee_assets: u64,
    pub fee_shares: u128,
}

/// Brings `market` up to `now`.
///
/// Interest compounds on the borrow side and is credited in full to supplied
/// assets. The protocol cut is minted as supply shares priced on the assets
/// that exclude the fee, so existing suppliers carry exactly the dilution of
/// the fee. Calling twice at the same `now` changes nothing.
pub fn accrue_interest(
    market: &mut Market,
    fee_factor: u128,
    model: &InterestRateModel,
    now: i64,
) -> Result<AccrualOutcome> {
    require!(
        now >= market.last_accrual_timestamp,
        MarketError::InvalidTimestamp
    );
    let elapsed = now - market.last_accrual_timestamp;
    if elapsed == 0 {
        return Ok(AccrualOutcome::default());
    }

    market.last_accrual_timestamp = now;
    if market.total_borrow_assets == 0 {
        return Ok(AccrualOutcome {
            elapsed,
            ..AccrualOutcome::default()
        });
    }

    let supply_before = market.total_supply_assets;
    let borrow_rate =
        model.borrow_rate(utilization(market.total_borrow_assets, market.total_supply_assets)?)?;
    let growth = w_taylor_compounded(borrow_rate, elapsed as u128)?;
    let interest = to_u64(w_mul_down(market.total_borrow_assets as u128, growth)?)?;

    market.total_borrow_assets = checked_add_u64(market.total_borrow_assets, interest)?;
    market.total_supply_assets = checked_add_u64(market.total_supply_assets, interest)?;
    market.borrow_index = w_mul_down(market.borrow_index, checked_add_u128(WAD, growth)?)?;

    let fee_assets = to_u64(w_mul_down(interest as u128, fee_factor)?)?;
    let mut fee_shares = 0;
    if fee_assets > 0 {
        fee_shares = to_shares_down(
            fee_assets,
            checked_sub_u64(market.total_supply_assets, fee_assets)?,
            market.total_supply_shares,
        )?;
        market.total_supply_shares = checked_add_u128(market.total_supply_shares, fee_shares)?;
        market.fee_shares = checked_add_u128(market.fee_shares, fee_shares)?;
    }

    if supply_before > 0 {
        let supplier_interest = checked_sub_u64(interest, fee_assets)? as u128;
        let index_growth =
            mul_div_down(market.deposit_index, supplier_interest, supply_before as u128)?;
        market.deposit_index = checked_add_u128(market.deposit_index, index_growth)?;
    }

    msg!(
        "Accrued {} interest on market {} over {}s (rate {}/s, fee shares {})",
        interest,
        market.id,
        elapsed,
        borrow_rate,
        fee_shares
    );
    emit!(InterestAccrued {
        market: market.id,
        borrow_rate,
        interest,
        fee_shares,
        borrow_index: market.borrow_index,
        deposit_index: market.deposit_index,
        timestamp: now,
    });

    Ok(AccrualOutcome {
        elapsed,
        borrow_rate,
        interest,
        fee_assets,
        fee_shares,
    })
}
