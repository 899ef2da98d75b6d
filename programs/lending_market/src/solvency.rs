use anchor_lang::prelude::*;
use fixed::types::I80F48;

use crate::error::MarketError;
use crate::math::{w_mul_down, Rounding};
use crate::oracle::{collateral_to_quote, ValidatedPrice};
use crate::shares::to_assets_up;
use crate::state::{BorrowPosition, Market};

/// Most the position may owe: collateral at the lower price bound times LTV.
pub fn max_borrow(position: &BorrowPosition, market: &Market, price: &ValidatedPrice) -> Result<u128> {
    let collateral_value = collateral_to_quote(
        market,
        position.collateral,
        price.lower(),
        price.exponent,
        Rounding::Down,
    )?;
    w_mul_down(collateral_value, market.ltv_factor)
}

/// Debt in quote units, rounded against the borrower.
pub fn debt_assets(position: &BorrowPosition, market: &Market) -> Result<u64> {
    to_assets_up(
        position.borrow_shares,
        market.total_borrow_assets,
        market.total_borrow_shares,
    )
}

pub fn is_solvent(position: &BorrowPosition, market: &Market, price: &ValidatedPrice) -> Result<bool> {
    if position.borrow_shares == 0 {
        return Ok(true);
    }
    Ok(max_borrow(position, market, price)? >= debt_assets(position, market)? as u128)
}

pub fn assert_solvent(position: &BorrowPosition, market: &Market, price: &ValidatedPrice) -> Result<()> {
    require!(
        is_solvent(position, market, price)?,
        MarketError::NotSolvent
    );
    Ok(())
}

/// `max_borrow / debt`. Below one means liquidatable. `None` without debt.
pub fn health_factor(
    position: &BorrowPosition,
    market: &Market,
    price: &ValidatedPrice,
) -> Result<Option<I80F48>> {
    let debt = debt_assets(position, market)?;
    if position.borrow_shares == 0 || debt == 0 {
        return Ok(None);
    }
    let capacity = I80F48::checked_from_num(max_borrow(position, market, price)?)
        .ok_or(MarketError::MathOverflow)?;
    let factor = capacity
        .checked_div(I80F48::from_num(debt))
        .ok_or(MarketError::MathOverflow)?;
    Ok(Some(factor))
}
