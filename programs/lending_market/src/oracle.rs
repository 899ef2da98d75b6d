//! Price validation and collateral valuation.
//!
//! A price is collateral quoted in quote units, `price * 10^exponent`, with the
//! token decimals of both sides folded into the conversion.

use anchor_lang::prelude::*;
use price_feeds::{FeedRegistry, PriceData};

use crate::error::MarketError;
use crate::math::{mul_div_rounded, pow10, Rounding};
use crate::state::Market;

/// A fresh price whose confidence band lies strictly inside `(0, 2 * price)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidatedPrice {
    pub price: u64,
    pub confidence: u64,
    pub exponent: i32,
    pub publish_time: i64,
}

impl ValidatedPrice {
    pub fn new(data: &PriceData, now: i64, max_age: u64) -> Result<Self> {
        require!(
            data.age(now) <= i64::try_from(max_age).unwrap_or(i64::MAX),
            MarketError::StaleOracle
        );
        require!(data.price > 0, MarketError::InvalidOraclePrice);
        let price = data.price as u64;
        require!(
            data.confidence < price,
            MarketError::InvalidPriceConfidence
        );
        Ok(Self {
            price,
            confidence: data.confidence,
            exponent: data.exponent,
            publish_time: data.publish_time,
        })
    }

    /// Conservative price for valuing collateral held.
    pub fn lower(&self) -> u64 {
        self.price - self.confidence
    }

    /// Conservative price for collateral handed out.
    pub fn upper(&self) -> Result<u64> {
        Ok(self
            .price
            .checked_add(self.confidence)
            .ok_or(MarketError::MathOverflow)?)
    }
}

/// Reads the market's feed and validates it against `max_age`.
pub fn fetch_price(
    feeds: &FeedRegistry,
    market: &Market,
    now: i64,
    max_age: u64,
) -> Result<ValidatedPrice> {
    let data = feeds.get_price(&market.oracle)?;
    ValidatedPrice::new(&data, now, max_age)
}

fn combined_exponent(market: &Market, exponent: i32) -> i32 {
    exponent + market.quote_decimals as i32 - market.collateral_decimals as i32
}

/// Value of `amount` collateral in quote native units at `price`.
pub fn collateral_to_quote(
    market: &Market,
    amount: u64,
    price: u64,
    exponent: i32,
    rounding: Rounding,
) -> Result<u128> {
    let exponent = combined_exponent(market, exponent);
    let product = amount as u128 * price as u128;
    if exponent >= 0 {
        Ok(product
            .checked_mul(pow10(exponent.unsigned_abs())?)
            .ok_or(MarketError::MathOverflow)?)
    } else {
        mul_div_rounded(product, 1, pow10(exponent.unsigned_abs())?, rounding)
    }
}

/// Amount of collateral worth `value` quote native units at `price`.
pub fn quote_to_collateral(
    market: &Market,
    value: u128,
    price: u64,
    exponent: i32,
    rounding: Rounding,
) -> Result<u128> {
    require!(price > 0, MarketError::InvalidOraclePrice);
    let exponent = combined_exponent(market, exponent);
    if exponent >= 0 {
        let denominator = (price as u128)
            .checked_mul(pow10(exponent.unsigned_abs())?)
            .ok_or(MarketError::MathOverflow)?;
        mul_div_rounded(value, 1, denominator, rounding)
    } else {
        mul_div_rounded(value, pow10(exponent.unsigned_abs())?, price as u128, rounding)
    }
}
