//! Asset/share conversion with a virtual offset.
//!
//! Rounding always favours the market: value entering the market is converted
//! rounding down on the side the user receives, value leaving it rounding up on
//! the side the user gives.

use anchor_lang::prelude::*;

use crate::constants::{VIRTUAL_ASSETS, VIRTUAL_SHARES};
use crate::error::MarketError;
use crate::math::{checked_add_u128, mul_div_down, mul_div_up, to_u64};

fn share_base(total_shares: u128) -> Result<u128> {
    checked_add_u128(total_shares, VIRTUAL_SHARES)
}

fn asset_base(total_assets: u64) -> Result<u128> {
    checked_add_u128(total_assets as u128, VIRTUAL_ASSETS)
}

pub fn to_shares_down(assets: u64, total_assets: u64, total_shares: u128) -> Result<u128> {
    mul_div_down(assets as u128, share_base(total_shares)?, asset_base(total_assets)?)
}

pub fn to_shares_up(assets: u64, total_assets: u64, total_shares: u128) -> Result<u128> {
    mul_div_up(assets as u128, share_base(total_shares)?, asset_base(total_assets)?)
}

pub fn to_assets_down(shares: u128, total_assets: u64, total_shares: u128) -> Result<u64> {
    to_u64(mul_div_down(shares, asset_base(total_assets)?, share_base(total_shares)?)?)
}

pub fn to_assets_up(shares: u128, total_assets: u64, total_shares: u128) -> Result<u64> {
    to_u64(mul_div_up(shares, asset_base(total_assets)?, share_base(total_shares)?)?)
}

/// The side of a conversion fixed by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantity {
    Assets(u64),
    Shares(u128),
}

impl Quantity {
    /// Exactly one of `assets` and `shares` must be non-zero.
    pub fn from_pair(assets: u64, shares: u128) -> Result<Self> {
        match (assets, shares) {
            (0, 0) => err!(MarketError::AssetShareValueMismatch),
            (assets, 0) => Ok(Quantity::Assets(assets)),
            (0, shares) => Ok(Quantity::Shares(shares)),
            _ => err!(MarketError::AssetShareValueMismatch),
        }
    }

    /// Value moving into the market (deposit, repay).
    pub fn resolve_inflow(self, total_assets: u64, total_shares: u128) -> Result<(u64, u128)> {
        match self {
            Quantity::Assets(assets) => Ok((assets, to_shares_down(assets, total_assets, total_shares)?)),
            Quantity::Shares(shares) => Ok((to_assets_up(shares, total_assets, total_shares)?, shares)),
        }
    }

    /// Value moving out of the market (withdraw, borrow).
    pub fn resolve_outflow(self, total_assets: u64, total_shares: u128) -> Result<(u64, u128)> {
        match self {
            Quantity::Assets(assets) => Ok((assets, to_shares_up(assets, total_assets, total_shares)?)),
            Quantity::Shares(shares) => Ok((to_assets_down(shares, total_assets, total_shares)?, shares)),
        }
    }
}
