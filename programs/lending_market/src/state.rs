use anchor_lang::prelude::*;
use price_feeds::OracleRef;

use crate::constants::WAD;
use crate::error::MarketError;
use crate::math::{checked_sub_u128, checked_sub_u64};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollateralStatus {
    Active,
    /// Wind-down: no new borrows or collateral, exits still allowed.
    Inactive,
}

/// Parameters a market is created with. Together they determine its id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarketParams {
    pub quote_mint: Pubkey,
    pub quote_decimals: u8,
    pub collateral_mint: Pubkey,
    pub collateral_decimals: u8,
    pub ltv_factor: u128,
    pub oracle: OracleRef,
}

#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct Market {
    pub id: Pubkey,
    pub bump: u8,
    pub quote_mint: Pubkey,
    pub quote_decimals: u8,
    pub collateral_mint: Pubkey,
    pub collateral_decimals: u8,
    pub ltv_factor: u128,
    pub oracle: OracleRef,
    pub creator: Pubkey,

    pub total_supply_assets: u64,
    pub total_supply_shares: u128,
    pub total_borrow_assets: u64,
    pub total_borrow_shares: u128,
    pub total_collateral: u64,
    /// Supply shares owed to the fee recipient.
    pub fee_shares: u128,
    pub debt_cap: u64,

    pub deposit_index: u128,
    pub borrow_index: u128,
    pub last_accrual_timestamp: i64,

    pub collateral_status: CollateralStatus,
    pub inactive_since: i64,
}

impl Market {
    pub const LEN: usize = 32 // id
        + 1 // bump
        + 32 + 1 // quote mint, decimals
        + 32 + 1 // collateral mint, decimals
        + 16 // ltv_factor
        + OracleRef::LEN
        + 32 // creator
        + 8 + 16 // supply assets, shares
        + 8 + 16 // borrow assets, shares
        + 8 // total_collateral
        + 16 // fee_shares
        + 8 // debt_cap
        + 16 + 16 // indices
        + 8 // last_accrual_timestamp
        + 1 // collateral_status
        + 8; // inactive_since

    pub fn new(id: Pubkey, bump: u8, params: &MarketParams, creator: Pubkey, now: i64) -> Self {
        Self {
            id,
            bump,
            quote_mint: params.quote_mint,
            quote_decimals: params.quote_decimals,
            collateral_mint: params.collateral_mint,
            collateral_decimals: params.collateral_decimals,
            ltv_factor: params.ltv_factor,
            oracle: params.oracle,
            creator,
            total_supply_assets: 0,
            total_supply_shares: 0,
            total_borrow_assets: 0,
            total_borrow_shares: 0,
            total_collateral: 0,
            fee_shares: 0,
            debt_cap: u64::MAX,
            deposit_index: WAD,
            borrow_index: WAD,
            last_accrual_timestamp: now,
            collateral_status: CollateralStatus::Active,
            inactive_since: 0,
        }
    }

    /// The tuple the market answers to now. The LTV may differ from creation.
    pub fn params(&self) -> MarketParams {
        MarketParams {
            quote_mint: self.quote_mint,
            quote_decimals: self.quote_decimals,
            collateral_mint: self.collateral_mint,
            collateral_decimals: self.collateral_decimals,
            ltv_factor: self.ltv_factor,
            oracle: self.oracle,
        }
    }

    pub fn is_collateral_active(&self) -> bool {
        self.collateral_status == CollateralStatus::Active
    }

    pub fn assert_collateral_active(&self) -> Result<()> {
        require!(self.is_collateral_active(), MarketError::CollateralNotActive);
        Ok(())
    }

    /// Lent-out assets can never exceed supplied assets.
    pub fn assert_liquidity(&self) -> Result<()> {
        require!(
            self.total_borrow_assets <= self.total_supply_assets,
            MarketError::InsufficientLiquidity
        );
        Ok(())
    }

    /// Removes `shares` of debt worth `assets` from the borrow totals and returns
    /// the assets actually settled. The last shares out settle every remaining
    /// borrow asset so that no debt survives its shares.
    pub fn release_debt(&mut self, shares: u128, assets: u64) -> Result<u64> {
        if shares == self.total_borrow_shares {
            let assets = assets.max(self.total_borrow_assets);
            self.total_borrow_shares = 0;
            self.total_borrow_assets = 0;
            return Ok(assets);
        }
        let remaining_shares = checked_sub_u128(self.total_borrow_shares, shares)?;
        let remaining_assets = checked_sub_u64(self.total_borrow_assets, assets)?;
        self.total_borrow_shares = remaining_shares;
        self.total_borrow_assets = remaining_assets;
        Ok(assets)
    }

    pub fn assert_debt_cap(&self) -> Result<()> {
        require!(
            self.total_borrow_assets <= self.debt_cap,
            MarketError::DebtCapExceeded
        );
        Ok(())
    }
}

#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct SupplyPosition {
    pub market: Pubkey,
    pub owner: Pubkey,
    pub shares: u128,
}

impl SupplyPosition {
    pub const LEN: usize = 32 + 32 + 16;

    pub fn new(market: Pubkey, owner: Pubkey) -> Self {
        Self { market, owner, shares: 0 }
    }

    pub fn assert_owner(&self, caller: Pubkey) -> Result<()> {
        require_keys_eq!(caller, self.owner, MarketError::UnauthorizedDelegate);
        Ok(())
    }
}

#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct BorrowPosition {
    pub market: Pubkey,
    pub owner: Pubkey,
    pub delegate: Option<Pubkey>,
    pub collateral: u64,
    pub borrow_shares: u128,
}

impl BorrowPosition {
    pub const LEN: usize = 32 + 32 + 1 + 32 + 8 + 16;

    pub fn new(market: Pubkey, owner: Pubkey) -> Self {
        Self {
            market,
            owner,
            delegate: None,
            collateral: 0,
            borrow_shares: 0,
        }
    }

    pub fn can_operate(&self, caller: Pubkey) -> bool {
        caller == self.owner || self.delegate == Some(caller)
    }

    /// Owner or delegate only.
    pub fn assert_operator(&self, caller: Pubkey) -> Result<()> {
        require!(self.can_operate(caller), MarketError::UnauthorizedDelegate);
        Ok(())
    }
}
