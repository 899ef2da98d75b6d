//! Market ledger: every user and admin operation.
//!
//! Each operation works on copies of the records it touches. The copies and the
//! token movements are committed together once every check has passed, so a
//! failed operation leaves the ledger exactly as it was.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use fixed::types::I80F48;
use price_feeds::{FeedError, FeedRegistry};

use crate::accrual::{accrue_interest, AccrualOutcome};
use crate::config::{Config, ConfigError, RiskParameters};
use crate::constants::WAD;
use crate::error::MarketError;
use crate::events::{
    Borrowed, CollateralDeposited, CollateralUpdated, CollateralWithdrawn, DebtCapUpdated,
    DelegateUpdated, Deposited, FeeUpdated, FeeWithdrawn, Liquidated, MarketCreated, Repaid,
    Withdrawn,
};
use crate::liquidation::{liquidate_position, LiquidationOutcome, LiquidationRequest};
use crate::math::{checked_add_u128, checked_add_u64, checked_sub_u128, checked_sub_u64};
use crate::oracle::{fetch_price, ValidatedPrice};
use crate::pda::{
    borrow_position_address, market_address, market_key, reissued_market_address,
    supply_position_address,
};
use crate::shares::{to_assets_down, to_assets_up, Quantity};
use crate::solvency;
use crate::state::{BorrowPosition, CollateralStatus, Market, MarketParams, SupplyPosition};
use crate::token::{check_batch, execute_batch, TokenTransfer, Transfer};

/// Records and token movements staged by one operation.
struct Commit {
    market: Market,
    supply: Option<(Pubkey, SupplyPosition)>,
    borrow: Option<(Pubkey, BorrowPosition)>,
    transfers: Vec<Transfer>,
}

pub struct MarketLedger<T: TokenTransfer> {
    config: Config,
    params: RiskParameters,
    feeds: FeedRegistry,
    bank: T,
    markets: BTreeMap<Pubkey, Market>,
    /// Parameter-tuple key of every market, as it stands now, to market id.
    market_keys: BTreeMap<Pubkey, Pubkey>,
    supply_positions: BTreeMap<Pubkey, SupplyPosition>,
    borrow_positions: BTreeMap<Pubkey, BorrowPosition>,
}

impl<T: TokenTransfer> MarketLedger<T> {
    pub fn new(bank: T, feeds: FeedRegistry) -> Self {
        Self::build(bank, feeds, RiskParameters::default())
    }

    /// Runs the engine with custom risk settings. Rejects settings that fail
    /// [`RiskParameters::validate`].
    pub fn with_params(
        bank: T,
        feeds: FeedRegistry,
        params: RiskParameters,
    ) -> std::result::Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self::build(bank, feeds, params))
    }

    fn build(bank: T, feeds: FeedRegistry, params: RiskParameters) -> Self {
        Self {
            config: Config::new(),
            params,
            feeds,
            bank,
            markets: BTreeMap::new(),
            market_keys: BTreeMap::new(),
            supply_positions: BTreeMap::new(),
            borrow_positions: BTreeMap::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn params(&self) -> &RiskParameters {
        &self.params
    }

    pub fn feeds(&self) -> &FeedRegistry {
        &self.feeds
    }

    pub fn feeds_mut(&mut self) -> &mut FeedRegistry {
        &mut self.feeds
    }

    pub fn bank(&self) -> &T {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut T {
        &mut self.bank
    }

    /// Stored market record, without pending interest.
    pub fn market(&self, market_id: &Pubkey) -> Option<&Market> {
        self.markets.get(market_id)
    }

    pub fn supply_position(&self, market_id: &Pubkey, owner: &Pubkey) -> Option<&SupplyPosition> {
        self.supply_positions
            .get(&supply_position_address(market_id, owner))
    }

    pub fn borrow_position(&self, market_id: &Pubkey, owner: &Pubkey) -> Option<&BorrowPosition> {
        self.borrow_positions
            .get(&borrow_position_address(market_id, owner))
    }

    pub fn supply_positions<'a>(
        &'a self,
        market_id: &'a Pubkey,
    ) -> impl Iterator<Item = &'a SupplyPosition> + 'a {
        self.supply_positions
            .values()
            .filter(move |position| position.market == *market_id)
    }

    pub fn borrow_positions<'a>(
        &'a self,
        market_id: &'a Pubkey,
    ) -> impl Iterator<Item = &'a BorrowPosition> + 'a {
        self.borrow_positions
            .values()
            .filter(move |position| position.market == *market_id)
    }

    // ---------------------------------------------------------------------
    // Staging helpers
    // ---------------------------------------------------------------------

    /// Copy of the market brought up to `now`.
    fn load_market(&self, market_id: &Pubkey, now: i64) -> Result<Market> {
        let mut market = self
            .markets
            .get(market_id)
            .cloned()
            .ok_or(MarketError::MarketNotFound)?;
        accrue_interest(
            &mut market,
            self.config.fee_factor,
            &self.params.interest_rate,
            now,
        )?;
        Ok(market)
    }

    fn load_supply(&self, market_id: &Pubkey, owner: Pubkey) -> (Pubkey, SupplyPosition) {
        let key = supply_position_address(market_id, &owner);
        let position = self
            .supply_positions
            .get(&key)
            .cloned()
            .unwrap_or_else(|| SupplyPosition::new(*market_id, owner));
        (key, position)
    }

    fn existing_supply(&self, market_id: &Pubkey, owner: Pubkey) -> Result<(Pubkey, SupplyPosition)> {
        let key = supply_position_address(market_id, &owner);
        let position = self
            .supply_positions
            .get(&key)
            .cloned()
            .ok_or(MarketError::PositionNotFound)?;
        Ok((key, position))
    }

    fn load_borrow(&self, market_id: &Pubkey, owner: Pubkey) -> (Pubkey, BorrowPosition) {
        let key = borrow_position_address(market_id, &owner);
        let position = self
            .borrow_positions
            .get(&key)
            .cloned()
            .unwrap_or_else(|| BorrowPosition::new(*market_id, owner));
        (key, position)
    }

    fn existing_borrow(&self, market_id: &Pubkey, owner: Pubkey) -> Result<(Pubkey, BorrowPosition)> {
        let key = borrow_position_address(market_id, &owner);
        let position = self
            .borrow_positions
            .get(&key)
            .cloned()
            .ok_or(MarketError::PositionNotFound)?;
        Ok((key, position))
    }

    /// First id for `params` not held by any market.
    fn free_market_address(&self, params: &MarketParams) -> (Pubkey, u8) {
        let first = market_address(params);
        if !self.markets.contains_key(&first.0) {
            return first;
        }
        (1u64..)
            .map(|generation| reissued_market_address(params, generation))
            .find(|(id, _)| !self.markets.contains_key(id))
            .unwrap_or(first)
    }

    fn price(&self, market: &Market, now: i64) -> Result<ValidatedPrice> {
        fetch_price(&self.feeds, market, now, self.params.max_price_age)
    }

    fn commit(&mut self, commit: Commit) -> Result<()> {
        check_batch(&self.bank, &commit.transfers)?;
        execute_batch(&mut self.bank, &commit.transfers)?;

        if let Some((key, position)) = commit.supply {
            self.supply_positions.insert(key, position);
        }
        if let Some((key, position)) = commit.borrow {
            self.borrow_positions.insert(key, position);
        }
        self.markets.insert(commit.market.id, commit.market);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Admin
    // ---------------------------------------------------------------------

    pub fn set_authority(&mut self, authority: Pubkey) -> Result<()> {
        self.config.set_authority(authority)
    }

    pub fn update_authority(&mut self, caller: Pubkey, new_authority: Pubkey) -> Result<()> {
        self.config.update_authority(caller, new_authority)
    }

    pub fn update_recipient(&mut self, caller: Pubkey, new_recipient: Pubkey) -> Result<()> {
        self.config.update_recipient(caller, new_recipient)
    }

    /// Changes the protocol fee. Every market is first accrued at the old fee.
    pub fn update_fee(&mut self, caller: Pubkey, new_fee: u128, now: i64) -> Result<()> {
        self.config
            .check_fee_update(caller, new_fee, self.params.max_fee_factor)?;

        let mut markets = self.markets.clone();
        for market in markets.values_mut() {
            accrue_interest(
                market,
                self.config.fee_factor,
                &self.params.interest_rate,
                now,
            )?;
        }

        let old_fee_factor = self.config.fee_factor;
        self.markets = markets;
        self.config.apply_fee(new_fee);
        msg!("Fee factor updated from {} to {}", old_fee_factor, new_fee);
        emit!(FeeUpdated {
            old_fee_factor,
            new_fee_factor: new_fee,
        });
        Ok(())
    }

    /// Sets the LTV factor and collateral status. Collateral that has been made
    /// inactive stays inactive. The new LTV may not give the market the same tuple
    /// as another market.
    pub fn update_collateral(
        &mut self,
        caller: Pubkey,
        market_id: &Pubkey,
        ltv_factor: u128,
        is_active: bool,
        now: i64,
    ) -> Result<()> {
        self.config.assert_authority(caller)?;
        require!(
            ltv_factor > 0 && ltv_factor < WAD,
            MarketError::InvalidLtvFactor
        );
        let mut market = self
            .markets
            .get(market_id)
            .cloned()
            .ok_or(MarketError::MarketNotFound)?;

        let old_key = market_key(&market.params());
        let new_key = market_key(&MarketParams {
            ltv_factor,
            ..market.params()
        });
        require!(
            new_key == old_key || !self.market_keys.contains_key(&new_key),
            MarketError::MarketAlreadyExists
        );

        match (market.collateral_status, is_active) {
            (CollateralStatus::Inactive, true) => {
                return err!(MarketError::CollateralReactivation);
            }
            (CollateralStatus::Active, false) => {
                market.collateral_status = CollateralStatus::Inactive;
                market.inactive_since = now;
                msg!("Collateral of market {} deactivated", market.id);
            }
            _ => {}
        }
        market.ltv_factor = ltv_factor;

        emit!(CollateralUpdated {
            market: market.id,
            ltv_factor,
            is_active,
            timestamp: now,
        });
        self.market_keys.remove(&old_key);
        self.market_keys.insert(new_key, market.id);
        self.markets.insert(market.id, market);
        Ok(())
    }

    pub fn update_debt_cap(&mut self, caller: Pubkey, market_id: &Pubkey, debt_cap: u64) -> Result<()> {
        self.config.assert_authority(caller)?;
        let market = self
            .markets
            .get_mut(market_id)
            .ok_or(MarketError::MarketNotFound)?;
        market.debt_cap = debt_cap;
        emit!(DebtCapUpdated {
            market: *market_id,
            debt_cap,
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Markets
    // ---------------------------------------------------------------------

    pub fn create_market(&mut self, caller: Pubkey, params: MarketParams, now: i64) -> Result<Pubkey> {
        if self.config.is_authority_set() {
            self.config.assert_authority(caller)?;
        }
        require_keys_neq!(
            params.quote_mint,
            params.collateral_mint,
            MarketError::SameTokenMints
        );
        require!(
            params.ltv_factor > 0 && params.ltv_factor < WAD,
            MarketError::InvalidLtvFactor
        );
        require!(
            self.feeds.is_registered(&params.oracle),
            FeedError::FeedNotFound
        );

        let key = market_key(&params);
        require!(
            !self.market_keys.contains_key(&key),
            MarketError::MarketAlreadyExists
        );
        let (id, bump) = self.free_market_address(&params);

        let market = Market::new(id, bump, &params, caller, now);
        msg!(
            "Market {} created: quote {} collateral {} ltv {}",
            id,
            params.quote_mint,
            params.collateral_mint,
            params.ltv_factor
        );
        emit!(MarketCreated {
            market: id,
            quote_mint: params.quote_mint,
            collateral_mint: params.collateral_mint,
            ltv_factor: params.ltv_factor,
            creator: caller,
            timestamp: now,
        });
        self.market_keys.insert(key, id);
        self.markets.insert(id, market);
        Ok(id)
    }

    /// Permissionless. A second call at the same `now` is a no-op.
    pub fn accrue_interest(&mut self, market_id: &Pubkey, now: i64) -> Result<AccrualOutcome> {
        let mut market = self
            .markets
            .get(market_id)
            .cloned()
            .ok_or(MarketError::MarketNotFound)?;
        let outcome = accrue_interest(
            &mut market,
            self.config.fee_factor,
            &self.params.interest_rate,
            now,
        )?;
        self.markets.insert(market.id, market);
        Ok(outcome)
    }

    pub fn update_delegate(
        &mut self,
        caller: Pubkey,
        market_id: &Pubkey,
        delegate: Option<Pubkey>,
    ) -> Result<()> {
        require!(
            self.markets.contains_key(market_id),
            MarketError::MarketNotFound
        );
        let (key, mut position) = self.load_borrow(market_id, caller);
        position.delegate = delegate;
        self.borrow_positions.insert(key, position);
        emit!(DelegateUpdated {
            market: *market_id,
            owner: caller,
            delegate,
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Supply side
    // ---------------------------------------------------------------------

    /// Supplies quote paid by `caller` and credits the shares to `owner`.
    /// Returns `(assets, shares)`.
    pub fn deposit(
        &mut self,
        caller: Pubkey,
        market_id: &Pubkey,
        owner: Pubkey,
        assets: u64,
        shares: u128,
        now: i64,
    ) -> Result<(u64, u128)> {
        let quantity = Quantity::from_pair(assets, shares)?;
        let mut market = self.load_market(market_id, now)?;
        let (key, mut position) = self.load_supply(market_id, owner);

        let (assets, shares) =
            quantity.resolve_inflow(market.total_supply_assets, market.total_supply_shares)?;
        require!(assets > 0 && shares > 0, MarketError::ZeroAmount);

        position.shares = checked_add_u128(position.shares, shares)?;
        market.total_supply_shares = checked_add_u128(market.total_supply_shares, shares)?;
        market.total_supply_assets = checked_add_u64(market.total_supply_assets, assets)?;

        let transfers = vec![Transfer {
            mint: market.quote_mint,
            from: caller,
            to: market.id,
            amount: assets,
        }];
        self.commit(Commit {
            market,
            supply: Some((key, position)),
            borrow: None,
            transfers,
        })?;

        emit!(Deposited {
            market: *market_id,
            caller,
            owner,
            assets,
            shares,
        });
        Ok((assets, shares))
    }

    /// Redeems the owner's supply shares. Only the owner may withdraw.
    pub fn withdraw(
        &mut self,
        caller: Pubkey,
        market_id: &Pubkey,
        owner: Pubkey,
        assets: u64,
        shares: u128,
        now: i64,
    ) -> Result<(u64, u128)> {
        let quantity = Quantity::from_pair(assets, shares)?;
        let mut market = self.load_market(market_id, now)?;
        let (key, mut position) = self.existing_supply(market_id, owner)?;
        position.assert_owner(caller)?;

        let (assets, shares) =
            quantity.resolve_outflow(market.total_supply_assets, market.total_supply_shares)?;
        require!(shares <= position.shares, MarketError::InsufficientShares);

        position.shares -= shares;
        market.total_supply_shares = checked_sub_u128(market.total_supply_shares, shares)?;
        market.total_supply_assets = checked_sub_u64(market.total_supply_assets, assets)?;
        market.assert_liquidity()?;

        let transfers = vec![Transfer {
            mint: market.quote_mint,
            from: market.id,
            to: owner,
            amount: assets,
        }];
        self.commit(Commit {
            market,
            supply: Some((key, position)),
            borrow: None,
            transfers,
        })?;

        emit!(Withdrawn {
            market: *market_id,
            owner,
            assets,
            shares,
        });
        Ok((assets, shares))
    }

    /// Redeems protocol fee shares to the fee recipient.
    pub fn withdraw_fee(
        &mut self,
        caller: Pubkey,
        market_id: &Pubkey,
        assets: u64,
        shares: u128,
        now: i64,
    ) -> Result<(u64, u128)> {
        require!(self.config.is_recipient_set(), MarketError::InvalidRecipient);
        require_keys_eq!(
            caller,
            self.config.fee_recipient,
            MarketError::InvalidRecipient
        );
        let quantity = Quantity::from_pair(assets, shares)?;
        let mut market = self.load_market(market_id, now)?;

        let (assets, shares) =
            quantity.resolve_outflow(market.total_supply_assets, market.total_supply_shares)?;
        require!(shares <= market.fee_shares, MarketError::InsufficientShares);

        market.fee_shares -= shares;
        market.total_supply_shares = checked_sub_u128(market.total_supply_shares, shares)?;
        market.total_supply_assets = checked_sub_u64(market.total_supply_assets, assets)?;
        market.assert_liquidity()?;

        let transfers = vec![Transfer {
            mint: market.quote_mint,
            from: market.id,
            to: caller,
            amount: assets,
        }];
        self.commit(Commit {
            market,
            supply: None,
            borrow: None,
            transfers,
        })?;

        emit!(FeeWithdrawn {
            market: *market_id,
            recipient: caller,
            assets,
            shares,
        });
        Ok((assets, shares))
    }

    // ---------------------------------------------------------------------
    // Collateral
    // ---------------------------------------------------------------------

    /// Anyone may add collateral to `owner`'s position; `caller` pays.
    pub fn deposit_collateral(
        &mut self,
        caller: Pubkey,
        market_id: &Pubkey,
        owner: Pubkey,
        amount: u64,
        now: i64,
    ) -> Result<()> {
        require!(amount > 0, MarketError::ZeroAmount);
        let mut market = self.load_market(market_id, now)?;
        market.assert_collateral_active()?;
        let (key, mut position) = self.load_borrow(market_id, owner);

        position.collateral = checked_add_u64(position.collateral, amount)?;
        market.total_collateral = checked_add_u64(market.total_collateral, amount)?;

        let transfers = vec![Transfer {
            mint: market.collateral_mint,
            from: caller,
            to: market.id,
            amount,
        }];
        self.commit(Commit {
            market,
            supply: None,
            borrow: Some((key, position)),
            transfers,
        })?;

        emit!(CollateralDeposited {
            market: *market_id,
            caller,
            owner,
            amount,
        });
        Ok(())
    }

    pub fn withdraw_collateral(
        &mut self,
        caller: Pubkey,
        market_id: &Pubkey,
        owner: Pubkey,
        amount: u64,
        recipient: Pubkey,
        now: i64,
    ) -> Result<()> {
        require!(amount > 0, MarketError::ZeroAmount);
        let mut market = self.load_market(market_id, now)?;
        let (key, mut position) = self.existing_borrow(market_id, owner)?;
        position.assert_operator(caller)?;
        require!(
            amount <= position.collateral,
            MarketError::InsufficientCollateral
        );

        position.collateral -= amount;
        market.total_collateral = checked_sub_u64(market.total_collateral, amount)?;
        if position.borrow_shares > 0 {
            let price = self.price(&market, now)?;
            solvency::assert_solvent(&position, &market, &price)?;
        }

        let transfers = vec![Transfer {
            mint: market.collateral_mint,
            from: market.id,
            to: recipient,
            amount,
        }];
        self.commit(Commit {
            market,
            supply: None,
            borrow: Some((key, position)),
            transfers,
        })?;

        emit!(CollateralWithdrawn {
            market: *market_id,
            owner,
            recipient,
            amount,
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Borrow side
    // ---------------------------------------------------------------------

    /// Borrows against `owner`'s collateral and sends the quote to `recipient`.
    /// Returns `(assets, shares)`.
    #[allow(clippy::too_many_arguments)]
    pub fn borrow(
        &mut self,
        caller: Pubkey,
        market_id: &Pubkey,
        owner: Pubkey,
        assets: u64,
        shares: u128,
        recipient: Pubkey,
        now: i64,
    ) -> Result<(u64, u128)> {
        let quantity = Quantity::from_pair(assets, shares)?;
        let mut market = self.load_market(market_id, now)?;
        market.assert_collateral_active()?;
        let (key, mut position) = self.load_borrow(market_id, owner);
        position.assert_operator(caller)?;

        let (assets, shares) =
            quantity.resolve_outflow(market.total_borrow_assets, market.total_borrow_shares)?;
        require!(assets > 0, MarketError::ZeroAmount);

        position.borrow_shares = checked_add_u128(position.borrow_shares, shares)?;
        market.total_borrow_shares = checked_add_u128(market.total_borrow_shares, shares)?;
        market.total_borrow_assets = checked_add_u64(market.total_borrow_assets, assets)?;
        market.assert_debt_cap()?;
        market.assert_liquidity()?;

        let price = self.price(&market, now)?;
        solvency::assert_solvent(&position, &market, &price)?;

        let transfers = vec![Transfer {
            mint: market.quote_mint,
            from: market.id,
            to: recipient,
            amount: assets,
        }];
        self.commit(Commit {
            market,
            supply: None,
            borrow: Some((key, position)),
            transfers,
        })?;

        emit!(Borrowed {
            market: *market_id,
            caller,
            owner,
            recipient,
            assets,
            shares,
        });
        Ok((assets, shares))
    }

    /// Repays `owner`'s debt from `caller`'s balance. Returns `(assets, shares)`.
    pub fn repay(
        &mut self,
        caller: Pubkey,
        market_id: &Pubkey,
        owner: Pubkey,
        assets: u64,
        shares: u128,
        now: i64,
    ) -> Result<(u64, u128)> {
        let quantity = Quantity::from_pair(assets, shares)?;
        let mut market = self.load_market(market_id, now)?;
        let (key, mut position) = self.existing_borrow(market_id, owner)?;
        position.assert_operator(caller)?;

        let (assets, shares) =
            quantity.resolve_inflow(market.total_borrow_assets, market.total_borrow_shares)?;
        require!(shares > 0, MarketError::ZeroAmount);
        require!(
            shares <= position.borrow_shares,
            MarketError::RepayExceedsDebt
        );

        position.borrow_shares -= shares;
        let assets = market.release_debt(shares, assets)?;

        let transfers = vec![Transfer {
            mint: market.quote_mint,
            from: caller,
            to: market.id,
            amount: assets,
        }];
        self.commit(Commit {
            market,
            supply: None,
            borrow: Some((key, position)),
            transfers,
        })?;

        emit!(Repaid {
            market: *market_id,
            payer: caller,
            owner,
            assets,
            shares,
        });
        Ok((assets, shares))
    }

    /// Liquidates an insolvent borrower. Exactly one of `seized_collateral` and
    /// `repay_shares` must be non-zero.
    pub fn liquidate(
        &mut self,
        caller: Pubkey,
        market_id: &Pubkey,
        borrower: Pubkey,
        seized_collateral: u64,
        repay_shares: u128,
        now: i64,
    ) -> Result<LiquidationOutcome> {
        let request = LiquidationRequest::from_pair(seized_collateral, repay_shares)?;
        let mut market = self.load_market(market_id, now)?;
        let (key, mut position) = self.existing_borrow(market_id, borrower)?;
        let price = self.price(&market, now)?;

        let outcome =
            liquidate_position(&mut market, &mut position, &price, request, &self.params)?;

        let transfers = vec![
            Transfer {
                mint: market.quote_mint,
                from: caller,
                to: market.id,
                amount: outcome.repaid_assets,
            },
            Transfer {
                mint: market.collateral_mint,
                from: market.id,
                to: caller,
                amount: outcome.seized_collateral,
            },
        ];
        self.commit(Commit {
            market,
            supply: None,
            borrow: Some((key, position)),
            transfers,
        })?;

        msg!(
            "Liquidated {} on market {}: repaid {} seized {}",
            borrower,
            market_id,
            outcome.repaid_assets,
            outcome.seized_collateral
        );
        emit!(Liquidated {
            market: *market_id,
            liquidator: caller,
            borrower,
            repaid_assets: outcome.repaid_assets,
            repaid_shares: outcome.repaid_shares,
            seized_collateral: outcome.seized_collateral,
            bad_debt_assets: outcome.bad_debt_assets,
            bad_debt_shares: outcome.bad_debt_shares,
        });
        Ok(outcome)
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    /// The market as it would look after accruing to `now`. Nothing is stored.
    pub fn expected_market_balances(&self, market_id: &Pubkey, now: i64) -> Result<Market> {
        self.load_market(market_id, now)
    }

    pub fn expected_supply_assets(&self, market_id: &Pubkey, owner: &Pubkey, now: i64) -> Result<u64> {
        let market = self.load_market(market_id, now)?;
        let shares = self
            .supply_position(market_id, owner)
            .map_or(0, |position| position.shares);
        to_assets_down(
            shares,
            market.total_supply_assets,
            market.total_supply_shares,
        )
    }

    pub fn expected_borrow_assets(&self, market_id: &Pubkey, owner: &Pubkey, now: i64) -> Result<u64> {
        let market = self.load_market(market_id, now)?;
        let shares = self
            .borrow_position(market_id, owner)
            .map_or(0, |position| position.borrow_shares);
        to_assets_up(
            shares,
            market.total_borrow_assets,
            market.total_borrow_shares,
        )
    }

    pub fn is_solvent(&self, market_id: &Pubkey, owner: &Pubkey, now: i64) -> Result<bool> {
        let market = self.load_market(market_id, now)?;
        let Some(position) = self.borrow_position(market_id, owner) else {
            return Ok(true);
        };
        if position.borrow_shares == 0 {
            return Ok(true);
        }
        let price = self.price(&market, now)?;
        solvency::is_solvent(position, &market, &price)
    }

    /// `None` when the owner has no debt.
    pub fn health_factor(
        &self,
        market_id: &Pubkey,
        owner: &Pubkey,
        now: i64,
    ) -> Result<Option<I80F48>> {
        let market = self.load_market(market_id, now)?;
        let Some(position) = self.borrow_position(market_id, owner) else {
            return Ok(None);
        };
        if position.borrow_shares == 0 {
            return Ok(None);
        }
        let price = self.price(&market, now)?;
        solvency::health_factor(position, &market, &price)
    }
}
