use anchor_lang::prelude::*;

use crate::constants::{BORROW_POSITION_SEED, MARKET_SEED, SUPPLY_POSITION_SEED};
use crate::state::MarketParams;

/// Market id and bump for a parameter tuple.
pub fn market_address(params: &MarketParams) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            MARKET_SEED,
            params.quote_mint.as_ref(),
            params.collateral_mint.as_ref(),
            &params.ltv_factor.to_le_bytes(),
            &params.oracle.source_seed(),
            params.oracle.feed_id.as_ref(),
        ],
        &crate::ID,
    )
}

/// Uniqueness key of a (quote, collateral, ltv, oracle) tuple. At most one market
/// holds a given key at any time.
pub fn market_key(params: &MarketParams) -> Pubkey {
    market_address(params).0
}

/// Id for a tuple whose first address is still taken by a market that has since
/// moved to another LTV.
pub fn reissued_market_address(params: &MarketParams, generation: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            MARKET_SEED,
            params.quote_mint.as_ref(),
            params.collateral_mint.as_ref(),
            &params.ltv_factor.to_le_bytes(),
            &params.oracle.source_seed(),
            params.oracle.feed_id.as_ref(),
            &generation.to_le_bytes(),
        ],
        &crate::ID,
    )
}

pub fn supply_position_address(market: &Pubkey, owner: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[SUPPLY_POSITION_SEED, market.as_ref(), owner.as_ref()],
        &crate::ID,
    )
    .0
}

pub fn borrow_position_address(market: &Pubkey, owner: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[BORROW_POSITION_SEED, market.as_ref(), owner.as_ref()],
        &crate::ID,
    )
    .0
}
