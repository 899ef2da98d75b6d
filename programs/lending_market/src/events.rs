use anchor_lang::prelude::*;

#[event]
pub struct MarketCreated {
    pub market: Pubkey,
    pub quote_mint: Pubkey,
    pub collateral_mint: Pubkey,
    pub ltv_factor: u128,
    pub creator: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct InterestAccrued {
    pub market: Pubkey,
    pub borrow_rate: u128,
    pub interest: u64,
    pub fee_shares: u128,
    pub borrow_index: u128,
    pub deposit_index: u128,
    pub timestamp: i64,
}

#[event]
pub struct Deposited {
    pub market: Pubkey,
    pub caller: Pubkey,
    pub owner: Pubkey,
    pub assets: u64,
    pub shares: u128,
}

#[event]
pub struct Withdrawn {
    pub market: Pubkey,
    pub owner: Pubkey,
    pub assets: u64,
    pub shares: u128,
}

#[event]
pub struct CollateralDeposited {
    pub market: Pubkey,
    pub caller: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

#[event]
pub struct CollateralWithdrawn {
    pub market: Pubkey,
    pub owner: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
}

#[event]
pub struct Borrowed {
    pub market: Pubkey,
    pub caller: Pubkey,
    pub owner: Pubkey,
    pub recipient: Pubkey,
    pub assets: u64,
    pub shares: u128,
}

#[event]
pub struct Repaid {
    pub market: Pubkey,
    pub payer: Pubkey,
    pub owner: Pubkey,
    pub assets: u64,
    pub shares: u128,
}

#[event]
pub struct Liquidated {
    pub market: Pubkey,
    pub liquidator: Pubkey,
    pub borrower: Pubkey,
    pub repaid_assets: u64,
    pub repaid_shares: u128,
    pub seized_collateral: u64,
    pub bad_debt_assets: u64,
    pub bad_debt_shares: u128,
}

#[event]
pub struct FeeWithdrawn {
    pub market: Pubkey,
    pub recipient: Pubkey,
    pub assets: u64,
    pub shares: u128,
}

#[event]
pub struct AuthorityUpdated {
    pub old_authority: Pubkey,
    pub new_authority: Pubkey,
}

#[event]
pub struct FeeUpdated {
    pub old_fee_factor: u128,
    pub new_fee_factor: u128,
}

#[event]
pub struct FeeRecipientUpdated {
    pub recipient: Pubkey,
}

#[event]
pub struct CollateralUpdated {
    pub market: Pubkey,
    pub ltv_factor: u128,
    pub is_active: bool,
    pub timestamp: i64,
}

#[event]
pub struct DebtCapUpdated {
    pub market: Pubkey,
    pub debt_cap: u64,
}

#[event]
pub struct DelegateUpdated {
    pub market: Pubkey,
    pub owner: Pubkey,
    pub delegate: Option<Pubkey>,
}
