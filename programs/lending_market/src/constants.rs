/// Scale of every index, rate and factor (1.0 == `WAD`).
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Virtual offset added to both sides of every share conversion.
pub const VIRTUAL_SHARES: u128 = 1_000_000;
pub const VIRTUAL_ASSETS: u128 = 1;

pub const SECONDS_PER_YEAR: u128 = 31_536_000;

// ========== INTEREST RATE CURVE ==========
/// Borrow rate paid at the target utilization: 4% APR, per second.
pub const RATE_AT_TARGET: u128 = 40_000_000_000_000_000 / SECONDS_PER_YEAR;

/// Utilization the curve kinks at (90%).
pub const TARGET_UTILIZATION: u128 = 900_000_000_000_000_000;

/// Ratio between the rate at full utilization and the rate at target (4x).
pub const CURVE_STEEPNESS: u128 = 4_000_000_000_000_000_000;

// ========== RISK LIMITS ==========
/// Oracle prices older than this are rejected (seconds).
pub const MAX_PRICE_AGE: u64 = 3_600;

/// Share of the LTV gap converted into liquidation incentive (0.3).
pub const LIQUIDATION_CURSOR: u128 = 300_000_000_000_000_000;

/// Upper bound of the liquidation incentive factor (1.15).
pub const MAX_LIQUIDATION_INCENTIVE_FACTOR: u128 = 1_150_000_000_000_000_000;

/// Largest share of interest the protocol may take (10%).
pub const MAX_FEE_FACTOR: u128 = 100_000_000_000_000_000;

// ========== SEEDS ==========
pub const MARKET_SEED: &[u8] = b"market";
pub const SUPPLY_POSITION_SEED: &[u8] = b"lender_shares";
pub const BORROW_POSITION_SEED: &[u8] = b"borrower_shares";
