//! Isolated lending markets: one quote asset lent against one collateral asset,
//! priced by an external feed.

use anchor_lang::prelude::*;

pub mod accrual;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod interest_rate;
pub mod ledger;
pub mod liquidation;
pub mod math;
pub mod oracle;
pub mod pda;
pub mod shares;
pub mod solvency;
pub mod state;
pub mod token;

pub use accrual::{accrue_interest, AccrualOutcome};
pub use config::{Config, ConfigError, RiskParameters};
pub use error::{ErrorKind, MarketError};
pub use interest_rate::InterestRateModel;
pub use ledger::MarketLedger;
pub use liquidation::{LiquidationOutcome, LiquidationRequest};
pub use oracle::ValidatedPrice;
pub use shares::Quantity;
pub use state::{BorrowPosition, CollateralStatus, Market, MarketParams, SupplyPosition};
pub use token::{TokenBank, TokenTransfer, Transfer};

declare_id!("Lend111111111111111111111111111111111111111");
