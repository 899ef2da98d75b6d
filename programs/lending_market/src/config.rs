use anchor_lang::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{
    LIQUIDATION_CURSOR, MAX_FEE_FACTOR, MAX_LIQUIDATION_INCENTIVE_FACTOR, MAX_PRICE_AGE, WAD,
};
use crate::error::MarketError;
use crate::events::{AuthorityUpdated, FeeRecipientUpdated};
use crate::interest_rate::InterestRateModel;

/// Global admin record. Starts without an authority; the first `set_authority`
/// call claims it.
#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub authority: Pubkey,
    pub fee_factor: u128,
    pub fee_recipient: Pubkey,
}

impl Config {
    pub const LEN: usize = 32 + 16 + 32;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authority_set(&self) -> bool {
        self.authority != Pubkey::default()
    }

    pub fn assert_authority(&self, caller: Pubkey) -> Result<()> {
        require!(self.is_authority_set(), MarketError::AuthorityNotSet);
        require_keys_eq!(caller, self.authority, MarketError::InvalidAuthority);
        Ok(())
    }

    pub fn set_authority(&mut self, authority: Pubkey) -> Result<()> {
        require!(!self.is_authority_set(), MarketError::AuthorityAlreadySet);
        require_keys_neq!(authority, Pubkey::default(), MarketError::InvalidAuthority);
        self.authority = authority;
        msg!("Config authority set to {}", authority);
        emit!(AuthorityUpdated {
            old_authority: Pubkey::default(),
            new_authority: authority,
        });
        Ok(())
    }

    pub fn update_authority(&mut self, caller: Pubkey, new_authority: Pubkey) -> Result<()> {
        self.assert_authority(caller)?;
        require_keys_neq!(new_authority, Pubkey::default(), MarketError::InvalidAuthority);
        let old_authority = self.authority;
        self.authority = new_authority;
        msg!("Config authority updated to {}", new_authority);
        emit!(AuthorityUpdated {
            old_authority,
            new_authority,
        });
        Ok(())
    }

    /// Validates a fee change without applying it. Markets must be accrued at the
    /// old fee before [`Config::apply_fee`] runs.
    pub fn check_fee_update(&self, caller: Pubkey, new_fee: u128, max_fee: u128) -> Result<()> {
        self.assert_authority(caller)?;
        require!(new_fee <= max_fee, MarketError::FeeExceedsMax);
        require!(new_fee != self.fee_factor, MarketError::FeeAlreadySet);
        Ok(())
    }

    pub fn apply_fee(&mut self, new_fee: u128) {
        self.fee_factor = new_fee;
    }

    pub fn is_recipient_set(&self) -> bool {
        self.fee_recipient != Pubkey::default()
    }

    pub fn update_recipient(&mut self, caller: Pubkey, new_recipient: Pubkey) -> Result<()> {
        self.assert_authority(caller)?;
        require_keys_neq!(new_recipient, Pubkey::default(), MarketError::InvalidRecipient);
        require_keys_neq!(new_recipient, self.fee_recipient, MarketError::InvalidRecipient);
        self.fee_recipient = new_recipient;
        msg!("Fee recipient updated to {}", new_recipient);
        emit!(FeeRecipientUpdated {
            recipient: new_recipient,
        });
        Ok(())
    }
}

/// Static risk settings the engine runs with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskParameters {
    pub interest_rate: InterestRateModel,
    /// Seconds.
    pub max_price_age: u64,
    pub liquidation_cursor: u128,
    pub max_liquidation_incentive_factor: u128,
    pub max_fee_factor: u128,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            interest_rate: InterestRateModel::default(),
            max_price_age: MAX_PRICE_AGE,
            liquidation_cursor: LIQUIDATION_CURSOR,
            max_liquidation_incentive_factor: MAX_LIQUIDATION_INCENTIVE_FACTOR,
            max_fee_factor: MAX_FEE_FACTOR,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("malformed risk parameters: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid risk parameter `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl RiskParameters {
    /// Parses a JSON override. Missing fields keep their defaults.
    pub fn from_json(raw: &str) -> std::result::Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(raw)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json(&self) -> std::result::Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        if !self.interest_rate.is_valid() {
            return invalid("interest_rate", "target must be in (0, 1) and steepness at least 1");
        }
        if self.max_price_age == 0 {
            return invalid("max_price_age", "must be positive");
        }
        if self.liquidation_cursor >= WAD {
            return invalid("liquidation_cursor", "must be below 1");
        }
        if self.max_liquidation_incentive_factor < WAD {
            return invalid("max_liquidation_incentive_factor", "must be at least 1");
        }
        if self.max_fee_factor > WAD {
            return invalid("max_fee_factor", "must not exceed 1");
        }
        Ok(())
    }
}
