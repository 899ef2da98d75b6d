use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::error::MarketError;

/// Moves tokens between holders. A market's vault is held under the market id.
pub trait TokenTransfer {
    fn balance(&self, mint: &Pubkey, owner: &Pubkey) -> u64;
    fn transfer(&mut self, mint: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub mint: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
}

/// Fails with `InsufficientBalance` unless every debit in `batch` is covered by
/// the payer's current balance. Credits inside the batch are not counted.
pub fn check_batch<T: TokenTransfer>(bank: &T, batch: &[Transfer]) -> Result<()> {
    let mut debits: BTreeMap<(Pubkey, Pubkey), u64> = BTreeMap::new();
    for transfer in batch {
        let debit = debits.entry((transfer.mint, transfer.from)).or_default();
        *debit = debit
            .checked_add(transfer.amount)
            .ok_or(MarketError::MathOverflow)?;
    }
    for ((mint, owner), amount) in debits {
        require!(
            bank.balance(&mint, &owner) >= amount,
            MarketError::InsufficientBalance
        );
    }
    Ok(())
}

pub fn execute_batch<T: TokenTransfer>(bank: &mut T, batch: &[Transfer]) -> Result<()> {
    for transfer in batch.iter().filter(|t| t.amount > 0) {
        bank.transfer(&transfer.mint, &transfer.from, &transfer.to, transfer.amount)?;
    }
    Ok(())
}

/// In-memory balances keyed by `(mint, owner)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenBank {
    balances: BTreeMap<(Pubkey, Pubkey), u64>,
}

impl TokenBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint_to(&mut self, mint: &Pubkey, owner: &Pubkey, amount: u64) -> Result<()> {
        let balance = self.balances.entry((*mint, *owner)).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(MarketError::MathOverflow)?;
        Ok(())
    }
}

impl TokenTransfer for TokenBank {
    fn balance(&self, mint: &Pubkey, owner: &Pubkey) -> u64 {
        self.balances.get(&(*mint, *owner)).copied().unwrap_or(0)
    }

    fn transfer(&mut self, mint: &Pubkey, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        let from_balance = self.balance(mint, from);
        require!(from_balance >= amount, MarketError::InsufficientBalance);
        let to_balance = self.balance(mint, to);
        if from == to {
            return Ok(());
        }
        let credited = to_balance
            .checked_add(amount)
            .ok_or(MarketError::MathOverflow)?;
        self.balances.insert((*mint, *from), from_balance - amount);
        self.balances.insert((*mint, *to), credited);
        Ok(())
    }
}
