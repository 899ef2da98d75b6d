mod common;

use anchor_lang::error::{AnchorError, Error, ERROR_CODE_OFFSET};
use anchor_lang::prelude::Pubkey;
use common::setup::{Fixture, START, UNIT, YEAR};
use lending_market::{Config, ErrorKind, MarketError, MarketLedger, TokenBank};
use price_feeds::{FeedError, FeedRegistry};

#[test]
fn test_authority_is_claimed_once() {
    let mut ledger = MarketLedger::new(TokenBank::new(), FeedRegistry::default());
    assert!(!ledger.config().is_authority_set());

    let err = ledger
        .update_recipient(Pubkey::new_unique(), Pubkey::new_unique())
        .unwrap_err();
    assert_eq!(err, MarketError::AuthorityNotSet.into());

    let err = ledger.set_authority(Pubkey::default()).unwrap_err();
    assert_eq!(err, MarketError::InvalidAuthority.into());

    let first = Pubkey::new_unique();
    ledger.set_authority(first).unwrap();
    assert_eq!(ledger.config().authority, first);

    let err = ledger.set_authority(Pubkey::new_unique()).unwrap_err();
    assert_eq!(err, MarketError::AuthorityAlreadySet.into());
    assert_eq!(ErrorKind::of(&err), Some(ErrorKind::Authorization));
    assert_eq!(ledger.config().authority, first);
}

#[test]
fn test_update_authority_hands_over_control() {
    let mut fx = Fixture::new();
    let old = fx.authority;
    let new = Pubkey::new_unique();

    let err = fx.ledger.update_authority(new, new).unwrap_err();
    assert_eq!(err, MarketError::InvalidAuthority.into());
    let err = fx.ledger.update_authority(old, Pubkey::default()).unwrap_err();
    assert_eq!(err, MarketError::InvalidAuthority.into());

    fx.ledger.update_authority(old, new).unwrap();
    assert_eq!(fx.ledger.config().authority, new);

    let err = fx.ledger.update_recipient(old, old).unwrap_err();
    assert_eq!(err, MarketError::InvalidAuthority.into());
    fx.ledger.update_recipient(new, old).unwrap();
    assert_eq!(fx.ledger.config().fee_recipient, old);
}

#[test]
fn test_update_fee_checks() {
    let mut fx = Fixture::new();
    let authority = fx.authority;
    let max = fx.ledger.params().max_fee_factor;

    let err = fx
        .ledger
        .update_fee(Pubkey::new_unique(), max, START)
        .unwrap_err();
    assert_eq!(err, MarketError::InvalidAuthority.into());

    let err = fx.ledger.update_fee(authority, max + 1, START).unwrap_err();
    assert_eq!(err, MarketError::FeeExceedsMax.into());
    assert_eq!(ErrorKind::of(&err), Some(ErrorKind::Validation));

    let err = fx.ledger.update_fee(authority, 0, START).unwrap_err();
    assert_eq!(err, MarketError::FeeAlreadySet.into());

    fx.ledger.update_fee(authority, max, START).unwrap();
    assert_eq!(fx.ledger.config().fee_factor, max);
}

#[test]
fn test_fee_change_accrues_markets_at_old_fee() {
    let mut fx = Fixture::new();
    let authority = fx.authority;
    fx.supply(1_000 * UNIT, START);
    fx.open_borrow(1_000 * UNIT, 500 * UNIT, START);

    // A year passes at zero fee, so none of that interest goes to the protocol.
    fx.ledger
        .update_fee(authority, 10_000_000_000_000_000, START + YEAR)
        .unwrap();
    let state = fx.market_state();
    assert_eq!(state.last_accrual_timestamp, START + YEAR);
    assert_eq!(state.total_borrow_assets, 500 * UNIT + 13_512_691_343);
    assert_eq!(state.fee_shares, 0);

    let market = fx.market;
    let outcome = fx
        .ledger
        .accrue_interest(&market, START + YEAR + 3_600)
        .unwrap();
    assert!(outcome.fee_shares > 0);
    assert_eq!(fx.market_state().fee_shares, outcome.fee_shares);
    fx.assert_invariants();
}

#[test]
fn test_fee_withdrawal_needs_recipient_and_shares() {
    let mut fx = Fixture::new();
    let market = fx.market;
    let authority = fx.authority;
    let recipient = Pubkey::new_unique();
    fx.ledger.update_recipient(authority, recipient).unwrap();

    let err = fx
        .ledger
        .withdraw_fee(recipient, &market, 0, 1, START)
        .unwrap_err();
    assert_eq!(err, MarketError::InsufficientShares.into());

    let err = fx
        .ledger
        .withdraw_fee(authority, &market, 0, 1, START)
        .unwrap_err();
    assert_eq!(err, MarketError::InvalidRecipient.into());
}

#[test]
fn test_update_recipient_rejects_default_and_unchanged() {
    let mut fx = Fixture::new();
    let authority = fx.authority;
    let recipient = Pubkey::new_unique();

    let err = fx
        .ledger
        .update_recipient(authority, Pubkey::default())
        .unwrap_err();
    assert_eq!(err, MarketError::InvalidRecipient.into());

    fx.ledger.update_recipient(authority, recipient).unwrap();
    let err = fx.ledger.update_recipient(authority, recipient).unwrap_err();
    assert_eq!(err, MarketError::InvalidRecipient.into());
    let err = fx
        .ledger
        .update_recipient(authority, Pubkey::default())
        .unwrap_err();
    assert_eq!(err, MarketError::InvalidRecipient.into());
    assert_eq!(fx.ledger.config().fee_recipient, recipient);
}

#[test]
fn test_fee_shares_stay_put_until_recipient_is_set() {
    let mut fx = Fixture::new();
    let market = fx.market;
    let authority = fx.authority;
    fx.supply(1_000 * UNIT, START);
    fx.open_borrow(1_000 * UNIT, 500 * UNIT, START);
    fx.ledger
        .update_fee(authority, 10_000_000_000_000_000, START)
        .unwrap();
    fx.ledger.accrue_interest(&market, START + YEAR).unwrap();
    let before = fx.market_state();
    assert!(before.fee_shares > 0);
    assert!(!fx.ledger.config().is_recipient_set());

    let err = fx
        .ledger
        .withdraw_fee(Pubkey::default(), &market, 0, before.fee_shares, START + YEAR)
        .unwrap_err();
    assert_eq!(err, MarketError::InvalidRecipient.into());
    assert_eq!(fx.market_state(), before);
    assert_eq!(fx.quote_balance(&Pubkey::default()), 0);

    let recipient = Pubkey::new_unique();
    fx.ledger.update_recipient(authority, recipient).unwrap();
    let (assets, shares) = fx
        .ledger
        .withdraw_fee(recipient, &market, 0, before.fee_shares, START + YEAR)
        .unwrap();
    assert_eq!(shares, before.fee_shares);
    assert_eq!(fx.quote_balance(&recipient), assets);
    assert_eq!(fx.market_state().fee_shares, 0);
    fx.assert_invariants();
}

#[test]
fn test_admin_operations_on_unknown_market() {
    let mut fx = Fixture::new();
    let authority = fx.authority;
    let unknown = Pubkey::new_unique();

    let err = fx.ledger.update_debt_cap(authority, &unknown, 1).unwrap_err();
    assert_eq!(err, MarketError::MarketNotFound.into());
    let err = fx.ledger.accrue_interest(&unknown, START).unwrap_err();
    assert_eq!(err, MarketError::MarketNotFound.into());
    let err = fx
        .ledger
        .update_delegate(authority, &unknown, None)
        .unwrap_err();
    assert_eq!(err, MarketError::MarketNotFound.into());
}

#[test]
fn test_config_record_defaults() {
    let config = Config::new();
    assert_eq!(config.authority, Pubkey::default());
    assert_eq!(config.fee_factor, 0);
    assert_eq!(config.fee_recipient, Pubkey::default());
    assert_eq!(Config::LEN, 80);
}

#[test]
fn test_error_kinds_cover_both_programs() {
    assert_eq!(
        ErrorKind::of(&MarketError::MathUnderflow.into()),
        Some(ErrorKind::Arithmetic)
    );
    assert_eq!(
        ErrorKind::of(&MarketError::InvalidOraclePrice.into()),
        Some(ErrorKind::Oracle)
    );
    assert_eq!(
        ErrorKind::of(&FeedError::Unauthorized.into()),
        Some(ErrorKind::Authorization)
    );
    assert_eq!(
        ErrorKind::of(&FeedError::NoPriceAvailable.into()),
        Some(ErrorKind::Oracle)
    );
    assert_eq!(MarketError::CollateralReactivation.kind(), ErrorKind::Validation);
    assert_eq!(MarketError::BorrowerIsSolvent.kind(), ErrorKind::Solvency);
}

fn error_with_code(code: u32) -> Error {
    Error::from(AnchorError {
        error_name: String::new(),
        error_code_number: code,
        error_msg: String::new(),
        error_origin: None,
        compared_values: None,
    })
}

#[test]
fn test_every_market_error_code_is_classified() {
    let first = u32::from(MarketError::InvalidAuthority);
    let last = u32::from(MarketError::InsufficientShares);
    assert_eq!(first, ERROR_CODE_OFFSET);

    for code in first..=last {
        assert!(
            ErrorKind::of(&error_with_code(code)).is_some(),
            "code {} has no kind",
            code
        );
    }
    assert_eq!(ErrorKind::of(&error_with_code(last + 1)), None);
    assert_eq!(
        ErrorKind::of(&error_with_code(u32::from(MarketError::InvalidRecipient))),
        Some(ErrorKind::Authorization)
    );
}
