use anchor_lang::prelude::Pubkey;
use lending_market::{Market, MarketLedger, MarketParams, TokenBank, TokenTransfer};
use price_feeds::{FeedRegistry, OracleRef};

pub const START: i64 = 1_700_000_000;
pub const YEAR: i64 = 31_536_000;
/// One whole token at 9 decimals.
pub const UNIT: u64 = 1_000_000_000;
pub const LTV: u128 = 800_000_000_000_000_000;
pub const PRICE_EXPONENT: i32 = -5;

pub fn market_params(quote: Pubkey, collateral: Pubkey, feed: Pubkey) -> MarketParams {
    MarketParams {
        quote_mint: quote,
        quote_decimals: 9,
        collateral_mint: collateral,
        collateral_decimals: 9,
        ltv_factor: LTV,
        oracle: OracleRef::push(feed),
    }
}

/// A ledger with one market: 9-decimal quote and collateral, LTV 0.8, and a push
/// feed quoting 1.0 +/- 0.1.
pub struct Fixture {
    pub ledger: MarketLedger<TokenBank>,
    pub market: Pubkey,
    pub quote: Pubkey,
    pub collateral: Pubkey,
    pub feed: Pubkey,
    pub feed_authority: Pubkey,
    pub authority: Pubkey,
}

impl Fixture {
    pub fn new() -> Self {
        let feed = Pubkey::new_unique();
        let feed_authority = Pubkey::new_unique();
        let mut feeds = FeedRegistry::default();
        feeds
            .push
            .initialize_feed(feed, feed_authority, PRICE_EXPONENT)
            .expect("initialize feed");
        feeds
            .push
            .update_price(&feed, feed_authority, 100_000, 10_000, START)
            .expect("seed price");

        let mut ledger = MarketLedger::new(TokenBank::new(), feeds);
        let authority = Pubkey::new_unique();
        ledger.set_authority(authority).expect("set authority");

        let quote = Pubkey::new_unique();
        let collateral = Pubkey::new_unique();
        let market = ledger
            .create_market(authority, market_params(quote, collateral, feed), START)
            .expect("create market");

        Self {
            ledger,
            market,
            quote,
            collateral,
            feed,
            feed_authority,
            authority,
        }
    }

    pub fn set_price(&mut self, price: i64, confidence: u64, publish_time: i64) {
        let (feed, authority) = (self.feed, self.feed_authority);
        self.ledger
            .feeds_mut()
            .push
            .update_price(&feed, authority, price, confidence, publish_time)
            .expect("update price");
    }

    pub fn fund_quote(&mut self, owner: &Pubkey, amount: u64) {
        let mint = self.quote;
        self.ledger
            .bank_mut()
            .mint_to(&mint, owner, amount)
            .expect("mint quote");
    }

    pub fn fund_collateral(&mut self, owner: &Pubkey, amount: u64) {
        let mint = self.collateral;
        self.ledger
            .bank_mut()
            .mint_to(&mint, owner, amount)
            .expect("mint collateral");
    }

    pub fn quote_balance(&self, owner: &Pubkey) -> u64 {
        self.ledger.bank().balance(&self.quote, owner)
    }

    pub fn collateral_balance(&self, owner: &Pubkey) -> u64 {
        self.ledger.bank().balance(&self.collateral, owner)
    }

    pub fn market_state(&self) -> Market {
        self.ledger.market(&self.market).expect("market").clone()
    }

    /// Funds `lender` and supplies `amount` of quote. Returns the lender key.
    pub fn supply(&mut self, amount: u64, now: i64) -> Pubkey {
        let lender = Pubkey::new_unique();
        self.fund_quote(&lender, amount);
        let market = self.market;
        self.ledger
            .deposit(lender, &market, lender, amount, 0, now)
            .expect("deposit");
        lender
    }

    /// Funds a fresh borrower, posts `collateral` and borrows `amount` to itself.
    pub fn open_borrow(&mut self, collateral: u64, amount: u64, now: i64) -> Pubkey {
        let borrower = Pubkey::new_unique();
        self.fund_collateral(&borrower, collateral);
        let market = self.market;
        self.ledger
            .deposit_collateral(borrower, &market, borrower, collateral, now)
            .expect("deposit collateral");
        self.ledger
            .borrow(borrower, &market, borrower, amount, 0, borrower, now)
            .expect("borrow");
        borrower
    }

    pub fn assert_invariants(&self) {
        let market = self.market_state();

        let supply_shares: u128 = self
            .ledger
            .supply_positions(&self.market)
            .map(|position| position.shares)
            .sum();
        assert_eq!(
            supply_shares + market.fee_shares,
            market.total_supply_shares,
            "supply shares out of sync"
        );

        let borrow_shares: u128 = self
            .ledger
            .borrow_positions(&self.market)
            .map(|position| position.borrow_shares)
            .sum();
        assert_eq!(borrow_shares, market.total_borrow_shares, "borrow shares out of sync");

        let collateral: u64 = self
            .ledger
            .borrow_positions(&self.market)
            .map(|position| position.collateral)
            .sum();
        assert_eq!(collateral, market.total_collateral, "collateral out of sync");

        assert_eq!(
            market.total_borrow_shares == 0,
            market.total_borrow_assets == 0,
            "borrow shares and assets disagree on emptiness"
        );
        assert!(market.total_borrow_assets <= market.total_supply_assets);
        assert!(
            self.quote_balance(&self.market)
                >= market.total_supply_assets - market.total_borrow_assets,
            "vault holds less than idle supply"
        );
        assert!(self.collateral_balance(&self.market) >= market.total_collateral);
    }
}
