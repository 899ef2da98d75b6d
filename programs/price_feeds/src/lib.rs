use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use fixed::types::I80F48;

declare_id!("Feed111111111111111111111111111111111111111");

/// Largest decimal exponent a feed may publish with.
pub const MAX_EXPONENT: u32 = 18;

/// Where a market's price comes from. Chosen once when the market is created.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OracleSource {
    /// Prices written by a feed authority.
    Push,
    /// Signed reports posted by anyone.
    Pull,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OracleRef {
    pub source: OracleSource,
    pub feed_id: Pubkey,
}

impl OracleRef {
    pub const LEN: usize = 1 + 32;

    pub fn push(feed_id: Pubkey) -> Self {
        Self { source: OracleSource::Push, feed_id }
    }

    pub fn pull(feed_id: Pubkey) -> Self {
        Self { source: OracleSource::Pull, feed_id }
    }

    pub fn source_seed(&self) -> [u8; 1] {
        [self.source as u8]
    }
}

/// A price observation: `price * 10^exponent` units of quote per unit of collateral,
/// with a symmetric confidence band in the same scale.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PriceData {
    pub price: i64,
    pub confidence: u64,
    pub exponent: i32,
    pub publish_time: i64,
}

impl PriceData {
    /// Human readable price, for logs and views only.
    pub fn ui_price(&self) -> Option<I80F48> {
        let ten = I80F48::from_num(10);
        let mut value = I80F48::checked_from_num(self.price)?;
        for _ in 0..self.exponent.unsigned_abs() {
            value = if self.exponent < 0 {
                value.checked_div(ten)?
            } else {
                value.checked_mul(ten)?
            };
        }
        Some(value)
    }

    pub fn age(&self, now: i64) -> i64 {
        now.saturating_sub(self.publish_time)
    }
}

/// Read side of an oracle source.
pub trait PriceFeed {
    fn get_price(&self, feed_id: &Pubkey) -> Result<PriceData>;
}

fn validate_observation(price: i64, exponent: i32) -> Result<()> {
    require!(price > 0, FeedError::InvalidPrice);
    require!(
        exponent.unsigned_abs() <= MAX_EXPONENT,
        FeedError::InvalidExponent
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Push feeds
// ---------------------------------------------------------------------------

#[account]
#[derive(Debug)]
pub struct PushFeedState {
    pub feed_id: Pubkey,
    pub authority: Pubkey,
    pub price: i64,
    pub confidence: u64,
    pub exponent: i32,
    pub publish_time: i64,
    pub paused: bool,
}

impl PushFeedState {
    pub const LEN: usize = 32 + 32 + 8 + 8 + 4 + 8 + 1;

    pub fn assert_authority(&self, authority: Pubkey) -> Result<()> {
        require_keys_eq!(authority, self.authority, FeedError::Unauthorized);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct PushFeeds {
    feeds: BTreeMap<Pubkey, PushFeedState>,
}

impl PushFeeds {
    pub fn initialize_feed(&mut self, feed_id: Pubkey, authority: Pubkey, exponent: i32) -> Result<()> {
        require!(!self.feeds.contains_key(&feed_id), FeedError::FeedAlreadyExists);
        require!(
            exponent.unsigned_abs() <= MAX_EXPONENT,
            FeedError::InvalidExponent
        );
        self.feeds.insert(
            feed_id,
            PushFeedState {
                feed_id,
                authority,
                price: 0,
                confidence: 0,
                exponent,
                publish_time: 0,
                paused: false,
            },
        );
        msg!("Push feed {} initialized, authority {}", feed_id, authority);
        emit!(FeedInitialized {
            feed_id,
            authority,
            exponent,
        });
        Ok(())
    }

    pub fn update_price(
        &mut self,
        feed_id: &Pubkey,
        authority: Pubkey,
        price: i64,
        confidence: u64,
        publish_time: i64,
    ) -> Result<()> {
        let feed = self.feeds.get_mut(feed_id).ok_or(FeedError::FeedNotFound)?;
        require!(!feed.paused, FeedError::FeedPaused);
        feed.assert_authority(authority)?;
        validate_observation(price, feed.exponent)?;
        require!(publish_time >= feed.publish_time, FeedError::OutdatedUpdate);

        feed.price = price;
        feed.confidence = confidence;
        feed.publish_time = publish_time;

        emit!(PriceUpdated {
            feed_id: *feed_id,
            source: OracleSource::Push as u8,
            price,
            confidence,
            publish_time,
        });
        Ok(())
    }

    pub fn pause(&mut self, feed_id: &Pubkey, authority: Pubkey) -> Result<()> {
        let feed = self.feeds.get_mut(feed_id).ok_or(FeedError::FeedNotFound)?;
        feed.assert_authority(authority)?;
        require!(!feed.paused, FeedError::AlreadyPaused);
        feed.paused = true;
        msg!("Push feed {} paused", feed_id);
        Ok(())
    }

    pub fn unpause(&mut self, feed_id: &Pubkey, authority: Pubkey) -> Result<()> {
        let feed = self.feeds.get_mut(feed_id).ok_or(FeedError::FeedNotFound)?;
        feed.assert_authority(authority)?;
        require!(feed.paused, FeedError::NotPaused);
        feed.paused = false;
        msg!("Push feed {} unpaused", feed_id);
        Ok(())
    }

    pub fn state(&self, feed_id: &Pubkey) -> Option<&PushFeedState> {
        self.feeds.get(feed_id)
    }

    pub fn contains(&self, feed_id: &Pubkey) -> bool {
        self.feeds.contains_key(feed_id)
    }
}

impl PriceFeed for PushFeeds {
    fn get_price(&self, feed_id: &Pubkey) -> Result<PriceData> {
        let feed = self.feeds.get(feed_id).ok_or(FeedError::FeedNotFound)?;
        require!(!feed.paused, FeedError::FeedPaused);
        require!(feed.publish_time > 0, FeedError::NoPriceAvailable);
        Ok(PriceData {
            price: feed.price,
            confidence: feed.confidence,
            exponent: feed.exponent,
            publish_time: feed.publish_time,
        })
    }
}

// ---------------------------------------------------------------------------
// Pull feeds
// ---------------------------------------------------------------------------

/// A report carried into the program by whoever needs a fresh price.
#[account]
#[derive(Debug)]
pub struct PriceUpdate {
    pub feed_id: Pubkey,
    pub price: i64,
    pub confidence: u64,
    pub exponent: i32,
    pub publish_time: i64,
    pub posted_by: Pubkey,
}

impl PriceUpdate {
    pub const LEN: usize = 32 + 8 + 8 + 4 + 8 + 32;
}

#[derive(Debug, Default, Clone)]
pub struct PullFeeds {
    reports: BTreeMap<Pubkey, PriceUpdate>,
}

impl PullFeeds {
    pub fn post_update(&mut self, update: PriceUpdate) -> Result<()> {
        validate_observation(update.price, update.exponent)?;
        if let Some(current) = self.reports.get(&update.feed_id) {
            require!(
                update.publish_time >= current.publish_time,
                FeedError::OutdatedUpdate
            );
        }

        emit!(PriceUpdated {
            feed_id: update.feed_id,
            source: OracleSource::Pull as u8,
            price: update.price,
            confidence: update.confidence,
            publish_time: update.publish_time,
        });
        self.reports.insert(update.feed_id, update);
        Ok(())
    }

    pub fn latest(&self, feed_id: &Pubkey) -> Option<&PriceUpdate> {
        self.reports.get(feed_id)
    }
}

impl PriceFeed for PullFeeds {
    fn get_price(&self, feed_id: &Pubkey) -> Result<PriceData> {
        let report = self.reports.get(feed_id).ok_or(FeedError::FeedNotFound)?;
        Ok(PriceData {
            price: report.price,
            confidence: report.confidence,
            exponent: report.exponent,
            publish_time: report.publish_time,
        })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Both oracle sources behind one lookup keyed by [`OracleRef`].
#[derive(Debug, Default, Clone)]
pub struct FeedRegistry {
    pub push: PushFeeds,
    pub pull: PullFeeds,
}

impl FeedRegistry {
    pub fn feed(&self, source: OracleSource) -> &dyn PriceFeed {
        match source {
            OracleSource::Push => &self.push,
            OracleSource::Pull => &self.pull,
        }
    }

    pub fn get_price(&self, oracle: &OracleRef) -> Result<PriceData> {
        self.feed(oracle.source).get_price(&oracle.feed_id)
    }

    /// A pull feed counts as known once any report for it has been posted.
    pub fn is_registered(&self, oracle: &OracleRef) -> bool {
        match oracle.source {
            OracleSource::Push => self.push.contains(&oracle.feed_id),
            OracleSource::Pull => self.pull.latest(&oracle.feed_id).is_some(),
        }
    }
}

#[event]
pub struct FeedInitialized {
    pub feed_id: Pubkey,
    pub authority: Pubkey,
    pub exponent: i32,
}

#[event]
pub struct PriceUpdated {
    pub feed_id: Pubkey,
    pub source: u8, // 0=Push, 1=Pull
    pub price: i64,
    pub confidence: u64,
    pub publish_time: i64,
}

#[error_code(offset = 7000)]
pub enum FeedError {
    #[msg("Price feed not found")]
    FeedNotFound,
    #[msg("Price feed already exists")]
    FeedAlreadyExists,
    #[msg("Unauthorized feed update")]
    Unauthorized,
    #[msg("Invalid price value")]
    InvalidPrice,
    #[msg("Price exponent out of range")]
    InvalidExponent,
    #[msg("Price update is older than the stored one")]
    OutdatedUpdate,
    #[msg("Price feed is paused")]
    FeedPaused,
    #[msg("Price feed is already paused")]
    AlreadyPaused,
    #[msg("Price feed is not paused")]
    NotPaused,
    #[msg("Price feed has never been updated")]
    NoPriceAvailable,
}
