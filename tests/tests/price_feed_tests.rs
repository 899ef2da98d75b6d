use anchor_lang::prelude::Pubkey;
use fixed::types::I80F48;
use price_feeds::{
    FeedError, FeedRegistry, OracleRef, OracleSource, PriceData, PriceFeed, PriceUpdate, PushFeeds,
};

const NOW: i64 = 1_700_000_000;

fn report(feed_id: Pubkey, price: i64, publish_time: i64) -> PriceUpdate {
    PriceUpdate {
        feed_id,
        price,
        confidence: 10,
        exponent: -8,
        publish_time,
        posted_by: Pubkey::new_unique(),
    }
}

#[test]
fn test_push_feed_lifecycle() {
    let mut feeds = PushFeeds::default();
    let feed = Pubkey::new_unique();
    let authority = Pubkey::new_unique();

    feeds.initialize_feed(feed, authority, -6).unwrap();
    assert_eq!(
        feeds.initialize_feed(feed, authority, -6).unwrap_err(),
        FeedError::FeedAlreadyExists.into()
    );
    assert_eq!(
        feeds.get_price(&feed).unwrap_err(),
        FeedError::NoPriceAvailable.into()
    );

    feeds.update_price(&feed, authority, 2_500_000, 1_000, NOW).unwrap();
    let price = feeds.get_price(&feed).unwrap();
    assert_eq!(
        price,
        PriceData {
            price: 2_500_000,
            confidence: 1_000,
            exponent: -6,
            publish_time: NOW,
        }
    );
    assert_eq!(price.age(NOW + 30), 30);
    assert_eq!(feeds.state(&feed).unwrap().authority, authority);
}

#[test]
fn test_push_feed_rejects_bad_updates() {
    let mut feeds = PushFeeds::default();
    let feed = Pubkey::new_unique();
    let authority = Pubkey::new_unique();
    feeds.initialize_feed(feed, authority, -6).unwrap();
    feeds.update_price(&feed, authority, 100, 1, NOW).unwrap();

    let err = feeds
        .update_price(&feed, Pubkey::new_unique(), 100, 1, NOW + 1)
        .unwrap_err();
    assert_eq!(err, FeedError::Unauthorized.into());
    let err = feeds.update_price(&feed, authority, 0, 0, NOW + 1).unwrap_err();
    assert_eq!(err, FeedError::InvalidPrice.into());
    let err = feeds.update_price(&feed, authority, 100, 1, NOW - 1).unwrap_err();
    assert_eq!(err, FeedError::OutdatedUpdate.into());
    let err = feeds
        .update_price(&Pubkey::new_unique(), authority, 100, 1, NOW)
        .unwrap_err();
    assert_eq!(err, FeedError::FeedNotFound.into());

    let err = feeds
        .initialize_feed(Pubkey::new_unique(), authority, -19)
        .unwrap_err();
    assert_eq!(err, FeedError::InvalidExponent.into());

    // The stored observation is untouched by the failures.
    assert_eq!(feeds.get_price(&feed).unwrap().publish_time, NOW);
}

#[test]
fn test_push_feed_pause() {
    let mut feeds = PushFeeds::default();
    let feed = Pubkey::new_unique();
    let authority = Pubkey::new_unique();
    feeds.initialize_feed(feed, authority, -6).unwrap();
    feeds.update_price(&feed, authority, 100, 1, NOW).unwrap();

    assert_eq!(
        feeds.pause(&feed, Pubkey::new_unique()).unwrap_err(),
        FeedError::Unauthorized.into()
    );
    assert_eq!(
        feeds.unpause(&feed, authority).unwrap_err(),
        FeedError::NotPaused.into()
    );
    feeds.pause(&feed, authority).unwrap();
    assert_eq!(
        feeds.pause(&feed, authority).unwrap_err(),
        FeedError::AlreadyPaused.into()
    );
    assert_eq!(
        feeds.get_price(&feed).unwrap_err(),
        FeedError::FeedPaused.into()
    );
    assert_eq!(
        feeds.update_price(&feed, authority, 200, 1, NOW + 1).unwrap_err(),
        FeedError::FeedPaused.into()
    );

    feeds.unpause(&feed, authority).unwrap();
    assert_eq!(feeds.get_price(&feed).unwrap().price, 100);
}

#[test]
fn test_pull_feed_keeps_newest_report() {
    let mut registry = FeedRegistry::default();
    let feed = Pubkey::new_unique();
    let oracle = OracleRef::pull(feed);
    assert!(!registry.is_registered(&oracle));
    assert_eq!(
        registry.get_price(&oracle).unwrap_err(),
        FeedError::FeedNotFound.into()
    );

    registry.pull.post_update(report(feed, 5_000, NOW)).unwrap();
    registry.pull.post_update(report(feed, 5_100, NOW)).unwrap();
    assert!(registry.is_registered(&oracle));
    assert_eq!(registry.get_price(&oracle).unwrap().price, 5_100);

    let err = registry
        .pull
        .post_update(report(feed, 4_900, NOW - 10))
        .unwrap_err();
    assert_eq!(err, FeedError::OutdatedUpdate.into());
    let err = registry
        .pull
        .post_update(report(feed, -1, NOW + 10))
        .unwrap_err();
    assert_eq!(err, FeedError::InvalidPrice.into());

    let latest = registry.pull.latest(&feed).unwrap();
    assert_eq!(latest.price, 5_100);
    assert_eq!(latest.exponent, -8);
}

#[test]
fn test_registry_dispatches_on_source() {
    let mut registry = FeedRegistry::default();
    let feed = Pubkey::new_unique();
    let authority = Pubkey::new_unique();
    registry.push.initialize_feed(feed, authority, -2).unwrap();
    registry
        .push
        .update_price(&feed, authority, 12_345, 5, NOW)
        .unwrap();
    registry.pull.post_update(report(feed, 777, NOW)).unwrap();

    assert_eq!(registry.get_price(&OracleRef::push(feed)).unwrap().price, 12_345);
    assert_eq!(registry.get_price(&OracleRef::pull(feed)).unwrap().price, 777);
    assert_eq!(
        registry
            .feed(OracleSource::Push)
            .get_price(&feed)
            .unwrap()
            .exponent,
        -2
    );
    assert_ne!(
        OracleRef::push(feed).source_seed(),
        OracleRef::pull(feed).source_seed()
    );
}

#[test]
fn test_ui_price() {
    let one = PriceData {
        price: 100_000,
        confidence: 0,
        exponent: -5,
        publish_time: NOW,
    };
    assert_eq!(one.ui_price(), Some(I80F48::ONE));

    let scaled_up = PriceData {
        price: 42,
        exponent: 3,
        ..one
    };
    assert_eq!(scaled_up.ui_price(), Some(I80F48::from_num(42_000)));

    let fractional = PriceData {
        price: 12_345,
        exponent: -2,
        ..one
    };
    let value = fractional.ui_price().unwrap();
    assert!(value > I80F48::from_num(123.44) && value < I80F48::from_num(123.46));
}
