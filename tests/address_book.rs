mod common;

use storefront_service::{
    cache::AddressCache,
    error::ShopError,
    stores::{address_book, orders},
};

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database (DATABASE_URL)"]
async fn duplicates_are_per_user() {
    let conn = &mut common::connection().await;
    let cache = AddressCache::default();

    common::address(conn, &cache, 5001, "Odori Nishi 1").await;

    let err = address_book::save(conn, &cache, 5001, common::new_address("  Odori Nishi 1 "))
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::Validation(msg) if msg == "duplicate address"));

    let other = address_book::save(conn, &cache, 5002, common::new_address("Odori Nishi 1"))
        .await
        .unwrap();
    assert_eq!(other.user_id, 5002);

    assert_eq!(address_book::list_for_user(conn, 5001).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database (DATABASE_URL)"]
async fn default_address_follows_the_last_save_or_select() {
    let conn = &mut common::connection().await;
    let cache = AddressCache::default();
    let user_id = 5003;

    assert_eq!(
        address_book::get_or_default(conn, &cache, user_id, None).await.unwrap(),
        None
    );

    let first = common::address(conn, &cache, user_id, "Susukino 1").await;
    let second = common::address(conn, &cache, user_id, "Susukino 2").await;

    let resolved = address_book::get_or_default(conn, &cache, user_id, None).await.unwrap();
    assert_eq!(resolved.map(|a| a.id), Some(second.id));

    address_book::select(conn, &cache, user_id, first.id).await.unwrap();
    let resolved = address_book::get_or_default(conn, &cache, user_id, None).await.unwrap();
    assert_eq!(resolved.map(|a| a.id), Some(first.id));

    let explicit = address_book::get_or_default(conn, &cache, user_id, Some(second.id))
        .await
        .unwrap();
    assert_eq!(explicit.map(|a| a.id), Some(second.id));

    let listed: Vec<i32> = address_book::list_for_user(conn, user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(listed, vec![second.id, first.id]);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database (DATABASE_URL)"]
async fn foreign_addresses_are_not_found() {
    let conn = &mut common::connection().await;
    let cache = AddressCache::default();

    let foreign = common::address(conn, &cache, 5004, "Nakajima Koen 1").await;

    assert!(matches!(
        address_book::get_or_default(conn, &cache, 5005, Some(foreign.id)).await,
        Err(ShopError::NotFound)
    ));
    assert!(matches!(
        address_book::select(conn, &cache, 5005, foreign.id).await,
        Err(ShopError::NotFound)
    ));
    assert!(matches!(
        address_book::delete(conn, &cache, 5005, foreign.id).await,
        Err(ShopError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database (DATABASE_URL)"]
async fn stale_cache_entry_is_dropped() {
    let conn = &mut common::connection().await;
    let cache = AddressCache::default();
    let user_id = 5006;

    let address = common::address(conn, &cache, user_id, "Maruyama 3").await;

    // A second cache simulates another instance deleting the address.
    address_book::delete(conn, &AddressCache::default(), user_id, address.id)
        .await
        .unwrap();
    assert!(cache.get(user_id).await.is_some());

    let resolved = address_book::get_or_default(conn, &cache, user_id, None).await.unwrap();
    assert_eq!(resolved, None);
    assert!(cache.get(user_id).await.is_none());
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database (DATABASE_URL)"]
async fn deleting_an_address_keeps_its_orders() {
    let conn = &mut common::connection().await;
    let cache = AddressCache::default();
    let user_id = 5007;

    let address = common::address(conn, &cache, user_id, "Tanukikoji 5").await;
    let order = orders::create(conn, user_id, address.id, 1200).await.unwrap();

    let deleted = address_book::delete(conn, &cache, user_id, address.id).await.unwrap();
    assert_eq!(deleted.id, address.id);
    assert!(cache.get(user_id).await.is_none());

    let kept = orders::get(conn, user_id, order.id).await.unwrap();
    assert_eq!(kept.order.address_id, None);
    assert_eq!(kept.order.total_price, 1200);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database (DATABASE_URL)"]
async fn orders_are_scoped_to_their_user() {
    let conn = &mut common::connection().await;
    let cache = AddressCache::default();
    let user_id = 5008;
    let other_user_id = 5009;

    let address = common::address(conn, &cache, user_id, "Hiragishi 2").await;
    let older = orders::create(conn, user_id, address.id, 100).await.unwrap();
    let newer = orders::create(conn, user_id, address.id, 200).await.unwrap();

    let listed: Vec<i32> = orders::list_for_user(conn, user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.order.id)
        .collect();
    assert_eq!(listed, vec![newer.id, older.id]);

    assert!(orders::list_for_user(conn, other_user_id).await.unwrap().is_empty());
    assert!(matches!(
        orders::get(conn, other_user_id, older.id).await,
        Err(ShopError::NotFound)
    ));

    assert_eq!(orders::detach_user(conn, user_id).await.unwrap(), 2);
    assert!(orders::list_for_user(conn, user_id).await.unwrap().is_empty());
}
