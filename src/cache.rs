//! Most-recently-used address per user, held in an in-process `moka` cache.
//!
//! Entries are hints only. Readers must re-confirm an entry against the
//! database (existence and ownership) before using it.

use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::models::AddressEntity;

#[derive(Clone)]
pub struct AddressCache {
    cache: Cache<String, AddressEntity>,
}

impl AddressCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    pub fn key(user_id: i32) -> String {
        format!("address_for_user_{user_id}")
    }

    pub async fn get(&self, user_id: i32) -> Option<AddressEntity> {
        let address = self.cache.get(&Self::key(user_id)).await;
        debug!(user_id, hit = address.is_some(), "Address cache lookup");
        address
    }

    /// Records `address` as the owner's most recently used address.
    pub async fn set(&self, address: AddressEntity) {
        self.cache.insert(Self::key(address.user_id), address).await;
    }

    pub async fn invalidate(&self, user_id: i32) {
        self.cache.invalidate(&Self::key(user_id)).await;
    }
}

impl Default for AddressCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(60 * 60 * 24))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn address(id: i32, user_id: i32) -> AddressEntity {
        AddressEntity {
            id,
            user_id,
            zip_code: "100-0001".into(),
            prefecture: "Tokyo".into(),
            address: "1-1 Chiyoda".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn keys_are_scoped_per_user() {
        assert_eq!(AddressCache::key(42), "address_for_user_42");
    }

    #[tokio::test]
    async fn set_get_invalidate() {
        let cache = AddressCache::default();
        assert!(cache.get(1).await.is_none());

        cache.set(address(10, 1)).await;
        cache.set(address(11, 2)).await;
        assert_eq!(cache.get(1).await.map(|a| a.id), Some(10));
        assert_eq!(cache.get(2).await.map(|a| a.id), Some(11));

        cache.set(address(12, 1)).await;
        assert_eq!(cache.get(1).await.map(|a| a.id), Some(12));

        cache.invalidate(1).await;
        assert!(cache.get(1).await.is_none());
        assert!(cache.get(2).await.is_some());
    }
}
