use crate::{cache::AddressCache, db::DbPool};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub address_cache: AddressCache,
}
