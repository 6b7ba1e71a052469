//! User-owned shipping addresses.

use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    cache::AddressCache,
    error::{ShopError, ShopResult},
    models::{AddressEntity, CreateAddressEntity},
    schema::{addresses, orders},
};

const MAX_ZIP_CODE_LEN: usize = 8;
const MAX_PREFECTURE_LEN: usize = 10;
const MAX_ADDRESS_LEN: usize = 200;

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct NewAddress {
    pub zip_code: String,
    pub prefecture: String,
    pub address: String,
}

impl NewAddress {
    /// Trims every field and checks it fits its column.
    pub fn normalize(self) -> ShopResult<Self> {
        let normalized = Self {
            zip_code: self.zip_code.trim().to_string(),
            prefecture: self.prefecture.trim().to_string(),
            address: self.address.trim().to_string(),
        };

        for (field, value, max) in [
            ("zip_code", &normalized.zip_code, MAX_ZIP_CODE_LEN),
            ("prefecture", &normalized.prefecture, MAX_PREFECTURE_LEN),
            ("address", &normalized.address, MAX_ADDRESS_LEN),
        ] {
            if value.is_empty() {
                return Err(ShopError::validation(format!("{field} is required")));
            }
            if value.chars().count() > max {
                return Err(ShopError::validation(format!(
                    "{field} must be at most {max} characters"
                )));
            }
        }

        Ok(normalized)
    }
}

async fn find_owned(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    id: i32,
) -> ShopResult<Option<AddressEntity>> {
    Ok(addresses::table
        .find(id)
        .filter(addresses::user_id.eq(user_id))
        .select(AddressEntity::as_select())
        .first(conn)
        .await
        .optional()?)
}

/// Saves a new address and makes it the user's most recently used one.
///
/// An identical (zip code, prefecture, address) for the same user is a
/// duplicate; the same tuple for another user is fine.
pub async fn save(
    conn: &mut AsyncPgConnection,
    cache: &AddressCache,
    user_id: i32,
    new_address: NewAddress,
) -> ShopResult<AddressEntity> {
    let NewAddress {
        zip_code,
        prefecture,
        address,
    } = new_address.normalize()?;

    let saved = diesel::insert_into(addresses::table)
        .values(CreateAddressEntity {
            user_id,
            zip_code,
            prefecture,
            address,
        })
        .on_conflict_do_nothing()
        .returning(AddressEntity::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| ShopError::validation("duplicate address"))?;

    cache.set(saved.clone()).await;

    info!(user_id, address_id = saved.id, "Address saved");
    Ok(saved)
}

pub async fn list_for_user(conn: &mut AsyncPgConnection, user_id: i32) -> ShopResult<Vec<AddressEntity>> {
    Ok(addresses::table
        .filter(addresses::user_id.eq(user_id))
        .order_by((addresses::created_at.desc(), addresses::id.desc()))
        .select(AddressEntity::as_select())
        .load(conn)
        .await?)
}

/// Resolves the address to ship to.
///
/// With an explicit id the address must exist and belong to the user.
/// Without one, the cached most recently used address is returned after
/// checking it still exists and is still the user's.
pub async fn get_or_default(
    conn: &mut AsyncPgConnection,
    cache: &AddressCache,
    user_id: i32,
    id: Option<i32>,
) -> ShopResult<Option<AddressEntity>> {
    if let Some(id) = id {
        return find_owned(conn, user_id, id)
            .await?
            .map(Some)
            .ok_or(ShopError::NotFound);
    }

    let Some(cached) = cache.get(user_id).await else {
        return Ok(None);
    };

    let confirmed = find_owned(conn, user_id, cached.id).await?;
    if confirmed.is_none() {
        debug!(user_id, address_id = cached.id, "Dropping stale cached address");
        cache.invalidate(user_id).await;
    }

    Ok(confirmed)
}

/// Marks a saved address as the user's most recently used one.
pub async fn select(
    conn: &mut AsyncPgConnection,
    cache: &AddressCache,
    user_id: i32,
    id: i32,
) -> ShopResult<AddressEntity> {
    let address = find_owned(conn, user_id, id)
        .await?
        .ok_or(ShopError::NotFound)?;

    cache.set(address.clone()).await;
    Ok(address)
}

/// Deletes an address. Orders shipped to it keep their row with the address
/// reference nulled.
pub async fn delete(
    conn: &mut AsyncPgConnection,
    cache: &AddressCache,
    user_id: i32,
    id: i32,
) -> ShopResult<AddressEntity> {
    let deleted = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let address = find_owned(conn, user_id, id)
                    .await?
                    .ok_or(ShopError::NotFound)?;

                diesel::update(orders::table.filter(orders::address_id.eq(address.id)))
                    .set(orders::address_id.eq(None::<i32>))
                    .execute(conn)
                    .await?;

                diesel::delete(addresses::table.find(address.id))
                    .execute(conn)
                    .await?;

                Ok::<AddressEntity, ShopError>(address)
            })
        })
        .await?;

    if cache.get(user_id).await.is_some_and(|cached| cached.id == deleted.id) {
        cache.invalidate(user_id).await;
    }

    info!(user_id, address_id = deleted.id, "Address deleted");
    Ok(deleted)
}
