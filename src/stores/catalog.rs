//! Products, their classification labels and pictures.
//!
//! The storefront only reads the catalog and decrements stock at checkout.
//! Catalog maintenance (`create_*`, `add_picture`, `delete_product`) has no
//! HTTP surface; these functions are the seeding and back-office entry
//! points for tools that load products, and for tests.

use std::collections::HashMap;

use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    error::{ShopError, ShopResult},
    models::{
        CreateProductEntity, ManufacturerEntity, ProductEntity, ProductPictureEntity,
        ProductTypeEntity,
    },
    schema::{
        cart_items, manufacturers, order_items, product_pictures, product_types, products,
    },
};

/// Listing filters. Both match exactly; empty strings are ignored.
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    pub type_name: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    None,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    /// Accepts `price_asc` / `price_desc` as well as the legacy `1` / `2` codes.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("price_asc" | "1") => SortOrder::PriceAsc,
            Some("price_desc" | "2") => SortOrder::PriceDesc,
            _ => SortOrder::None,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ProductDetail {
    pub product: ProductEntity,
    pub product_type: String,
    pub manufacturer: String,
    pub pictures: Vec<ProductPictureEntity>,
    /// Quantity of this product already in the caller's cart.
    pub cart_quantity: Option<i32>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn list(
    conn: &mut AsyncPgConnection,
    filter: &ProductFilter,
    sort: SortOrder,
) -> ShopResult<Vec<ProductEntity>> {
    let mut query = products::table
        .inner_join(product_types::table)
        .select(ProductEntity::as_select())
        .into_boxed();

    if let Some(type_name) = non_empty(&filter.type_name) {
        query = query.filter(product_types::name.eq(type_name));
    }
    if let Some(name) = non_empty(&filter.name) {
        query = query.filter(products::name.eq(name));
    }

    query = match sort {
        SortOrder::None => query.order_by(products::id.asc()),
        SortOrder::PriceAsc => query.order_by((products::price.asc(), products::id.asc())),
        SortOrder::PriceDesc => query.order_by((products::price.desc(), products::id.asc())),
    };

    Ok(query.load(conn).await?)
}

pub async fn get(conn: &mut AsyncPgConnection, id: i32) -> ShopResult<ProductEntity> {
    products::table
        .find(id)
        .select(ProductEntity::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or(ShopError::NotFound)
}

pub async fn detail(
    conn: &mut AsyncPgConnection,
    user_id: Option<i32>,
    id: i32,
) -> ShopResult<ProductDetail> {
    let (product, product_type, manufacturer) = products::table
        .inner_join(product_types::table)
        .inner_join(manufacturers::table)
        .filter(products::id.eq(id))
        .select((
            ProductEntity::as_select(),
            product_types::name,
            manufacturers::name,
        ))
        .first::<(ProductEntity, String, String)>(conn)
        .await
        .optional()?
        .ok_or(ShopError::NotFound)?;

    let pictures = product_pictures::table
        .filter(product_pictures::product_id.eq(product.id))
        .order_by((product_pictures::display_order.asc(), product_pictures::id.asc()))
        .select(ProductPictureEntity::as_select())
        .load(conn)
        .await?;

    let cart_quantity = match user_id {
        Some(user_id) => cart_items::table
            .filter(cart_items::cart_id.eq(user_id))
            .filter(cart_items::product_id.eq(id))
            .select(cart_items::quantity)
            .first::<i32>(conn)
            .await
            .optional()?,
        None => None,
    };

    Ok(ProductDetail {
        product,
        product_type,
        manufacturer,
        pictures,
        cart_quantity,
    })
}

/// First picture of each listed product: lowest `display_order`, ties
/// broken by id. Products without pictures are absent from the map.
pub async fn first_pictures(
    conn: &mut AsyncPgConnection,
    product_ids: &[i32],
) -> ShopResult<HashMap<i32, ProductPictureEntity>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let all_pictures: Vec<ProductPictureEntity> = product_pictures::table
        .filter(product_pictures::product_id.eq_any(product_ids))
        .order_by((
            product_pictures::product_id.asc(),
            product_pictures::display_order.asc(),
            product_pictures::id.asc(),
        ))
        .select(ProductPictureEntity::as_select())
        .load(conn)
        .await?;

    let mut firsts: HashMap<i32, ProductPictureEntity> = HashMap::new();
    for picture in all_pictures {
        firsts.entry(picture.product_id).or_insert(picture);
    }
    Ok(firsts)
}

/// First picture of a product, if it has any.
pub async fn first_picture(
    conn: &mut AsyncPgConnection,
    product_id: i32,
) -> ShopResult<Option<ProductPictureEntity>> {
    Ok(first_pictures(conn, &[product_id]).await?.remove(&product_id))
}

/// Subtracts `quantity` from the product's stock.
///
/// Does not re-check availability: the caller validated `quantity <= stock`
/// against a locked row earlier in the same transaction.
pub async fn decrement_stock(
    conn: &mut AsyncPgConnection,
    product_id: i32,
    quantity: i32,
) -> ShopResult<ProductEntity> {
    diesel::update(products::table.find(product_id))
        .set((
            products::stock.eq(products::stock - quantity),
            products::updated_at.eq(diesel::dsl::now),
        ))
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or(ShopError::NotFound)
}

/// Seeds a product type label.
pub async fn create_product_type(
    conn: &mut AsyncPgConnection,
    name: &str,
) -> ShopResult<ProductTypeEntity> {
    Ok(diesel::insert_into(product_types::table)
        .values(product_types::name.eq(name))
        .returning(ProductTypeEntity::as_returning())
        .get_result(conn)
        .await?)
}

/// Seeds a manufacturer label.
pub async fn create_manufacturer(
    conn: &mut AsyncPgConnection,
    name: &str,
) -> ShopResult<ManufacturerEntity> {
    Ok(diesel::insert_into(manufacturers::table)
        .values(manufacturers::name.eq(name))
        .returning(ManufacturerEntity::as_returning())
        .get_result(conn)
        .await?)
}

/// Seeds a product. Price and stock must not be negative.
pub async fn create_product(
    conn: &mut AsyncPgConnection,
    new_product: CreateProductEntity,
) -> ShopResult<ProductEntity> {
    if new_product.price < 0 {
        return Err(ShopError::validation("negative price"));
    }
    if new_product.stock < 0 {
        return Err(ShopError::validation("negative stock"));
    }

    let product = diesel::insert_into(products::table)
        .values(new_product)
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await?;

    info!(product_id = product.id, "Product created");
    Ok(product)
}

/// Attaches a stored picture reference to a product. Lower
/// `display_order` comes first.
pub async fn add_picture(
    conn: &mut AsyncPgConnection,
    product_id: i32,
    file_ref: &str,
    display_order: i32,
) -> ShopResult<ProductPictureEntity> {
    Ok(diesel::insert_into(product_pictures::table)
        .values((
            product_pictures::product_id.eq(product_id),
            product_pictures::file_ref.eq(file_ref),
            product_pictures::display_order.eq(display_order),
        ))
        .returning(ProductPictureEntity::as_returning())
        .get_result(conn)
        .await?)
}

/// Deletes a product. Order lines keep their row with the product reference
/// nulled; cart lines and pictures of the product go with it.
pub async fn delete_product(conn: &mut AsyncPgConnection, id: i32) -> ShopResult<ProductEntity> {
    let product = conn
        .transaction(move |conn| {
            Box::pin(async move {
                diesel::update(order_items::table.filter(order_items::product_id.eq(id)))
                    .set(order_items::product_id.eq(None::<i32>))
                    .execute(conn)
                    .await?;

                diesel::delete(cart_items::table.filter(cart_items::product_id.eq(id)))
                    .execute(conn)
                    .await?;

                diesel::delete(product_pictures::table.filter(product_pictures::product_id.eq(id)))
                    .execute(conn)
                    .await?;

                let product = diesel::delete(products::table.find(id))
                    .returning(ProductEntity::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?
                    .ok_or(ShopError::NotFound)?;

                Ok::<ProductEntity, ShopError>(product)
            })
        })
        .await?;

    info!(product_id = id, "Product deleted");
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_parses_names_and_codes() {
        assert_eq!(SortOrder::parse(Some("price_asc")), SortOrder::PriceAsc);
        assert_eq!(SortOrder::parse(Some("1")), SortOrder::PriceAsc);
        assert_eq!(SortOrder::parse(Some("price_desc")), SortOrder::PriceDesc);
        assert_eq!(SortOrder::parse(Some(" 2 ")), SortOrder::PriceDesc);
        assert_eq!(SortOrder::parse(Some("0")), SortOrder::None);
        assert_eq!(SortOrder::parse(Some("cheapest")), SortOrder::None);
        assert_eq!(SortOrder::parse(None), SortOrder::None);
    }

    #[test]
    fn blank_filters_are_ignored() {
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&Some("  ".into())), None);
        assert_eq!(non_empty(&Some("Fruit".into())), Some("Fruit"));
    }
}
