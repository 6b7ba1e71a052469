//! Per-user shopping carts.
//!
//! A cart is keyed by its owner's user id and created lazily on the first
//! add. Each product appears at most once per cart: re-adding a product
//! replaces the quantity of the existing line.

use std::collections::HashMap;

use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper, upsert::excluded,
};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    error::{ShopError, ShopResult},
    models::{
        CartEntity, CartItemEntity, CreateCartEntity, CreateCartItemEntity, ProductEntity,
        ProductPictureEntity,
    },
    schema::{cart_items, carts, products},
    stores::catalog,
};

#[derive(Serialize, Debug, ToSchema)]
pub struct CartLine {
    pub item: CartItemEntity,
    pub product: ProductEntity,
    pub line_total: i64,
    /// False when the product's stock has dropped below the line quantity.
    pub in_stock: bool,
    pub picture: Option<ProductPictureEntity>,
}

#[derive(Serialize, Debug, Default, ToSchema)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub total_price: i64,
}

/// Checks a requested line quantity against the product's current stock.
pub fn validate_quantity(quantity: i32, stock: i32) -> ShopResult<()> {
    if quantity <= 0 {
        return Err(ShopError::validation("non-positive quantity"));
    }
    if quantity > stock {
        return Err(ShopError::validation("exceeds stock"));
    }
    Ok(())
}

pub fn line_total(quantity: i32, price: i32) -> i64 {
    i64::from(quantity) * i64::from(price)
}

/// Sums line totals, rejecting totals that do not fit in an `i64`.
pub fn total_price<I>(line_totals: I) -> ShopResult<i64>
where
    I: IntoIterator<Item = i64>,
{
    line_totals
        .into_iter()
        .try_fold(0i64, |acc, line| acc.checked_add(line))
        .ok_or_else(|| ShopError::validation("total price overflow"))
}

pub fn summarize(
    lines: Vec<(CartItemEntity, ProductEntity)>,
    mut pictures: HashMap<i32, ProductPictureEntity>,
) -> ShopResult<CartSummary> {
    let items: Vec<CartLine> = lines
        .into_iter()
        .map(|(item, product)| CartLine {
            line_total: line_total(item.quantity, product.price),
            in_stock: product.stock >= item.quantity,
            picture: pictures.remove(&product.id),
            item,
            product,
        })
        .collect();

    let total_price = total_price(items.iter().map(|line| line.line_total))?;

    Ok(CartSummary { items, total_price })
}

pub async fn find_cart(conn: &mut AsyncPgConnection, user_id: i32) -> ShopResult<Option<CartEntity>> {
    Ok(carts::table
        .find(user_id)
        .select(CartEntity::as_select())
        .first(conn)
        .await
        .optional()?)
}

/// Returns the user's cart, creating it if it does not exist yet.
pub async fn get_or_create_cart(conn: &mut AsyncPgConnection, user_id: i32) -> ShopResult<CartEntity> {
    diesel::insert_into(carts::table)
        .values(CreateCartEntity { user_id })
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;

    Ok(carts::table
        .find(user_id)
        .select(CartEntity::as_select())
        .first(conn)
        .await?)
}

/// Adds `quantity` of a product to the user's cart, replacing the quantity
/// when the product is already in it. Stock is checked but not reserved.
pub async fn add_item(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    product_id: i32,
    quantity: i32,
) -> ShopResult<CartItemEntity> {
    let product = catalog::get(conn, product_id).await?;
    validate_quantity(quantity, product.stock)?;

    let item = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let cart = get_or_create_cart(conn, user_id).await?;

                let item = diesel::insert_into(cart_items::table)
                    .values(CreateCartItemEntity {
                        cart_id: cart.user_id,
                        product_id,
                        quantity,
                    })
                    .on_conflict((cart_items::product_id, cart_items::cart_id))
                    .do_update()
                    .set((
                        cart_items::quantity.eq(excluded(cart_items::quantity)),
                        cart_items::updated_at.eq(diesel::dsl::now),
                    ))
                    .returning(CartItemEntity::as_returning())
                    .get_result(conn)
                    .await?;

                diesel::update(carts::table.find(cart.user_id))
                    .set(carts::updated_at.eq(diesel::dsl::now))
                    .execute(conn)
                    .await?;

                Ok::<CartItemEntity, ShopError>(item)
            })
        })
        .await?;

    info!(user_id, product_id, quantity, "Cart item saved");
    Ok(item)
}

/// Sets the quantity of an existing line in the user's cart.
pub async fn update_item(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    item_id: i32,
    quantity: i32,
) -> ShopResult<CartItemEntity> {
    let (item, product) = cart_items::table
        .inner_join(products::table)
        .filter(cart_items::id.eq(item_id))
        .filter(cart_items::cart_id.eq(user_id))
        .select((CartItemEntity::as_select(), ProductEntity::as_select()))
        .first::<(CartItemEntity, ProductEntity)>(conn)
        .await
        .optional()?
        .ok_or(ShopError::NotFound)?;

    validate_quantity(quantity, product.stock)?;

    Ok(diesel::update(cart_items::table.find(item.id))
        .set((
            cart_items::quantity.eq(quantity),
            cart_items::updated_at.eq(diesel::dsl::now),
        ))
        .returning(CartItemEntity::as_returning())
        .get_result(conn)
        .await?)
}

pub async fn remove_item(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    item_id: i32,
) -> ShopResult<CartItemEntity> {
    diesel::delete(
        cart_items::table
            .filter(cart_items::id.eq(item_id))
            .filter(cart_items::cart_id.eq(user_id)),
    )
    .returning(CartItemEntity::as_returning())
    .get_result(conn)
    .await
    .optional()?
    .ok_or(ShopError::NotFound)
}

/// Lists the cart's lines with their products, line totals and first
/// picture. A user without a cart gets an empty summary.
pub async fn list_items(conn: &mut AsyncPgConnection, user_id: i32) -> ShopResult<CartSummary> {
    let lines: Vec<(CartItemEntity, ProductEntity)> = cart_items::table
        .inner_join(products::table)
        .filter(cart_items::cart_id.eq(user_id))
        .order_by(cart_items::id.asc())
        .select((CartItemEntity::as_select(), ProductEntity::as_select()))
        .load(conn)
        .await?;

    if lines.is_empty() {
        return Ok(CartSummary::default());
    }

    let product_ids: Vec<i32> = lines.iter().map(|(_, product)| product.id).collect();
    let pictures = catalog::first_pictures(conn, &product_ids).await?;

    summarize(lines, pictures)
}

/// Loads the cart's lines with their products, locking the product rows
/// until the surrounding transaction ends. Rows come back in product id
/// order so concurrent lockers acquire them in the same order.
pub async fn lock_lines(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> ShopResult<Vec<(CartItemEntity, ProductEntity)>> {
    Ok(cart_items::table
        .inner_join(products::table)
        .filter(cart_items::cart_id.eq(user_id))
        .order_by(products::id.asc())
        .select((CartItemEntity::as_select(), ProductEntity::as_select()))
        .for_update()
        .load(conn)
        .await?)
}

/// Deletes the user's cart together with its items. Returns whether a cart
/// existed.
pub async fn clear(conn: &mut AsyncPgConnection, user_id: i32) -> ShopResult<bool> {
    let deleted = conn
        .transaction(move |conn| {
            Box::pin(async move {
                diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(user_id)))
                    .execute(conn)
                    .await?;

                let deleted = diesel::delete(carts::table.find(user_id))
                    .execute(conn)
                    .await?;

                Ok::<usize, ShopError>(deleted)
            })
        })
        .await?;

    Ok(deleted > 0)
}
