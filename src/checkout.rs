//! Turns a user's cart into an order.
//!
//! Checkout runs as one transaction: the cart lines are read with their
//! product rows locked, re-validated against the locked stock, and then the
//! order, its items, the stock decrements and the cart deletion are written
//! together. Any failure rolls all of it back.

use diesel_async::{AsyncConnection, AsyncPgConnection};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    cache::AddressCache,
    error::{ShopError, ShopResult},
    models::{AddressEntity, CartItemEntity, ProductEntity},
    stores::{
        address_book,
        carts::{self, CartSummary},
        catalog,
        orders::{self, OrderLine, OrderWithItems},
    },
};

/// What a validated cart will be written as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub address_id: i32,
    pub total_price: i64,
    pub lines: Vec<OrderLine>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct CheckoutPreview {
    pub cart: CartSummary,
    pub address: Option<AddressEntity>,
}

/// Validates cart lines for checkout.
///
/// Checks run in a fixed order: the cart has lines, an address is known,
/// the total is positive, every line fits its product's stock.
pub fn plan(
    lines: &[(CartItemEntity, ProductEntity)],
    address: Option<&AddressEntity>,
) -> ShopResult<CheckoutPlan> {
    if lines.is_empty() {
        return Err(ShopError::invalid_state("empty cart"));
    }

    let Some(address) = address else {
        return Err(ShopError::invalid_state("no address"));
    };

    let total_price = carts::total_price(
        lines
            .iter()
            .map(|(item, product)| carts::line_total(item.quantity, product.price)),
    )?;
    if total_price <= 0 {
        return Err(ShopError::invalid_state("non-positive total"));
    }

    if let Some((item, product)) = lines.iter().find(|(item, product)| item.quantity > product.stock) {
        warn!(
            product_id = product.id,
            requested = item.quantity,
            stock = product.stock,
            "Stock changed since the item was added"
        );
        return Err(ShopError::invalid_state("insufficient stock"));
    }

    Ok(CheckoutPlan {
        address_id: address.id,
        total_price,
        lines: lines
            .iter()
            .map(|(item, _)| OrderLine {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
    })
}

/// Places an order for everything in the user's cart.
///
/// `address_id` picks a saved address explicitly; without it the user's most
/// recently used address is used.
pub async fn checkout(
    conn: &mut AsyncPgConnection,
    cache: &AddressCache,
    user_id: i32,
    address_id: Option<i32>,
) -> ShopResult<OrderWithItems> {
    let tx_cache = cache.clone();

    let result = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let lines = carts::lock_lines(conn, user_id).await?;
                // An empty cart is reported before any address lookup.
                let address = if lines.is_empty() {
                    None
                } else {
                    address_book::get_or_default(conn, &tx_cache, user_id, address_id).await?
                };

                let plan = plan(&lines, address.as_ref())?;

                let order = orders::create(conn, user_id, plan.address_id, plan.total_price).await?;
                let order_items = orders::create_items(conn, order.id, &plan.lines).await?;

                for line in &plan.lines {
                    catalog::decrement_stock(conn, line.product_id, line.quantity).await?;
                }

                carts::clear(conn, user_id).await?;

                Ok::<(OrderWithItems, Option<AddressEntity>), ShopError>((
                    OrderWithItems { order, order_items },
                    address,
                ))
            })
        })
        .await;

    let (placed, address) = match result {
        Ok(placed) => placed,
        Err(err) => {
            if let ShopError::InvalidState(reason) = &err {
                warn!(user_id, reason = %reason, "Checkout rejected");
            }
            return Err(err);
        }
    };

    if let Some(address) = address {
        cache.set(address).await;
    }

    info!(
        user_id,
        order_id = placed.order.id,
        total_price = placed.order.total_price,
        items = placed.order_items.len(),
        "Order placed"
    );

    Ok(placed)
}

/// Shows what checkout would submit without writing anything.
pub async fn preview(
    conn: &mut AsyncPgConnection,
    cache: &AddressCache,
    user_id: i32,
    address_id: Option<i32>,
) -> ShopResult<CheckoutPreview> {
    let cart = carts::list_items(conn, user_id).await?;
    if cart.items.is_empty() {
        return Err(ShopError::invalid_state("empty cart"));
    }

    let address = address_book::get_or_default(conn, cache, user_id, address_id).await?;

    Ok(CheckoutPreview { cart, address })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(id: i32, price: i32, stock: i32) -> ProductEntity {
        ProductEntity {
            id,
            name: format!("product-{id}"),
            price,
            stock,
            product_type_id: 1,
            manufacturer_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(product_id: i32, quantity: i32) -> CartItemEntity {
        CartItemEntity {
            id: product_id * 10,
            cart_id: 1,
            product_id,
            quantity,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn address() -> AddressEntity {
        AddressEntity {
            id: 3,
            user_id: 1,
            zip_code: "100-0001".into(),
            prefecture: "Tokyo".into(),
            address: "1-1 Chiyoda".into(),
            created_at: Utc::now(),
        }
    }

    fn reason(err: ShopError) -> String {
        match err {
            ShopError::InvalidState(reason) => reason,
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn plan_totals_every_line() {
        let lines = vec![(item(1, 2), product(1, 100, 5)), (item(2, 1), product(2, 50, 1))];

        let plan = plan(&lines, Some(&address())).unwrap();

        assert_eq!(plan.total_price, 250);
        assert_eq!(plan.address_id, 3);
        assert_eq!(
            plan.lines,
            vec![
                OrderLine { product_id: 1, quantity: 2 },
                OrderLine { product_id: 2, quantity: 1 },
            ]
        );
    }

    #[test]
    fn empty_cart_is_rejected_first() {
        assert_eq!(reason(plan(&[], None).unwrap_err()), "empty cart");
        assert_eq!(reason(plan(&[], Some(&address())).unwrap_err()), "empty cart");
    }

    #[test]
    fn missing_address_is_rejected() {
        let lines = vec![(item(1, 1), product(1, 100, 5))];
        assert_eq!(reason(plan(&lines, None).unwrap_err()), "no address");
    }

    #[test]
    fn zero_total_is_rejected() {
        let lines = vec![(item(1, 3), product(1, 0, 5))];
        assert_eq!(
            reason(plan(&lines, Some(&address())).unwrap_err()),
            "non-positive total"
        );
    }

    #[test]
    fn any_short_line_rejects_the_whole_cart() {
        let lines = vec![
            (item(1, 2), product(1, 100, 5)),
            (item(2, 4), product(2, 50, 3)),
            (item(3, 1), product(3, 10, 9)),
        ];
        assert_eq!(
            reason(plan(&lines, Some(&address())).unwrap_err()),
            "insufficient stock"
        );
    }

    #[test]
    fn exact_stock_is_enough() {
        let lines = vec![(item(1, 5), product(1, 100, 5))];
        assert_eq!(plan(&lines, Some(&address())).unwrap().total_price, 500);
    }
}
