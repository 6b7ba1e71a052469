//! Completed orders. Rows are written once by checkout and only touched
//! afterwards to null references to deleted addresses, products or users.

use std::collections::HashMap;

use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    error::{ShopError, ShopResult},
    models::{CreateOrderEntity, CreateOrderItemEntity, OrderEntity, OrderItemEntity},
    schema::{order_items, orders},
};

#[derive(Serialize, Debug, ToSchema)]
pub struct OrderWithItems {
    pub order: OrderEntity,
    pub order_items: Vec<OrderItemEntity>,
}

/// A product and quantity to record on a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: i32,
    pub quantity: i32,
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    address_id: i32,
    total_price: i64,
) -> ShopResult<OrderEntity> {
    Ok(diesel::insert_into(orders::table)
        .values(CreateOrderEntity {
            total_price,
            address_id: Some(address_id),
            user_id: Some(user_id),
        })
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await?)
}

pub async fn create_items(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    lines: &[OrderLine],
) -> ShopResult<Vec<OrderItemEntity>> {
    let new_items: Vec<CreateOrderItemEntity> = lines
        .iter()
        .map(|line| CreateOrderItemEntity {
            order_id,
            product_id: Some(line.product_id),
            quantity: line.quantity,
        })
        .collect();

    Ok(diesel::insert_into(order_items::table)
        .values(new_items)
        .returning(OrderItemEntity::as_returning())
        .get_results(conn)
        .await?)
}

/// Fetches one of the user's orders with its items.
pub async fn get(conn: &mut AsyncPgConnection, user_id: i32, id: i32) -> ShopResult<OrderWithItems> {
    let order = orders::table
        .find(id)
        .filter(orders::user_id.eq(user_id))
        .select(OrderEntity::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or(ShopError::NotFound)?;

    let order_items = order_items::table
        .filter(order_items::order_id.eq(order.id))
        .order_by(order_items::id.asc())
        .select(OrderItemEntity::as_select())
        .load(conn)
        .await?;

    Ok(OrderWithItems { order, order_items })
}

/// Lists the user's orders, newest first.
pub async fn list_for_user(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> ShopResult<Vec<OrderWithItems>> {
    let orders: Vec<OrderEntity> = orders::table
        .filter(orders::user_id.eq(user_id))
        .order_by((orders::created_at.desc(), orders::id.desc()))
        .select(OrderEntity::as_select())
        .load(conn)
        .await?;

    let order_ids: Vec<i32> = orders.iter().map(|order| order.id).collect();
    let items: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq_any(&order_ids))
        .order_by(order_items::id.asc())
        .select(OrderItemEntity::as_select())
        .load(conn)
        .await?;

    let mut group: HashMap<i32, Vec<OrderItemEntity>> = HashMap::new();
    for item in items {
        group.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderWithItems {
            order_items: group.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}

/// Nulls the user reference on all of a user's orders, for when the user
/// account is removed. Returns the number of orders detached.
pub async fn detach_user(conn: &mut AsyncPgConnection, user_id: i32) -> ShopResult<usize> {
    let detached = diesel::update(orders::table.filter(orders::user_id.eq(user_id)))
        .set(orders::user_id.eq(None::<i32>))
        .execute(conn)
        .await?;

    info!(user_id, detached, "Orders detached from user");
    Ok(detached)
}
