use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::CartItemEntity,
    stores::carts::{self, CartSummary},
};

/// Defines the caller's cart routes (authorization required).
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/carts",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_my_cart))
            .routes(utoipa_axum::routes!(clear_my_cart))
            .routes(utoipa_axum::routes!(add_cart_item))
            .routes(utoipa_axum::routes!(update_cart_item))
            .routes(utoipa_axum::routes!(remove_cart_item))
            .route_layer(axum::middleware::from_fn(middleware::user_authorization)),
    )
}

/// Fetch the caller's cart with line totals.
#[utoipa::path(
    get,
    path = "/my-cart",
    tags = ["Carts"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "Get my cart", body = StdResponse<CartSummary, String>)
    )
)]
async fn get_my_cart(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let cart = carts::list_items(conn, user_id).await?;

    Ok(StdResponse {
        data: Some(cart),
        message: Some("Get my cart successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct ClearMyCartRes {
    pub deleted: bool,
}

/// Delete the caller's cart and all its items.
#[utoipa::path(
    delete,
    path = "/my-cart",
    tags = ["Carts"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "Cart cleared", body = StdResponse<ClearMyCartRes, String>)
    )
)]
async fn clear_my_cart(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let deleted = carts::clear(conn, user_id).await?;

    Ok(StdResponse {
        data: Some(ClearMyCartRes { deleted }),
        message: Some("Cleared cart successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct AddCartItemReq {
    pub product_id: i32,
    pub quantity: i32,
}

/// Put a product in the caller's cart. Re-adding a product replaces its quantity.
#[utoipa::path(
    post,
    path = "/my-cart/items",
    tags = ["Carts"],
    security(("userId" = [])),
    request_body = AddCartItemReq,
    responses(
        (status = 200, description = "Cart item saved", body = StdResponse<CartItemEntity, String>),
        (status = 400, description = "Quantity is not positive or exceeds stock"),
        (status = 404, description = "Product not found")
    )
)]
async fn add_cart_item(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    Json(body): Json<AddCartItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item = carts::add_item(conn, user_id, body.product_id, body.quantity).await?;

    Ok(StdResponse {
        data: Some(item),
        message: Some("Added product to cart successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct UpdateCartItemReq {
    pub quantity: i32,
}

/// Change the quantity of a line in the caller's cart.
#[utoipa::path(
    patch,
    path = "/my-cart/items/{id}",
    tags = ["Carts"],
    security(("userId" = [])),
    params(
        ("id" = i32, Path, description = "Cart item ID to update")
    ),
    request_body = UpdateCartItemReq,
    responses(
        (status = 200, description = "Cart item updated", body = StdResponse<CartItemEntity, String>),
        (status = 400, description = "Quantity is not positive or exceeds stock"),
        (status = 404, description = "Cart item not found")
    )
)]
async fn update_cart_item(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    Json(body): Json<UpdateCartItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item = carts::update_item(conn, user_id, id, body.quantity).await?;

    Ok(StdResponse {
        data: Some(item),
        message: Some("Updated cart item successfully"),
    })
}

/// Remove a line from the caller's cart.
#[utoipa::path(
    delete,
    path = "/my-cart/items/{id}",
    tags = ["Carts"],
    security(("userId" = [])),
    params(
        ("id" = i32, Path, description = "Cart item ID to remove")
    ),
    responses(
        (status = 200, description = "Cart item removed", body = StdResponse<CartItemEntity, String>),
        (status = 404, description = "Cart item not found")
    )
)]
async fn remove_cart_item(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item = carts::remove_item(conn, user_id, id).await?;

    Ok(StdResponse {
        data: Some(item),
        message: Some("Removed cart item successfully"),
    })
}
