use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    checkout::{self, CheckoutPreview},
    middleware,
    stores::orders::{self, OrderWithItems},
};

/// Defines the caller's checkout and order history routes (authorization required).
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(preview_checkout))
            .routes(utoipa_axum::routes!(create_order))
            .routes(utoipa_axum::routes!(get_my_orders))
            .routes(utoipa_axum::routes!(get_order))
            .route_layer(axum::middleware::from_fn(middleware::user_authorization)),
    )
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct PreviewCheckoutQuery {
    /// Address to ship to instead of the most recently used one.
    address_id: Option<i32>,
}

/// Show the cart and address checkout would submit.
#[utoipa::path(
    get,
    path = "/checkout",
    tags = ["Orders"],
    security(("userId" = [])),
    params(PreviewCheckoutQuery),
    responses(
        (status = 200, description = "Checkout preview", body = StdResponse<CheckoutPreview, String>),
        (status = 409, description = "Cart is empty")
    )
)]
async fn preview_checkout(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    Query(query): Query<PreviewCheckoutQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let preview =
        checkout::preview(conn, &state.address_cache, user_id, query.address_id).await?;

    Ok(StdResponse {
        data: Some(preview),
        message: Some("Get checkout preview successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct CreateOrderReq {
    /// Omit to ship to the most recently used address.
    #[serde(default)]
    address_id: Option<i32>,
}

/// Check out the caller's cart.
///
/// Creates the order and its items, decrements stock and deletes the cart in
/// one transaction.
#[utoipa::path(
    post,
    path = "/checkout",
    tags = ["Orders"],
    security(("userId" = [])),
    request_body = CreateOrderReq,
    responses(
        (status = 200, description = "Created order successfully", body = StdResponse<OrderWithItems, String>),
        (status = 404, description = "Explicit address not found"),
        (status = 409, description = "Empty cart, no address or insufficient stock")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    Json(body): Json<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = checkout::checkout(conn, &state.address_cache, user_id, body.address_id).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Create order successfully"),
    })
}

/// Fetch all orders belonging to the caller, newest first.
#[utoipa::path(
    get,
    path = "/my-orders",
    tags = ["Orders"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "List my orders", body = StdResponse<Vec<OrderWithItems>, String>)
    )
)]
async fn get_my_orders(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let orders = orders::list_for_user(conn, user_id).await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get my orders successfully"),
    })
}

/// Fetch a specific order belonging to the caller.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
    security(("userId" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<OrderWithItems, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = orders::get(conn, user_id, id).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Get order successfully"),
    })
}
