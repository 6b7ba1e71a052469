use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware::user_id_from_headers,
    models::ProductEntity,
    stores::catalog::{self, ProductDetail, ProductFilter, SortOrder},
};

/// Catalog routes. Readable without a user; the detail view reports the
/// caller's cart quantity when a user id is forwarded.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/products",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_products))
            .routes(utoipa_axum::routes!(get_product)),
    )
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct GetProductsQuery {
    /// Exact product type name.
    product_type_name: Option<String>,
    /// Exact product name.
    product_name: Option<String>,
    /// `price_asc` (or `1`) / `price_desc` (or `2`).
    order_by_price: Option<String>,
}

/// List products, optionally filtered and sorted by price.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Products"],
    params(GetProductsQuery),
    responses(
        (status = 200, description = "List products", body = StdResponse<Vec<ProductEntity>, String>)
    )
)]
async fn get_products(
    State(state): State<AppState>,
    Query(query): Query<GetProductsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let filter = ProductFilter {
        type_name: query.product_type_name,
        name: query.product_name,
    };
    let sort = SortOrder::parse(query.order_by_price.as_deref());

    let products = catalog::list(conn, &filter, sort).await?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get products successfully"),
    })
}

/// Fetch a single product with its pictures.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Products"],
    params(
        ("id" = i32, Path, description = "Product ID to fetch")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = StdResponse<ProductDetail, String>),
        (status = 404, description = "Product not found")
    )
)]
async fn get_product(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user_id_from_headers(&headers)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product = catalog::detail(conn, user_id, id).await?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Get product successfully"),
    })
}
