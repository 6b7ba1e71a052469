use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::AddressEntity,
    stores::address_book::{self, NewAddress},
};

/// Defines the caller's address book routes (authorization required).
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/addresses",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_my_addresses))
            .routes(utoipa_axum::routes!(save_address))
            .routes(utoipa_axum::routes!(get_default_address))
            .routes(utoipa_axum::routes!(select_address))
            .routes(utoipa_axum::routes!(delete_address))
            .route_layer(axum::middleware::from_fn(middleware::user_authorization)),
    )
}

/// Fetch all addresses saved by the caller, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Addresses"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "List my addresses", body = StdResponse<Vec<AddressEntity>, String>)
    )
)]
async fn get_my_addresses(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let addresses = address_book::list_for_user(conn, user_id).await?;

    Ok(StdResponse {
        data: Some(addresses),
        message: Some("Get my addresses successfully"),
    })
}

/// Save a new address. It becomes the caller's default for checkout.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Addresses"],
    security(("userId" = [])),
    request_body = NewAddress,
    responses(
        (status = 200, description = "Address saved", body = StdResponse<AddressEntity, String>),
        (status = 400, description = "Invalid or duplicate address")
    )
)]
async fn save_address(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    Json(body): Json<NewAddress>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let address = address_book::save(conn, &state.address_cache, user_id, body).await?;

    Ok(StdResponse {
        data: Some(address),
        message: Some("Saved address successfully"),
    })
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct GetDefaultAddressQuery {
    /// Explicit address to use instead of the most recently used one.
    id: Option<i32>,
}

/// Resolve the address checkout would ship to.
#[utoipa::path(
    get,
    path = "/default",
    tags = ["Addresses"],
    security(("userId" = [])),
    params(GetDefaultAddressQuery),
    responses(
        (status = 200, description = "Resolved address, if any", body = StdResponse<AddressEntity, String>),
        (status = 404, description = "Explicit address not found")
    )
)]
async fn get_default_address(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    Query(query): Query<GetDefaultAddressQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let address =
        address_book::get_or_default(conn, &state.address_cache, user_id, query.id).await?;

    Ok(StdResponse {
        data: address,
        message: Some("Get default address successfully"),
    })
}

/// Use a saved address as the caller's default.
#[utoipa::path(
    post,
    path = "/{id}/select",
    tags = ["Addresses"],
    security(("userId" = [])),
    params(
        ("id" = i32, Path, description = "Address ID to select")
    ),
    responses(
        (status = 200, description = "Address selected", body = StdResponse<AddressEntity, String>),
        (status = 404, description = "Address not found")
    )
)]
async fn select_address(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let address = address_book::select(conn, &state.address_cache, user_id, id).await?;

    Ok(StdResponse {
        data: Some(address),
        message: Some("Selected address successfully"),
    })
}

/// Delete a saved address. Past orders keep their record without it.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Addresses"],
    security(("userId" = [])),
    params(
        ("id" = i32, Path, description = "Address ID to delete")
    ),
    responses(
        (status = 200, description = "Address deleted", body = StdResponse<AddressEntity, String>),
        (status = 404, description = "Address not found")
    )
)]
async fn delete_address(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let address = address_book::delete(conn, &state.address_cache, user_id, id).await?;

    Ok(StdResponse {
        data: Some(address),
        message: Some("Deleted address successfully"),
    })
}
