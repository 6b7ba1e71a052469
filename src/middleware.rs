//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user's id in the `X-User-Id` header.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app_error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Reads the caller's user id, if one was forwarded. A header that is
/// present but not a positive integer is rejected.
pub fn user_id_from_headers(headers: &HeaderMap) -> Result<Option<i32>, AppError> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse::<i32>().ok())
        .filter(|id| *id > 0)
        .map(Some)
        .ok_or(AppError::Unauthorized)
}

/// Requires a caller identity and exposes it to handlers as `Extension<i32>`.
pub async fn user_authorization(mut req: Request, next: Next) -> Result<Response, AppError> {
    let user_id = user_id_from_headers(req.headers())?.ok_or(AppError::Unauthorized)?;
    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension, Router,
        body::Body,
        http::{HeaderValue, StatusCode},
        routing,
    };
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route(
                "/whoami",
                routing::get(|Extension(user_id): Extension<i32>| async move { user_id.to_string() }),
            )
            .route_layer(axum::middleware::from_fn(user_authorization))
    }

    async fn call(user_id: Option<&str>) -> (StatusCode, String) {
        let mut request = axum::http::Request::builder().uri("/whoami");
        if let Some(user_id) = user_id {
            request = request.header(USER_ID_HEADER, user_id);
        }

        let response = app()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn forwards_user_id_to_handlers() {
        assert_eq!(call(Some("42")).await, (StatusCode::OK, "42".to_string()));
    }

    #[tokio::test]
    async fn rejects_missing_or_malformed_ids() {
        for user_id in [None, Some("abc"), Some("0"), Some("-3")] {
            let (status, _) = call(user_id).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "user id {user_id:?}");
        }
    }

    #[test]
    fn optional_lookup() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id_from_headers(&headers).unwrap(), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" 7 "));
        assert_eq!(user_id_from_headers(&headers).unwrap(), Some(7));

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("seven"));
        assert!(matches!(
            user_id_from_headers(&headers),
            Err(AppError::Unauthorized)
        ));
    }
}
