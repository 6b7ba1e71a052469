use utoipa::openapi::{
    OpenApi,
    security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::USER_ID_HEADER;

/// Name of the security scheme that authenticated routes reference.
pub const USER_ID_SCHEME: &str = "userId";

pub fn create_swagger_ui(mut openapi: OpenApi) -> SwaggerUi {
    openapi
        .components
        .get_or_insert_with(Default::default)
        .add_security_scheme(
            USER_ID_SCHEME,
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(USER_ID_HEADER))),
        );

    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi)
}
