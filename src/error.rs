//! Domain errors raised by the stores and the checkout engine.

use thiserror::Error;

/// Failure of a storefront operation.
///
/// Every variant is terminal for the operation that produced it. Callers may
/// retry after correcting state, nothing is retried automatically.
#[derive(Debug, Error)]
pub enum ShopError {
    /// The entity does not exist or is not owned by the caller.
    #[error("not found")]
    NotFound,

    /// The input breaks an invariant of the data model.
    #[error("validation error: {0}")]
    Validation(String),

    /// Checkout preconditions are not met.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Database(#[from] diesel::result::Error),
}

impl ShopError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

pub type ShopResult<T> = Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_reason() {
        assert_eq!(
            ShopError::validation("exceeds stock").to_string(),
            "validation error: exceeds stock"
        );
        assert_eq!(
            ShopError::invalid_state("empty cart").to_string(),
            "invalid state: empty cart"
        );
        assert_eq!(ShopError::NotFound.to_string(), "not found");
    }

    #[test]
    fn diesel_errors_convert() {
        let err: ShopError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, ShopError::Database(diesel::result::Error::NotFound)));
    }
}
