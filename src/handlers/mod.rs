pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod health;
pub mod metrics;
pub mod orders;

pub use health::health_check;
pub use metrics::metrics_handler;

use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::{RepositoryError, ServiceError};
use crate::services::{AccountService, CartService, CatalogService, OrderService};

/// Shared application state containing all services
#[derive(Clone)]
pub struct ApiState {
    pub account_service: Arc<AccountService>,
    pub catalog_service: Arc<CatalogService>,
    pub cart_service: Arc<CartService>,
    pub order_service: Arc<OrderService>,
}

/// Root endpoint; a plain-text liveness line
pub async fn root() -> &'static str {
    "Catalog & order service is running"
}

/// Convert ServiceError to HTTP response
pub(crate) fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match err {
        ServiceError::UserNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::CartItemNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::OrderNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::PhoneNumberInUse { .. } => (StatusCode::CONFLICT, err.to_string()),
        ServiceError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
        ServiceError::ValidationError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::EmptyCart { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::InvalidOrderStatus { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::MediaUpload { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Media upload failed".to_string(),
        ),
        ServiceError::PasswordHash => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
        ServiceError::Repository { source } => match source {
            RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// Build a client-error response for handler-level input failures
pub(crate) fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": message.into(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_errors_map_to_404() {
        let cases = [
            ServiceError::UserNotFound {
                user_id: "U1".to_string(),
            },
            ServiceError::ProductNotFound {
                product_id: "P1".to_string(),
            },
            ServiceError::CartItemNotFound {
                product_id: "P1".to_string(),
                user_id: "U1".to_string(),
            },
            ServiceError::OrderNotFound {
                order_id: "O1".to_string(),
            },
        ];

        for err in cases {
            let (status, _) = service_error_to_response(err);
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn test_client_errors_map_to_4xx() {
        let (status, _) = service_error_to_response(ServiceError::PhoneNumberInUse {
            phone_number: "555".to_string(),
        });
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = service_error_to_response(ServiceError::InvalidCredentials);
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = service_error_to_response(ServiceError::EmptyCart {
            user_id: "U1".to_string(),
        });
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = service_error_to_response(ServiceError::InvalidOrderStatus {
            status: "shipped".to_string(),
        });
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_infrastructure_errors_map_to_500() {
        let (status, _) = service_error_to_response(ServiceError::Repository {
            source: RepositoryError::ConnectionFailed,
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = service_error_to_response(ServiceError::MediaUpload {
            message: "host unreachable".to_string(),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
