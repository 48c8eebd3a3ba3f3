use thiserror::Error;

/// Service-level errors that can occur in business logic
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Phone number already registered: {phone_number}")]
    PhoneNumberInUse { phone_number: String },

    #[error("Invalid phone number or password")]
    InvalidCredentials,

    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    #[error("Cart item not found: product_id={product_id}, user_id={user_id}")]
    CartItemNotFound {
        product_id: String,
        user_id: String,
    },

    #[error("Cart is empty for user: {user_id}")]
    EmptyCart { user_id: String },

    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    #[error("Invalid order status: {status}")]
    InvalidOrderStatus { status: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Media upload failed: {message}")]
    MediaUpload { message: String },

    #[error("Password hashing failed")]
    PasswordHash,

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed")]
    ConnectionFailed,

    #[error("Item not found")]
    NotFound,

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("AWS SDK error: {message}")]
    AwsSdk { message: String },

    #[error("Invalid query parameters: {message}")]
    InvalidQuery { message: String },

    #[error("Timeout occurred during operation")]
    Timeout,
}

/// Validation errors for input data
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredField { field: String },

    #[error("Invalid field value: {field}={value}, reason={reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field too long: {field}, max_length={max_length}, actual_length={actual_length}")]
    TooLong {
        field: String,
        max_length: usize,
        actual_length: usize,
    },

    #[error("Field too short: {field}, min_length={min_length}, actual_length={actual_length}")]
    TooShort {
        field: String,
        min_length: usize,
        actual_length: usize,
    },

    #[error("Invalid format: {field}, expected={expected}")]
    InvalidFormat { field: String, expected: String },

    #[error("Value out of range: {field}, min={min}, max={max}, value={value}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
        value: String,
    },
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ServiceError::ProductNotFound {
            product_id: "P001".to_string(),
        };
        assert_eq!(error.to_string(), "Product not found: P001");

        let validation_error = ValidationError::RequiredField {
            field: "phone_number".to_string(),
        };
        assert_eq!(
            validation_error.to_string(),
            "Required field missing: phone_number"
        );
    }

    #[test]
    fn test_invalid_credentials_message_has_no_detail() {
        // Both login failure causes must surface the same message
        let error = ServiceError::InvalidCredentials;
        assert_eq!(error.to_string(), "Invalid phone number or password");
    }

    #[test]
    fn test_error_conversion() {
        let validation_error = ValidationError::InvalidValue {
            field: "price".to_string(),
            value: "-10".to_string(),
            reason: "Price cannot be negative".to_string(),
        };

        let service_error: ServiceError = validation_error.into();
        match service_error {
            ServiceError::ValidationError { message } => {
                assert!(message.contains("Invalid field value"));
            }
            _ => panic!("Expected ValidationError conversion"),
        }
    }

    #[test]
    fn test_repository_error_from_serde() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json");
        assert!(json_error.is_err());

        let repo_error: RepositoryError = json_error.unwrap_err().into();
        match repo_error {
            RepositoryError::Serialization { .. } => {}
            _ => panic!("Expected Serialization error"),
        }
    }
}
