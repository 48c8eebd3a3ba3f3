use rust_decimal::Decimal;

use super::{
    AddCartItemRequest, CheckoutRequest, CreateProductRequest, LoginRequest, SignupRequest,
    UpdateCartItemRequest, ValidationError, ValidationResult,
};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_CATEGORY_LENGTH: usize = 100;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PHONE_NUMBER_LENGTH: usize = 20;
pub const MIN_CART_QUANTITY: u32 = 1;

impl Validate for SignupRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_phone_number(&self.phone_number)?;
        validate_password(&self.password)?;
        Ok(())
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> ValidationResult<()> {
        if self.phone_number.trim().is_empty() {
            return Err(ValidationError::RequiredField {
                field: "phone_number".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(ValidationError::RequiredField {
                field: "password".to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_product_name(&self.name)?;
        validate_product_price(&self.price)?;
        if self.description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(ValidationError::TooLong {
                field: "description".to_string(),
                max_length: MAX_DESCRIPTION_LENGTH,
                actual_length: self.description.len(),
            });
        }
        if self.category.len() > MAX_CATEGORY_LENGTH {
            return Err(ValidationError::TooLong {
                field: "category".to_string(),
                max_length: MAX_CATEGORY_LENGTH,
                actual_length: self.category.len(),
            });
        }
        Ok(())
    }
}

impl Validate for AddCartItemRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_reference_id("user_id", &self.user_id)?;
        validate_reference_id("product_id", &self.product_id)?;
        validate_cart_quantity(self.quantity)?;
        Ok(())
    }
}

impl Validate for UpdateCartItemRequest {
    // Quantity is deliberately NOT validated here: explicit sets overwrite
    // verbatim, unlike add.
    fn validate(&self) -> ValidationResult<()> {
        validate_reference_id("user_id", &self.user_id)?;
        validate_reference_id("product_id", &self.product_id)?;
        Ok(())
    }
}

impl Validate for CheckoutRequest {
    // Location and phone number content is not validated; the store accepts
    // whatever the client sends.
    fn validate(&self) -> ValidationResult<()> {
        validate_reference_id("user_id", &self.user_id)?;
        Ok(())
    }
}

pub fn validate_phone_number(phone_number: &str) -> ValidationResult<()> {
    let trimmed = phone_number.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "phone_number".to_string(),
        });
    }
    if trimmed.len() > MAX_PHONE_NUMBER_LENGTH {
        return Err(ValidationError::TooLong {
            field: "phone_number".to_string(),
            max_length: MAX_PHONE_NUMBER_LENGTH,
            actual_length: trimmed.len(),
        });
    }
    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "password".to_string(),
        });
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min_length: MIN_PASSWORD_LENGTH,
            actual_length: password.len(),
        });
    }
    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::RequiredField {
            field: "name".to_string(),
        });
    }
    if name.len() > MAX_PRODUCT_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max_length: MAX_PRODUCT_NAME_LENGTH,
            actual_length: name.len(),
        });
    }
    Ok(())
}

pub fn validate_product_price(price: &Decimal) -> ValidationResult<()> {
    if price.is_sign_negative() {
        return Err(ValidationError::InvalidValue {
            field: "price".to_string(),
            value: price.to_string(),
            reason: "Price cannot be negative".to_string(),
        });
    }
    Ok(())
}

pub fn validate_cart_quantity(quantity: u32) -> ValidationResult<()> {
    if quantity < MIN_CART_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: MIN_CART_QUANTITY.to_string(),
            max: "unbounded".to_string(),
            value: quantity.to_string(),
        });
    }
    Ok(())
}

fn validate_reference_id(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }
    Ok(())
}
