use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One cart line for a (user, product) pair. At most one item exists per
/// pair; repeat adds merge into the existing line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub user_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

/// Request model for adding an item to the cart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub user_id: String,
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Request model for overwriting a cart line's quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub user_id: String,
    pub product_id: String,
    pub quantity: u32,
}

/// Request model for removing a cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartItemRequest {
    pub user_id: String,
    pub product_id: String,
}

/// Cart line with product details expanded for cart reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub category: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    pub is_available: bool,
    pub added_at: DateTime<Utc>,
}

fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// Create a new cart line
    pub fn new(user_id: String, product_id: String, quantity: u32) -> Self {
        Self {
            user_id,
            product_id,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Increment the quantity for a repeat add of the same product
    pub fn merge_add(&mut self, quantity: u32) {
        self.quantity += quantity;
    }

    /// Overwrite the quantity verbatim (explicit quantity-set)
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}
