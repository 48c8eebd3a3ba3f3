use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderStatus;

/// Placed order. Created from a user's cart at checkout; the total is
/// computed once at that moment and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderLine>,
    pub delivery_location: String,
    pub phone_number: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One (product, quantity) line frozen into an order at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
}

/// Request model for checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: String,
    pub location: String,
    pub phone_number: String,
}

/// Request model for the rider status update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    /// Raw status string; parsed against [`OrderStatus`] so unknown values
    /// surface as a client error rather than a deserialization failure
    pub status: String,
}

/// Order line with product details expanded for order listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Order as returned by the per-user listing, items expanded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderLineResponse>,
    pub delivery_location: String,
    pub phone_number: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Customer contact fields expanded into rider order listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub user_id: String,
    pub full_name: String,
    pub phone_number: String,
    pub city: String,
}

/// Order as returned by the rider listing: customer contact plus product
/// summaries, across all users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderOrderResponse {
    pub id: String,
    pub customer: OrderCustomer,
    pub items: Vec<OrderLineResponse>,
    pub delivery_location: String,
    pub phone_number: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending Order with a generated ID and the total computed
    /// by the caller at checkout time
    pub fn new(
        user_id: String,
        items: Vec<OrderLine>,
        delivery_location: String,
        phone_number: String,
        total_amount: Decimal,
    ) -> Self {
        Self {
            id: format!(
                "O{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            user_id,
            items,
            delivery_location,
            phone_number,
            total_amount,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
