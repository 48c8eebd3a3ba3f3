use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::models::{
    CheckoutRequest, Order, OrderResponse, RiderOrderResponse, UpdateOrderStatusRequest,
};

use super::{service_error_to_response, ApiState};

/// Check out the user's cart into a new pending order
#[instrument(name = "checkout", skip(state, request), fields(user_id = %request.user_id))]
pub async fn checkout(
    State(state): State<ApiState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>), (StatusCode, Json<Value>)> {
    info!("Processing checkout for user: {}", request.user_id);

    match state.order_service.checkout(request).await {
        Ok(order) => {
            info!("Checkout completed successfully for order: {}", order.id);
            Ok((StatusCode::CREATED, Json(order)))
        }
        Err(err) => {
            error!("Failed to process checkout: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// List a user's orders with product details expanded
#[instrument(name = "list_user_orders", skip(state), fields(user_id = %user_id))]
pub async fn list_user_orders(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, (StatusCode, Json<Value>)> {
    info!("Listing orders for user: {}", user_id);

    match state.order_service.list_user_orders(&user_id).await {
        Ok(orders) => {
            info!("Successfully listed {} orders", orders.len());
            Ok(Json(orders))
        }
        Err(err) => {
            error!("Failed to list orders for user {}: {}", user_id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// List every order across all users for riders
#[instrument(name = "list_all_orders", skip(state))]
pub async fn list_all_orders(
    State(state): State<ApiState>,
) -> Result<Json<Vec<RiderOrderResponse>>, (StatusCode, Json<Value>)> {
    info!("Listing all orders for riders");

    match state.order_service.list_all_orders().await {
        Ok(orders) => {
            info!("Successfully listed {} orders", orders.len());
            Ok(Json(orders))
        }
        Err(err) => {
            error!("Failed to list all orders: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Overwrite an order's delivery status
#[instrument(name = "update_order_status", skip(state, request), fields(
    order_id = %order_id,
    status = %request.status,
))]
pub async fn update_order_status(
    State(state): State<ApiState>,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, (StatusCode, Json<Value>)> {
    info!(
        "Updating status for order: {} to {}",
        order_id, request.status
    );

    match state
        .order_service
        .update_status(&order_id, &request.status)
        .await
    {
        Ok(order) => {
            info!("Successfully updated order status");
            Ok(Json(order))
        }
        Err(err) => {
            error!("Failed to update order status: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
