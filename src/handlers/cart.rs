use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::models::{
    AddCartItemRequest, CartItem, CartItemResponse, RemoveCartItemRequest, UpdateCartItemRequest,
};

use super::{service_error_to_response, ApiState};

/// Add an item to the cart, merging into an existing (user, product) line
#[instrument(name = "add_cart_item", skip(state, request), fields(
    user_id = %request.user_id,
    product_id = %request.product_id,
    quantity = %request.quantity,
))]
pub async fn add_cart_item(
    State(state): State<ApiState>,
    Json(request): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<CartItem>), (StatusCode, Json<Value>)> {
    info!(
        "Adding item to cart for user: {}, product_id: {}, quantity: {}",
        request.user_id, request.product_id, request.quantity
    );

    match state.cart_service.add_item(request).await {
        Ok(item) => {
            info!("Successfully added item to cart");
            Ok((StatusCode::CREATED, Json(item)))
        }
        Err(err) => {
            error!("Failed to add item to cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get a user's cart with product details expanded
#[instrument(name = "get_cart", skip(state), fields(user_id = %user_id))]
pub async fn get_cart(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CartItemResponse>>, (StatusCode, Json<Value>)> {
    info!("Getting cart for user: {}", user_id);

    match state.cart_service.get_cart(&user_id).await {
        Ok(items) => {
            info!("Successfully retrieved cart with {} lines", items.len());
            Ok(Json(items))
        }
        Err(err) => {
            error!("Failed to get cart for user {}: {}", user_id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Overwrite the quantity of an existing cart line
#[instrument(name = "update_cart_item", skip(state, request), fields(
    user_id = %request.user_id,
    product_id = %request.product_id,
    quantity = %request.quantity,
))]
pub async fn update_cart_item(
    State(state): State<ApiState>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<CartItem>, (StatusCode, Json<Value>)> {
    info!(
        "Updating cart item for user: {}, product_id: {}, new_quantity: {}",
        request.user_id, request.product_id, request.quantity
    );

    match state.cart_service.update_item(request).await {
        Ok(item) => {
            info!("Successfully updated cart item");
            Ok(Json(item))
        }
        Err(err) => {
            error!("Failed to update cart item: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Remove a cart line; removing an absent line still succeeds
#[instrument(name = "remove_cart_item", skip(state, request), fields(
    user_id = %request.user_id,
    product_id = %request.product_id,
))]
pub async fn remove_cart_item(
    State(state): State<ApiState>,
    Json(request): Json<RemoveCartItemRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    info!(
        "Removing item from cart for user: {}, product_id: {}",
        request.user_id, request.product_id
    );

    match state.cart_service.remove_item(request).await {
        Ok(()) => {
            info!("Successfully removed item from cart");
            Ok(Json(json!({
                "message": "Item removed from cart",
            })))
        }
        Err(err) => {
            error!("Failed to remove item from cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
