use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{
    AddCartItemRequest, CartItem, CartItemResponse, Product, RemoveCartItemRequest, ServiceError,
    ServiceResult, UpdateCartItemRequest, Validate,
};
use crate::repositories::{CartRepository, ProductRepository};

/// Service for managing shopping carts
pub struct CartService {
    cart_repository: Arc<dyn CartRepository>,
    product_repository: Arc<dyn ProductRepository>,
}

impl CartService {
    /// Create a new CartService
    pub fn new(
        cart_repository: Arc<dyn CartRepository>,
        product_repository: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            cart_repository,
            product_repository,
        }
    }

    /// Add an item to the cart: merge into the existing (user, product) line
    /// if one exists, otherwise create it. Neither the user nor the product
    /// reference is checked for existence; dangling references are accepted.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, product_id = %request.product_id, quantity = request.quantity))]
    pub async fn add_item(&self, request: AddCartItemRequest) -> ServiceResult<CartItem> {
        info!("Adding item to cart");

        request.validate()?;

        let item = match self
            .cart_repository
            .find_item(&request.user_id, &request.product_id)
            .await?
        {
            Some(mut existing) => {
                existing.merge_add(request.quantity);
                existing
            }
            None => CartItem::new(request.user_id, request.product_id, request.quantity),
        };

        let saved = self.cart_repository.save_item(item).await?;

        info!("Cart line saved with quantity {}", saved.quantity);
        Ok(saved)
    }

    /// Get a user's cart with product details expanded inline.
    ///
    /// Read-side composition: fetch the cart lines, batch-fetch the
    /// referenced products, then merge. A dangling product reference yields
    /// a placeholder entry flagged unavailable.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_cart(&self, user_id: &str) -> ServiceResult<Vec<CartItemResponse>> {
        info!("Getting cart");

        let items = self.cart_repository.find_items(user_id).await?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let product_ids: Vec<String> = items.iter().map(|i| i.product_id.clone()).collect();
        let products: HashMap<String, Product> = self
            .product_repository
            .find_by_ids(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let responses = items
            .iter()
            .map(|item| match products.get(&item.product_id) {
                Some(product) => cart_item_to_response(item, product),
                None => {
                    warn!("Product not found for cart line: {}", item.product_id);
                    placeholder_response(item)
                }
            })
            .collect::<Vec<_>>();

        info!("Cart retrieved with {} lines", responses.len());
        Ok(responses)
    }

    /// Overwrite the quantity of an existing cart line verbatim. Unlike add,
    /// no minimum is enforced. Fails if the (user, product) line does not
    /// exist; nothing is created.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, product_id = %request.product_id, quantity = request.quantity))]
    pub async fn update_item(&self, request: UpdateCartItemRequest) -> ServiceResult<CartItem> {
        info!("Updating cart line quantity");

        request.validate()?;

        let mut item = self
            .cart_repository
            .find_item(&request.user_id, &request.product_id)
            .await?
            .ok_or_else(|| ServiceError::CartItemNotFound {
                product_id: request.product_id.clone(),
                user_id: request.user_id.clone(),
            })?;

        item.set_quantity(request.quantity);
        let saved = self.cart_repository.save_item(item).await?;

        info!("Cart line updated");
        Ok(saved)
    }

    /// Remove a cart line. Idempotent: removing an absent line is not an
    /// error.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, product_id = %request.product_id))]
    pub async fn remove_item(&self, request: RemoveCartItemRequest) -> ServiceResult<()> {
        info!("Removing cart line");

        self.cart_repository
            .delete_item(&request.user_id, &request.product_id)
            .await?;

        info!("Cart line removed");
        Ok(())
    }
}

/// Convert a cart line plus its product into the expanded response
fn cart_item_to_response(item: &CartItem, product: &Product) -> CartItemResponse {
    CartItemResponse {
        product_id: item.product_id.clone(),
        product_name: product.name.clone(),
        product_image: product.image_url.clone(),
        category: product.category.clone(),
        unit_price: product.price,
        quantity: item.quantity,
        line_total: product.price * Decimal::from(item.quantity),
        is_available: true,
        added_at: item.added_at,
    }
}

/// Placeholder for a cart line whose product no longer resolves
fn placeholder_response(item: &CartItem) -> CartItemResponse {
    CartItemResponse {
        product_id: item.product_id.clone(),
        product_name: "Product not found".to_string(),
        product_image: String::new(),
        category: String::new(),
        unit_price: Decimal::ZERO,
        quantity: item.quantity,
        line_total: Decimal::ZERO,
        is_available: false,
        added_at: item.added_at,
    }
}
