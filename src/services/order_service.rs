use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{
    CheckoutRequest, Order, OrderCustomer, OrderLine, OrderLineResponse, OrderResponse,
    OrderStatus, Product, RiderOrderResponse, ServiceError, ServiceResult, User, Validate,
};
use crate::repositories::{CartRepository, OrderRepository, ProductRepository, UserRepository};

/// Service for order management: checkout, listings, and rider status
/// updates
pub struct OrderService {
    order_repository: Arc<dyn OrderRepository>,
    cart_repository: Arc<dyn CartRepository>,
    product_repository: Arc<dyn ProductRepository>,
    user_repository: Arc<dyn UserRepository>,
}

impl OrderService {
    /// Create a new OrderService
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        cart_repository: Arc<dyn CartRepository>,
        product_repository: Arc<dyn ProductRepository>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            order_repository,
            cart_repository,
            product_repository,
            user_repository,
        }
    }

    /// Check out a user's cart into a new pending order.
    ///
    /// The total is computed from each product's price as it stands right
    /// now, not a price captured when the item was added. The order write
    /// and the cart clearing are two sequential store operations with no
    /// surrounding transaction: a fault between them leaves the order
    /// created and the cart intact. That window is accepted behavior.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn checkout(&self, request: CheckoutRequest) -> ServiceResult<Order> {
        info!("Processing checkout");

        request.validate()?;

        let items = self.cart_repository.find_items(&request.user_id).await?;
        if items.is_empty() {
            return Err(ServiceError::EmptyCart {
                user_id: request.user_id,
            });
        }

        let product_ids: Vec<String> = items.iter().map(|i| i.product_id.clone()).collect();
        let products: HashMap<String, Product> = self
            .product_repository
            .find_by_ids(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let mut total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            let product = products.get(&item.product_id).ok_or_else(|| {
                ServiceError::ProductNotFound {
                    product_id: item.product_id.clone(),
                }
            })?;
            total += product.price * Decimal::from(item.quantity);
            lines.push(OrderLine {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            });
        }

        let order = Order::new(
            request.user_id.clone(),
            lines,
            request.location,
            request.phone_number,
            total,
        );

        let created = self.order_repository.save(order).await?;
        let cleared = self.cart_repository.delete_items(&request.user_id).await?;

        info!(
            "Checkout completed: order {} for {}, {} cart lines cleared",
            created.id, created.total_amount, cleared
        );
        Ok(created)
    }

    /// List a user's orders, newest first, with product details expanded
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_user_orders(&self, user_id: &str) -> ServiceResult<Vec<OrderResponse>> {
        info!("Listing orders for user");

        let mut orders = self.order_repository.find_by_user(user_id).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let products = self.fetch_products_for(&orders).await?;
        let responses = orders
            .into_iter()
            .map(|order| expand_order(order, &products))
            .collect();

        Ok(responses)
    }

    /// List every order across all users for riders, newest first, with
    /// customer contact fields and product summaries expanded. No
    /// pagination and no status filtering.
    #[instrument(skip(self))]
    pub async fn list_all_orders(&self) -> ServiceResult<Vec<RiderOrderResponse>> {
        info!("Listing all orders for riders");

        let mut orders = self.order_repository.find_all().await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let products = self.fetch_products_for(&orders).await?;

        let mut user_ids: Vec<String> = orders.iter().map(|o| o.user_id.clone()).collect();
        user_ids.sort();
        user_ids.dedup();
        let users: HashMap<String, User> = self
            .user_repository
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let responses = orders
            .into_iter()
            .map(|order| {
                let customer = match users.get(&order.user_id) {
                    Some(user) => OrderCustomer {
                        user_id: user.id.clone(),
                        full_name: user.full_name.clone(),
                        phone_number: user.phone_number.clone(),
                        city: user.city.clone(),
                    },
                    None => {
                        warn!("User not found for order: {}", order.user_id);
                        OrderCustomer {
                            user_id: order.user_id.clone(),
                            full_name: String::new(),
                            // The order's own contact number still applies
                            phone_number: order.phone_number.clone(),
                            city: String::new(),
                        }
                    }
                };

                let expanded = expand_order(order, &products);
                RiderOrderResponse {
                    id: expanded.id,
                    customer,
                    items: expanded.items,
                    delivery_location: expanded.delivery_location,
                    phone_number: expanded.phone_number,
                    total_amount: expanded.total_amount,
                    status: expanded.status,
                    created_at: expanded.created_at,
                }
            })
            .collect();

        Ok(responses)
    }

    /// Overwrite an order's status. Any of the three recognized values is
    /// accepted from any current status; there are no transition checks.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_status(&self, order_id: &str, status: &str) -> ServiceResult<Order> {
        info!("Updating order status");

        let status: OrderStatus =
            status
                .parse()
                .map_err(|_| ServiceError::InvalidOrderStatus {
                    status: status.to_string(),
                })?;

        let mut order = self
            .order_repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;

        order.status = status;
        let updated = self.order_repository.save(order).await?;

        info!("Order status updated to {}", updated.status);
        Ok(updated)
    }

    /// Batch-fetch every product referenced by the given orders
    async fn fetch_products_for(
        &self,
        orders: &[Order],
    ) -> ServiceResult<HashMap<String, Product>> {
        let mut product_ids: Vec<String> = orders
            .iter()
            .flat_map(|o| o.items.iter().map(|l| l.product_id.clone()))
            .collect();
        product_ids.sort();
        product_ids.dedup();

        let products = self
            .product_repository
            .find_by_ids(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(products)
    }
}

/// Expand an order's lines with product details; dangling references are
/// kept as placeholder lines rather than dropped
fn expand_order(order: Order, products: &HashMap<String, Product>) -> OrderResponse {
    let items = order
        .items
        .iter()
        .map(|line| match products.get(&line.product_id) {
            Some(product) => OrderLineResponse {
                product_id: line.product_id.clone(),
                product_name: product.name.clone(),
                product_image: product.image_url.clone(),
                unit_price: product.price,
                quantity: line.quantity,
            },
            None => OrderLineResponse {
                product_id: line.product_id.clone(),
                product_name: "Product not found".to_string(),
                product_image: String::new(),
                unit_price: Decimal::ZERO,
                quantity: line.quantity,
            },
        })
        .collect();

    OrderResponse {
        id: order.id,
        user_id: order.user_id,
        items,
        delivery_location: order.delivery_location,
        phone_number: order.phone_number,
        total_amount: order.total_amount,
        status: order.status,
        created_at: order.created_at,
    }
}
