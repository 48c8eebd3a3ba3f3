use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use chrono::DateTime;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use crate::models::{Order, OrderLine, OrderStatus, RepositoryError, RepositoryResult};

use super::dynamodb_span;

/// Trait defining the interface for order data access operations
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Find an order by its ID
    async fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>>;

    /// Find all orders placed by a user via the UserOrdersIndex GSI
    async fn find_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Order>>;

    /// Find every order across all users (rider listing)
    async fn find_all(&self) -> RepositoryResult<Vec<Order>>;

    /// Save an order (create or overwrite)
    async fn save(&self, order: Order) -> RepositoryResult<Order>;
}

/// DynamoDB implementation of the OrderRepository trait
pub struct DynamoDbOrderRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    user_orders_index: String,
    region: String,
}

impl DynamoDbOrderRepository {
    /// Create a new DynamoDB order repository
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            user_orders_index: "UserOrdersIndex".to_string(),
            region,
        }
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Convert an Order struct to DynamoDB attribute values
    pub fn order_to_item(&self, order: &Order) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert("order_id".to_string(), AttributeValue::S(order.id.clone()));
        item.insert(
            "user_id".to_string(),
            AttributeValue::S(order.user_id.clone()),
        );

        // Order lines as a DynamoDB list of maps
        let lines: Vec<AttributeValue> = order
            .items
            .iter()
            .map(|line| {
                let mut line_map = HashMap::new();
                line_map.insert(
                    "product_id".to_string(),
                    AttributeValue::S(line.product_id.clone()),
                );
                line_map.insert(
                    "quantity".to_string(),
                    AttributeValue::N(line.quantity.to_string()),
                );
                AttributeValue::M(line_map)
            })
            .collect();

        item.insert("items".to_string(), AttributeValue::L(lines));
        item.insert(
            "delivery_location".to_string(),
            AttributeValue::S(order.delivery_location.clone()),
        );
        item.insert(
            "phone_number".to_string(),
            AttributeValue::S(order.phone_number.clone()),
        );
        item.insert(
            "total_amount".to_string(),
            AttributeValue::N(order.total_amount.to_string()),
        );
        item.insert(
            "status".to_string(),
            AttributeValue::S(order.status.to_string()),
        );
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(order.created_at.to_rfc3339()),
        );

        item
    }

    /// Convert DynamoDB item to Order struct
    pub fn item_to_order(&self, item: HashMap<String, AttributeValue>) -> RepositoryResult<Order> {
        let id = item
            .get("order_id")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing order_id".to_string(),
            })?;

        let user_id = item
            .get("user_id")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing user_id".to_string(),
            })?;

        let items = item
            .get("items")
            .and_then(|v| v.as_l().ok())
            .map(|list| {
                list.iter()
                    .filter_map(|line_attr| {
                        if let Ok(line_map) = line_attr.as_m() {
                            self.map_to_order_line(line_map).ok()
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let delivery_location = item
            .get("delivery_location")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default();

        let phone_number = item
            .get("phone_number")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default();

        let total_amount = item
            .get("total_amount")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| Decimal::from_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid total_amount".to_string(),
            })?;

        let status = item
            .get("status")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| OrderStatus::from_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid status".to_string(),
            })?;

        let created_at = item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid created_at".to_string(),
            })?;

        Ok(Order {
            id,
            user_id,
            items,
            delivery_location,
            phone_number,
            total_amount,
            status,
            created_at,
        })
    }

    /// Convert DynamoDB map to OrderLine
    pub fn map_to_order_line(
        &self,
        line_map: &HashMap<String, AttributeValue>,
    ) -> RepositoryResult<OrderLine> {
        let product_id = line_map
            .get("product_id")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing product_id in order line".to_string(),
            })?;

        let quantity = line_map
            .get("quantity")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid quantity in order line".to_string(),
            })?;

        Ok(OrderLine {
            product_id,
            quantity,
        })
    }

    /// Convert DynamoDB error to RepositoryError
    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);
        RepositoryError::AwsSdk {
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl OrderRepository for DynamoDbOrderRepository {
    #[instrument(skip(self), fields(table = %self.table_name, order_id = %order_id))]
    async fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        info!("Finding order by id");

        let get_span = dynamodb_span("GetItem", &self.table_name, &self.region);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("order_id", AttributeValue::S(order_id.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_order(item)?)),
            None => {
                info!("Order not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id))]
    async fn find_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Order>> {
        info!("Finding orders for user");

        let query_span = dynamodb_span("Query", &self.table_name, &self.region);

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.user_orders_index)
                .key_condition_expression("#u = :u")
                .expression_attribute_names("#u", "user_id")
                .expression_attribute_values(":u", AttributeValue::S(user_id.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(query_span)
        .await?;

        let mut orders = Vec::new();
        for item in response.items.unwrap_or_default() {
            match self.item_to_order(item) {
                Ok(order) => orders.push(order),
                Err(e) => {
                    warn!("Failed to parse order item: {}", e);
                    continue;
                }
            }
        }

        info!("Found {} orders", orders.len());
        Ok(orders)
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Order>> {
        info!("Finding all orders");

        let scan_span = dynamodb_span("Scan", &self.table_name, &self.region);

        let response = async {
            self.client
                .scan()
                .table_name(&self.table_name)
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(scan_span)
        .await?;

        let mut orders = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_order(item) {
                    Ok(order) => orders.push(order),
                    Err(e) => {
                        warn!("Failed to parse order item: {}", e);
                        continue;
                    }
                }
            }
        }

        info!("Found {} orders", orders.len());
        Ok(orders)
    }

    #[instrument(skip(self, order), fields(table = %self.table_name, order_id = %order.id, item_count = order.items.len()))]
    async fn save(&self, order: Order) -> RepositoryResult<Order> {
        info!("Saving order");

        let item = self.order_to_item(&order);

        let put_span = dynamodb_span("PutItem", &self.table_name, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        info!("Order saved successfully");
        Ok(order)
    }
}
