use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use chrono::DateTime;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use crate::models::{CartItem, RepositoryError, RepositoryResult};

use super::dynamodb_span;

/// Trait defining the interface for cart data access operations.
///
/// Cart lines are keyed by (user_id, product_id), so the composite key
/// guarantees at most one row per pair at the storage layer.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Find a single cart line for a (user, product) pair
    async fn find_item(&self, user_id: &str, product_id: &str)
        -> RepositoryResult<Option<CartItem>>;

    /// Find all cart lines for a user
    async fn find_items(&self, user_id: &str) -> RepositoryResult<Vec<CartItem>>;

    /// Save a cart line (create or overwrite)
    async fn save_item(&self, item: CartItem) -> RepositoryResult<CartItem>;

    /// Delete a single cart line; succeeds whether or not it existed
    async fn delete_item(&self, user_id: &str, product_id: &str) -> RepositoryResult<()>;

    /// Delete every cart line for a user (checkout clearing); returns the
    /// number of lines removed
    async fn delete_items(&self, user_id: &str) -> RepositoryResult<usize>;
}

/// DynamoDB implementation of the CartRepository trait
pub struct DynamoDbCartRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbCartRepository {
    /// Create a new DynamoDB cart repository
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Convert a CartItem struct to DynamoDB attribute values
    pub fn cart_item_to_item(&self, cart_item: &CartItem) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert(
            "user_id".to_string(),
            AttributeValue::S(cart_item.user_id.clone()),
        );
        item.insert(
            "product_id".to_string(),
            AttributeValue::S(cart_item.product_id.clone()),
        );
        item.insert(
            "quantity".to_string(),
            AttributeValue::N(cart_item.quantity.to_string()),
        );
        item.insert(
            "added_at".to_string(),
            AttributeValue::S(cart_item.added_at.to_rfc3339()),
        );

        item
    }

    /// Convert DynamoDB item to CartItem struct
    pub fn item_to_cart_item(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<CartItem> {
        let user_id = item
            .get("user_id")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing user_id".to_string(),
            })?;

        let product_id = item
            .get("product_id")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing product_id".to_string(),
            })?;

        let quantity = item
            .get("quantity")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid quantity".to_string(),
            })?;

        let added_at = item
            .get("added_at")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid added_at".to_string(),
            })?;

        Ok(CartItem {
            user_id,
            product_id,
            quantity,
            added_at,
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
impl CartRepository for DynamoDbCartRepository {
    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id, product_id = %product_id))]
    async fn find_item(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> RepositoryResult<Option<CartItem>> {
        info!("Finding cart line");

        let get_span = dynamodb_span("GetItem", &self.table_name, &self.region);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("user_id", AttributeValue::S(user_id.to_string()))
                .key("product_id", AttributeValue::S(product_id.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_cart_item(item)?)),
            None => {
                info!("Cart line not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id))]
    async fn find_items(&self, user_id: &str) -> RepositoryResult<Vec<CartItem>> {
        info!("Finding cart lines for user");

        let query_span = dynamodb_span("Query", &self.table_name, &self.region);

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("#u = :u")
                .expression_attribute_names("#u", "user_id")
                .expression_attribute_values(":u", AttributeValue::S(user_id.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(query_span)
        .await?;

        let mut items = Vec::new();
        for item in response.items.unwrap_or_default() {
            match self.item_to_cart_item(item) {
                Ok(cart_item) => items.push(cart_item),
                Err(e) => {
                    warn!("Failed to parse cart line: {}", e);
                    continue;
                }
            }
        }

        info!("Found {} cart lines", items.len());
        Ok(items)
    }

    #[instrument(skip(self, item), fields(table = %self.table_name, user_id = %item.user_id, product_id = %item.product_id))]
    async fn save_item(&self, item: CartItem) -> RepositoryResult<CartItem> {
        info!("Saving cart line");

        let attributes = self.cart_item_to_item(&item);

        let put_span = dynamodb_span("PutItem", &self.table_name, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(attributes))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        info!("Cart line saved successfully");
        Ok(item)
    }

    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id, product_id = %product_id))]
    async fn delete_item(&self, user_id: &str, product_id: &str) -> RepositoryResult<()> {
        info!("Deleting cart line");

        let delete_span = dynamodb_span("DeleteItem", &self.table_name, &self.region);

        async {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key("user_id", AttributeValue::S(user_id.to_string()))
                .key("product_id", AttributeValue::S(product_id.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))?;

            info!("Cart line deleted");
            Ok(())
        }
        .instrument(delete_span)
        .await
    }

    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id))]
    async fn delete_items(&self, user_id: &str) -> RepositoryResult<usize> {
        info!("Deleting all cart lines for user");

        let items = self.find_items(user_id).await?;

        for item in &items {
            self.delete_item(user_id, &item.product_id).await?;
        }

        info!("Deleted {} cart lines", items.len());
        Ok(items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::offline_client;

    fn create_test_cart_item() -> CartItem {
        CartItem::new("U12345678".to_string(), "P12345678".to_string(), 3)
    }

    fn create_repo() -> DynamoDbCartRepository {
        DynamoDbCartRepository::new(
            offline_client(),
            "test-cart-items".to_string(),
            "us-east-1".to_string(),
        )
    }

    #[test]
    fn test_cart_item_round_trip() {
        let repo = create_repo();
        let cart_item = create_test_cart_item();

        let item = repo.cart_item_to_item(&cart_item);
        assert!(item.contains_key("user_id"));
        assert!(item.contains_key("product_id"));
        assert!(item.contains_key("quantity"));
        assert!(item.contains_key("added_at"));

        if let Some(AttributeValue::N(quantity)) = item.get("quantity") {
            assert_eq!(quantity, "3");
        } else {
            panic!("Expected numeric value for quantity");
        }

        let converted = repo.item_to_cart_item(item).unwrap();
        assert_eq!(converted.user_id, cart_item.user_id);
        assert_eq!(converted.product_id, cart_item.product_id);
        assert_eq!(converted.quantity, 3);

        let time_diff = (converted.added_at - cart_item.added_at)
            .num_milliseconds()
            .abs();
        assert!(time_diff < 1000);
    }

    #[test]
    fn test_item_to_cart_item_missing_field() {
        let repo = create_repo();

        let mut item = HashMap::new();
        item.insert("quantity".to_string(), AttributeValue::N("3".to_string()));

        let result = repo.item_to_cart_item(item);
        assert!(result.is_err());

        match result.unwrap_err() {
            RepositoryError::InvalidQuery { message } => {
                assert!(message.contains("Missing user_id"));
            }
            _ => panic!("Expected InvalidQuery error"),
        }
    }

    #[test]
    fn test_item_to_cart_item_invalid_quantity() {
        let repo = create_repo();
        let cart_item = create_test_cart_item();

        let mut item = repo.cart_item_to_item(&cart_item);
        item.insert(
            "quantity".to_string(),
            AttributeValue::S("three".to_string()),
        );

        let result = repo.item_to_cart_item(item);
        assert!(result.is_err());
    }

    #[test]
    fn test_repository_creation() {
        let repo = create_repo();
        assert_eq!(repo.table_name(), "test-cart-items");
    }
}
