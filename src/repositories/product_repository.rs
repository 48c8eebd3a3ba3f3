use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use chrono::DateTime;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use crate::models::{Product, RepositoryError, RepositoryResult};

use super::dynamodb_span;

/// Trait defining the interface for product data access operations
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Find all products (catalog listing; ordering is applied by the caller)
    async fn find_all(&self) -> RepositoryResult<Vec<Product>>;

    /// Find a product by its ID
    async fn find_by_id(&self, product_id: &str) -> RepositoryResult<Option<Product>>;

    /// Batch-fetch products by identifier for read-side expansion
    async fn find_by_ids(&self, product_ids: &[String]) -> RepositoryResult<Vec<Product>>;

    /// Save a product (create or overwrite)
    async fn save(&self, product: Product) -> RepositoryResult<Product>;
}

/// DynamoDB implementation of the ProductRepository trait
pub struct DynamoDbProductRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbProductRepository {
    /// Create a new DynamoDB product repository
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

    /// Convert a Product struct to DynamoDB attribute values
    pub fn product_to_item(&self, product: &Product) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert(
            "product_id".to_string(),
            AttributeValue::S(product.id.clone()),
        );
        item.insert("name".to_string(), AttributeValue::S(product.name.clone()));
        item.insert(
            "description".to_string(),
            AttributeValue::S(product.description.clone()),
        );
        item.insert(
            "price".to_string(),
            AttributeValue::N(product.price.to_string()),
        );
        item.insert(
            "category".to_string(),
            AttributeValue::S(product.category.clone()),
        );
        item.insert(
            "image_url".to_string(),
            AttributeValue::S(product.image_url.clone()),
        );
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(product.created_at.to_rfc3339()),
        );

        item
    }

    /// Convert DynamoDB item to Product struct
    pub fn item_to_product(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<Product> {
        let id = item
            .get("product_id")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing product_id".to_string(),
            })?;

        let name = item
            .get("name")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing name".to_string(),
            })?;

        let description = item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default();

        let price = item
            .get("price")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| Decimal::from_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid price".to_string(),
            })?;

        let category = item
            .get("category")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default();

        let image_url = item
            .get("image_url")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Missing image_url".to_string(),
            })?;

        let created_at = item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid created_at".to_string(),
            })?;

        Ok(Product {
            id,
            name,
            description,
            price,
            category,
            image_url,
            created_at,
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
impl ProductRepository for DynamoDbProductRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        info!("Finding all products");

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

        let mut products = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_product(item) {
                    Ok(product) => products.push(product),
                    Err(e) => {
                        warn!("Failed to parse product item: {}", e);
                        continue;
                    }
                }
            }
        }

        info!("Found {} products", products.len());
        Ok(products)
    }

    #[instrument(skip(self), fields(table = %self.table_name, product_id = %product_id))]
    async fn find_by_id(&self, product_id: &str) -> RepositoryResult<Option<Product>> {
        info!("Finding product by id");

        let get_span = dynamodb_span("GetItem", &self.table_name, &self.region);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("product_id", AttributeValue::S(product_id.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_product(item)?)),
            None => {
                info!("Product not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, product_ids), fields(table = %self.table_name, count = product_ids.len()))]
    async fn find_by_ids(&self, product_ids: &[String]) -> RepositoryResult<Vec<Product>> {
        info!("Batch-fetching products");

        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for product_id in product_ids {
            let mut key = HashMap::new();
            key.insert(
                "product_id".to_string(),
                AttributeValue::S(product_id.clone()),
            );
            keys.push(key);
        }

        let keys_and_attributes = KeysAndAttributes::builder()
            .set_keys(Some(keys))
            .build()
            .map_err(|e| RepositoryError::InvalidQuery {
                message: format!("Failed to build batch keys: {}", e),
            })?;

        let batch_span = dynamodb_span("BatchGetItem", &self.table_name, &self.region);

        let response = async {
            self.client
                .batch_get_item()
                .request_items(&self.table_name, keys_and_attributes)
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(batch_span)
        .await?;

        let mut products = Vec::new();
        if let Some(mut tables) = response.responses {
            if let Some(items) = tables.remove(&self.table_name) {
                for item in items {
                    match self.item_to_product(item) {
                        Ok(product) => products.push(product),
                        Err(e) => {
                            warn!("Failed to parse product item: {}", e);
                            continue;
                        }
                    }
                }
            }
        }

        info!("Found {} products", products.len());
        Ok(products)
    }

    #[instrument(skip(self, product), fields(table = %self.table_name, product_id = %product.id))]
    async fn save(&self, product: Product) -> RepositoryResult<Product> {
        info!("Saving product");

        let item = self.product_to_item(&product);

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

        info!("Product saved successfully");
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateProductRequest;
    use crate::repositories::test_support::offline_client;
    use rust_decimal_macros::dec;

    fn create_test_product() -> Product {
        Product::new(
            CreateProductRequest {
                name: "Jollof Rice Bowl".to_string(),
                description: "Smoky party-style jollof".to_string(),
                price: dec!(10.00),
                category: "meals".to_string(),
            },
            "https://media.example.com/storefront/jollof.jpg".to_string(),
        )
    }

    fn create_repo() -> DynamoDbProductRepository {
        DynamoDbProductRepository::new(
            offline_client(),
            "test-products".to_string(),
            "us-east-1".to_string(),
        )
    }

    #[test]
    fn test_product_item_round_trip() {
        let repo = create_repo();
        let product = create_test_product();

        let item = repo.product_to_item(&product);
        assert!(item.contains_key("product_id"));
        assert!(item.contains_key("price"));
        assert!(item.contains_key("image_url"));

        // Price must be stored as a DynamoDB number
        if let Some(AttributeValue::N(price)) = item.get("price") {
            assert_eq!(price, "10.00");
        } else {
            panic!("Expected numeric value for price");
        }

        let converted = repo.item_to_product(item).unwrap();
        assert_eq!(converted.id, product.id);
        assert_eq!(converted.price, dec!(10.00));
        assert_eq!(converted.image_url, product.image_url);
    }

    #[test]
    fn test_item_to_product_missing_price() {
        let repo = create_repo();
        let product = create_test_product();

        let mut item = repo.product_to_item(&product);
        item.remove("price");

        let result = repo.item_to_product(item);
        assert!(result.is_err());

        match result.unwrap_err() {
            RepositoryError::InvalidQuery { message } => {
                assert!(message.contains("price"));
            }
            _ => panic!("Expected InvalidQuery error"),
        }
    }

    #[test]
    fn test_item_to_product_optional_fields_default() {
        let repo = create_repo();
        let product = create_test_product();

        let mut item = repo.product_to_item(&product);
        item.remove("description");
        item.remove("category");

        let converted = repo.item_to_product(item).unwrap();
        assert!(converted.description.is_empty());
        assert!(converted.category.is_empty());
    }

    #[test]
    fn test_repository_creation() {
        let repo = create_repo();
        assert_eq!(repo.table_name(), "test-products");
    }
}
