use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::models::{RepositoryError, RepositoryResult};

/// Manages DynamoDB table creation and configuration for the four
/// collections: users, products, cart items, and orders
pub struct TableManager {
    client: Arc<DynamoDbClient>,
}

impl TableManager {
    /// Create a new table manager
    pub fn new(client: Arc<DynamoDbClient>) -> Self {
        Self { client }
    }

    /// Create the users table with the PhoneNumberIndex GSI that backs
    /// signup uniqueness checks and login lookups
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn create_users_table(&self, table_name: &str) -> RepositoryResult<()> {
        info!("Creating users table");

        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        let attribute_definitions = vec![
            string_attribute("user_id")?,
            string_attribute("phone_number")?,
        ];

        let key_schema = vec![hash_key("user_id")?];

        let phone_number_gsi = GlobalSecondaryIndex::builder()
            .index_name("PhoneNumberIndex")
            .key_schema(hash_key("phone_number")?)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::All)
                    .build(),
            )
            .build()
            .map_err(|e| RepositoryError::AwsSdk {
                message: format!("Failed to build GSI: {}", e),
            })?;

        self.client
            .create_table()
            .table_name(table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .global_secondary_indexes(phone_number_gsi)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(table_name).await?;
        info!("Users table created successfully");

        Ok(())
    }

    /// Create the products table
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn create_products_table(&self, table_name: &str) -> RepositoryResult<()> {
        info!("Creating products table");

        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        let attribute_definitions = vec![string_attribute("product_id")?];
        let key_schema = vec![hash_key("product_id")?];

        self.client
            .create_table()
            .table_name(table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(table_name).await?;
        info!("Products table created successfully");

        Ok(())
    }

    /// Create the cart items table, keyed by (user_id, product_id) so each
    /// pair holds at most one line
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn create_cart_items_table(&self, table_name: &str) -> RepositoryResult<()> {
        info!("Creating cart items table");

        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        let attribute_definitions = vec![
            string_attribute("user_id")?,
            string_attribute("product_id")?,
        ];

        let key_schema = vec![hash_key("user_id")?, range_key("product_id")?];

        self.client
            .create_table()
            .table_name(table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(table_name).await?;
        info!("Cart items table created successfully");

        Ok(())
    }

    /// Create the orders table with the UserOrdersIndex GSI that backs the
    /// per-user order listing
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn create_orders_table(&self, table_name: &str) -> RepositoryResult<()> {
        info!("Creating orders table");

        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        let attribute_definitions =
            vec![string_attribute("order_id")?, string_attribute("user_id")?];

        let key_schema = vec![hash_key("order_id")?];

        let user_orders_gsi = GlobalSecondaryIndex::builder()
            .index_name("UserOrdersIndex")
            .key_schema(hash_key("user_id")?)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::All)
                    .build(),
            )
            .build()
            .map_err(|e| RepositoryError::AwsSdk {
                message: format!("Failed to build GSI: {}", e),
            })?;

        self.client
            .create_table()
            .table_name(table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .global_secondary_indexes(user_orders_gsi)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(table_name).await?;
        info!("Orders table created successfully");

        Ok(())
    }

    /// Check if a table exists
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn table_exists(&self, table_name: &str) -> RepositoryResult<bool> {
        match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let error_string = e.to_string();
                let error_debug = format!("{:?}", e);

                if error_string.contains("ResourceNotFoundException")
                    || error_string.contains("Requested resource not found")
                    || error_debug.contains("ResourceNotFoundException")
                {
                    info!("Table {} does not exist", table_name);
                    Ok(false)
                } else {
                    error!("Error checking table existence: {}", e);
                    Err(RepositoryError::ConnectionFailed)
                }
            }
        }
    }

    /// Wait for a table to become active
    #[instrument(skip(self), fields(table_name = %table_name))]
    async fn wait_for_table_active(&self, table_name: &str) -> RepositoryResult<()> {
        let mut attempts = 0;
        let max_attempts = 30;
        let wait_duration = Duration::from_secs(10);

        loop {
            match self
                .client
                .describe_table()
                .table_name(table_name)
                .send()
                .await
            {
                Ok(response) => {
                    if let Some(table) = response.table {
                        match table.table_status {
                            Some(TableStatus::Active) => {
                                info!("Table {} is now active", table_name);
                                return Ok(());
                            }
                            Some(status) => {
                                info!("Table {} status: {:?}, waiting...", table_name, status);
                            }
                            None => {
                                warn!("Table {} status unknown, waiting...", table_name);
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Error checking table status: {}", e);
                    return Err(self.map_dynamodb_error(e.into()));
                }
            }

            attempts += 1;
            if attempts >= max_attempts {
                error!("Timeout waiting for table {} to become active", table_name);
                return Err(RepositoryError::Timeout);
            }

            tokio::time::sleep(wait_duration).await;
        }
    }

    /// Delete a table (for testing/cleanup)
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn delete_table(&self, table_name: &str) -> RepositoryResult<()> {
        info!("Deleting table");

        if !self.table_exists(table_name).await? {
            info!("Table {} does not exist, nothing to delete", table_name);
            return Ok(());
        }

        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Table {} deletion initiated", table_name);
        Ok(())
    }

    /// Create all four tables (convenience method for startup provisioning)
    #[instrument(skip_all)]
    pub async fn create_all_tables(
        &self,
        users_table: &str,
        products_table: &str,
        cart_items_table: &str,
        orders_table: &str,
    ) -> RepositoryResult<()> {
        info!("Creating all tables");

        let (users_result, products_result, cart_items_result, orders_result) = tokio::join!(
            self.create_users_table(users_table),
            self.create_products_table(products_table),
            self.create_cart_items_table(cart_items_table),
            self.create_orders_table(orders_table),
        );

        users_result?;
        products_result?;
        cart_items_result?;
        orders_result?;

        info!("All tables created successfully");
        Ok(())
    }

    /// Convert DynamoDB error to RepositoryError
    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);
        RepositoryError::AwsSdk {
            message: error.to_string(),
        }
    }
}

fn string_attribute(name: &str) -> RepositoryResult<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| RepositoryError::AwsSdk {
            message: format!("Failed to build attribute definition: {}", e),
        })
}

fn hash_key(name: &str) -> RepositoryResult<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| RepositoryError::AwsSdk {
            message: format!("Failed to build key schema: {}", e),
        })
}

fn range_key(name: &str) -> RepositoryResult<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(KeyType::Range)
        .build()
        .map_err(|e| RepositoryError::AwsSdk {
            message: format!("Failed to build key schema: {}", e),
        })
}
