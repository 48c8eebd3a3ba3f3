use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use chrono::DateTime;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use crate::models::{RepositoryError, RepositoryResult, User};

use super::dynamodb_span;

/// Trait defining the interface for user data access operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their generated identifier
    async fn find_by_id(&self, user_id: &str) -> RepositoryResult<Option<User>>;

    /// Find a user by phone number via the PhoneNumberIndex GSI
    async fn find_by_phone_number(&self, phone_number: &str) -> RepositoryResult<Option<User>>;

    /// Batch-fetch users by identifier for read-side expansion
    async fn find_by_ids(&self, user_ids: &[String]) -> RepositoryResult<Vec<User>>;

    /// Save a user (create or overwrite)
    async fn save(&self, user: User) -> RepositoryResult<User>;
}

/// DynamoDB implementation of the UserRepository trait
pub struct DynamoDbUserRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    phone_number_index: String,
    region: String,
}

impl DynamoDbUserRepository {
    /// Create a new DynamoDB user repository
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            phone_number_index: "PhoneNumberIndex".to_string(),
            region,
        }
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Convert a User struct to DynamoDB attribute values
    pub fn user_to_item(&self, user: &User) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert("user_id".to_string(), AttributeValue::S(user.id.clone()));
        item.insert(
            "phone_number".to_string(),
            AttributeValue::S(user.phone_number.clone()),
        );
        item.insert(
            "password_hash".to_string(),
            AttributeValue::S(user.password_hash.clone()),
        );
        item.insert(
            "full_name".to_string(),
            AttributeValue::S(user.full_name.clone()),
        );
        item.insert("city".to_string(), AttributeValue::S(user.city.clone()));
        item.insert(
            "location".to_string(),
            AttributeValue::S(user.location.clone()),
        );
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(user.created_at.to_rfc3339()),
        );
        item.insert(
            "updated_at".to_string(),
            AttributeValue::S(user.updated_at.to_rfc3339()),
        );

        item
    }

    /// Convert DynamoDB item to User struct
    pub fn item_to_user(&self, item: HashMap<String, AttributeValue>) -> RepositoryResult<User> {
        let id = get_string(&item, "user_id")?;
        let phone_number = get_string(&item, "phone_number")?;
        let password_hash = get_string(&item, "password_hash")?;
        let full_name = get_string(&item, "full_name").unwrap_or_default();
        let city = get_string(&item, "city").unwrap_or_default();
        let location = get_string(&item, "location").unwrap_or_default();

        let created_at = item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid created_at".to_string(),
            })?;

        let updated_at = item
            .get("updated_at")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or(created_at);

        Ok(User {
            id,
            phone_number,
            password_hash,
            full_name,
            city,
            location,
            created_at,
            updated_at,
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

fn get_string(item: &HashMap<String, AttributeValue>, key: &str) -> RepositoryResult<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| RepositoryError::InvalidQuery {
            message: format!("Missing {}", key),
        })
}

#[async_trait]
impl UserRepository for DynamoDbUserRepository {
    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id))]
    async fn find_by_id(&self, user_id: &str) -> RepositoryResult<Option<User>> {
        info!("Finding user by id");

        let get_span = dynamodb_span("GetItem", &self.table_name, &self.region);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("user_id", AttributeValue::S(user_id.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_user(item)?)),
            None => {
                info!("User not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, phone_number), fields(table = %self.table_name))]
    async fn find_by_phone_number(&self, phone_number: &str) -> RepositoryResult<Option<User>> {
        info!("Finding user by phone number");

        let query_span = dynamodb_span("Query", &self.table_name, &self.region);

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.phone_number_index)
                .key_condition_expression("#p = :p")
                .expression_attribute_names("#p", "phone_number")
                .expression_attribute_values(":p", AttributeValue::S(phone_number.to_string()))
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(e.into()))
        }
        .instrument(query_span)
        .await?;

        let user = response
            .items
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|item| self.item_to_user(item))
            .transpose()?;

        Ok(user)
    }

    #[instrument(skip(self, user_ids), fields(table = %self.table_name, count = user_ids.len()))]
    async fn find_by_ids(&self, user_ids: &[String]) -> RepositoryResult<Vec<User>> {
        info!("Batch-fetching users");

        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for user_id in user_ids {
            let mut key = HashMap::new();
            key.insert("user_id".to_string(), AttributeValue::S(user_id.clone()));
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

        let mut users = Vec::new();
        if let Some(mut tables) = response.responses {
            if let Some(items) = tables.remove(&self.table_name) {
                for item in items {
                    match self.item_to_user(item) {
                        Ok(user) => users.push(user),
                        Err(e) => {
                            warn!("Failed to parse user item: {}", e);
                            continue;
                        }
                    }
                }
            }
        }

        info!("Found {} users", users.len());
        Ok(users)
    }

    #[instrument(skip(self, user), fields(table = %self.table_name, user_id = %user.id))]
    async fn save(&self, user: User) -> RepositoryResult<User> {
        info!("Saving user");

        let item = self.user_to_item(&user);

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

        info!("User saved successfully");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::offline_client;

    fn create_test_user() -> User {
        let mut user = User::new("5551234567".to_string(), "$argon2id$stub".to_string());
        user.full_name = "Jordan Chen".to_string();
        user.city = "Lagos".to_string();
        user.location = "12 Marina Road".to_string();
        user
    }

    fn create_repo() -> DynamoDbUserRepository {
        DynamoDbUserRepository::new(
            offline_client(),
            "test-users".to_string(),
            "us-east-1".to_string(),
        )
    }

    #[test]
    fn test_user_item_round_trip() {
        let repo = create_repo();
        let user = create_test_user();

        let item = repo.user_to_item(&user);
        assert!(item.contains_key("user_id"));
        assert!(item.contains_key("phone_number"));
        assert!(item.contains_key("password_hash"));

        let converted = repo.item_to_user(item).unwrap();
        assert_eq!(converted.id, user.id);
        assert_eq!(converted.phone_number, user.phone_number);
        assert_eq!(converted.password_hash, user.password_hash);
        assert_eq!(converted.full_name, "Jordan Chen");
        assert_eq!(converted.city, "Lagos");
    }

    #[test]
    fn test_item_to_user_missing_required_field() {
        let repo = create_repo();
        let user = create_test_user();

        let mut item = repo.user_to_item(&user);
        item.remove("phone_number");

        let result = repo.item_to_user(item);
        assert!(result.is_err());

        match result.unwrap_err() {
            RepositoryError::InvalidQuery { message } => {
                assert!(message.contains("phone_number"));
            }
            _ => panic!("Expected InvalidQuery error"),
        }
    }

    #[test]
    fn test_item_to_user_missing_updated_at_falls_back() {
        let repo = create_repo();
        let user = create_test_user();

        let mut item = repo.user_to_item(&user);
        item.remove("updated_at");

        let converted = repo.item_to_user(item).unwrap();
        assert_eq!(converted.updated_at, converted.created_at);
    }

    #[test]
    fn test_repository_creation() {
        let repo = create_repo();
        assert_eq!(repo.table_name(), "test-users");
    }
}
