use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered account, keyed by a generated user id.
///
/// The phone number doubles as the login identifier. The password hash is
/// never serialized; clients only ever see a [`UserResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub city: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request model for signup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub phone_number: String,
    pub password: String,
}

/// Request model for login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

/// Request model for profile updates; absent fields are written as empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub city: Option<String>,
    pub location: Option<String>,
}

/// Response model carrying only the user identifier (signup and login)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdResponse {
    pub user_id: String,
}

/// User record as exposed to clients, without the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub phone_number: String,
    pub full_name: String,
    pub city: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with a generated ID and timestamps.
    /// Profile fields start empty and are filled in via profile update.
    pub fn new(phone_number: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: format!(
                "U{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            phone_number,
            password_hash,
            full_name: String::new(),
            city: String::new(),
            location: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the three profile fields from an update request.
    /// Absent fields are written as empty, mirroring the store's overwrite
    /// semantics rather than a merge.
    pub fn apply_profile_update(&mut self, request: UpdateProfileRequest) {
        self.full_name = request.full_name.unwrap_or_default();
        self.city = request.city.unwrap_or_default();
        self.location = request.location.unwrap_or_default();
        self.updated_at = Utc::now();
    }

    /// Convert to the client-facing representation
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id.clone(),
            phone_number: self.phone_number.clone(),
            full_name: self.full_name.clone(),
            city: self.city.clone(),
            location: self.location.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user() -> User {
        User::new("5551234567".to_string(), "$argon2id$stub".to_string())
    }

    #[test]
    fn test_user_creation() {
        let user = create_test_user();

        assert!(user.id.starts_with('U'));
        assert_eq!(user.id.len(), 9);
        assert_eq!(user.phone_number, "5551234567");
        assert!(user.full_name.is_empty());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_profile_update_overwrites_all_three_fields() {
        let mut user = create_test_user();
        user.full_name = "Old Name".to_string();
        user.city = "Old City".to_string();

        // Only full_name provided; city and location must be blanked
        user.apply_profile_update(UpdateProfileRequest {
            full_name: Some("New Name".to_string()),
            city: None,
            location: None,
        });

        assert_eq!(user.full_name, "New Name");
        assert!(user.city.is_empty());
        assert!(user.location.is_empty());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = create_test_user();

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2id"));

        let response_json = serde_json::to_string(&user.to_response()).unwrap();
        assert!(!response_json.contains("password"));
    }

    #[test]
    fn test_to_response_preserves_fields() {
        let mut user = create_test_user();
        user.full_name = "Jordan Chen".to_string();
        user.city = "Lagos".to_string();
        user.location = "12 Marina Road".to_string();

        let response = user.to_response();

        assert_eq!(response.id, user.id);
        assert_eq!(response.phone_number, user.phone_number);
        assert_eq!(response.full_name, "Jordan Chen");
        assert_eq!(response.city, "Lagos");
        assert_eq!(response.location, "12 Marina Road");
    }

    #[test]
    fn test_update_request_deserialization() {
        let json = r#"{"fullName": "Sam", "city": "Accra"}"#;
        let request: UpdateProfileRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.full_name, Some("Sam".to_string()));
        assert_eq!(request.city, Some("Accra".to_string()));
        assert_eq!(request.location, None);
    }
}
