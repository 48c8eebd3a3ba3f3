use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{
    LoginRequest, ServiceError, ServiceResult, SignupRequest, UpdateProfileRequest, User,
    UserIdResponse, UserResponse, Validate,
};
use crate::repositories::UserRepository;

/// Service for account management: profiles, signup, and login
pub struct AccountService {
    user_repository: Arc<dyn UserRepository>,
}

impl AccountService {
    /// Create a new AccountService
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    /// Get a user's profile, without the password hash
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_profile(&self, user_id: &str) -> ServiceResult<UserResponse> {
        info!("Getting profile");

        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound {
                user_id: user_id.to_string(),
            })?;

        Ok(user.to_response())
    }

    /// Overwrite the three profile fields and return the updated record.
    /// Fields absent from the request are written as empty.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> ServiceResult<UserResponse> {
        info!("Updating profile");

        let mut user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound {
                user_id: user_id.to_string(),
            })?;

        user.apply_profile_update(request);
        let updated = self.user_repository.save(user).await?;

        info!("Profile updated successfully");
        Ok(updated.to_response())
    }

    /// Register a new account. The phone number must not already be in use;
    /// the check is a lookup rather than a store-level uniqueness constraint.
    #[instrument(skip(self, request))]
    pub async fn signup(&self, request: SignupRequest) -> ServiceResult<UserIdResponse> {
        info!("Processing signup");

        request.validate()?;

        if self
            .user_repository
            .find_by_phone_number(&request.phone_number)
            .await?
            .is_some()
        {
            warn!("Signup rejected: phone number already registered");
            return Err(ServiceError::PhoneNumberInUse {
                phone_number: request.phone_number,
            });
        }

        let password_hash = hash_password(&request.password)?;
        let user = User::new(request.phone_number, password_hash);
        let created = self.user_repository.save(user).await?;

        info!("Signup completed");
        Ok(UserIdResponse {
            user_id: created.id,
        })
    }

    /// Authenticate by phone number and password. Both failure causes — an
    /// unknown number and a wrong password — return the same error so the
    /// response does not reveal which check failed. Success returns the bare
    /// user identifier; no session or token is issued.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<UserIdResponse> {
        info!("Processing login");

        request.validate()?;

        let user = self
            .user_repository
            .find_by_phone_number(&request.phone_number)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        verify_password(&request.password, &user.password_hash)?;

        info!("Login succeeded");
        Ok(UserIdResponse { user_id: user.id })
    }
}

/// Hash a password using Argon2id with a fresh random salt
fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ServiceError::PasswordHash)
}

/// Verify a password against a stored hash
fn verify_password(password: &str, hash: &str) -> ServiceResult<()> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| ServiceError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ServiceError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryError;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, RepositoryError>;
            async fn find_by_phone_number(&self, phone_number: &str) -> Result<Option<User>, RepositoryError>;
            async fn find_by_ids(&self, user_ids: &[String]) -> Result<Vec<User>, RepositoryError>;
            async fn save(&self, user: User) -> Result<User, RepositoryError>;
        }
    }

    fn create_test_user(password: &str) -> User {
        let hash = hash_password(password).unwrap();
        User::new("5551234567".to_string(), hash)
    }

    #[tokio::test]
    async fn test_signup_success() {
        let mut mock_repo = MockTestUserRepository::new();

        mock_repo
            .expect_find_by_phone_number()
            .with(mockall::predicate::eq("5551234567"))
            .times(1)
            .returning(|_| Ok(None));

        mock_repo
            .expect_save()
            .times(1)
            .returning(|user| Ok(user));

        let service = AccountService::new(Arc::new(mock_repo));

        let result = service
            .signup(SignupRequest {
                phone_number: "5551234567".to_string(),
                password: "hunter22".to_string(),
            })
            .await;

        assert!(result.is_ok());
        assert!(result.unwrap().user_id.starts_with('U'));
    }

    #[tokio::test]
    async fn test_signup_conflict_regardless_of_password() {
        // An existing phone number must be rejected for every password
        for password in ["hunter22", "totally-different-password"] {
            let mut mock_repo = MockTestUserRepository::new();
            let existing = create_test_user("original-password");

            mock_repo
                .expect_find_by_phone_number()
                .times(1)
                .returning(move |_| Ok(Some(existing.clone())));

            let service = AccountService::new(Arc::new(mock_repo));

            let result = service
                .signup(SignupRequest {
                    phone_number: "5551234567".to_string(),
                    password: password.to_string(),
                })
                .await;

            match result.unwrap_err() {
                ServiceError::PhoneNumberInUse { phone_number } => {
                    assert_eq!(phone_number, "5551234567");
                }
                other => panic!("Expected PhoneNumberInUse, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let mock_repo = MockTestUserRepository::new();
        let service = AccountService::new(Arc::new(mock_repo));

        let result = service
            .signup(SignupRequest {
                phone_number: "5551234567".to_string(),
                password: "abc".to_string(),
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ValidationError { .. }
        ));
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut mock_repo = MockTestUserRepository::new();
        let user = create_test_user("hunter22");
        let user_id = user.id.clone();

        mock_repo
            .expect_find_by_phone_number()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = AccountService::new(Arc::new(mock_repo));

        let result = service
            .login(LoginRequest {
                phone_number: "5551234567".to_string(),
                password: "hunter22".to_string(),
            })
            .await;

        assert_eq!(result.unwrap().user_id, user_id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        // Unknown phone number
        let mut mock_repo = MockTestUserRepository::new();
        mock_repo
            .expect_find_by_phone_number()
            .times(1)
            .returning(|_| Ok(None));

        let service = AccountService::new(Arc::new(mock_repo));
        let unknown_user_err = service
            .login(LoginRequest {
                phone_number: "5550000000".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap_err();

        // Wrong password for an existing account
        let mut mock_repo = MockTestUserRepository::new();
        let user = create_test_user("hunter22");
        mock_repo
            .expect_find_by_phone_number()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = AccountService::new(Arc::new(mock_repo));
        let wrong_password_err = service
            .login(LoginRequest {
                phone_number: "5551234567".to_string(),
                password: "not-the-password".to_string(),
            })
            .await
            .unwrap_err();

        // The two failures must carry the identical message
        assert_eq!(unknown_user_err.to_string(), wrong_password_err.to_string());
        assert!(matches!(unknown_user_err, ServiceError::InvalidCredentials));
        assert!(matches!(
            wrong_password_err,
            ServiceError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_get_profile_not_found() {
        let mut mock_repo = MockTestUserRepository::new();
        mock_repo
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = AccountService::new(Arc::new(mock_repo));

        let result = service.get_profile("U00000000").await;
        assert!(matches!(
            result.unwrap_err(),
            ServiceError::UserNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_update_profile_overwrites_absent_fields() {
        let mut mock_repo = MockTestUserRepository::new();
        let mut user = create_test_user("hunter22");
        user.full_name = "Old Name".to_string();
        user.city = "Old City".to_string();
        let user_id = user.id.clone();

        mock_repo
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        mock_repo
            .expect_save()
            .times(1)
            .returning(|user| Ok(user));

        let service = AccountService::new(Arc::new(mock_repo));

        let response = service
            .update_profile(
                &user_id,
                UpdateProfileRequest {
                    full_name: Some("New Name".to_string()),
                    city: None,
                    location: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(response.full_name, "New Name");
        assert!(response.city.is_empty());
        assert!(response.location.is_empty());
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password("hunter22", &hash).is_ok());
        assert!(verify_password("wrong", &hash).is_err());

        // A second hash of the same password uses a different salt
        let second = hash_password("hunter22").unwrap();
        assert_ne!(hash, second);
    }
}
