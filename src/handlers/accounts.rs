use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::models::{
    LoginRequest, SignupRequest, UpdateProfileRequest, UserIdResponse, UserResponse,
};

use super::{service_error_to_response, ApiState};

/// Get a user's profile, without the password hash
#[instrument(name = "get_profile", skip(state), fields(user_id = %user_id))]
pub async fn get_profile(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, (StatusCode, Json<Value>)> {
    info!("Getting profile for user: {}", user_id);

    match state.account_service.get_profile(&user_id).await {
        Ok(profile) => {
            info!("Successfully retrieved profile");
            Ok(Json(profile))
        }
        Err(err) => {
            error!("Failed to get profile for user {}: {}", user_id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Overwrite the three mutable profile fields
#[instrument(name = "update_profile", skip(state, request), fields(user_id = %user_id))]
pub async fn update_profile(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, (StatusCode, Json<Value>)> {
    info!("Updating profile for user: {}", user_id);

    match state.account_service.update_profile(&user_id, request).await {
        Ok(profile) => {
            info!("Successfully updated profile");
            Ok(Json(profile))
        }
        Err(err) => {
            error!("Failed to update profile for user {}: {}", user_id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Register a new account
#[instrument(name = "signup", skip(state, request))]
pub async fn signup(
    State(state): State<ApiState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserIdResponse>), (StatusCode, Json<Value>)> {
    info!("Processing signup");

    match state.account_service.signup(request).await {
        Ok(response) => {
            info!("Signup succeeded for user: {}", response.user_id);
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(err) => {
            error!("Signup failed: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Authenticate and return the bare user identifier
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<ApiState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserIdResponse>, (StatusCode, Json<Value>)> {
    info!("Processing login");

    match state.account_service.login(request).await {
        Ok(response) => {
            info!("Login succeeded");
            Ok(Json(response))
        }
        Err(err) => {
            error!("Login failed: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
