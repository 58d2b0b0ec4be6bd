use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::dto::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RefreshRequest,
    RegisterRequest, ResetPasswordRequest, ResetTokenValidity,
};
use crate::auth::extractors::AuthUser;
use crate::auth::service;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::UserProfile;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_me))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/validate-reset-token/:token", get(validate_reset_token))
        .route("/auth/reset-password", post(reset_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let response = service::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = service::login(&state, payload).await?;
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = service::refresh(&state, &payload.refresh_token).await?;
    Ok(Json(response))
}

/// Tokens are stateless; logout is an acknowledgement for the client.
#[instrument(skip(_user))]
pub async fn logout(AuthUser(_user): AuthUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Session closed".into(),
    })
}

#[instrument(skip(user))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(user))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    service::request_password_reset(&state, &payload.email).await?;
    Ok(Json(MessageResponse {
        message: service::RESET_REQUESTED_MESSAGE.into(),
    }))
}

#[instrument(skip(state))]
pub async fn validate_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ResetTokenValidity>, ApiError> {
    match service::validate_reset_credential(&state, &token).await {
        Ok(_) => Ok(Json(ResetTokenValidity {
            valid: true,
            message: "Token is valid".into(),
        })),
        Err(e @ (ApiError::NotFound(_) | ApiError::InvalidInput(_))) => {
            Ok(Json(ResetTokenValidity {
                valid: false,
                message: e.to_string(),
            }))
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    service::complete_reset(&state, &payload.token, &payload.password).await?;
    Ok(Json(MessageResponse {
        message: "Password reset successfully".into(),
    }))
}
