use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{
    search_term, UpdateUserRequest, UserListQuery, UserProfile, UserSearchQuery,
};
use crate::users::repo::{User, UserFilter};
use crate::users::service;

const SEARCH_RESULT_LIMIT: i64 = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/search", get(search_users))
        .route(
            "/users/me",
            get(get_profile).put(update_profile).delete(deactivate),
        )
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(deactivate_user),
        )
}

#[instrument(skip(user))]
pub async fn get_profile(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(user))
}

#[instrument(skip(state, user, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let updated = service::update_profile(&state, user.id, payload).await?;
    Ok(Json(UserProfile::from(updated)))
}

#[instrument(skip(state, user))]
pub async fn deactivate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    service::deactivate(&state, user.id).await?;
    Ok((StatusCode::OK, Json(json!({ "message": "Account deactivated" }))))
}

#[instrument(skip(state, _user))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(q): Query<UserListQuery>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let filter = UserFilter {
        full_name: q.full_name,
        dni: q.dni,
        email: q.email,
        is_active: q.is_active,
        email_verified: q.email_verified,
    };
    let rows = User::list(&state.db, &filter, q.limit, q.offset).await?;
    Ok(Json(rows.into_iter().map(UserProfile::from).collect()))
}

/// Free-text lookup across name, email and DNI. A term shorter than two
/// characters yields an empty list rather than an error.
#[instrument(skip(state, _user))]
pub async fn search_users(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(q): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let Some(term) = search_term(q.q.as_deref()) else {
        return Ok(Json(Vec::new()));
    };
    let rows = User::search(&state.db, &term, SEARCH_RESULT_LIMIT).await?;
    Ok(Json(rows.into_iter().map(UserProfile::from).collect()))
}

#[instrument(skip(state, _user))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(UserProfile::from(user)))
}

#[instrument(skip(state, _user, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let updated = service::update_profile(&state, id, payload).await?;
    Ok(Json(UserProfile::from(updated)))
}

#[instrument(skip(state, _user))]
pub async fn deactivate_user(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    service::deactivate(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
