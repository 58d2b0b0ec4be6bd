use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use crate::associates::dto::{AssociateRequest, Pagination};
use crate::associates::repo::Associate;
use crate::auth::extractors::AuthUser;
use crate::error::{is_unique_violation, ApiError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/associates", get(list_associates).post(create_associate))
        .route(
            "/associates/:id",
            get(get_associate)
                .put(update_associate)
                .delete(deactivate_associate),
        )
}

#[instrument(skip(state))]
pub async fn list_associates(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Associate>>, ApiError> {
    let rows = Associate::list_active(&state.db, p.limit, p.offset).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_associate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Associate>, ApiError> {
    let associate = Associate::find_active(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Associate not found".into()))?;
    Ok(Json(associate))
}

#[instrument(skip(state, _user, payload))]
pub async fn create_associate(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(payload): Json<AssociateRequest>,
) -> Result<(StatusCode, Json<Associate>), ApiError> {
    let new = payload.into_new()?;
    let associate = Associate::create(&state.db, &new).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("An associate with this name already exists".into())
        } else {
            ApiError::from(e)
        }
    })?;
    Ok((StatusCode::CREATED, Json(associate)))
}

#[instrument(skip(state, _user, payload))]
pub async fn update_associate(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssociateRequest>,
) -> Result<Json<Associate>, ApiError> {
    Associate::find_active(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Associate not found".into()))?;

    let new = payload.into_new()?;
    let associate = Associate::update(&state.db, id, &new).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("An associate with this name already exists".into())
        } else {
            ApiError::from(e)
        }
    })?;
    Ok(Json(associate))
}

#[instrument(skip(state, _user))]
pub async fn deactivate_associate(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let affected = Associate::deactivate(&state.db, id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Associate not found".into()));
    }
    Ok(Json(json!({ "message": "Associate deactivated" })))
}
