use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::error::ApiError;
use crate::participations::dto::{CreateParticipationRequest, ParticipationQuery};
use crate::participations::repo::{Participation, ParticipationFilter};
use crate::participations::service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/participations",
            get(list_participations).post(create_participation),
        )
        .route("/participations/:id", get(get_participation))
}

#[instrument(skip(state, user, payload))]
pub async fn create_participation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateParticipationRequest>,
) -> Result<(StatusCode, Json<Participation>), ApiError> {
    let participation = service::create_participation(&state, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(participation)))
}

#[instrument(skip(state, user))]
pub async fn list_participations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<ParticipationQuery>,
) -> Result<Json<Vec<Participation>>, ApiError> {
    let filter = ParticipationFilter {
        associate_id: q.associate_id,
        ticket_number: q.ticket_number,
        from: q.from,
        to: q.to,
    };
    let rows =
        Participation::list_for_user(&state.db, user.id, &filter, q.limit, q.offset).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, user))]
pub async fn get_participation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Participation>, ApiError> {
    let participation = Participation::find_by_id(&state.db, id)
        .await?
        // someone else's row looks like a missing one
        .filter(|p| p.user_id == user.id)
        .ok_or_else(|| ApiError::NotFound("Participation not found".into()))?;
    Ok(Json(participation))
}
