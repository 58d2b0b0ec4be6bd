use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::campaigns::dto::{
    clone_name, CampaignQuery, CampaignRequest, CampaignStatusRequest, CloneCampaignRequest,
};
use crate::campaigns::repo::{Campaign, CampaignFilter, NewCampaign};
use crate::error::{is_unique_violation, ApiError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/campaigns", get(list_campaigns).post(create_campaign))
        .route("/campaigns/active", get(active_campaigns))
        .route(
            "/campaigns/:id",
            get(get_campaign)
                .put(update_campaign)
                .delete(deactivate_campaign),
        )
        .route("/campaigns/:id/status", post(set_campaign_status))
        .route("/campaigns/:id/clone", post(clone_campaign))
}

fn name_conflict(e: sqlx::Error) -> ApiError {
    if is_unique_violation(&e) {
        ApiError::Conflict("A campaign with this name already exists".into())
    } else {
        ApiError::from(e)
    }
}

#[instrument(skip(state, _user))]
pub async fn list_campaigns(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(q): Query<CampaignQuery>,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    let filter = CampaignFilter {
        name: q.name,
        is_active: q.is_active,
    };
    let rows = Campaign::list(&state.db, &filter, q.limit, q.offset).await?;
    Ok(Json(rows))
}

/// Campaigns currently running: active, and inside their start/end window.
#[instrument(skip(state))]
pub async fn active_campaigns(
    State(state): State<AppState>,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let rows = Campaign::list_active(&state.db)
        .await?
        .into_iter()
        .filter(|c| c.is_running(now))
        .collect::<Vec<_>>();
    Ok(Json(rows))
}

#[instrument(skip(state, _user))]
pub async fn get_campaign(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    let campaign = Campaign::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".into()))?;
    Ok(Json(campaign))
}

#[instrument(skip(state, _user, payload))]
pub async fn create_campaign(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(payload): Json<CampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let new = payload.into_new()?;
    let campaign = Campaign::create(&state.db, &new)
        .await
        .map_err(name_conflict)?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

#[instrument(skip(state, _user, payload))]
pub async fn update_campaign(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CampaignRequest>,
) -> Result<Json<Campaign>, ApiError> {
    Campaign::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".into()))?;

    let new = payload.into_new()?;
    let campaign = Campaign::update(&state.db, id, &new)
        .await
        .map_err(name_conflict)?;
    Ok(Json(campaign))
}

#[instrument(skip(state, _user))]
pub async fn set_campaign_status(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CampaignStatusRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let affected = Campaign::set_active(&state.db, id, payload.is_active).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Campaign not found".into()));
    }
    let campaign = Campaign::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".into()))?;
    Ok(Json(campaign))
}

/// Duplicate an existing campaign; the copy starts inactive.
#[instrument(skip(state, _user, payload))]
pub async fn clone_campaign(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloneCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let original = Campaign::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".into()))?;

    let new = NewCampaign {
        name: clone_name(&original.name, payload.name.as_deref()),
        description: original.description,
        image_url: original.image_url,
        is_active: false,
        starts_at: original.starts_at,
        ends_at: original.ends_at,
    };
    let campaign = Campaign::create(&state.db, &new)
        .await
        .map_err(name_conflict)?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

#[instrument(skip(state, _user))]
pub async fn deactivate_campaign(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let affected = Campaign::set_active(&state.db, id, false).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Campaign not found".into()));
    }
    Ok(Json(json!({ "message": "Campaign deactivated" })))
}
