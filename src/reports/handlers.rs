use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::Date;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::error::ApiError;
use crate::reports::repo::{self, AssociateSummary, ParticipationRecord, ReportFilter};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/participations", get(participation_report))
        .route("/reports/participations/summary", get(summary_report))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub user_id: Option<Uuid>,
    pub associate_id: Option<Uuid>,
    pub from: Option<Date>,
    pub to: Option<Date>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

#[instrument(skip(state, _user))]
pub async fn participation_report(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(q): Query<ReportQuery>,
) -> Result<Json<Vec<ParticipationRecord>>, ApiError> {
    let filter = ReportFilter {
        user_id: q.user_id,
        associate_id: q.associate_id,
        from: q.from,
        to: q.to,
    };
    let rows = repo::participation_records(&state.db, &filter, q.limit, q.offset).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, _user))]
pub async fn summary_report(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(q): Query<ReportQuery>,
) -> Result<Json<Vec<AssociateSummary>>, ApiError> {
    let rows = repo::associate_summary(&state.db, q.from, q.to).await?;
    Ok(Json(rows))
}
