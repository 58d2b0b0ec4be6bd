use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

const PARTICIPATION_COLUMNS: &str =
    "id, user_id, associate_id, ticket_number, ticket_date, total_amount, created_at";

/// One submitted purchase ticket.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub associate_id: Uuid,
    pub ticket_number: String,
    pub ticket_date: Date,
    pub total_amount: Decimal,
    pub created_at: OffsetDateTime,
}

/// The daily-quota decision: a user holding `existing` participations on
/// a ticket date may not add another once the limit is reached.
pub(crate) fn quota_reached(existing: i64, limit: i64) -> bool {
    existing >= limit
}

/// Optional filters for listing a user's participations.
#[derive(Debug, Default)]
pub struct ParticipationFilter {
    pub associate_id: Option<Uuid>,
    pub ticket_number: Option<String>,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl Participation {
    pub async fn find_duplicate(
        db: &PgPool,
        ticket_number: &str,
        associate_id: Uuid,
    ) -> anyhow::Result<Option<Participation>> {
        let row = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM participations
             WHERE ticket_number = $1 AND associate_id = $2"
        ))
        .bind(ticket_number)
        .bind(associate_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Insert guarded by the per-user daily quota. A per-user advisory
    /// lock serializes concurrent submissions from the same user, so the
    /// count-then-insert cannot oversubscribe the quota. The quota is
    /// keyed by ticket date, not submission time. Returns `None` when the
    /// quota is already used up. The UNIQUE (ticket_number, associate_id)
    /// constraint remains the authoritative duplicate guard, surfacing as
    /// `sqlx::Error`.
    pub async fn insert_admitted(
        db: &PgPool,
        user_id: Uuid,
        associate_id: Uuid,
        ticket_number: &str,
        ticket_date: Date,
        total_amount: Decimal,
        daily_limit: i64,
    ) -> Result<Option<Participation>, sqlx::Error> {
        let mut tx = db.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM participations WHERE user_id = $1 AND ticket_date = $2",
        )
        .bind(user_id)
        .bind(ticket_date)
        .fetch_one(&mut *tx)
        .await?;

        if quota_reached(existing, daily_limit) {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, Participation>(&format!(
            "INSERT INTO participations
                 (user_id, associate_id, ticket_number, ticket_date, total_amount)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PARTICIPATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(associate_id)
        .bind(ticket_number)
        .bind(ticket_date)
        .bind(total_amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(row))
    }

    pub async fn list_for_user(
        db: &PgPool,
        user_id: Uuid,
        filter: &ParticipationFilter,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Participation>> {
        let rows = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM participations
             WHERE user_id = $1
               AND ($2::uuid IS NULL OR associate_id = $2)
               AND ($3::text IS NULL OR ticket_number ILIKE '%' || $3 || '%')
               AND ($4::date IS NULL OR ticket_date >= $4)
               AND ($5::date IS NULL OR ticket_date <= $5)
             ORDER BY created_at DESC
             LIMIT $6 OFFSET $7"
        ))
        .bind(user_id)
        .bind(filter.associate_id)
        .bind(&filter.ticket_number)
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Participation>> {
        let row = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM participations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}
