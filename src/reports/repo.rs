use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Flat participation record joined with its user and associate, the
/// shape administrators export.
#[derive(Debug, Serialize, FromRow)]
pub struct ParticipationRecord {
    pub participation_id: Uuid,
    pub user_id: Uuid,
    pub user_full_name: String,
    pub user_email: String,
    pub user_dni: String,
    pub user_phone: Option<String>,
    pub associate_id: Uuid,
    pub associate_name: String,
    pub associate_address: Option<String>,
    pub ticket_number: String,
    pub ticket_date: Date,
    pub total_amount: Decimal,
    pub created_at: OffsetDateTime,
}

/// Per-associate totals over a date range.
#[derive(Debug, Serialize, FromRow)]
pub struct AssociateSummary {
    pub associate_id: Uuid,
    pub associate_name: String,
    pub participation_count: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Default)]
pub struct ReportFilter {
    pub user_id: Option<Uuid>,
    pub associate_id: Option<Uuid>,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

pub async fn participation_records(
    db: &PgPool,
    filter: &ReportFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ParticipationRecord>> {
    let rows = sqlx::query_as::<_, ParticipationRecord>(
        r#"
        SELECT p.id AS participation_id,
               u.id AS user_id,
               u.full_name AS user_full_name,
               u.email AS user_email,
               u.dni AS user_dni,
               u.phone AS user_phone,
               a.id AS associate_id,
               a.name AS associate_name,
               a.address AS associate_address,
               p.ticket_number,
               p.ticket_date,
               p.total_amount,
               p.created_at
        FROM participations p
        JOIN users u ON u.id = p.user_id
        JOIN associates a ON a.id = p.associate_id
        WHERE ($1::uuid IS NULL OR p.user_id = $1)
          AND ($2::uuid IS NULL OR p.associate_id = $2)
          AND ($3::date IS NULL OR p.ticket_date >= $3)
          AND ($4::date IS NULL OR p.ticket_date <= $4)
        ORDER BY p.created_at DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(filter.user_id)
    .bind(filter.associate_id)
    .bind(filter.from)
    .bind(filter.to)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn associate_summary(
    db: &PgPool,
    from: Option<Date>,
    to: Option<Date>,
) -> anyhow::Result<Vec<AssociateSummary>> {
    let rows = sqlx::query_as::<_, AssociateSummary>(
        r#"
        SELECT a.id AS associate_id,
               a.name AS associate_name,
               COUNT(p.id) AS participation_count,
               COALESCE(SUM(p.total_amount), 0) AS total_amount
        FROM associates a
        LEFT JOIN participations p
          ON p.associate_id = a.id
         AND ($1::date IS NULL OR p.ticket_date >= $1)
         AND ($2::date IS NULL OR p.ticket_date <= $2)
        GROUP BY a.id, a.name
        ORDER BY participation_count DESC, a.name
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
