use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

const CAMPAIGN_COLUMNS: &str =
    "id, name, description, image_url, is_active, starts_at, ends_at, created_at, updated_at";

/// Promotional campaign. The active flag gates visibility; the optional
/// start and end dates bound when the campaign is considered running.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub starts_at: Option<OffsetDateTime>,
    pub ends_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub struct NewCampaign {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub starts_at: Option<OffsetDateTime>,
    pub ends_at: Option<OffsetDateTime>,
}

/// Optional filters for listing campaigns.
#[derive(Debug, Default)]
pub struct CampaignFilter {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl Campaign {
    /// Whether the campaign is running at `now`: it must be active, and
    /// `now` must fall inside the start/end bounds where they are set.
    /// A missing bound is open on that side.
    pub fn is_running(&self, now: OffsetDateTime) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(starts_at) = self.starts_at {
            if now < starts_at {
                return false;
            }
        }
        if let Some(ends_at) = self.ends_at {
            if now > ends_at {
                return false;
            }
        }
        true
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Campaign>> {
        let row = sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<Campaign>> {
        let row = sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list(
        db: &PgPool,
        filter: &CampaignFilter,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Campaign>> {
        let rows = sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
               AND ($2::bool IS NULL OR is_active = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(&filter.name)
        .bind(filter.is_active)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<Campaign>> {
        let rows = sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns
             WHERE is_active = true
             ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Insert a new campaign. The unique name constraint bubbles up as
    /// `sqlx::Error` for the caller to map to a conflict.
    pub async fn create(db: &PgPool, new: &NewCampaign) -> Result<Campaign, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(&format!(
            "INSERT INTO campaigns
                 (name, description, image_url, is_active, starts_at, ends_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {CAMPAIGN_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.image_url)
        .bind(new.is_active)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .fetch_one(db)
        .await
    }

    pub async fn update(db: &PgPool, id: Uuid, new: &NewCampaign) -> Result<Campaign, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(&format!(
            "UPDATE campaigns
             SET name = $2, description = $3, image_url = $4, is_active = $5,
                 starts_at = $6, ends_at = $7, updated_at = now()
             WHERE id = $1
             RETURNING {CAMPAIGN_COLUMNS}"
        ))
        .bind(id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.image_url)
        .bind(new.is_active)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .fetch_one(db)
        .await
    }

    pub async fn set_active(db: &PgPool, id: Uuid, is_active: bool) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "UPDATE campaigns SET is_active = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(is_active)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn campaign(
        is_active: bool,
        starts_at: Option<OffsetDateTime>,
        ends_at: Option<OffsetDateTime>,
    ) -> Campaign {
        let now = OffsetDateTime::now_utc();
        Campaign {
            id: Uuid::new_v4(),
            name: "Summer 2025".into(),
            description: None,
            image_url: None,
            is_active,
            starts_at,
            ends_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn running_requires_active_flag() {
        let now = OffsetDateTime::now_utc();
        assert!(campaign(true, None, None).is_running(now));
        assert!(!campaign(false, None, None).is_running(now));
    }

    #[test]
    fn running_respects_date_bounds() {
        let now = OffsetDateTime::now_utc();
        let yesterday = now - Duration::days(1);
        let tomorrow = now + Duration::days(1);

        assert!(campaign(true, Some(yesterday), Some(tomorrow)).is_running(now));
        // not started yet
        assert!(!campaign(true, Some(tomorrow), None).is_running(now));
        // already over
        assert!(!campaign(true, None, Some(yesterday)).is_running(now));
        // open bounds
        assert!(campaign(true, Some(yesterday), None).is_running(now));
        assert!(campaign(true, None, Some(tomorrow)).is_running(now));
    }

    #[test]
    fn running_boundaries_are_inclusive() {
        let now = OffsetDateTime::now_utc();
        assert!(campaign(true, Some(now), None).is_running(now));
        assert!(campaign(true, None, Some(now)).is_running(now));
    }
}
