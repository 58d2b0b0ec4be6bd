use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

const ASSOCIATE_COLUMNS: &str = "id, name, description, address, phone, maps_url, web_text, \
     web_url, social_text, social_url, logo_url, is_active, created_at, updated_at";

/// Merchant enrolled in the loyalty program.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Associate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub maps_url: Option<String>,
    pub web_text: Option<String>,
    pub web_url: Option<String>,
    pub social_text: Option<String>,
    pub social_url: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub struct NewAssociate {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub maps_url: Option<String>,
    pub web_text: Option<String>,
    pub web_url: Option<String>,
    pub social_text: Option<String>,
    pub social_url: Option<String>,
    pub logo_url: Option<String>,
}

impl Associate {
    /// Lookup restricted to active rows: an inactive associate is served
    /// exactly like a missing one.
    pub async fn find_active(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Associate>> {
        let associate = sqlx::query_as::<_, Associate>(&format!(
            "SELECT {ASSOCIATE_COLUMNS} FROM associates WHERE id = $1 AND is_active = true"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(associate)
    }

    pub async fn list_active(
        db: &PgPool,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Associate>> {
        let rows = sqlx::query_as::<_, Associate>(&format!(
            "SELECT {ASSOCIATE_COLUMNS} FROM associates
             WHERE is_active = true
             ORDER BY name
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(db: &PgPool, new: &NewAssociate) -> Result<Associate, sqlx::Error> {
        sqlx::query_as::<_, Associate>(&format!(
            "INSERT INTO associates
                 (name, description, address, phone, maps_url, web_text, web_url,
                  social_text, social_url, logo_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {ASSOCIATE_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.maps_url)
        .bind(&new.web_text)
        .bind(&new.web_url)
        .bind(&new.social_text)
        .bind(&new.social_url)
        .bind(&new.logo_url)
        .fetch_one(db)
        .await
    }

    pub async fn update(db: &PgPool, id: Uuid, new: &NewAssociate) -> Result<Associate, sqlx::Error> {
        sqlx::query_as::<_, Associate>(&format!(
            "UPDATE associates
             SET name = $2, description = $3, address = $4, phone = $5, maps_url = $6,
                 web_text = $7, web_url = $8, social_text = $9, social_url = $10,
                 logo_url = $11, updated_at = now()
             WHERE id = $1
             RETURNING {ASSOCIATE_COLUMNS}"
        ))
        .bind(id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.maps_url)
        .bind(&new.web_text)
        .bind(&new.web_url)
        .bind(&new.social_text)
        .bind(&new.social_url)
        .bind(&new.logo_url)
        .fetch_one(db)
        .await
    }

    /// Soft delete: the merchant disappears from listings and stops
    /// accepting participations.
    pub async fn deactivate(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
        let result =
            sqlx::query("UPDATE associates SET is_active = false, updated_at = now() WHERE id = $1")
                .bind(id)
                .execute(db)
                .await?;
        Ok(result.rows_affected())
    }
}
