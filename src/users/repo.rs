use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, full_name, dni, phone, email, password_hash, email_verified, \
     is_active, last_login_at, avatar_url, reset_token, reset_token_expires_at, \
     created_at, updated_at";

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub dni: String,
    pub phone: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email_verified: bool,
    pub is_active: bool,
    pub last_login_at: Option<OffsetDateTime>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Outstanding password-reset credential. Only materialized when both the
/// token and its expiry are present, so the both-or-neither invariant is
/// checked in one place.
#[derive(Debug, Clone)]
pub struct ResetCredential {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl ResetCredential {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

pub struct NewUser {
    pub full_name: String,
    pub dni: String,
    pub phone: Option<String>,
    pub email: String,
    pub password_hash: String,
}

/// Optional filters for the user listing.
#[derive(Debug, Default)]
pub struct UserFilter {
    pub full_name: Option<String>,
    pub dni: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub email_verified: Option<bool>,
}

impl User {
    pub fn reset_credential(&self) -> Option<ResetCredential> {
        match (&self.reset_token, self.reset_token_expires_at) {
            (Some(token), Some(expires_at)) => Some(ResetCredential {
                token: token.clone(),
                expires_at,
            }),
            _ => None,
        }
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_dni(db: &PgPool, dni: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE dni = $1"
        ))
        .bind(dni)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_reset_token(db: &PgPool, token: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1"
        ))
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list(
        db: &PgPool,
        filter: &UserFilter,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE ($1::text IS NULL OR full_name ILIKE '%' || $1 || '%')
               AND ($2::text IS NULL OR dni ILIKE '%' || $2 || '%')
               AND ($3::text IS NULL OR email ILIKE '%' || $3 || '%')
               AND ($4::bool IS NULL OR is_active = $4)
               AND ($5::bool IS NULL OR email_verified = $5)
             ORDER BY created_at DESC
             LIMIT $6 OFFSET $7"
        ))
        .bind(&filter.full_name)
        .bind(&filter.dni)
        .bind(&filter.email)
        .bind(filter.is_active)
        .bind(filter.email_verified)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Free-text search across name, email and DNI, active accounts only.
    pub async fn search(db: &PgPool, term: &str, limit: i64) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE is_active = true
               AND (full_name ILIKE '%' || $1 || '%'
                    OR email ILIKE '%' || $1 || '%'
                    OR dni ILIKE '%' || $1 || '%')
             ORDER BY full_name
             LIMIT $2"
        ))
        .bind(term)
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Insert a new user. Unique violations (email, dni) bubble up as
    /// `sqlx::Error` so the caller can map them to a conflict.
    pub async fn create(db: &PgPool, new: &NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (full_name, dni, phone, email, password_hash)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new.full_name)
        .bind(&new.dni)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn update_last_login(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_login_at = now(), updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Issue a reset credential, silently discarding any prior one.
    /// Token and expiry are written together so they are never half-set.
    pub async fn set_reset_credential(
        db: &PgPool,
        id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users
             SET reset_token = $2, reset_token_expires_at = $3, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn clear_reset_credential(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users
             SET reset_token = NULL, reset_token_expires_at = NULL, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Replace the password and consume the reset credential in one write.
    pub async fn reset_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users
             SET password_hash = $2, reset_token = NULL, reset_token_expires_at = NULL,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        full_name: &str,
        dni: &str,
        phone: Option<&str>,
        email: &str,
        avatar_url: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET full_name = $2, dni = $3, phone = $4, email = $5, avatar_url = $6,
                 updated_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(full_name)
        .bind(dni)
        .bind(phone)
        .bind(email)
        .bind(avatar_url)
        .fetch_one(db)
        .await
    }

    /// Soft delete: the row stays, tokens stop validating on the next request.
    pub async fn deactivate(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET is_active = false, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn user_with(token: Option<&str>, expires: Option<OffsetDateTime>) -> User {
        User {
            id: Uuid::new_v4(),
            full_name: "Ana Pérez".into(),
            dni: "ID1".into(),
            phone: None,
            email: "a@x.com".into(),
            password_hash: "$argon2id$fake".into(),
            email_verified: false,
            is_active: true,
            last_login_at: None,
            avatar_url: None,
            reset_token: token.map(str::to_string),
            reset_token_expires_at: expires,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn reset_credential_requires_both_fields() {
        let now = OffsetDateTime::now_utc();
        assert!(user_with(None, None).reset_credential().is_none());
        assert!(user_with(Some("tok"), None).reset_credential().is_none());
        assert!(user_with(None, Some(now)).reset_credential().is_none());
        assert!(user_with(Some("tok"), Some(now)).reset_credential().is_some());
    }

    #[test]
    fn reset_credential_expiry() {
        let now = OffsetDateTime::now_utc();
        let cred = ResetCredential {
            token: "tok".into(),
            expires_at: now + Duration::hours(1),
        };
        assert!(!cred.is_expired(now));
        assert!(cred.is_expired(now + Duration::hours(1)));
        assert!(cred.is_expired(now + Duration::hours(2)));
    }

    #[test]
    fn serialization_skips_secrets() {
        let user = user_with(Some("tok"), Some(OffsetDateTime::now_utc()));
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("reset_token"));
        assert!(json.contains("a@x.com"));
    }
}
