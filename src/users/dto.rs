use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::User;

/// Public part of the user returned to the client (never the hash or the
/// reset credential).
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub dni: String,
    pub phone: Option<String>,
    pub email: String,
    pub email_verified: bool,
    pub is_active: bool,
    pub last_login_at: Option<OffsetDateTime>,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name,
            dni: u.dni,
            phone: u.phone,
            email: u.email,
            email_verified: u.email_verified,
            is_active: u.is_active,
            last_login_at: u.last_login_at,
            avatar_url: u.avatar_url,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Request body for profile updates; absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub dni: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Query parameters for the user listing.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub full_name: Option<String>,
    pub dni: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub email_verified: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    pub q: Option<String>,
}

const SEARCH_TERM_MIN: usize = 2;

/// Trimmed search term, or `None` when too short to search on. A short
/// term yields an empty result instead of an error.
pub(crate) fn search_term(raw: Option<&str>) -> Option<String> {
    let term = raw?.trim();
    if term.len() < SEARCH_TERM_MIN {
        return None;
    }
    Some(term.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_serializes_public_fields() {
        let now = OffsetDateTime::now_utc();
        let profile = UserProfile {
            id: Uuid::new_v4(),
            full_name: "Ana Pérez".into(),
            dni: "12345678Z".into(),
            phone: Some("+34600000000".into()),
            email: "ana@example.com".into(),
            email_verified: true,
            is_active: true,
            last_login_at: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("ana@example.com"));
        assert!(json.contains("12345678Z"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn search_term_requires_two_characters() {
        assert_eq!(search_term(None), None);
        assert_eq!(search_term(Some("  ")), None);
        assert_eq!(search_term(Some("a")), None);
        assert_eq!(search_term(Some(" an ")), Some("an".to_string()));
        assert_eq!(search_term(Some("Juan")), Some("Juan".to_string()));
    }
}
