use serde::Deserialize;
use time::OffsetDateTime;

use crate::campaigns::repo::NewCampaign;
use crate::error::ApiError;

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 255;
const DESCRIPTION_MAX: usize = 1000;
const IMAGE_URL_MAX: usize = 500;

#[derive(Debug, Deserialize)]
pub struct CampaignRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub starts_at: Option<OffsetDateTime>,
    pub ends_at: Option<OffsetDateTime>,
}

fn default_active() -> bool {
    true
}

impl CampaignRequest {
    pub fn into_new(self) -> Result<NewCampaign, ApiError> {
        let name = self.name.trim().to_string();
        if name.len() < NAME_MIN {
            return Err(ApiError::InvalidInput(
                "Name must be at least 3 characters".into(),
            ));
        }
        if name.len() > NAME_MAX {
            return Err(ApiError::InvalidInput(
                "Name must not exceed 255 characters".into(),
            ));
        }
        let description = self.description.map(|d| d.trim().to_string());
        if let Some(ref d) = description {
            if d.len() > DESCRIPTION_MAX {
                return Err(ApiError::InvalidInput(
                    "Description must not exceed 1000 characters".into(),
                ));
            }
        }
        let image_url = self.image_url.map(|u| u.trim().to_string());
        if let Some(ref u) = image_url {
            if u.len() > IMAGE_URL_MAX {
                return Err(ApiError::InvalidInput(
                    "Image URL must not exceed 500 characters".into(),
                ));
            }
        }
        if let (Some(starts_at), Some(ends_at)) = (self.starts_at, self.ends_at) {
            if ends_at < starts_at {
                return Err(ApiError::InvalidInput(
                    "End date must not be before start date".into(),
                ));
            }
        }
        Ok(NewCampaign {
            name,
            description,
            image_url,
            is_active: self.is_active,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CampaignQuery {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct CampaignStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CloneCampaignRequest {
    pub name: Option<String>,
}

/// Name for a cloned campaign: the requested one, or the original's name
/// with a copy marker.
pub(crate) fn clone_name(original: &str, requested: Option<&str>) -> String {
    match requested.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{original} (Copy)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> CampaignRequest {
        CampaignRequest {
            name: name.into(),
            description: None,
            image_url: None,
            is_active: true,
            starts_at: None,
            ends_at: None,
        }
    }

    #[test]
    fn name_is_trimmed_and_bounded() {
        let new = request("  Summer 2025  ").into_new().unwrap();
        assert_eq!(new.name, "Summer 2025");
        assert!(request("ab").into_new().is_err());
        assert!(request(&"x".repeat(256)).into_new().is_err());
    }

    #[test]
    fn description_and_image_url_are_bounded() {
        let mut req = request("Summer 2025");
        req.description = Some("y".repeat(1001));
        assert!(req.into_new().is_err());

        let mut req = request("Summer 2025");
        req.image_url = Some("z".repeat(501));
        assert!(req.into_new().is_err());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let now = OffsetDateTime::now_utc();
        let mut req = request("Summer 2025");
        req.starts_at = Some(now);
        req.ends_at = Some(now - time::Duration::days(1));
        assert!(req.into_new().is_err());
    }

    #[test]
    fn clone_name_defaults_to_copy_marker() {
        assert_eq!(clone_name("Summer 2025", None), "Summer 2025 (Copy)");
        assert_eq!(clone_name("Summer 2025", Some("  ")), "Summer 2025 (Copy)");
        assert_eq!(clone_name("Summer 2025", Some(" Winter ")), "Winter");
    }

    #[test]
    fn active_flag_defaults_to_true() {
        let req: CampaignRequest =
            serde_json::from_str(r#"{ "name": "Summer 2025" }"#).unwrap();
        assert!(req.is_active);
    }
}
