use serde::Deserialize;

use crate::associates::repo::NewAssociate;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AssociateRequest {
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

impl AssociateRequest {
    pub fn into_new(self) -> Result<NewAssociate, ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("Name is required".into()));
        }
        Ok(NewAssociate {
            name,
            description: self.description,
            address: self.address,
            phone: self.phone,
            maps_url: self.maps_url,
            web_text: self.web_text,
            web_url: self.web_url,
            social_text: self.social_text,
            social_url: self.social_url,
            logo_url: self.logo_url,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        let req = AssociateRequest {
            name: "   ".into(),
            description: None,
            address: None,
            phone: None,
            maps_url: None,
            web_text: None,
            web_url: None,
            social_text: None,
            social_url: None,
            logo_url: None,
        };
        assert!(req.into_new().is_err());
    }

    #[test]
    fn name_is_trimmed() {
        let req = AssociateRequest {
            name: "  Panadería Sol  ".into(),
            description: Some("Bakery".into()),
            address: None,
            phone: None,
            maps_url: None,
            web_text: None,
            web_url: None,
            social_text: None,
            social_url: None,
            logo_url: None,
        };
        let new = req.into_new().unwrap();
        assert_eq!(new.name, "Panadería Sol");
    }
}
