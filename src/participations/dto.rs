use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;
use uuid::Uuid;

/// Request body for submitting a ticket.
#[derive(Debug, Deserialize)]
pub struct CreateParticipationRequest {
    pub associate_id: Uuid,
    pub ticket_number: String,
    pub ticket_date: Date,
    pub total_amount: Decimal,
}

/// Query parameters for listing own participations.
#[derive(Debug, Deserialize)]
pub struct ParticipationQuery {
    pub associate_id: Option<Uuid>,
    pub ticket_number: Option<String>,
    pub from: Option<Date>,
    pub to: Option<Date>,
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
    fn deserializes_iso_date_and_decimal_amount() {
        let json = r#"{
            "associate_id": "123e4567-e89b-12d3-a456-426614174000",
            "ticket_number": "T-2025-001234",
            "ticket_date": "2025-01-18",
            "total_amount": 25.99
        }"#;
        let req: CreateParticipationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ticket_number, "T-2025-001234");
        assert_eq!(req.ticket_date.to_string(), "2025-01-18");
        assert_eq!(req.total_amount.to_string(), "25.99");
    }
}
