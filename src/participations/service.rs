use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::associates::repo::Associate;
use crate::error::{is_unique_violation, ApiError};
use crate::participations::dto::CreateParticipationRequest;
use crate::participations::repo::Participation;
use crate::state::AppState;
use crate::users::repo::User;

/// Per-user cap on participations sharing one ticket date.
pub const DAILY_PARTICIPATION_LIMIT: i64 = 5;
/// Tickets older than this many days are no longer admissible.
pub const TICKET_WINDOW_DAYS: i64 = 30;

const TICKET_NUMBER_MIN: usize = 3;
const TICKET_NUMBER_MAX: usize = 100;

fn max_amount() -> Decimal {
    // 999,999.99 — sanity ceiling, not business-meaningful
    Decimal::new(99_999_999, 2)
}

pub(crate) fn validate_ticket_number(raw: &str) -> Result<String, ApiError> {
    let ticket = raw.trim().to_string();
    if ticket.len() < TICKET_NUMBER_MIN {
        return Err(ApiError::InvalidInput(
            "Ticket number must be at least 3 characters".into(),
        ));
    }
    if ticket.len() > TICKET_NUMBER_MAX {
        return Err(ApiError::InvalidInput(
            "Ticket number must not exceed 100 characters".into(),
        ));
    }
    Ok(ticket)
}

pub(crate) fn validate_amount(amount: Decimal) -> Result<(), ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::InvalidInput(
            "Amount must be greater than zero".into(),
        ));
    }
    if amount > max_amount() {
        return Err(ApiError::InvalidInput(
            "Amount must not exceed 999,999.99".into(),
        ));
    }
    if amount != amount.round_dp(2) {
        return Err(ApiError::InvalidInput(
            "Amount must have at most 2 decimal places".into(),
        ));
    }
    Ok(())
}

/// The admissible window: not after today, not before today minus 30 days
/// (inclusive). Day-granular because the column is a calendar date.
pub(crate) fn validate_ticket_date(today: Date, ticket_date: Date) -> Result<(), ApiError> {
    if ticket_date > today {
        return Err(ApiError::InvalidInput(
            "Ticket date cannot be in the future".into(),
        ));
    }
    if ticket_date < today - Duration::days(TICKET_WINDOW_DAYS) {
        return Err(ApiError::InvalidInput(
            "Ticket date cannot be older than 30 days".into(),
        ));
    }
    Ok(())
}

/// Admission control for a new participation. Checks run fail-fast in a
/// fixed order; the first failure wins. The duplicate pre-check is
/// check-then-act, so the unique index on (ticket_number, associate_id)
/// remains the final word on duplicates; the daily quota is enforced
/// under a per-user lock inside the insert itself.
pub async fn create_participation(
    state: &AppState,
    user_id: Uuid,
    payload: CreateParticipationRequest,
) -> Result<Participation, ApiError> {
    let ticket_number = validate_ticket_number(&payload.ticket_number)?;
    validate_amount(payload.total_amount)?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // Inactive associates are served exactly like missing ones.
    let associate = Associate::find_active(&state.db, payload.associate_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Associate not found".into()))?;

    if Participation::find_duplicate(&state.db, &ticket_number, associate.id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "A participation with this ticket number already exists at this associate".into(),
        ));
    }

    let today = OffsetDateTime::now_utc().date();
    validate_ticket_date(today, payload.ticket_date)?;

    let participation = Participation::insert_admitted(
        &state.db,
        user.id,
        associate.id,
        &ticket_number,
        payload.ticket_date,
        payload.total_amount,
        DAILY_PARTICIPATION_LIMIT,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict(
                "A participation with this ticket number already exists at this associate".into(),
            )
        } else {
            ApiError::from(e)
        }
    })?
    .ok_or_else(|| {
        ApiError::QuotaExceeded("You have reached the maximum of 5 participations per day".into())
    })?;

    info!(
        participation_id = %participation.id,
        user_id = %user.id,
        associate_id = %associate.id,
        "participation admitted"
    );
    Ok(participation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn ticket_number_is_trimmed_and_bounded() {
        assert_eq!(validate_ticket_number("  T-001  ").unwrap(), "T-001");
        assert!(matches!(
            validate_ticket_number("ab"),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_ticket_number(&"x".repeat(101)),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(validate_ticket_number(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn amount_must_be_positive() {
        assert!(matches!(
            validate_amount(Decimal::ZERO),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_amount(Decimal::new(-100, 2)),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(validate_amount(Decimal::new(1, 2)).is_ok()); // 0.01
    }

    #[test]
    fn amount_ceiling() {
        assert!(validate_amount(Decimal::new(99_999_999, 2)).is_ok()); // 999,999.99
        assert!(matches!(
            validate_amount(Decimal::new(100_000_000, 2)), // 1,000,000.00
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn amount_allows_at_most_two_decimals() {
        assert!(validate_amount(Decimal::new(2599, 2)).is_ok()); // 25.99
        assert!(validate_amount(Decimal::new(25_990, 3)).is_ok()); // 25.990 == 25.99
        assert!(matches!(
            validate_amount(Decimal::new(25_999, 3)), // 25.999
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn daily_quota_boundary() {
        use crate::participations::repo::quota_reached;

        // four prior on the day: a fifth still fits
        assert!(!quota_reached(4, DAILY_PARTICIPATION_LIMIT));
        // five prior: the sixth is refused
        assert!(quota_reached(5, DAILY_PARTICIPATION_LIMIT));
        assert!(quota_reached(6, DAILY_PARTICIPATION_LIMIT));
        // the quota is per ticket date: a fresh day starts at zero
        assert!(!quota_reached(0, DAILY_PARTICIPATION_LIMIT));
    }

    #[test]
    fn future_dates_are_rejected() {
        let today = date!(2025 - 06 - 15);
        assert!(validate_ticket_date(today, today).is_ok());
        assert!(matches!(
            validate_ticket_date(today, date!(2025 - 06 - 16)),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn window_is_thirty_days_inclusive() {
        let today = date!(2025 - 06 - 15);
        assert!(validate_ticket_date(today, date!(2025 - 05 - 16)).is_ok()); // today - 30
        assert!(matches!(
            validate_ticket_date(today, date!(2025 - 05 - 15)), // today - 31
            Err(ApiError::InvalidInput(_))
        ));
    }
}
