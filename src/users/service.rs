use tracing::info;
use uuid::Uuid;

use crate::auth::service::{normalize_dni, normalize_email};
use crate::error::{is_unique_violation, ApiError};
use crate::state::AppState;
use crate::users::dto::UpdateUserRequest;
use crate::users::repo::User;

/// Update the authenticated user's profile. Email and DNI changes are
/// checked against other accounts first, with the unique index as the
/// final arbiter.
pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    update: UpdateUserRequest,
) -> Result<User, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let email = match update.email {
        Some(raw) => {
            let email = normalize_email(&raw);
            if !crate::auth::service::is_valid_email(&email) {
                return Err(ApiError::InvalidInput("Invalid email".into()));
            }
            if email != user.email {
                if let Some(other) = User::find_by_email(&state.db, &email).await? {
                    if other.id != user_id {
                        return Err(ApiError::Conflict("Email already registered".into()));
                    }
                }
            }
            email
        }
        None => user.email.clone(),
    };

    let dni = match update.dni {
        Some(raw) => {
            let dni = normalize_dni(&raw);
            if dni.is_empty() {
                return Err(ApiError::InvalidInput("DNI must not be empty".into()));
            }
            if dni != user.dni {
                if let Some(other) = User::find_by_dni(&state.db, &dni).await? {
                    if other.id != user_id {
                        return Err(ApiError::Conflict("DNI already registered".into()));
                    }
                }
            }
            dni
        }
        None => user.dni.clone(),
    };

    let full_name = match update.full_name {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ApiError::InvalidInput("Full name must not be empty".into()));
            }
            name
        }
        None => user.full_name.clone(),
    };

    let phone = update.phone.or(user.phone.clone());
    let avatar_url = update.avatar_url.or(user.avatar_url.clone());

    let updated = User::update_profile(
        &state.db,
        user_id,
        &full_name,
        &dni,
        phone.as_deref(),
        &email,
        avatar_url.as_deref(),
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Email or DNI already registered".into())
        } else {
            ApiError::from(e)
        }
    })?;

    info!(user_id = %user_id, "profile updated");
    Ok(updated)
}

/// Soft delete; existing tokens stop validating on their next use.
pub async fn deactivate(state: &AppState, user_id: Uuid) -> Result<(), ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    User::deactivate(&state.db, user.id).await?;
    info!(user_id = %user_id, "user deactivated");
    Ok(())
}
