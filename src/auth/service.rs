use lazy_static::lazy_static;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::auth::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, validate_new_password, verify_password};
use crate::error::{is_unique_violation, ApiError};
use crate::state::AppState;
use crate::users::dto::UserProfile;
use crate::users::repo::{NewUser, User};

/// One message for "no such account", "inactive account" and "wrong
/// password", so login responses carry no enumeration signal.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Returned for every forgot-password request, whether or not the email
/// maps to an account.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If the email exists in our system, you will receive instructions to reset your password.";

const RESET_TOKEN_LEN: usize = 48;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn normalize_dni(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn issue_token_pair(state: &AppState, user: &User) -> Result<(String, String), ApiError> {
    use axum::extract::FromRef;
    let keys = JwtKeys::from_ref(state);
    let access = keys.sign_access(user).map_err(ApiError::Internal)?;
    let refresh = keys.sign_refresh(user).map_err(ApiError::Internal)?;
    Ok((access, refresh))
}

pub async fn register(state: &AppState, payload: RegisterRequest) -> Result<AuthResponse, ApiError> {
    let email = normalize_email(&payload.email);
    let dni = normalize_dni(&payload.dni);
    let full_name = payload.full_name.trim().to_string();

    if full_name.is_empty() {
        return Err(ApiError::InvalidInput("Full name is required".into()));
    }
    if dni.is_empty() {
        return Err(ApiError::InvalidInput("DNI is required".into()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::InvalidInput("Invalid email".into()));
    }
    validate_new_password(&payload.password)?;

    // Friendly pre-checks; the unique indexes still win under races.
    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }
    if User::find_by_dni(&state.db, &dni).await?.is_some() {
        return Err(ApiError::Conflict("DNI already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let new_user = NewUser {
        full_name,
        dni,
        phone: payload.phone.map(|p| p.trim().to_string()),
        email,
        password_hash,
    };

    let user = User::create(&state.db, &new_user).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Email or DNI already registered".into())
        } else {
            ApiError::from(e)
        }
    })?;

    let (access_token, refresh_token) = issue_token_pair(state, &user)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: UserProfile::from(user),
    })
}

pub async fn login(state: &AppState, payload: LoginRequest) -> Result<AuthResponse, ApiError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(ApiError::InvalidInput("Invalid email".into()));
    }

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    if !user.is_active {
        warn!(user_id = %user.id, "login for inactive user");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let (access_token, refresh_token) = issue_token_pair(state, &user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: UserProfile::from(user),
    })
}

pub async fn refresh(state: &AppState, refresh_token: &str) -> Result<AuthResponse, ApiError> {
    use axum::extract::FromRef;
    let keys = JwtKeys::from_ref(state);
    let claims = keys
        .verify_refresh(refresh_token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired refresh token".into()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired refresh token".into()))?;

    let (access_token, refresh_token) = issue_token_pair(state, &user)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: UserProfile::from(user),
    })
}

/// Issue a reset credential and mail it. An unknown or inactive account
/// is not an error here: the handler answers with the same generic
/// message either way. A failed send rolls the stored credential back so
/// an undelivered token never stays valid.
pub async fn request_password_reset(state: &AppState, email: &str) -> Result<(), ApiError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(ApiError::InvalidInput("Invalid email".into()));
    }

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) if u.is_active => u,
        _ => {
            info!("password reset requested for unknown or inactive account");
            return Ok(());
        }
    };

    let token = generate_reset_token();
    let expires_at =
        OffsetDateTime::now_utc() + Duration::minutes(state.config.reset_token_ttl_minutes);
    User::set_reset_credential(&state.db, user.id, &token, expires_at).await?;

    if let Err(e) = state
        .mailer
        .send_password_reset(&user.email, &user.full_name, &token)
        .await
    {
        warn!(user_id = %user.id, error = %e, "reset email failed, clearing credential");
        User::clear_reset_credential(&state.db, user.id).await?;
        return Err(ApiError::Dependency(
            "Could not send the recovery email".into(),
        ));
    }

    info!(user_id = %user.id, "password reset issued");
    Ok(())
}

/// Look up a presented reset credential and check its expiry.
pub async fn validate_reset_credential(state: &AppState, token: &str) -> Result<User, ApiError> {
    let user = User::find_by_reset_token(&state.db, token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid reset token".into()))?;

    let credential = user
        .reset_credential()
        .ok_or_else(|| ApiError::NotFound("Invalid reset token".into()))?;

    if credential.is_expired(OffsetDateTime::now_utc()) {
        return Err(ApiError::InvalidInput("Reset token has expired".into()));
    }

    Ok(user)
}

/// Replace the password and consume the credential; a second use of the
/// same token fails validation.
pub async fn complete_reset(
    state: &AppState,
    token: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let user = validate_reset_credential(state, token).await?;
    validate_new_password(new_password)?;

    let password_hash = hash_password(new_password)?;
    User::reset_password(&state.db, user.id, &password_hash).await?;

    info!(user_id = %user.id, "password reset completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("juan.perez@example.co.uk"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@x"));
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
        assert_eq!(normalize_dni(" 12345678z "), "12345678Z");
    }

    #[test]
    fn reset_token_is_long_and_alphanumeric() {
        let token = generate_reset_token();
        assert_eq!(token.len(), RESET_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn reset_tokens_are_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_ne!(a, b);
    }
}
