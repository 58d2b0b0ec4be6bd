use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::ApiError;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Policy for new passwords: at least 8 characters, at most 50, with one
/// lowercase letter, one uppercase letter and one digit.
pub fn validate_new_password(plain: &str) -> Result<(), ApiError> {
    if plain.len() < 8 {
        return Err(ApiError::InvalidInput(
            "Password must be at least 8 characters".into(),
        ));
    }
    if plain.len() > 50 {
        return Err(ApiError::InvalidInput(
            "Password must not exceed 50 characters".into(),
        ));
    }
    let has_lower = plain.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = plain.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = plain.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err(ApiError::InvalidInput(
            "Password must contain a lowercase letter, an uppercase letter and a digit".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "Correct-Horse-1";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("Wrong-Password-1", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn password_policy() {
        assert!(validate_new_password("Abcdef12").is_ok());
        assert!(validate_new_password("short1A").is_err());
        assert!(validate_new_password("alllowercase1").is_err());
        assert!(validate_new_password("ALLUPPERCASE1").is_err());
        assert!(validate_new_password("NoDigitsHere").is_err());
        let long = format!("Aa1{}", "x".repeat(60));
        assert!(validate_new_password(&long).is_err());
    }
}
