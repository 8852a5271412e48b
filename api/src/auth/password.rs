//! Credential rules and Argon2id hashing.
//!
//! Hashes are stored as PHC strings, so the salt and parameters travel with
//! the hash. Verification goes through `argon2`'s constant-time comparison.

use std::sync::LazyLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use regex::Regex;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::validation("invalid email format"));
    }
    Ok(())
}

/// At least [`MIN_PASSWORD_LEN`] characters with an upper-case letter, a
/// lower-case letter and a digit.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(AppError::validation(
            "password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(AppError::validation(
            "password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(char::is_numeric) {
        return Err(AppError::validation(
            "password must contain at least one number",
        ));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Returns `Ok(false)` on a mismatch; errors only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("Password1").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Password1", &hash).unwrap());
        assert!(!verify_password("Password2", &hash).unwrap());
    }

    #[test]
    fn unreadable_hash_is_an_error() {
        assert!(verify_password("Password1", "not-a-phc-string").is_err());
    }

    #[test]
    fn password_policy() {
        assert!(validate_password("Password1").is_ok());

        let short = validate_password("short1A").unwrap_err();
        assert!(short.to_string().contains("at least 8 characters"));

        assert!(validate_password("password1").is_err());
        assert!(validate_password("PASSWORD1").is_err());
        assert!(validate_password("Passwordd").is_err());
    }

    #[test]
    fn email_format() {
        assert!(validate_email("reader@example.com").is_ok());
        assert!(validate_email("first.last+tag@mail.example.co").is_ok());
        assert!(validate_email("no-at-sign.example.com").is_err());
        assert!(validate_email("reader@example").is_err());
        assert!(validate_email("reader@example.c").is_err());
        assert!(validate_email("' OR 1=1 --@x.io").is_err());
    }
}
