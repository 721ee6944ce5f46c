/// Password Hashing and Verification
///
/// bcrypt with a configurable work factor. Hashing and verifying are CPU-bound,
/// so both run on tokio's blocking pool instead of the request executor.

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 25;

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password using bcrypt
    ///
    /// Output differs on every call (random salt).
    ///
    /// # Errors
    /// Returns error only if bcrypt itself or the blocking task fails
    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    ///
    /// Returns `Ok(false)` for a wrong password.
    ///
    /// # Errors
    /// Returns error if `hash` is not a bcrypt digest
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

/// Validate password strength requirements
///
/// Requirements:
/// - 8 to 25 characters
/// - ASCII letters and digits only
/// - At least one digit, one lowercase and one uppercase letter
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    let only_alphanumeric = password.chars().all(|c| c.is_ascii_alphanumeric());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());

    if !only_alphanumeric || !has_digit || !has_lowercase || !has_uppercase {
        return Err(ValidationError::InvalidFormat("password"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[tokio::test]
    async fn test_hash_password() {
        let password = "ValidPassword123";
        let hash = hasher().hash(password).await.expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_verify_password() {
        let password = "ValidPassword123";
        let hash = hasher().hash(password).await.expect("Failed to hash password");

        let is_valid = hasher().verify(password, &hash).await.expect("Failed to verify password");
        assert!(is_valid);
    }

    #[tokio::test]
    async fn test_verify_wrong_password() {
        let hash = hasher().hash("ValidPassword123").await.expect("Failed to hash password");

        let is_valid = hasher()
            .verify("WrongPassword123", &hash)
            .await
            .expect("Failed to verify password");
        assert!(!is_valid);
    }

    #[tokio::test]
    async fn test_same_password_hashes_differently() {
        let password = "Password1";
        let first = hasher().hash(password).await.unwrap();
        let second = hasher().hash(password).await.unwrap();

        assert_ne!(first, second);
        assert!(hasher().verify(password, &first).await.unwrap());
        assert!(hasher().verify(password, &second).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_digest_is_an_error() {
        let result = hasher().verify("Password1", "not-a-bcrypt-digest").await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_valid_password() {
        assert!(validate_password_strength("Password1").is_ok());
        assert!(validate_password_strength(&format!("Aa1{}", "b".repeat(22))).is_ok());
    }

    #[test]
    fn test_too_short_password() {
        assert_eq!(
            validate_password_strength("Short1"),
            Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH))
        );
    }

    #[test]
    fn test_too_long_password() {
        let long_password = format!("Aa1{}", "b".repeat(23));
        assert_eq!(
            validate_password_strength(&long_password),
            Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH))
        );
    }

    #[test]
    fn test_missing_character_classes() {
        assert!(validate_password_strength("NoDigitsPassword").is_err());
        assert!(validate_password_strength("NOLOWERCASE1").is_err());
        assert!(validate_password_strength("nouppercase1").is_err());
    }

    #[test]
    fn test_symbols_rejected() {
        assert!(validate_password_strength("Password1!").is_err());
    }
}
