//! Password hashing and password policy.
//!
//! bcrypt is CPU-bound, so hashing and verification run on the blocking
//! thread pool instead of the actix worker threads.

use super::AuthError;

/// bcrypt work factor.
const BCRYPT_COST: u32 = 10;

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Check a new password against the policy.
///
/// A password needs at least [`MIN_PASSWORD_LEN`] characters, one digit,
/// one lowercase and one uppercase letter. Every violated rule is reported.
pub fn validate_password_policy(password: &str) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(format!(
            "password must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("password must contain at least one digit".to_string());
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        problems.push("password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        problems.push("password must contain at least one uppercase letter".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

fn hash_password_sync(password: String) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| AuthError::Hashing(e.to_string()))
}

fn verify_password_sync(password: String, hash: String) -> Result<bool, AuthError> {
    bcrypt::verify(password, &hash).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Hash a password with bcrypt.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password_sync(password))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
}

/// Verify a password against a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let result = tokio::task::spawn_blocking(move || verify_password_sync(password, hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

    Ok(result.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_accepts_strong_password() {
        assert!(validate_password_policy("Secret1").is_ok());
        assert!(validate_password_policy("Año2024x").is_ok());
    }

    #[test]
    fn test_policy_reports_each_violation() {
        let problems = validate_password_policy("abc").unwrap_err();
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.contains("at least 6")));
        assert!(problems.iter().any(|p| p.contains("digit")));
        assert!(problems.iter().any(|p| p.contains("uppercase")));

        let problems = validate_password_policy("ABCDEF1").unwrap_err();
        assert_eq!(problems, vec!["password must contain at least one lowercase letter"]);
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("Secret1").await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("Secret1", &hash).await.unwrap());
        assert!(!verify_password("secret1", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_a_mismatch() {
        assert!(!verify_password("Secret1", "not-a-hash").await.unwrap());
    }
}
