// Password hashing
// bcrypt is CPU bound, so both operations run on tokio's blocking pool

use super::AuthError;

pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check a password against a stored hash. Malformed hashes never match.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("s3cret", 4).await.unwrap();
        assert_ne!(hash, "s3cret");
        assert!(verify_password("s3cret", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_does_not_match() {
        assert!(!verify_password("s3cret", "not-a-bcrypt-hash").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_cost_is_an_error() {
        assert!(hash_password("s3cret", 99).await.is_err());
    }
}
