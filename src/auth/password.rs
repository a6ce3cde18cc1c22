use crate::error::AppResult;

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Constant-time check of a plaintext password against a stored bcrypt hash.
/// A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// `hash_password` on the blocking pool.
pub async fn hash_password_blocking(password: String, cost: u32) -> AppResult<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??;
    Ok(hash)
}

pub async fn verify_password_blocking(password: String, hash: String) -> AppResult<bool> {
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?;
    Ok(ok)
}
