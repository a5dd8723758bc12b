use rand::distr::{Alphanumeric, Distribution};
use tower_sessions::Session;

use crate::error::HeroshotError;

const CSRF_TOKEN_KEY: &str = "csrf_token";

/// 32 random alphanumerics, used for CSRF tokens and workspace ids.
pub(crate) fn generate_token() -> String {
    Alphanumeric
        .sample_iter(rand::rng())
        .take(32)
        .map(char::from)
        .collect()
}

pub(crate) async fn csrf_token(session: &Session) -> Result<String, HeroshotError> {
    if let Some(existing) = session.get::<String>(CSRF_TOKEN_KEY).await? {
        return Ok(existing);
    }
    let token = generate_token();
    session.insert(CSRF_TOKEN_KEY, token.clone()).await?;
    Ok(token)
}

pub(crate) async fn validate_csrf(session: &Session, token: &str) -> Result<(), HeroshotError> {
    let stored = session.get::<String>(CSRF_TOKEN_KEY).await?;
    match stored {
        Some(expected) if !token.is_empty() && expected == token => Ok(()),
        _ => Err(HeroshotError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::generate_token;

    #[test]
    fn tokens_are_alphanumeric_and_distinct() {
        let first = generate_token();
        let second = generate_token();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }
}
