//! Password reset token repository over the `reset-token:` namespace.

use chrono::Utc;

use crate::auth::password::generate_reset_token;
use crate::store::errors::Result;
use crate::store::models::reset_tokens::ResetTokenRecord;
use crate::store::{KvStore, keys};

pub struct ResetTokens<'a> {
    store: &'a KvStore,
}

impl<'a> ResetTokens<'a> {
    pub fn new(store: &'a KvStore) -> Self {
        Self { store }
    }

    /// Mint a fresh token for `email` and persist it.
    ///
    /// The raw token string is the key, so it can be looked up directly from
    /// the reset link. Previous tokens for the same email stay valid until
    /// they expire or one of them is consumed.
    pub async fn create_for_email(&self, email: &str, ttl: std::time::Duration) -> Result<ResetTokenRecord> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).map_err(anyhow::Error::from)?;
        let record = ResetTokenRecord {
            token: generate_reset_token(),
            email: email.to_lowercase(),
            expires_at: now + ttl,
            created_at: now,
        };
        self.store.insert_new(&keys::reset_token(&record.token), &record)?;
        Ok(record)
    }

    pub async fn get(&self, token: &str) -> Result<Option<ResetTokenRecord>> {
        self.store.get(&keys::reset_token(token))
    }

    /// Remove a token so it cannot be used again.
    pub async fn consume(&self, token: &str) -> bool {
        self.store.delete(&keys::reset_token(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test_log::test(tokio::test)]
    async fn test_create_and_consume_token() {
        let store = KvStore::new();
        let tokens = ResetTokens::new(&store);

        let record = tokens.create_for_email("A@Example.com", Duration::from_secs(3600)).await.unwrap();
        assert_eq!(record.email, "a@example.com");
        assert!(!record.is_expired(Utc::now()));

        let found = tokens.get(&record.token).await.unwrap().unwrap();
        assert_eq!(found.email, record.email);

        assert!(tokens.consume(&record.token).await);
        assert!(tokens.get(&record.token).await.unwrap().is_none());
        // Second consume is a no-op
        assert!(!tokens.consume(&record.token).await);
    }

    #[test_log::test(tokio::test)]
    async fn test_zero_ttl_token_is_expired() {
        let store = KvStore::new();
        let tokens = ResetTokens::new(&store);

        let record = tokens.create_for_email("a@example.com", Duration::ZERO).await.unwrap();
        assert!(record.is_expired(Utc::now() + chrono::Duration::seconds(1)));
    }

    #[test_log::test(tokio::test)]
    async fn test_tokens_are_distinct() {
        let store = KvStore::new();
        let tokens = ResetTokens::new(&store);

        let first = tokens.create_for_email("a@example.com", Duration::from_secs(3600)).await.unwrap();
        let second = tokens.create_for_email("a@example.com", Duration::from_secs(3600)).await.unwrap();
        assert_ne!(first.token, second.token);
    }
}
