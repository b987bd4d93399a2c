//! One-time passcode repository over the `otp:` namespace.

use chrono::Utc;

use crate::store::errors::{Result, StoreError};
use crate::store::models::otp::{OtpChallengeRecord, OtpPurpose};
use crate::store::{KvStore, keys};

pub struct OtpChallenges<'a> {
    store: &'a KvStore,
}

impl<'a> OtpChallenges<'a> {
    pub fn new(store: &'a KvStore) -> Self {
        Self { store }
    }

    /// Persist a new challenge for `email`, replacing any outstanding one.
    /// `code_hash` is the argon2 hash of the code; the caller keeps the raw
    /// code only long enough to deliver it.
    pub async fn issue(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code_hash: String,
        ttl: std::time::Duration,
    ) -> Result<OtpChallengeRecord> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).map_err(anyhow::Error::from)?;
        let record = OtpChallengeRecord {
            email: email.to_lowercase(),
            code_hash,
            purpose,
            attempts: 0,
            expires_at: now + ttl,
            created_at: now,
        };
        self.store.set(&keys::otp(email), &record)?;
        Ok(record)
    }

    pub async fn get(&self, email: &str) -> Result<Option<OtpChallengeRecord>> {
        self.store.get(&keys::otp(email))
    }

    /// Bump the failed-attempt counter and return the updated record.
    pub async fn record_attempt(&self, email: &str) -> Result<OtpChallengeRecord> {
        let key = keys::otp(email);
        let mut record: OtpChallengeRecord = self.store.get(&key)?.ok_or(StoreError::NotFound)?;
        record.attempts += 1;
        self.store.set(&key, &record)?;
        Ok(record)
    }

    /// Drop the challenge, after success or when it is no longer redeemable.
    pub async fn clear(&self, email: &str) -> bool {
        self.store.delete(&keys::otp(email))
    }
}
