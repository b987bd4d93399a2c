//! Stored one-time passcode challenge records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What the pending code, once verified, will complete.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Signin,
    Signup,
}

/// Pending one-time passcode challenge, keyed by `otp:{email}`. At most one
/// challenge exists per email; issuing a new code replaces the old record.
///
/// The code itself is never stored - only its argon2 hash. Verification
/// attempts are counted and capped so the 6-digit space cannot be walked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpChallengeRecord {
    pub email: String,
    pub code_hash: String,
    pub purpose: OtpPurpose,
    pub attempts: u32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpChallengeRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
