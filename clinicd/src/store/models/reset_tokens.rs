//! Stored password reset token records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Password reset token, keyed by `reset-token:{token}` - the raw token
/// string acts as the primary key, exactly as the reset link carries it.
///
/// Single-use: deleted immediately after a successful reset. Expired tokens
/// are rejected and removed on sight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetTokenRecord {
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ResetTokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
