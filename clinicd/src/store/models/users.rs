//! Stored user records and repository request models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::models::users::Role;
use crate::types::UserId;

/// User record as persisted in the store, keyed by `user:{email}`.
///
/// The password hash never leaves this layer; API responses are built from
/// [`crate::api::models::users::UserResponse`], which has no such field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    /// Argon2id hash. `None` for walk-in patients who have not registered.
    pub password_hash: Option<String>,
    /// Walk-in patients cannot sign in until they complete self-registration.
    pub can_login: bool,
    pub is_walk_in: bool,
    /// Email of the staff/admin account that created this record, if any.
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserCreateStoreRequest {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub can_login: bool,
    pub is_walk_in: bool,
    pub created_by: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateStoreRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub can_login: Option<bool>,
    pub is_walk_in: Option<bool>,
}

/// Filter for listing users
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Restrict to the given roles; empty means all roles.
    pub roles: Vec<Role>,
}

impl UserFilter {
    pub fn with_role(role: Role) -> Self {
        Self { roles: vec![role] }
    }
}
