//! Authentication and authorization.
//!
//! Sessions are stateless JWTs, delivered as an HTTP-only cookie at sign-in
//! and accepted either as that cookie or as a Bearer token. Passwords and
//! one-time codes are stored as argon2id hashes only.

pub mod current_user;
pub mod password;
pub mod session;

use crate::api::models::users::{CurrentUser, Role};
use crate::errors::{Error, Result};
use crate::types::{Operation, Permission, Resource};

/// Require a clinic-side account (staff, dentist, or admin).
pub fn require_staff(user: &CurrentUser, action: Operation, resource: Resource) -> Result<()> {
    match user.role {
        Role::Staff | Role::Dentist | Role::Admin => Ok(()),
        Role::Patient => Err(Error::InsufficientPermissions {
            required: Permission::Allow(resource, action),
            action,
            resource: resource.to_string(),
        }),
    }
}

/// Require the admin role.
pub fn require_admin(user: &CurrentUser, action: Operation, resource: Resource) -> Result<()> {
    if user.role == Role::Admin {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission::Allow(resource, action),
            action,
            resource: resource.to_string(),
        })
    }
}
