//! Stored record types and repository request models.
//!
//! These are the shapes that live in the key-value store. They are distinct
//! from the API models in [`crate::api::models`]: stored records may carry
//! fields that must never cross the wire (most notably `password_hash`),
//! and the API layer converts between the two at the handler boundary.

pub mod appointments;
pub mod history;
pub mod notes;
pub mod otp;
pub mod reset_tokens;
pub mod users;
