//! Request and response models for the HTTP API.
//!
//! These are the wire types: camelCase JSON, no internal-only fields (password
//! hashes never appear here). Conversions from the store records live next to
//! each response type.

pub mod appointments;
pub mod auth;
pub mod history;
pub mod users;
