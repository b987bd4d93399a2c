//! Key-value persistence layer.
//!
//! The backend state lives in a namespaced key-value store: every record is a
//! JSON document under a prefixed string key (`user:{email}`,
//! `appointment:{id}`, ...). Application code never touches [`KvStore`]
//! directly; each entity has a repository in [`handlers`] that owns its key
//! namespace and exposes typed create/read/update/delete operations.
//!
//! The store is an in-process [`DashMap`] shared across handlers via
//! [`crate::AppState`]. Cloning a [`KvStore`] is cheap and yields a handle to
//! the same underlying map.

pub mod errors;
pub mod handlers;
pub mod models;

use dashmap::{DashMap, mapref::entry::Entry};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

use errors::{Result, StoreError};

/// Key namespace helpers. Every repository builds its keys through these so
/// the layout stays in one place.
pub mod keys {
    use crate::types::{AppointmentId, NoteId};

    pub const USER: &str = "user:";
    pub const USER_APPOINTMENTS: &str = "user-appointments:";
    pub const APPOINTMENT: &str = "appointment:";
    pub const APPOINTMENT_NOTES: &str = "appointment-notes:";
    pub const NOTE: &str = "note:";
    pub const RESET_TOKEN: &str = "reset-token:";
    pub const OTP: &str = "otp:";
    pub const HISTORY: &str = "history:";

    pub fn user(email: &str) -> String {
        format!("{USER}{}", email.to_lowercase())
    }

    pub fn user_appointments(email: &str) -> String {
        format!("{USER_APPOINTMENTS}{}", email.to_lowercase())
    }

    pub fn appointment(id: &AppointmentId) -> String {
        format!("{APPOINTMENT}{id}")
    }

    pub fn appointment_notes(id: &AppointmentId) -> String {
        format!("{APPOINTMENT_NOTES}{id}")
    }

    pub fn note(id: &NoteId) -> String {
        format!("{NOTE}{id}")
    }

    pub fn reset_token(token: &str) -> String {
        format!("{RESET_TOKEN}{token}")
    }

    pub fn otp(email: &str) -> String {
        format!("{OTP}{}", email.to_lowercase())
    }

    pub fn history(email: &str) -> String {
        format!("{HISTORY}{}", email.to_lowercase())
    }
}

/// Shared in-process key-value store holding JSON documents.
#[derive(Clone, Debug, Default)]
pub struct KvStore {
    inner: Arc<DashMap<String, serde_json::Value>>,
}

impl KvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch and deserialize the record under `key`, if any.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.inner.get(key) {
            Some(value) => {
                let record = serde_json::from_value(value.clone()).map_err(|source| StoreError::Serialization {
                    key: key.to_string(),
                    operation: "deserialize",
                    source,
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Write `value` under `key`, replacing any existing record.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_value(value).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            operation: "serialize",
            source,
        })?;
        self.inner.insert(key.to_string(), json);
        Ok(())
    }

    /// Write `value` under `key` only if the key is vacant.
    ///
    /// This is the uniqueness primitive: the occupancy check and the insert
    /// happen under the same map shard lock, so two concurrent sign-ups with
    /// the same email cannot both succeed.
    pub fn insert_new<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_value(value).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            operation: "serialize",
            source,
        })?;
        match self.inner.entry(key.to_string()) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation { key: key.to_string() }),
            Entry::Vacant(entry) => {
                entry.insert(json);
                Ok(())
            }
        }
    }

    /// Remove the record under `key`. Returns whether a record was present.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Fetch and deserialize every record whose key starts with `prefix`.
    ///
    /// Iteration order is unspecified; callers that care sort the result.
    pub fn get_by_prefix<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        let mut records = Vec::new();
        for entry in self.inner.iter() {
            if entry.key().starts_with(prefix) {
                let record = serde_json::from_value(entry.value().clone()).map_err(|source| StoreError::Serialization {
                    key: entry.key().clone(),
                    operation: "deserialize",
                    source,
                })?;
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Count records under a key prefix without deserializing them.
    pub fn count_by_prefix(&self, prefix: &str) -> usize {
        self.inner.iter().filter(|entry| entry.key().starts_with(prefix)).count()
    }
}
