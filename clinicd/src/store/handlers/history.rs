//! Service history repository over the `history:` namespace.
//!
//! Each patient's entire history lives in one record holding a list; entries
//! are only ever appended.

use chrono::Utc;
use uuid::Uuid;

use crate::store::errors::Result;
use crate::store::models::history::{HistoryCreateStoreRequest, HistoryRecord};
use crate::store::{KvStore, keys};

pub struct History<'a> {
    store: &'a KvStore,
}

impl<'a> History<'a> {
    pub fn new(store: &'a KvStore) -> Self {
        Self { store }
    }

    pub async fn list_for_patient(&self, email: &str) -> Result<Vec<HistoryRecord>> {
        Ok(self.store.get(&keys::history(email))?.unwrap_or_default())
    }

    pub async fn append(&self, request: &HistoryCreateStoreRequest) -> Result<HistoryRecord> {
        let record = HistoryRecord {
            id: Uuid::new_v4(),
            patient_email: request.patient_email.to_lowercase(),
            date: request.date.clone(),
            treatment: request.treatment.clone(),
            notes: request.notes.clone(),
            dentist_name: request.dentist_name.clone(),
            cost_cents: request.cost_cents,
            created_at: Utc::now(),
        };

        let key = keys::history(&record.patient_email);
        let mut entries: Vec<HistoryRecord> = self.store.get(&key)?.unwrap_or_default();
        entries.push(record.clone());
        self.store.set(&key, &entries)?;

        Ok(record)
    }
}
