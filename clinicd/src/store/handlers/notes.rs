//! Appointment note repository over the `note:` namespace.
//!
//! Notes are append-only. A per-appointment index (`appointment-notes:{id}`)
//! keeps the list of note ids in insertion order.

use chrono::Utc;
use uuid::Uuid;

use crate::store::errors::Result;
use crate::store::models::notes::{NoteCreateStoreRequest, NoteRecord};
use crate::store::{KvStore, keys};
use crate::types::{AppointmentId, NoteId};

pub struct Notes<'a> {
    store: &'a KvStore,
}

impl<'a> Notes<'a> {
    pub fn new(store: &'a KvStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: &NoteCreateStoreRequest) -> Result<NoteRecord> {
        let note = NoteRecord {
            id: Uuid::new_v4(),
            appointment_id: request.appointment_id,
            content: request.content.clone(),
            author_email: request.author_email.to_lowercase(),
            author_role: request.author_role,
            created_at: Utc::now(),
        };
        self.store.insert_new(&keys::note(&note.id), &note)?;

        let index_key = keys::appointment_notes(&request.appointment_id);
        let mut index: Vec<NoteId> = self.store.get(&index_key)?.unwrap_or_default();
        index.push(note.id);
        self.store.set(&index_key, &index)?;

        Ok(note)
    }

    /// Notes for an appointment, oldest first.
    pub async fn list_for_appointment(&self, appointment_id: &AppointmentId) -> Result<Vec<NoteRecord>> {
        let ids: Vec<NoteId> = self
            .store
            .get(&keys::appointment_notes(appointment_id))?
            .unwrap_or_default();
        let mut notes = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(note) = self.store.get::<NoteRecord>(&keys::note(id))? {
                notes.push(note);
            }
        }
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(notes)
    }
}
