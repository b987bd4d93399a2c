//! Stored appointment note records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::models::users::Role;
use crate::types::{AppointmentId, NoteId};

/// Free-text annotation attached to an appointment. Append-only: there is no
/// update or delete path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: NoteId,
    pub appointment_id: AppointmentId,
    pub content: String,
    pub author_email: String,
    pub author_role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NoteCreateStoreRequest {
    pub appointment_id: AppointmentId,
    pub content: String,
    pub author_email: String,
    pub author_role: Role,
}
