//! API models for appointments and their notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::users::Role;
use crate::store::models::appointments::{AppointmentRecord, AppointmentStatus};
use crate::store::models::notes::NoteRecord;
use crate::types::{AppointmentId, NoteId};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AppointmentId,
    pub patient_name: String,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub reason: String,
    pub status: AppointmentStatus,
    pub date: Option<String>,
    pub time: Option<String>,
    pub dentist_name: Option<String>,
    pub needs_staff_confirmation: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AppointmentRecord> for AppointmentResponse {
    fn from(appointment: AppointmentRecord) -> Self {
        Self {
            id: appointment.id,
            patient_name: appointment.patient_name,
            patient_email: appointment.patient_email,
            patient_phone: appointment.patient_phone,
            reason: appointment.reason,
            status: appointment.status,
            date: appointment.date,
            time: appointment.time,
            dentist_name: appointment.dentist_name,
            needs_staff_confirmation: appointment.needs_staff_confirmation,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

/// Request body for `POST /appointments`.
///
/// Patients book for themselves: their name and email come from the session
/// and any values here are ignored. Staff may fill them in when booking on a
/// patient's behalf.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentCreate {
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub reason: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub dentist_name: Option<String>,
}

/// Request body for `PUT /appointments/{id}`. Absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdate {
    pub status: Option<AppointmentStatus>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub dentist_name: Option<String>,
    pub reason: Option<String>,
    pub needs_staff_confirmation: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NoteCreate {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: NoteId,
    #[schema(value_type = String, format = "uuid")]
    pub appointment_id: AppointmentId,
    pub content: String,
    pub author_email: String,
    pub author_role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<NoteRecord> for NoteResponse {
    fn from(note: NoteRecord) -> Self {
        Self {
            id: note.id,
            appointment_id: note.appointment_id,
            content: note.content,
            author_email: note.author_email,
            author_role: note.author_role,
            created_at: note.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_response_wire_shape() {
        let now = Utc::now();
        let record = AppointmentRecord {
            id: uuid::Uuid::new_v4(),
            patient_name: "John Smith".to_string(),
            patient_email: Some("p@example.com".to_string()),
            patient_phone: None,
            reason: "Checkup".to_string(),
            status: AppointmentStatus::Pending,
            date: None,
            time: None,
            dentist_name: None,
            needs_staff_confirmation: true,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(AppointmentResponse::from(record)).unwrap();
        assert_eq!(json["patientEmail"], "p@example.com");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["needsStaffConfirmation"], true);
    }
}
