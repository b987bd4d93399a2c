//! Stored appointment records and repository request models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::users::Role;
use crate::types::AppointmentId;

/// Appointment lifecycle status.
///
/// Creation always starts at `Pending`; later transitions are driven by
/// staff, dentist, or admin users, except that a patient may cancel their
/// own appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

/// Appointment record as persisted in the store, keyed by `appointment:{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
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

#[derive(Debug, Clone)]
pub struct AppointmentCreateStoreRequest {
    pub patient_name: String,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub reason: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub dentist_name: Option<String>,
}

/// Partial update; `None` fields are left untouched. Writes are
/// last-writer-wins with no version check.
#[derive(Debug, Clone, Default)]
pub struct AppointmentUpdateStoreRequest {
    pub status: Option<AppointmentStatus>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub dentist_name: Option<String>,
    pub reason: Option<String>,
    pub needs_staff_confirmation: Option<bool>,
}

/// Filter for listing appointments: patients only ever see their own set
/// (resolved through the per-patient id index), everyone else sees all.
#[derive(Debug, Clone)]
pub struct AppointmentFilter {
    pub role: Role,
    pub user_email: Option<String>,
}
