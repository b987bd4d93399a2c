//! API models for patient service history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::models::history::HistoryRecord;
use crate::types::HistoryRecordId;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: HistoryRecordId,
    pub patient_email: String,
    pub date: String,
    pub treatment: String,
    pub notes: Option<String>,
    pub dentist_name: Option<String>,
    pub cost_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryRecord> for HistoryEntryResponse {
    fn from(record: HistoryRecord) -> Self {
        Self {
            id: record.id,
            patient_email: record.patient_email,
            date: record.date,
            treatment: record.treatment,
            notes: record.notes,
            dentist_name: record.dentist_name,
            cost_cents: record.cost_cents,
            created_at: record.created_at,
        }
    }
}

/// Request body for `POST /patients/{email}/history` (staff and above).
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryCreate {
    pub date: String,
    pub treatment: String,
    pub notes: Option<String>,
    pub dentist_name: Option<String>,
    pub cost_cents: Option<i64>,
}
