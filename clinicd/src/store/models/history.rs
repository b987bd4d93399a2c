//! Stored service history records (past treatments per patient).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::HistoryRecordId;

/// A past-treatment entry. The whole per-patient history is stored as one
/// list under `history:{email}`; entries are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: HistoryRecordId,
    pub patient_email: String,
    pub date: String,
    pub treatment: String,
    pub notes: Option<String>,
    pub dentist_name: Option<String>,
    pub cost_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HistoryCreateStoreRequest {
    pub patient_email: String,
    pub date: String,
    pub treatment: String,
    pub notes: Option<String>,
    pub dentist_name: Option<String>,
    pub cost_cents: Option<i64>,
}
