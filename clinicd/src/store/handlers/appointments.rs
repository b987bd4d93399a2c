//! Appointment repository over the `appointment:` namespace.
//!
//! Besides the record itself, the repository maintains a per-patient index
//! (`user-appointments:{email}` holding a list of appointment ids) so a
//! patient's own appointments can be listed without scanning the whole
//! namespace.

use chrono::Utc;
use uuid::Uuid;

use crate::api::models::users::Role;
use crate::store::errors::{Result, StoreError};
use crate::store::handlers::repository::Repository;
use crate::store::models::appointments::{
    AppointmentCreateStoreRequest, AppointmentFilter, AppointmentRecord, AppointmentStatus,
    AppointmentUpdateStoreRequest,
};
use crate::store::{KvStore, keys};
use crate::types::AppointmentId;

pub struct Appointments<'a> {
    store: &'a KvStore,
}

impl<'a> Appointments<'a> {
    pub fn new(store: &'a KvStore) -> Self {
        Self { store }
    }

    fn load_index(&self, email: &str) -> Result<Vec<AppointmentId>> {
        Ok(self.store.get(&keys::user_appointments(email))?.unwrap_or_default())
    }

    /// Appointments referenced by a patient's index. Ids whose record has
    /// been deleted are skipped.
    pub async fn list_for_patient(&self, email: &str) -> Result<Vec<AppointmentRecord>> {
        let ids = self.load_index(email)?;
        let mut appointments = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(appointment) = self.store.get::<AppointmentRecord>(&keys::appointment(id))? {
                appointments.push(appointment);
            }
        }
        Ok(appointments)
    }

    /// Whether the patient already has an appointment awaiting confirmation.
    pub async fn has_pending_for(&self, email: &str) -> Result<bool> {
        let appointments = self.list_for_patient(email).await?;
        Ok(appointments.iter().any(|a| a.status == AppointmentStatus::Pending))
    }
}

#[async_trait::async_trait]
impl Repository for Appointments<'_> {
    type CreateRequest = AppointmentCreateStoreRequest;
    type UpdateRequest = AppointmentUpdateStoreRequest;
    type Response = AppointmentRecord;
    type Id = AppointmentId;
    type Filter = AppointmentFilter;

    /// New appointments always start out pending and flagged for staff
    /// confirmation, whatever the caller claims.
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let appointment = AppointmentRecord {
            id: Uuid::new_v4(),
            patient_name: request.patient_name.clone(),
            patient_email: request.patient_email.as_deref().map(str::to_lowercase),
            patient_phone: request.patient_phone.clone(),
            reason: request.reason.clone(),
            status: AppointmentStatus::Pending,
            date: request.date.clone(),
            time: request.time.clone(),
            dentist_name: request.dentist_name.clone(),
            needs_staff_confirmation: true,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_new(&keys::appointment(&appointment.id), &appointment)?;

        if let Some(email) = &appointment.patient_email {
            let mut index = self.load_index(email)?;
            index.push(appointment.id);
            self.store.set(&keys::user_appointments(email), &index)?;
        }
        Ok(appointment)
    }

    async fn get_by_id(&self, id: &Self::Id) -> Result<Option<Self::Response>> {
        self.store.get(&keys::appointment(id))
    }

    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut appointments = match (&filter.role, &filter.user_email) {
            (Role::Patient, Some(email)) => self.list_for_patient(email).await?,
            _ => self.store.get_by_prefix(keys::APPOINTMENT)?,
        };
        appointments.sort_by(|a: &AppointmentRecord, b: &AppointmentRecord| b.created_at.cmp(&a.created_at));
        Ok(appointments)
    }

    async fn update(&self, id: &Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let key = keys::appointment(id);
        let mut appointment: AppointmentRecord = self.store.get(&key)?.ok_or(StoreError::NotFound)?;

        if let Some(status) = request.status {
            appointment.status = status;
        }
        if let Some(date) = &request.date {
            appointment.date = Some(date.clone());
        }
        if let Some(time) = &request.time {
            appointment.time = Some(time.clone());
        }
        if let Some(dentist_name) = &request.dentist_name {
            appointment.dentist_name = Some(dentist_name.clone());
        }
        if let Some(reason) = &request.reason {
            appointment.reason = reason.clone();
        }
        if let Some(needs_staff_confirmation) = request.needs_staff_confirmation {
            appointment.needs_staff_confirmation = needs_staff_confirmation;
        }
        appointment.updated_at = Utc::now();

        self.store.set(&key, &appointment)?;
        Ok(appointment)
    }

    async fn delete(&self, id: &Self::Id) -> Result<bool> {
        Ok(self.store.delete(&keys::appointment(id)))
    }
}
