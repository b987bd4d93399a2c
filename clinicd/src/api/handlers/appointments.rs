use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        appointments::{AppointmentCreate, AppointmentResponse, AppointmentUpdate, NoteCreate, NoteResponse},
        users::{CurrentUser, Role},
    },
    auth::require_staff,
    errors::Error,
    store::{
        handlers::{Appointments, Notes, Repository},
        models::{
            appointments::{AppointmentCreateStoreRequest, AppointmentFilter, AppointmentRecord, AppointmentStatus, AppointmentUpdateStoreRequest},
            notes::NoteCreateStoreRequest,
        },
    },
    types::{AppointmentId, Operation, Permission, Resource},
};

/// List appointments
///
/// Patients see only their own; clinic accounts see everything.
#[utoipa::path(
    get,
    path = "/appointments",
    tag = "appointments",
    responses(
        (status = 200, description = "Appointments visible to the caller", body = Vec<AppointmentResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(role = %current_user.role))]
pub async fn list_appointments(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<AppointmentResponse>>, Error> {
    let appointments = Appointments::new(&state.store)
        .list(&AppointmentFilter {
            role: current_user.role,
            user_email: Some(current_user.email),
        })
        .await?;

    Ok(Json(appointments.into_iter().map(AppointmentResponse::from).collect()))
}

/// Request an appointment
///
/// Patients book for themselves and may hold at most one pending request at
/// a time. Clinic accounts book on a patient's behalf and must supply the
/// patient's name.
#[utoipa::path(
    post,
    path = "/appointments",
    request_body = AppointmentCreate,
    tag = "appointments",
    responses(
        (status = 201, description = "Appointment requested", body = AppointmentResponse),
        (status = 400, description = "Missing patient name"),
        (status = 409, description = "A pending appointment already exists"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(role = %current_user.role))]
pub async fn create_appointment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<AppointmentCreate>,
) -> Result<(StatusCode, Json<AppointmentResponse>), Error> {
    let appointments = Appointments::new(&state.store);

    let store_request = if current_user.role == Role::Patient {
        // One open request per patient; checked here rather than trusted to
        // the client
        if appointments.has_pending_for(&current_user.email).await? {
            return Err(Error::Conflict {
                message: "You already have a pending appointment request".to_string(),
            });
        }

        AppointmentCreateStoreRequest {
            patient_name: current_user.name.clone(),
            patient_email: Some(current_user.email.clone()),
            patient_phone: request.patient_phone,
            reason: request.reason,
            date: request.date,
            time: request.time,
            dentist_name: request.dentist_name,
        }
    } else {
        let patient_name = request.patient_name.ok_or_else(|| Error::BadRequest {
            message: "patientName is required when booking for a patient".to_string(),
        })?;

        if let Some(email) = &request.patient_email {
            if appointments.has_pending_for(email).await? {
                return Err(Error::Conflict {
                    message: "This patient already has a pending appointment request".to_string(),
                });
            }
        }

        AppointmentCreateStoreRequest {
            patient_name,
            patient_email: request.patient_email,
            patient_phone: request.patient_phone,
            reason: request.reason,
            date: request.date,
            time: request.time,
            dentist_name: request.dentist_name,
        }
    };

    let appointment = appointments.create(&store_request).await?;
    Ok((StatusCode::CREATED, Json(AppointmentResponse::from(appointment))))
}

/// Get a single appointment
#[utoipa::path(
    get,
    path = "/appointments/{id}",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "The appointment", body = AppointmentResponse),
        (status = 404, description = "Not found or not visible to the caller"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_appointment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<AppointmentId>,
) -> Result<Json<AppointmentResponse>, Error> {
    let appointment = fetch_visible_appointment(&state, &current_user, &id).await?;
    Ok(Json(AppointmentResponse::from(appointment)))
}

/// Update an appointment
///
/// Clinic accounts may change any field. A patient may only cancel their own
/// appointment.
#[utoipa::path(
    put,
    path = "/appointments/{id}",
    request_body = AppointmentUpdate,
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Updated appointment", body = AppointmentResponse),
        (status = 403, description = "Patients may only cancel their own appointments"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(role = %current_user.role))]
pub async fn update_appointment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<AppointmentId>,
    Json(request): Json<AppointmentUpdate>,
) -> Result<Json<AppointmentResponse>, Error> {
    let appointment = fetch_visible_appointment(&state, &current_user, &id).await?;

    if current_user.role == Role::Patient {
        let is_cancel_only = request.status == Some(AppointmentStatus::Cancelled)
            && request.date.is_none()
            && request.time.is_none()
            && request.dentist_name.is_none()
            && request.reason.is_none()
            && request.needs_staff_confirmation.is_none();
        if !is_cancel_only {
            return Err(Error::InsufficientPermissions {
                required: Permission::Allow(Resource::Appointments, Operation::UpdateAll),
                action: Operation::UpdateAll,
                resource: Resource::Appointments.to_string(),
            });
        }
    }

    let updated = Appointments::new(&state.store)
        .update(
            &appointment.id,
            &AppointmentUpdateStoreRequest {
                status: request.status,
                date: request.date,
                time: request.time,
                dentist_name: request.dentist_name,
                reason: request.reason,
                needs_staff_confirmation: request.needs_staff_confirmation,
            },
        )
        .await?;

    Ok(Json(AppointmentResponse::from(updated)))
}

/// List notes on an appointment
#[utoipa::path(
    get,
    path = "/appointments/{id}/notes",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Notes, oldest first", body = Vec<NoteResponse>),
        (status = 404, description = "Appointment not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_notes(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<AppointmentId>,
) -> Result<Json<Vec<NoteResponse>>, Error> {
    let appointment = fetch_visible_appointment(&state, &current_user, &id).await?;

    let notes = Notes::new(&state.store).list_for_appointment(&appointment.id).await?;
    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

/// Add a note to an appointment (clinic accounts only)
#[utoipa::path(
    post,
    path = "/appointments/{id}/notes",
    request_body = NoteCreate,
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 201, description = "Note added", body = NoteResponse),
        (status = 403, description = "Patients cannot add notes"),
        (status = 404, description = "Appointment not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(role = %current_user.role))]
pub async fn create_note(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<AppointmentId>,
    Json(request): Json<NoteCreate>,
) -> Result<(StatusCode, Json<NoteResponse>), Error> {
    require_staff(&current_user, Operation::CreateAll, Resource::Notes)?;

    let appointment = Appointments::new(&state.store)
        .get_by_id(&id)
        .await?
        .ok_or_else(|| appointment_not_found(&id))?;

    let note = Notes::new(&state.store)
        .create(&NoteCreateStoreRequest {
            appointment_id: appointment.id,
            content: request.content,
            author_email: current_user.email,
            author_role: current_user.role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))))
}

/// Load an appointment, hiding other patients' records behind a 404.
async fn fetch_visible_appointment(
    state: &AppState,
    current_user: &CurrentUser,
    id: &AppointmentId,
) -> Result<AppointmentRecord, Error> {
    let appointment = Appointments::new(&state.store)
        .get_by_id(id)
        .await?
        .ok_or_else(|| appointment_not_found(id))?;

    if current_user.role == Role::Patient && appointment.patient_email.as_deref() != Some(current_user.email.as_str()) {
        return Err(appointment_not_found(id));
    }

    Ok(appointment)
}

fn appointment_not_found(id: &AppointmentId) -> Error {
    Error::NotFound {
        resource: "Appointment".to_string(),
        id: crate::types::abbrev_uuid(id),
    }
}
