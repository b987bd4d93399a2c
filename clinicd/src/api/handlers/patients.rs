use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        history::{HistoryEntryCreate, HistoryEntryResponse},
        users::{CurrentUser, ProfileUpdate, Role, UserResponse, WalkInPatientCreate},
    },
    auth::require_staff,
    errors::Error,
    store::{
        handlers::{History, Repository, Users},
        models::{
            history::HistoryCreateStoreRequest,
            users::{UserCreateStoreRequest, UserFilter, UserUpdateStoreRequest},
        },
    },
    types::{Operation, Resource},
};

/// List the patient directory (clinic accounts only)
#[utoipa::path(
    get,
    path = "/patients",
    tag = "patients",
    responses(
        (status = 200, description = "All patients, registered and walk-in", body = Vec<UserResponse>),
        (status = 403, description = "Caller is not a clinic account"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(role = %current_user.role))]
pub async fn list_patients(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, Error> {
    require_staff(&current_user, Operation::ReadAll, Resource::Patients)?;

    let patients = Users::new(&state.store).list(&UserFilter::with_role(Role::Patient)).await?;

    Ok(Json(patients.into_iter().map(UserResponse::from).collect()))
}

/// Register a walk-in patient
///
/// Creates a directory entry without sign-in credentials. The patient can
/// later claim the account by signing up with the same email.
#[utoipa::path(
    post,
    path = "/patients/walk-in",
    request_body = WalkInPatientCreate,
    tag = "patients",
    responses(
        (status = 201, description = "Walk-in patient created", body = UserResponse),
        (status = 403, description = "Caller is not a clinic account"),
        (status = 409, description = "An account already exists with this email"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(role = %current_user.role))]
pub async fn create_walk_in_patient(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<WalkInPatientCreate>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    require_staff(&current_user, Operation::CreateAll, Resource::Patients)?;

    let patient = Users::new(&state.store)
        .create(&UserCreateStoreRequest {
            email: request.email,
            name: request.name,
            role: Role::Patient,
            phone: request.phone,
            password_hash: None,
            can_login: false,
            is_walk_in: true,
            created_by: Some(current_user.email),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(patient))))
}

/// Update a profile
///
/// Patients may update their own name and phone; clinic accounts may update
/// any patient's.
#[utoipa::path(
    put,
    path = "/profile/{email}",
    request_body = ProfileUpdate,
    tag = "patients",
    params(("email" = String, Path, description = "Profile email")),
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "No such profile"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(role = %current_user.role))]
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(email): Path<String>,
    Json(request): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, Error> {
    let email = email.to_lowercase();
    if current_user.role == Role::Patient && current_user.email != email {
        require_staff(&current_user, Operation::UpdateAll, Resource::Users)?;
    }

    let users = Users::new(&state.store);
    if users.get_by_email(&email).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Profile".to_string(),
            id: email,
        });
    }

    let updated = users
        .update(
            &email,
            &UserUpdateStoreRequest {
                name: request.name,
                phone: request.phone,
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// List a patient's treatment history
#[utoipa::path(
    get,
    path = "/patients/{email}/history",
    tag = "patients",
    params(("email" = String, Path, description = "Patient email")),
    responses(
        (status = 200, description = "Treatment history, oldest first", body = Vec<HistoryEntryResponse>),
        (status = 403, description = "Not your history"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(role = %current_user.role))]
pub async fn list_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(email): Path<String>,
) -> Result<Json<Vec<HistoryEntryResponse>>, Error> {
    let email = email.to_lowercase();
    if current_user.role == Role::Patient && current_user.email != email {
        require_staff(&current_user, Operation::ReadAll, Resource::History)?;
    }

    let entries = History::new(&state.store).list_for_patient(&email).await?;
    Ok(Json(entries.into_iter().map(HistoryEntryResponse::from).collect()))
}

/// Record a treatment in a patient's history (clinic accounts only)
#[utoipa::path(
    post,
    path = "/patients/{email}/history",
    request_body = HistoryEntryCreate,
    tag = "patients",
    params(("email" = String, Path, description = "Patient email")),
    responses(
        (status = 201, description = "History entry recorded", body = HistoryEntryResponse),
        (status = 403, description = "Caller is not a clinic account"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(role = %current_user.role))]
pub async fn create_history_entry(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(email): Path<String>,
    Json(request): Json<HistoryEntryCreate>,
) -> Result<(StatusCode, Json<HistoryEntryResponse>), Error> {
    require_staff(&current_user, Operation::CreateAll, Resource::History)?;

    let entry = History::new(&state.store)
        .append(&HistoryCreateStoreRequest {
            patient_email: email.to_lowercase(),
            date: request.date,
            treatment: request.treatment,
            notes: request.notes,
            dentist_name: request.dentist_name,
            cost_cents: request.cost_cents,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(HistoryEntryResponse::from(entry))))
}
