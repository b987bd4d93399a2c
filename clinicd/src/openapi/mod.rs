//! OpenAPI documentation for the clinic API at `/api/v1/*`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;

/// Security scheme for the clinic API (session cookie).
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "session_token".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "clinicd_session",
                    "Session cookie issued by the signin, signup, or verify-otp endpoints.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Clinic management API")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::health::health,
        // Authentication
        api::handlers::auth::signin,
        api::handlers::auth::signup,
        api::handlers::auth::verify_otp,
        api::handlers::auth::resend_otp,
        api::handlers::auth::signout,
        api::handlers::auth::change_password,
        api::handlers::auth::forgot_password,
        api::handlers::auth::reset_password,
        // Appointments
        api::handlers::appointments::list_appointments,
        api::handlers::appointments::create_appointment,
        api::handlers::appointments::get_appointment,
        api::handlers::appointments::update_appointment,
        api::handlers::appointments::list_notes,
        api::handlers::appointments::create_note,
        // Patients
        api::handlers::patients::list_patients,
        api::handlers::patients::create_walk_in_patient,
        api::handlers::patients::update_profile,
        api::handlers::patients::list_history,
        api::handlers::patients::create_history_entry,
        // Admin
        api::handlers::users::list_users,
        api::handlers::users::create_user,
    ),
    components(
        schemas(
            api::models::auth::SignInRequest,
            api::models::auth::SignUpRequest,
            api::models::auth::VerifyOtpRequest,
            api::models::auth::ResendOtpRequest,
            api::models::auth::ChangePasswordRequest,
            api::models::auth::ForgotPasswordRequest,
            api::models::auth::ForgotPasswordResponse,
            api::models::auth::ResetPasswordRequest,
            api::models::auth::AuthResponse,
            api::models::auth::OtpChallengeResponse,
            api::models::auth::MessageResponse,
            api::models::users::Role,
            api::models::users::UserResponse,
            api::models::users::AdminUserCreate,
            api::models::users::WalkInPatientCreate,
            api::models::users::ProfileUpdate,
            api::models::appointments::AppointmentResponse,
            api::models::appointments::AppointmentCreate,
            api::models::appointments::AppointmentUpdate,
            api::models::appointments::NoteCreate,
            api::models::appointments::NoteResponse,
            api::models::history::HistoryEntryResponse,
            api::models::history::HistoryEntryCreate,
            api::handlers::health::HealthResponse,
            crate::store::models::appointments::AppointmentStatus,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Sign in, sign up, and password management"),
        (name = "appointments", description = "Appointment booking and staff notes"),
        (name = "patients", description = "Patient directory and treatment history"),
        (name = "admin", description = "Account administration"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_doc_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("/auth/signin"));
        assert!(json.contains("/appointments/{id}/notes"));
        assert!(json.contains("session_token"));
    }

    #[test]
    fn test_id_fields_render_as_uuid_strings() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        for schema in ["UserResponse", "AppointmentResponse", "NoteResponse", "HistoryEntryResponse"] {
            let id = &json["components"]["schemas"][schema]["properties"]["id"];
            assert_eq!(id["type"], "string", "{schema}.id");
            assert_eq!(id["format"], "uuid", "{schema}.id");
        }
    }
}
