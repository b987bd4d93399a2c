use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::users::{AdminUserCreate, CurrentUser, Role, UserResponse},
    auth::require_admin,
    errors::Error,
    store::{
        handlers::{Repository, Users},
        models::users::{UserCreateStoreRequest, UserFilter},
    },
    types::{Operation, Resource},
};

/// List clinic accounts (admin only)
///
/// Returns staff and dentist accounts; patients live in the directory at
/// `/patients`.
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    responses(
        (status = 200, description = "Staff and dentist accounts", body = Vec<UserResponse>),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(role = %current_user.role))]
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, Error> {
    require_admin(&current_user, Operation::ReadAll, Resource::Users)?;

    let users = Users::new(&state.store)
        .list(&UserFilter {
            roles: vec![Role::Staff, Role::Dentist],
        })
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Create a staff or dentist account (admin only)
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = AdminUserCreate,
    tag = "admin",
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Role is not staff or dentist"),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "An account already exists with this email"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(role = %current_user.role))]
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<AdminUserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    require_admin(&current_user, Operation::CreateAll, Resource::Users)?;

    if !matches!(request.role, Role::Staff | Role::Dentist) {
        return Err(Error::BadRequest {
            message: "Admin can only create staff and dentist users".to_string(),
        });
    }

    crate::api::handlers::auth::validate_password(&request.password, &state.config)?;
    let password_hash = crate::api::handlers::auth::hash_password_blocking(request.password, &state.config).await?;

    let user = Users::new(&state.store)
        .create(&UserCreateStoreRequest {
            email: request.email,
            name: request.name,
            role: request.role,
            phone: request.phone,
            password_hash: Some(password_hash),
            can_login: true,
            is_walk_in: false,
            created_by: Some(current_user.email),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_config, seed_admin_user, signup_user};
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_admin_endpoints_require_admin() {
        let (server, _state) = create_test_app(create_test_config()).await;
        signup_user(&server, "p@example.com", "password123", "John Smith").await;

        server.get("/api/v1/admin/users").await.assert_status(StatusCode::FORBIDDEN);
        server
            .post("/api/v1/admin/users")
            .json(&json!({
                "email": "d@dentalclinic.com",
                "name": "Dr. D",
                "role": "dentist",
                "password": "password123"
            }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_creates_dentist_who_can_sign_in() {
        let (server, state) = create_test_app(create_test_config()).await;
        seed_admin_user(&server, &state, "admin@dentalclinic.com", "adminpass1").await;

        let response = server
            .post("/api/v1/admin/users")
            .json(&json!({
                "email": "Dentist@DentalClinic.com",
                "name": "Dr. Sarah Johnson",
                "role": "dentist",
                "password": "password123"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["email"], "dentist@dentalclinic.com");
        assert_eq!(body["role"], "dentist");
        assert_eq!(body["canLogin"], true);
        assert!(body.get("passwordHash").is_none());

        let response = server
            .post("/api/v1/auth/signin")
            .json(&json!({"email": "dentist@dentalclinic.com", "password": "password123"}))
            .await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_admin_cannot_create_patient_or_admin() {
        let (server, state) = create_test_app(create_test_config()).await;
        seed_admin_user(&server, &state, "admin@dentalclinic.com", "adminpass1").await;

        for role in ["patient", "admin"] {
            let response = server
                .post("/api/v1/admin/users")
                .json(&json!({
                    "email": "x@example.com",
                    "name": "X",
                    "role": role,
                    "password": "password123"
                }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert_eq!(body["error"], "Admin can only create staff and dentist users");
        }
    }

    #[tokio::test]
    async fn test_admin_user_listing_shows_clinic_accounts_only() {
        let (server, state) = create_test_app(create_test_config()).await;
        signup_user(&server, "p@example.com", "password123", "John Smith").await;
        seed_admin_user(&server, &state, "admin@dentalclinic.com", "adminpass1").await;

        server
            .post("/api/v1/admin/users")
            .json(&json!({
                "email": "dentist@dentalclinic.com",
                "name": "Dr. Sarah Johnson",
                "role": "dentist",
                "password": "password123"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get("/api/v1/admin/users").await;
        response.assert_status_ok();
        let body: Value = response.json();
        // Patients and the admin itself are not part of this listing
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["email"], "dentist@dentalclinic.com");
    }
}
