//! Test utilities for integration testing.

use axum_test::TestServer;

use crate::api::models::users::Role;
use crate::auth::password;
use crate::config::{AuthConfig, Config, EmailConfig, EmailTransportConfig, NativeAuthConfig, OtpConfig, PasswordConfig};
use crate::store::handlers::{Repository, Users};
use crate::store::models::users::UserCreateStoreRequest;
use crate::{AppState, KvStore, build_router};

pub fn create_test_config() -> Config {
    // Use temp directory for test emails; keep() persists it past the handle
    // so the file transport can write for the rest of the test run.
    let temp_dir = tempfile::Builder::new()
        .prefix("clinicd-test-emails-")
        .tempdir()
        .expect("Failed to create test email directory")
        .keep();

    Config {
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: AuthConfig {
            // Most tests exercise plain password auth; OTP tests opt back in
            otp: OtpConfig {
                enabled: false,
                ..Default::default()
            },
            native: NativeAuthConfig {
                // Cheap hashing keeps the suite fast; production keeps the defaults
                password: PasswordConfig {
                    argon2_memory_kib: 128,
                    argon2_iterations: 1,
                    argon2_parallelism: 1,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        },
        email: EmailConfig {
            transport: EmailTransportConfig::File {
                path: temp_dir.to_string_lossy().to_string(),
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Build a test server with a cookie jar plus the state backing it, so tests
/// can seed records directly through the repositories.
pub async fn create_test_app(config: Config) -> (TestServer, AppState) {
    let state = AppState::builder().store(KvStore::new()).config(config).build();
    let router = build_router(state.clone()).expect("Failed to build router");

    let server = TestServer::builder()
        .save_cookies()
        .build(router)
        .expect("Failed to create test server");

    (server, state)
}

/// Sign up a patient account; the session cookie lands in the server's jar.
pub async fn signup_user(server: &TestServer, email: &str, password: &str, name: &str) {
    let response = server
        .post("/api/v1/auth/signup")
        .json(&serde_json::json!({
            "email": email,
            "password": password,
            "name": name,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
}

pub async fn seed_staff_user(server: &TestServer, state: &AppState, email: &str, password: &str) {
    seed_user_with_role(server, state, email, password, Role::Staff).await;
}

pub async fn seed_admin_user(server: &TestServer, state: &AppState, email: &str, password: &str) {
    seed_user_with_role(server, state, email, password, Role::Admin).await;
}

/// Create an account with the given role directly in the store, then sign it
/// in so the server's cookie jar carries its session.
async fn seed_user_with_role(server: &TestServer, state: &AppState, email: &str, user_password: &str, role: Role) {
    Users::new(&state.store)
        .create(&UserCreateStoreRequest {
            email: email.to_string(),
            name: format!("Test {role}"),
            role,
            phone: None,
            password_hash: Some(
                password::hash_string_with_params(
                    user_password,
                    Some(password::Argon2Params::from(&state.config.auth.native.password)),
                )
                .expect("Failed to hash test password"),
            ),
            can_login: true,
            is_walk_in: false,
            created_by: None,
        })
        .await
        .expect("Failed to seed test user");

    let response = server
        .post("/api/v1/auth/signin")
        .json(&serde_json::json!({"email": email, "password": user_password}))
        .await;
    response.assert_status_ok();
}
