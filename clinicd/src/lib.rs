//! # clinicd: Dental Clinic Management Backend
//!
//! `clinicd` is the backend for a small dental clinic: patients book
//! appointments and manage their profile, clinic staff run the schedule and
//! the patient directory, and an admin manages staff accounts. It exposes a
//! RESTful JSON API under `/api/v1` consumed by the clinic dashboard.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and keeps all records in an in-process key-value store
//! ([`store::KvStore`]), sized for a single-clinic deployment.
//!
//! The **API layer** ([`api`]) holds the axum handlers and their wire models.
//! Handlers authenticate the caller, enforce role rules, and delegate to the
//! store repositories.
//!
//! The **authentication layer** ([`auth`]) issues JWT sessions delivered as
//! HttpOnly cookies, hashes passwords with argon2id, and optionally gates
//! sign-in and sign-up behind emailed one-time codes.
//!
//! The **store layer** ([`store`]) uses the repository pattern: each entity
//! (users, appointments, notes, and so on) has a repository that owns its key
//! namespace and serialization.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use clinicd::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = clinicd::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     clinicd::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
mod email;
pub mod errors;
mod openapi;
pub mod store;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::password,
    config::CorsOrigin,
    openapi::ApiDoc,
    store::{
        handlers::{Appointments, Repository, Users},
        models::{
            appointments::AppointmentCreateStoreRequest,
            users::{UserCreateStoreRequest, UserUpdateStoreRequest},
        },
    },
};
use axum::http::HeaderValue;
use axum::{
    Router, http,
    routing::{get, post, put},
};
use bon::Builder;
pub use config::Config;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use store::KvStore;
pub use types::{AppointmentId, HistoryRecordId, NoteId, UserId};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: KvStore,
    pub config: Config,
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: creates the admin on first startup, updates the password on
/// later startups if one is configured.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(
    email: &str,
    password: Option<&str>,
    params: password::Argon2Params,
    store: &KvStore,
) -> Result<UserId, errors::Error> {
    let password_hash = match password {
        Some(pwd) => Some(password::hash_string_with_params(pwd, Some(params))?),
        None => None,
    };

    let users = Users::new(store);

    if let Some(existing) = users.get_by_email(email).await? {
        if password_hash.is_some() {
            users
                .update(
                    &existing.email,
                    &UserUpdateStoreRequest {
                        password_hash,
                        can_login: Some(true),
                        ..Default::default()
                    },
                )
                .await?;
        }
        return Ok(existing.id);
    }

    let created = users
        .create(&UserCreateStoreRequest {
            email: email.to_string(),
            name: "Clinic Admin".to_string(),
            role: Role::Admin,
            phone: None,
            password_hash,
            can_login: true,
            is_walk_in: false,
            created_by: None,
        })
        .await?;

    info!(email = %created.email, "Created initial admin user");
    Ok(created.id)
}

/// Seed demo accounts and a sample appointment (run only once).
///
/// Idempotent: skips seeding when the demo dentist already exists, so manual
/// changes survive restarts.
#[instrument(skip_all)]
pub async fn seed_demo_data(params: password::Argon2Params, store: &KvStore) -> Result<(), errors::Error> {
    const DEMO_PASSWORD: &str = "password123";

    let users = Users::new(store);
    if users.get_by_email("dentist@dentalclinic.com").await?.is_some() {
        info!("Demo data already seeded, skipping");
        return Ok(());
    }

    info!("Seeding demo accounts");
    let password_hash = password::hash_string_with_params(DEMO_PASSWORD, Some(params))?;

    let accounts = [
        ("dentist@dentalclinic.com", "Dr. Sarah Johnson", Role::Dentist),
        ("staff@dentalclinic.com", "Mary Chen", Role::Staff),
        ("patient@example.com", "John Smith", Role::Patient),
    ];
    for (email, name, role) in accounts {
        users
            .create(&UserCreateStoreRequest {
                email: email.to_string(),
                name: name.to_string(),
                role,
                phone: None,
                password_hash: Some(password_hash.clone()),
                can_login: true,
                is_walk_in: false,
                created_by: None,
            })
            .await?;
    }

    Appointments::new(store)
        .create(&AppointmentCreateStoreRequest {
            patient_name: "John Smith".to_string(),
            patient_email: Some("patient@example.com".to_string()),
            patient_phone: None,
            reason: "Routine checkup".to_string(),
            date: None,
            time: None,
            dentist_name: None,
        })
        .await?;

    Ok(())
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .allow_headers(vec![http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
        ])
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route("/health", get(api::handlers::health::health))
        // Authentication
        .route("/auth/signin", post(api::handlers::auth::signin))
        .route("/auth/signup", post(api::handlers::auth::signup))
        .route("/auth/verify-otp", post(api::handlers::auth::verify_otp))
        .route("/auth/resend-otp", post(api::handlers::auth::resend_otp))
        .route("/auth/signout", post(api::handlers::auth::signout))
        .route("/auth/change-password", post(api::handlers::auth::change_password))
        .route("/auth/forgot-password", post(api::handlers::auth::forgot_password))
        .route("/auth/reset-password", post(api::handlers::auth::reset_password))
        // Appointments
        .route(
            "/appointments",
            get(api::handlers::appointments::list_appointments).post(api::handlers::appointments::create_appointment),
        )
        .route(
            "/appointments/{id}",
            get(api::handlers::appointments::get_appointment).put(api::handlers::appointments::update_appointment),
        )
        .route(
            "/appointments/{id}/notes",
            get(api::handlers::appointments::list_notes).post(api::handlers::appointments::create_note),
        )
        // Patients
        .route("/patients", get(api::handlers::patients::list_patients))
        .route("/patients/walk-in", post(api::handlers::patients::create_walk_in_patient))
        .route(
            "/patients/{email}/history",
            get(api::handlers::patients::list_history).post(api::handlers::patients::create_history_entry),
        )
        .route("/profile/{email}", put(api::handlers::patients::update_profile))
        // Administration
        .route(
            "/admin/users",
            get(api::handlers::users::list_users).post(api::handlers::users::create_user),
        )
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] initializes the store, ensures the
///    admin account exists, and optionally seeds demo data
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = KvStore::new();

        let argon2_params = password::Argon2Params::from(&config.auth.native.password);
        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), argon2_params, &store)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {e}"))?;

        if config.seed_demo_data {
            seed_demo_data(argon2_params, &store)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to seed demo data: {e}"))?;
        }

        let state = AppState::builder().store(store).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("clinicd listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::create_test_config;

    fn test_argon2_params() -> password::Argon2Params {
        password::Argon2Params::from(&create_test_config().auth.native.password)
    }

    #[tokio::test]
    async fn test_initial_admin_user_is_idempotent() {
        let store = KvStore::new();

        let first = create_initial_admin_user("admin@test.com", Some("adminpass1"), test_argon2_params(), &store)
            .await
            .unwrap();
        let second = create_initial_admin_user("admin@test.com", Some("rotated-pass"), test_argon2_params(), &store)
            .await
            .unwrap();
        assert_eq!(first, second);

        let admin = Users::new(&store).get_by_email("admin@test.com").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(password::verify_string("rotated-pass", admin.password_hash.as_deref().unwrap()).unwrap());
    }

    #[tokio::test]
    async fn test_demo_seed_is_idempotent() {
        let store = KvStore::new();

        seed_demo_data(test_argon2_params(), &store).await.unwrap();
        seed_demo_data(test_argon2_params(), &store).await.unwrap();

        let users = Users::new(&store);
        assert_eq!(users.count().await, 3);
        assert!(users.get_by_email("staff@dentalclinic.com").await.unwrap().is_some());

        let appointments = Appointments::new(&store);
        assert!(appointments.has_pending_for("patient@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_router_builds_from_test_config() {
        let state = AppState::builder().store(KvStore::new()).config(create_test_config()).build();
        assert!(build_router(state).is_ok());
    }
}
