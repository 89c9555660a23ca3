//! # Schoolhouse HTTP API Module
//!
//! This module implements the HTTP JSON API server using axum.
//!
//! ## Endpoints
//!
//! Public:
//! - `GET /health`, `GET /` (home courses)
//! - `GET /courses`, `GET /courses/{id}`, `GET /filias`, `GET /filias/{id}`
//! - `POST /quiz`, `GET|POST /quiz/contact`, `POST /contact`
//!
//! Accounts:
//! - `POST /register`, `POST /login`, `POST /logout`
//! - `GET /dashboard` and `GET /dashboard/{role}`
//!
//! Management (program manager):
//! - `/manage/courses`, `/manage/groups`, `/manage/filias`
//!
//! Management (education manager):
//! - `/manage/groups/{id}/students|teachers[/remove]`, `/start`, `/finish`, `/history`
//! - `/manage/students`, `/manage/teachers`, `/manage/messages`
//!
//! Members:
//! - `GET /groups/{id}`, `/notifications`
//!
//! ## Security Configuration
//!
//! See [`crate::config::Config`]: CORS origins (localhost only by default)
//! and the global rate limit (0 disables it).

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod types;

pub use auth::{CurrentUser, SessionRegistry};
pub use middleware::create_rate_limiter;
pub use types::{ActionResponse, ApiError, HealthResponse, LoginResponse, Saved, UserView};

use crate::AppError;
use crate::config::Config;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use schoolhouse_core::School;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// The `School` write guard is held for a whole check-then-commit sequence,
/// so concurrent enrollment requests against one group are serialized.
#[derive(Clone)]
pub struct AppState {
    pub school: Arc<RwLock<School>>,
    pub sessions: Arc<RwLock<SessionRegistry>>,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(school: School, config: Config) -> Self {
        Self {
            school: Arc::new(RwLock::new(school)),
            sessions: Arc::new(RwLock::new(SessionRegistry::new())),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const CORS_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer from the configured origins.
///
/// - `["*"]`: allows all origins (development only)
/// - empty: localhost only
/// - otherwise: the listed origins, with credentials so the session cookie works
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::info!("CORS: No origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit - 2 MiB
/// 4. Rate limiting - global token bucket (if enabled)
///
/// Authentication is per handler through the [`CurrentUser`] extractor.
pub fn create_router(state: AppState) -> Router {
    use handlers::{accounts, manage, members, public};

    let cors = build_cors_layer(&state.config.cors_origins);

    let rate_limit = state.config.rate_limit;
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let mut router = Router::new()
        // Public
        .route("/health", get(public::health_handler))
        .route("/", get(public::home_handler))
        .route("/courses", get(public::courses_handler))
        .route("/courses/{id}", get(public::course_details_handler))
        .route("/filias", get(public::filias_handler))
        .route("/filias/{id}", get(public::filia_details_handler))
        .route("/quiz", post(public::quiz_handler))
        .route(
            "/quiz/contact",
            get(public::quiz_contact_handler).post(public::quiz_contact_submit_handler),
        )
        .route("/contact", post(public::contact_handler))
        // Accounts
        .route("/register", post(accounts::register_handler))
        .route("/login", post(accounts::login_handler))
        .route("/logout", post(accounts::logout_handler))
        .route("/dashboard", get(accounts::dashboard_redirect_handler))
        .route("/dashboard/student", get(accounts::student_dashboard_handler))
        .route("/dashboard/teacher", get(accounts::teacher_dashboard_handler))
        .route(
            "/dashboard/education-manager",
            get(accounts::education_manager_dashboard_handler),
        )
        .route(
            "/dashboard/program-manager",
            get(accounts::program_manager_dashboard_handler),
        )
        // Program manager
        .route(
            "/manage/courses",
            get(manage::list_courses_handler).post(manage::create_course_handler),
        )
        .route(
            "/manage/courses/{id}",
            get(manage::get_course_handler)
                .put(manage::update_course_handler)
                .delete(manage::delete_course_handler),
        )
        .route(
            "/manage/groups",
            get(manage::list_groups_handler).post(manage::create_group_handler),
        )
        .route(
            "/manage/groups/{id}",
            get(manage::get_group_handler)
                .put(manage::update_group_handler)
                .delete(manage::delete_group_handler),
        )
        .route("/manage/filias", post(manage::create_filia_handler))
        .route(
            "/manage/filias/{id}",
            put(manage::update_filia_handler).delete(manage::delete_filia_handler),
        )
        // Education manager
        .route("/manage/groups/{id}/students", post(manage::add_students_handler))
        .route(
            "/manage/groups/{id}/students/remove",
            post(manage::remove_students_handler),
        )
        .route("/manage/groups/{id}/teachers", post(manage::add_teachers_handler))
        .route(
            "/manage/groups/{id}/teachers/remove",
            post(manage::remove_teachers_handler),
        )
        .route("/manage/groups/{id}/start", post(manage::start_education_handler))
        .route("/manage/groups/{id}/finish", post(manage::finish_education_handler))
        .route("/manage/groups/{id}/history", get(manage::group_history_handler))
        .route("/manage/students", get(manage::list_students_handler))
        .route("/manage/teachers", get(manage::list_teachers_handler))
        .route("/manage/messages", get(manage::list_messages_handler))
        .route(
            "/manage/messages/{id}/status",
            post(manage::set_message_status_handler),
        )
        // Members
        .route("/groups/{id}", get(members::group_handler))
        .route("/notifications", get(members::notifications_handler))
        .route("/notifications/read-all", post(members::read_all_handler))
        .route("/notifications/{id}/read", post(members::mark_read_handler))
        .route("/notifications/{id}", delete(members::delete_notification_handler));

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until the process is stopped.
pub async fn run_server(school: School, config: Config) -> Result<(), AppError> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(school, config);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Schoolhouse HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))
}
