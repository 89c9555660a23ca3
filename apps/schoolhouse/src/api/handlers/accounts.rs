//! Registration, login and per-role dashboards.

use super::new_salt;
use crate::api::{
    AppState,
    auth::{CurrentUser, SESSION_COOKIE, expired_cookie, session_cookie},
    types::{ActionResponse, ApiError, LoginRequest, LoginResponse, Saved, UserView},
};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use schoolhouse_core::{
    Accounts, Dashboards, EducationManagerDashboard, ProgramManagerDashboard, RegistrationForm,
    StudentDashboard, TeacherDashboard, User,
    accounts::{is_education_manager, is_program_manager, is_student, is_teacher},
};

/// Path of the dashboard a user lands on.
#[must_use]
pub fn dashboard_path(user: &User) -> String {
    format!("/dashboard/{}", user.role.dashboard().replace('_', "-"))
}

// =============================================================================
// REGISTRATION & LOGIN
// =============================================================================

/// Self-registration creates a student account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<Saved<UserView>>), ApiError> {
    let mut school = state.school.write().await;
    let user = Accounts::register_student(&mut school, &form, new_salt())?;
    Ok((
        StatusCode::CREATED,
        Json(Saved::new(
            "Registration successful. You can now log in.",
            UserView::from(&user),
        )),
    ))
}

/// Check credentials and start a session.
///
/// With `remember` the cookie persists for the remember TTL; without it the
/// cookie ends with the browser session.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let user = {
        let school = state.school.read().await;
        Accounts::authenticate(&school, &request.email, &request.password)?
    };

    let (ttl, max_age) = if request.remember {
        (
            state.config.remember_ttl_secs,
            Some(state.config.remember_ttl_secs),
        )
    } else {
        (state.config.session_ttl_secs, None)
    };
    let token = state.sessions.write().await.issue(user.id, ttl, Utc::now());
    tracing::info!(user = %user.id, remember = request.remember, "user logged in");

    let body = LoginResponse {
        success: true,
        message: format!("Welcome back, {}!", user.first_name),
        dashboard: dashboard_path(&user),
        user: UserView::from(&user),
        token: token.clone(),
    };
    Ok((
        [(header::SET_COOKIE, session_cookie(&token, max_age))],
        Json(body),
    )
        .into_response())
}

pub async fn logout_handler(State(state): State<AppState>, current: CurrentUser) -> Response {
    state.sessions.write().await.revoke(&current.token);
    tracing::info!(user = %current.user.id, "user logged out");
    (
        [(header::SET_COOKIE, expired_cookie(SESSION_COOKIE))],
        Json(ActionResponse::success("You have been logged out.")),
    )
        .into_response()
}

// =============================================================================
// DASHBOARDS
// =============================================================================

/// Send the user to their role's dashboard.
pub async fn dashboard_redirect_handler(current: CurrentUser) -> Redirect {
    Redirect::to(&dashboard_path(&current.user))
}

pub async fn student_dashboard_handler(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<StudentDashboard>, ApiError> {
    let user = current.require(is_student)?;
    let school = state.school.read().await;
    Ok(Json(Dashboards::student(&school, &user)?))
}

pub async fn teacher_dashboard_handler(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<TeacherDashboard>, ApiError> {
    let user = current.require(is_teacher)?;
    let school = state.school.read().await;
    Ok(Json(Dashboards::teacher(&school, &user)?))
}

pub async fn education_manager_dashboard_handler(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<EducationManagerDashboard>, ApiError> {
    current.require(is_education_manager)?;
    let school = state.school.read().await;
    Ok(Json(Dashboards::education_manager(&school)?))
}

pub async fn program_manager_dashboard_handler(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ProgramManagerDashboard>, ApiError> {
    current.require(is_program_manager)?;
    let school = state.school.read().await;
    Ok(Json(Dashboards::program_manager(&school)?))
}
