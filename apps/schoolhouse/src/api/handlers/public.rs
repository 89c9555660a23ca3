//! Public pages: catalog, quiz and contact form.

use crate::api::{
    AppState,
    auth::{cookie_value, expired_cookie},
    types::{ApiError, CourseQuery, HealthResponse, Saved},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use schoolhouse_core::{
    Catalog, Contact, ContactForm, ContactMessage, Course, CourseDetails, CourseId, Experience,
    Filia, FiliaDetails, FiliaId, Quiz, QuizAnswers, SchoolError, Suggestion,
};
use serde::{Deserialize, Serialize};

/// Name of the cookie carrying quiz answers between the quiz and the contact form.
pub const QUIZ_COOKIE: &str = "schoolhouse_quiz";

// =============================================================================
// RESPONSES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeResponse {
    pub courses: Vec<Course>,
}

/// Course listing plus the options the filter can offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoursesResponse {
    pub courses: Vec<Course>,
    pub count: usize,
    pub experiences: Vec<Experience>,
    pub filias: Vec<Filia>,
}

// =============================================================================
// CATALOG
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Home page: the first courses by name.
pub async fn home_handler(State(state): State<AppState>) -> Result<Json<HomeResponse>, ApiError> {
    let school = state.school.read().await;
    Ok(Json(HomeResponse {
        courses: Catalog::home_courses(&school)?,
    }))
}

/// Filtered, sorted course list.
pub async fn courses_handler(
    State(state): State<AppState>,
    Query(query): Query<CourseQuery>,
) -> Result<Json<CoursesResponse>, ApiError> {
    let filter = query.filter()?;
    let school = state.school.read().await;
    let courses = Catalog::courses(&school, &filter, query.sort())?;
    Ok(Json(CoursesResponse {
        count: courses.len(),
        courses,
        experiences: Catalog::experiences(&school)?,
        filias: Catalog::filias(&school)?,
    }))
}

pub async fn course_details_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<CourseDetails>, ApiError> {
    let school = state.school.read().await;
    Ok(Json(Catalog::course_details(&school, CourseId(id))?))
}

pub async fn filias_handler(State(state): State<AppState>) -> Result<Json<Vec<Filia>>, ApiError> {
    let school = state.school.read().await;
    Ok(Json(Catalog::filias(&school)?))
}

pub async fn filia_details_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<FiliaDetails>, ApiError> {
    let school = state.school.read().await;
    Ok(Json(Catalog::filia_details(&school, FiliaId(id))?))
}

// =============================================================================
// QUIZ
// =============================================================================

fn encode_answers(answers: &QuizAnswers) -> Result<String, ApiError> {
    let json =
        serde_json::to_vec(answers).map_err(|e| SchoolError::Serialization(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Quiz answers from the cookie, if present, decodable and complete.
fn answers_from_cookie(headers: &HeaderMap) -> Option<QuizAnswers> {
    let raw = cookie_value(headers, QUIZ_COOKIE)?;
    let bytes = URL_SAFE_NO_PAD.decode(raw.as_bytes()).ok()?;
    let answers: QuizAnswers = serde_json::from_slice(&bytes).ok()?;
    answers.is_complete().then_some(answers)
}

/// Score the quiz and remember the answers for the contact form.
pub async fn quiz_handler(
    State(state): State<AppState>,
    Json(answers): Json<QuizAnswers>,
) -> Result<Response, ApiError> {
    let suggestion = {
        let school = state.school.read().await;
        Quiz::suggest(&school, &answers)?
    };
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        QUIZ_COOKIE,
        encode_answers(&answers)?
    );
    tracing::info!(suggested = %suggestion.suggested_course, "quiz answered");
    Ok(([(header::SET_COOKIE, cookie)], Json(suggestion)).into_response())
}

/// Recompute the suggestion from the quiz cookie.
///
/// `None` means the visitor has to take the quiz (again).
async fn cookie_suggestion(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Suggestion>, ApiError> {
    let Some(answers) = answers_from_cookie(headers) else {
        return Ok(None);
    };
    let school = state.school.read().await;
    match Quiz::suggest(&school, &answers) {
        Ok(suggestion) => Ok(Some(suggestion)),
        Err(SchoolError::Validation(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Show the suggestion before the visitor writes their message.
pub async fn quiz_contact_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    match cookie_suggestion(&state, &headers).await? {
        Some(suggestion) => Ok(Json(suggestion).into_response()),
        None => Ok(Redirect::to("/quiz").into_response()),
    }
}

/// Send a contact message carrying the quiz suggestion.
pub async fn quiz_contact_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<ContactForm>,
) -> Result<Response, ApiError> {
    let Some(suggestion) = cookie_suggestion(&state, &headers).await? else {
        return Ok(Redirect::to("/quiz").into_response());
    };
    let message = {
        let mut school = state.school.write().await;
        Contact::submit(&mut school, &form, Some(&suggestion))?
    };
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, expired_cookie(QUIZ_COOKIE))],
        Json(Saved::new("Your message has been sent.", message)),
    )
        .into_response())
}

// =============================================================================
// CONTACT
// =============================================================================

pub async fn contact_handler(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<(StatusCode, Json<Saved<ContactMessage>>), ApiError> {
    let mut school = state.school.write().await;
    let message = Contact::submit(&mut school, &form, None)?;
    Ok((
        StatusCode::CREATED,
        Json(Saved::new("Your message has been sent.", message)),
    ))
}
