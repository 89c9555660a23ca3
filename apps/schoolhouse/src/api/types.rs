//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API and the
//! mapping from domain errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use schoolhouse_core::{
    AgeGroup, ContactStatus, CourseFilter, CourseId, ExperienceId, FiliaId, GroupFilter,
    GroupStatus, GroupView, SchoolError, SortOption, User,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

// =============================================================================
// FLASH RESPONSES
// =============================================================================

/// The `{success, message, errors?}` body every mutation answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ActionResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
        }
    }
}

/// A successful mutation together with the record it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Saved<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> Saved<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

// =============================================================================
// API ERRORS
// =============================================================================

/// Why a request failed, rendered as a status code plus flash body.
#[derive(Debug)]
pub enum ApiError {
    /// A domain operation was rejected or failed.
    School(SchoolError),
    /// No valid login session.
    Unauthorized,
    /// Logged in, but with the wrong role.
    Forbidden,
    /// Malformed query or path input.
    BadRequest(String),
}

impl From<SchoolError> for ApiError {
    fn from(e: SchoolError) -> Self {
        Self::School(e)
    }
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::School(e) => match e {
                SchoolError::Validation(_)
                | SchoolError::InvalidChoice { .. }
                | SchoolError::WrongRole { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                SchoolError::NotFound { .. } => StatusCode::NOT_FOUND,
                SchoolError::Duplicate(_)
                | SchoolError::CapacityExceeded { .. }
                | SchoolError::InvalidTransition { .. }
                | SchoolError::StatusLocked { .. }
                | SchoolError::NotMember { .. }
                | SchoolError::AlreadyMember { .. }
                | SchoolError::Precondition(_) => StatusCode::CONFLICT,
                SchoolError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                SchoolError::InactiveAccount | SchoolError::Forbidden => StatusCode::FORBIDDEN,
                SchoolError::Storage(_) | SchoolError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn body(&self) -> ActionResponse {
        match self {
            Self::Unauthorized => ActionResponse::failure("Authentication required."),
            Self::Forbidden => {
                ActionResponse::failure("You do not have permission to perform this action.")
            }
            Self::BadRequest(message) => ActionResponse::failure(message.clone()),
            Self::School(SchoolError::Validation(errors)) => ActionResponse {
                success: false,
                message: "Please correct the errors below.".to_string(),
                errors: Some(
                    errors
                        .iter()
                        .map(|(field, messages)| (field.to_string(), messages.to_vec()))
                        .collect(),
                ),
            },
            Self::School(SchoolError::InvalidChoice { field, value }) => ActionResponse {
                success: false,
                message: "Please correct the errors below.".to_string(),
                errors: Some(BTreeMap::from([(
                    (*field).to_string(),
                    vec![format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        value
                    )],
                )])),
            },
            Self::School(e) if !e.is_client_error() => {
                ActionResponse::failure("Internal server error.")
            }
            Self::School(e) => ActionResponse::failure(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::School(e) if !e.is_client_error() => {
                tracing::error!(error = %e, "request failed");
            }
            Self::School(e) => tracing::warn!(status = status.as_u16(), error = %e, "request rejected"),
            other => tracing::warn!(status = status.as_u16(), error = ?other, "request rejected"),
        }
        (status, Json(self.body())).into_response()
    }
}

// =============================================================================
// HEALTH & USERS
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A user as other users may see it. Never carries the password digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: String,
    pub is_active: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
            role: user.role.dashboard().to_string(),
            is_active: user.is_active,
        }
    }
}

// =============================================================================
// ACCOUNTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    /// Path of the user's dashboard.
    pub dashboard: String,
    pub user: UserView,
}

// =============================================================================
// MANAGEMENT REQUESTS
// =============================================================================

/// Users to add to or remove from a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembersRequest {
    #[serde(alias = "students", alias = "teachers")]
    pub ids: Vec<u64>,
}

/// New status of a contact message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// A group with its resolved members.
#[derive(Debug, Clone, Serialize)]
pub struct GroupDetailsResponse {
    #[serde(flatten)]
    pub view: GroupView,
    pub students: Vec<UserView>,
    pub teachers: Vec<UserView>,
}

// =============================================================================
// LISTING QUERIES
// =============================================================================

/// Split a comma-separated query value into its non-empty parts.
fn split_list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_ids(field: &str, value: Option<&str>) -> Result<BTreeSet<u64>, ApiError> {
    split_list(value)
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid {} id: {}", field, part)))
        })
        .collect()
}

/// `GET /courses?experience=1,2&filia=3&age_group=6-8,9-12&sort=newest`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseQuery {
    pub experience: Option<String>,
    pub filia: Option<String>,
    pub age_group: Option<String>,
    pub sort: Option<String>,
}

impl CourseQuery {
    pub fn filter(&self) -> Result<CourseFilter, ApiError> {
        Ok(CourseFilter {
            experiences: parse_ids("experience", self.experience.as_deref())?
                .into_iter()
                .map(ExperienceId)
                .collect(),
            filias: parse_ids("filia", self.filia.as_deref())?
                .into_iter()
                .map(FiliaId)
                .collect(),
            age_groups: split_list(self.age_group.as_deref())
                .map(AgeGroup::from_str)
                .collect::<Result<_, _>>()?,
        })
    }

    #[must_use]
    pub fn sort(&self) -> SortOption {
        SortOption::parse(self.sort.as_deref())
    }
}

/// `GET /manage/groups?filia=1&course=2,3&status=education_started&sort=name`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupQuery {
    pub filia: Option<String>,
    pub course: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
}

impl GroupQuery {
    pub fn filter(&self) -> Result<GroupFilter, ApiError> {
        Ok(GroupFilter {
            filias: parse_ids("filia", self.filia.as_deref())?
                .into_iter()
                .map(FiliaId)
                .collect(),
            courses: parse_ids("course", self.course.as_deref())?
                .into_iter()
                .map(CourseId)
                .collect(),
            statuses: split_list(self.status.as_deref())
                .map(GroupStatus::from_str)
                .collect::<Result<_, _>>()?,
        })
    }

    #[must_use]
    pub fn sort(&self) -> SortOption {
        SortOption::parse(self.sort.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageQuery {
    pub status: Option<String>,
}

impl MessageQuery {
    pub fn status(&self) -> Result<Option<ContactStatus>, ApiError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Ok(Some(ContactStatus::from_str(value)?)),
        }
    }
}
