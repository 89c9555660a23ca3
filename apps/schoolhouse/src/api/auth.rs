//! # Authentication Module
//!
//! Login sessions and role checks for the Schoolhouse HTTP API.
//!
//! ## Usage
//!
//! `POST /login` returns a session token and also sets it as the
//! `schoolhouse_session` cookie. Later requests send either:
//! ```text
//! Authorization: Bearer <token>
//! Cookie: schoolhouse_session=<token>
//! ```
//!
//! Sessions are held in memory only; restarting the server logs everyone out.

use super::{AppState, types::ApiError};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use schoolhouse_core::{User, UserId};
use std::collections::BTreeMap;

/// Name of the login session cookie.
pub const SESSION_COOKIE: &str = "schoolhouse_session";

// =============================================================================
// SESSION REGISTRY
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct LoginSession {
    user: UserId,
    expires_at: DateTime<Utc>,
}

/// Active login sessions keyed by token.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<String, LoginSession>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `user` lasting `ttl_secs` and return its token.
    pub fn issue(&mut self, user: UserId, ttl_secs: u64, now: DateTime<Utc>) -> String {
        self.purge_expired(now);
        let token = uuid::Uuid::new_v4().simple().to_string();
        let ttl = Duration::try_seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX))
            .unwrap_or(Duration::MAX);
        self.sessions.insert(
            token.clone(),
            LoginSession {
                user,
                expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        );
        token
    }

    /// The user behind a token, if the session exists and has not expired.
    #[must_use]
    pub fn resolve(&self, token: &str, now: DateTime<Utc>) -> Option<UserId> {
        self.sessions
            .get(token)
            .filter(|s| s.expires_at > now)
            .map(|s| s.user)
    }

    /// End a session. Returns whether it existed.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop expired sessions, returning how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before - self.sessions.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =============================================================================
// COOKIES & TOKENS
// =============================================================================

/// Value of a cookie sent by the client.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Session token from the `Authorization` header, falling back to the cookie.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| cookie_value(headers, SESSION_COOKIE))
}

/// `Set-Cookie` value for a login. Without `max_age` it is a browser-session cookie.
#[must_use]
pub fn session_cookie(token: &str, max_age: Option<u64>) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token);
    if let Some(secs) = max_age {
        cookie.push_str(&format!("; Max-Age={}", secs));
    }
    cookie
}

/// `Set-Cookie` value that deletes a cookie.
#[must_use]
pub fn expired_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}

// =============================================================================
// CURRENT USER EXTRACTOR
// =============================================================================

/// The logged-in user of a request. Rejects with 401 when there is none.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl CurrentUser {
    /// Keep the user only if `allowed` accepts them; otherwise 403.
    pub fn require(self, allowed: fn(&User) -> bool) -> Result<User, ApiError> {
        if allowed(&self.user) {
            Ok(self.user)
        } else {
            tracing::warn!(
                event = "auth_failure",
                reason = "wrong_role",
                user = %self.user.id,
                role = self.user.role.dashboard(),
                "Permission denied"
            );
            Err(ApiError::Forbidden)
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            tracing::debug!(event = "auth_failure", reason = "missing_token");
            return Err(ApiError::Unauthorized);
        };

        let Some(user_id) = state.sessions.read().await.resolve(&token, Utc::now()) else {
            tracing::warn!(event = "auth_failure", reason = "unknown_or_expired_session");
            return Err(ApiError::Unauthorized);
        };

        let user = state.school.read().await.get::<User>(user_id.0)?;
        match user {
            Some(user) if user.is_active => Ok(Self { user, token }),
            _ => {
                tracing::warn!(event = "auth_failure", reason = "inactive_or_deleted", user = %user_id);
                Err(ApiError::Unauthorized)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
