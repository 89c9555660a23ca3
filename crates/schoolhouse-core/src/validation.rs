//! # Validation
//!
//! Field-level checks shared by every form-like input.
//!
//! Checks never stop at the first failure: each form collects all of its
//! problems into a [`FieldErrors`] so the caller can show them together.

use crate::SchoolError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Message shown when a phone number has the wrong shape.
pub const PHONE_FORMAT_MESSAGE: &str = "Phone number must be in the format (XXX) XXX-XX-XX.";

/// Per-field validation messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record the error of a failed check, if any.
    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for one field.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(())` when nothing was recorded, otherwise `SchoolError::Validation`.
    pub fn into_result(self) -> Result<(), SchoolError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(SchoolError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

// =============================================================================
// CHECKS
// =============================================================================

/// Check that a trimmed value is between `min` and `max` characters.
pub fn check_length(value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.trim().chars().count();
    if len < min {
        if min == 1 {
            return Err("This field is required.".to_string());
        }
        return Err(format!(
            "Ensure this value has at least {} characters (it has {}).",
            min, len
        ));
    }
    if len > max {
        return Err(format!(
            "Ensure this value has at most {} characters (it has {}).",
            max, len
        ));
    }
    Ok(())
}

/// Compiled `(XXX) XXX-XX-XX` phone pattern.
static PHONE_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\(\d{3}\) \d{3}-\d{2}-\d{2}$"));

/// Check a phone number against the `(XXX) XXX-XX-XX` pattern.
pub fn validate_phone(phone: &str) -> Result<(), String> {
    match PHONE_PATTERN.as_ref() {
        Ok(pattern) if pattern.is_match(phone) => Ok(()),
        _ => Err(PHONE_FORMAT_MESSAGE.to_string()),
    }
}

/// Normalize an email address: trim it and lowercase the domain part.
///
/// The local part keeps its case.
pub fn normalize_email(email: &str) -> Result<String, String> {
    let trimmed = email.trim();
    let invalid = || "Enter a valid email address.".to_string();

    let (local, domain) = trimmed.rsplit_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || local.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || trimmed.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    if trimmed.len() > crate::primitives::MAX_EMAIL_LENGTH {
        return Err(invalid());
    }
    Ok(format!("{}@{}", local, domain.to_ascii_lowercase()))
}

// =============================================================================
// TESTS
// =============================================================================
