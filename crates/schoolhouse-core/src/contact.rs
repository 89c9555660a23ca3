//! # Contact Messages
//!
//! The public contact form and the education manager's message queue.

use crate::model::ContactMessage;
use crate::primitives::{MAX_DESCRIPTION_LENGTH, MAX_SHORT_NAME_LENGTH};
use crate::quiz::Suggestion;
use crate::store::WriteBatch;
use crate::validation::{FieldErrors, check_length, validate_phone};
use crate::{ContactStatus, MessageId, School, SchoolError};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// What a visitor submits. Suggestion fields are never taken from here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub phone_number: String,
    #[serde(default)]
    pub message: String,
}

pub struct Contact;

impl Contact {
    /// Store a contact message, optionally carrying a quiz suggestion.
    pub fn submit(
        school: &mut School,
        form: &ContactForm,
        suggestion: Option<&Suggestion>,
    ) -> Result<ContactMessage, SchoolError> {
        let mut errors = FieldErrors::new();
        errors.check("name", check_length(&form.name, 1, MAX_SHORT_NAME_LENGTH));
        errors.check("phone_number", validate_phone(form.phone_number.trim()));
        errors.check(
            "message",
            check_length(&form.message, 0, MAX_DESCRIPTION_LENGTH),
        );
        errors.into_result()?;

        let message = ContactMessage {
            id: MessageId(school.next_id::<ContactMessage>()),
            name: form.name.trim().to_string(),
            phone_number: form.phone_number.trim().to_string(),
            message: form.message.trim().to_string(),
            suggested_course: suggestion.map(|s| s.suggested_course.clone()),
            suggestion_details: suggestion.map(|s| s.suggestion_details.clone()),
            status: ContactStatus::Pending,
            sent_at: Utc::now(),
        };
        let mut batch = WriteBatch::new();
        batch.put(&message)?;
        school.commit(batch)?;
        tracing::info!(message = %message.id, from_quiz = suggestion.is_some(), "contact message received");
        Ok(message)
    }

    /// Messages, newest first, optionally only those with one status.
    pub fn list(
        school: &School,
        status: Option<ContactStatus>,
    ) -> Result<Vec<ContactMessage>, SchoolError> {
        let mut messages: Vec<ContactMessage> = school
            .list::<ContactMessage>()?
            .into_iter()
            .filter(|m| status.is_none_or(|s| m.status == s))
            .collect();
        messages.sort_by(|a, b| (b.sent_at, b.id).cmp(&(a.sent_at, a.id)));
        Ok(messages)
    }

    pub fn pending_count(school: &School) -> Result<usize, SchoolError> {
        Ok(Self::list(school, Some(ContactStatus::Pending))?.len())
    }

    /// Change a message's processing status.
    pub fn set_status(
        school: &mut School,
        id: MessageId,
        status: ContactStatus,
    ) -> Result<ContactMessage, SchoolError> {
        let mut message = school.require::<ContactMessage>(id.0)?;
        message.status = status;
        let mut batch = WriteBatch::new();
        batch.put(&message)?;
        school.commit(batch)?;
        tracing::info!(message = %id, status = status.as_str(), "contact message status changed");
        Ok(message)
    }
}
