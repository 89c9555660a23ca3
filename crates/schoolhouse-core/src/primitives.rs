//! # Primitives
//!
//! Fixed limits for the Schoolhouse core. These are compiled into the
//! binary and are immutable at runtime.

/// Smallest allowed group size.
pub const MIN_GROUP_SIZE: u32 = 2;

/// Largest allowed group size.
pub const MAX_GROUP_SIZE: u32 = 20;

/// Group size used when a form leaves it out.
pub const DEFAULT_GROUP_SIZE: u32 = 10;

/// Number of courses shown on the home page.
pub const HOME_COURSE_COUNT: usize = 3;

// =============================================================================
// FIELD LENGTH LIMITS
// =============================================================================

/// Maximum length of a user's first or last name.
pub const MAX_PERSON_NAME_LENGTH: usize = 150;

/// Maximum length of a filia name, city, experience name or goal name.
pub const MAX_SHORT_NAME_LENGTH: usize = 50;

/// Maximum length of a filia address.
pub const MAX_ADDRESS_LENGTH: usize = 100;

/// Maximum length of a course or group name.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum length of a short description or a contact message body.
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// Maximum length of a course description.
pub const MAX_COURSE_DESCRIPTION_LENGTH: usize = 10_000;

/// Maximum length of an email address.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length, bounding hashing work per request.
pub const MAX_PASSWORD_LENGTH: usize = 1024;

/// Maximum number of users in one membership request.
pub const MAX_MEMBERSHIP_BATCH: usize = 100;

/// Length of a password salt in bytes.
pub const SALT_LENGTH: usize = 16;

/// Extra derivation rounds applied to a password digest.
pub const PASSWORD_ROUNDS: u32 = 4096;

/// Context string for password key derivation.
pub const PASSWORD_CONTEXT: &str = "schoolhouse 2026-01-01 account password v1";

/// Suggested-course text when the quiz matches nothing.
pub const NO_SUITABLE_COURSE: &str = "No suitable course found.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_size_bounds_are_consistent() {
        assert!(MIN_GROUP_SIZE <= DEFAULT_GROUP_SIZE);
        assert!(DEFAULT_GROUP_SIZE <= MAX_GROUP_SIZE);
    }
}
