//! # Core Type Definitions
//!
//! This module contains the vocabulary shared by every Schoolhouse module:
//! - Record identifiers (`UserId`, `GroupId`, ...)
//! - Closed choice sets (`Role`, `AgeGroup`, `GroupStatus`, ...)
//! - Error types (`SchoolError`)
//!
//! ## Ordering Guarantees
//!
//! Every identifier implements `Ord` so it can key a `BTreeMap`/`BTreeSet`,
//! which keeps member lists and listings in a stable order.

use crate::validation::FieldErrors;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// RECORD IDENTIFIERS
// =============================================================================

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// Get the raw id value.
            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of a user account (student, teacher or manager).
    UserId
);
record_id!(
    /// Identifier of a filia (campus / branch location).
    FiliaId
);
record_id!(
    /// Identifier of a course.
    CourseId
);
record_id!(
    /// Identifier of an experience level.
    ExperienceId
);
record_id!(
    /// Identifier of a learning goal.
    GoalId
);
record_id!(
    /// Identifier of a group (a cohort following a course at a filia).
    GroupId
);
record_id!(
    /// Identifier of a contact message.
    MessageId
);
record_id!(
    /// Identifier of a notification.
    NotificationId
);
record_id!(
    /// Identifier of an enrollment history entry.
    EnrollmentId
);

// =============================================================================
// ROLES
// =============================================================================

/// The two kinds of manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerRole {
    /// Runs group lifecycle and enrollment.
    Education,
    /// Curates courses and groups.
    Program,
}

impl ManagerRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Education => "education",
            Self::Program => "program",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Education => "Education Manager",
            Self::Program => "Program Manager",
        }
    }
}

/// Role of a user account. A user holds exactly one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Manager(ManagerRole),
}

impl Role {
    /// Name of the dashboard this role lands on.
    #[must_use]
    pub const fn dashboard(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Manager(ManagerRole::Education) => "education_manager",
            Self::Manager(ManagerRole::Program) => "program_manager",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Teacher => "Teacher",
            Self::Manager(m) => m.label(),
        }
    }

    #[must_use]
    pub const fn is_manager(self) -> bool {
        matches!(self, Self::Manager(_))
    }
}

impl FromStr for Role {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "education" | "education_manager" => Ok(Self::Manager(ManagerRole::Education)),
            "program" | "program_manager" => Ok(Self::Manager(ManagerRole::Program)),
            _ => Err(SchoolError::InvalidChoice {
                field: "role",
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// AGE GROUP
// =============================================================================

/// Age bracket a course is designed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "6-8")]
    Junior,
    #[serde(rename = "9-12")]
    Preteen,
    #[serde(rename = "13-15")]
    Teenager,
    #[serde(rename = "16-18")]
    OlderTeen,
}

impl AgeGroup {
    pub const ALL: [Self; 4] = [Self::Junior, Self::Preteen, Self::Teenager, Self::OlderTeen];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Junior => "6-8",
            Self::Preteen => "9-12",
            Self::Teenager => "13-15",
            Self::OlderTeen => "16-18",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Junior => "6-8 y.o.",
            Self::Preteen => "9-12 y.o.",
            Self::Teenager => "13-15 y.o.",
            Self::OlderTeen => "16-18 y.o.",
        }
    }
}

impl FromStr for AgeGroup {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == trimmed)
            .ok_or_else(|| SchoolError::InvalidChoice {
                field: "age_group",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// GROUP STATUS
// =============================================================================

/// Lifecycle status of a group.
///
/// Transitions only move forward:
/// `EnrollmentStarted -> EducationStarted -> EducationCompleted`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    #[default]
    EnrollmentStarted,
    EducationStarted,
    EducationCompleted,
}

impl GroupStatus {
    pub const ALL: [Self; 3] = [
        Self::EnrollmentStarted,
        Self::EducationStarted,
        Self::EducationCompleted,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnrollmentStarted => "enrollment_started",
            Self::EducationStarted => "education_started",
            Self::EducationCompleted => "education_completed",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EnrollmentStarted => "Enrollment Started",
            Self::EducationStarted => "Education Started",
            Self::EducationCompleted => "Education Completed",
        }
    }

    /// The only status this one may advance to.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::EnrollmentStarted => Some(Self::EducationStarted),
            Self::EducationStarted => Some(Self::EducationCompleted),
            Self::EducationCompleted => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::EducationCompleted)
    }
}

impl FromStr for GroupStatus {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == trimmed)
            .ok_or_else(|| SchoolError::InvalidChoice {
                field: "status",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONTACT MESSAGE STATUS
// =============================================================================

/// Processing status of a contact message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    #[default]
    Pending,
    InProcess,
    Completed,
}

impl ContactStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProcess, Self::Completed];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProcess => "in_process",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProcess => "In Process",
            Self::Completed => "Completed",
        }
    }
}

impl FromStr for ContactStatus {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == trimmed)
            .ok_or_else(|| SchoolError::InvalidChoice {
                field: "status",
                value: s.to_string(),
            })
    }
}

// =============================================================================
// MEMBERSHIP & NOTIFICATION KINDS
// =============================================================================

/// Which membership list of a group a user sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Student,
    Teacher,
}

impl MemberKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
        }
    }

    /// The account role a member of this kind must hold.
    #[must_use]
    pub const fn required_role(self) -> Role {
        match self {
            Self::Student => Role::Student,
            Self::Teacher => Role::Teacher,
        }
    }
}

/// Direction of a membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipAction {
    Added,
    Removed,
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AddedToGroup,
    RemovedFromGroup,
    EducationStarted,
    EducationCompleted,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddedToGroup => "added_to_group",
            Self::RemovedFromGroup => "removed_from_group",
            Self::EducationStarted => "education_started",
            Self::EducationCompleted => "education_completed",
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Schoolhouse core.
///
/// - No silent failures
/// - A failed operation never leaves a partial write behind
/// - The core never panics; the binary maps each variant to an HTTP status
#[derive(Debug, Error)]
pub enum SchoolError {
    /// One or more form fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// A value outside a closed set of choices.
    #[error("Invalid {field} choice: {value}")]
    InvalidChoice { field: &'static str, value: String },

    /// The requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },

    /// A uniqueness constraint was violated.
    #[error("{0}")]
    Duplicate(String),

    /// More students requested than seats left in the group.
    #[error("Group capacity exceeded: requested {requested}, remaining {remaining}")]
    CapacityExceeded { requested: usize, remaining: usize },

    /// Status transition that does not follow the lifecycle.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: GroupStatus, to: GroupStatus },

    /// The group status forbids the requested change.
    #[error("Group is {status}: {action} is not allowed")]
    StatusLocked {
        status: GroupStatus,
        action: &'static str,
    },

    /// The user is not in the group's membership list.
    #[error("User {user} is not a {kind} of group {group}")]
    NotMember {
        user: UserId,
        group: GroupId,
        kind: &'static str,
    },

    /// The user is already in the group's membership list.
    #[error("User {user} is already a {kind} of group {group}")]
    AlreadyMember {
        user: UserId,
        group: GroupId,
        kind: &'static str,
    },

    /// The user does not hold the role the operation requires.
    #[error("User {user} is not a {expected}")]
    WrongRole { user: UserId, expected: &'static str },

    /// A lifecycle precondition is not met.
    #[error("{0}")]
    Precondition(String),

    /// Email/password pair does not match an account.
    #[error("Please enter a correct email and password.")]
    InvalidCredentials,

    /// The account has been deactivated.
    #[error("This account is inactive.")]
    InactiveAccount,

    /// The acting user may not touch this record.
    #[error("Permission denied")]
    Forbidden,

    /// The storage engine failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Encoding or decoding a record failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SchoolError {
    /// Shorthand for a single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    /// True for failures caused by the caller's input rather than the system.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Serialization(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
