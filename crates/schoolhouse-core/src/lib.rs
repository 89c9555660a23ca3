//! # schoolhouse-core
//!
//! The domain engine for Schoolhouse - THE LOGIC.
//!
//! This crate holds everything a school needs to run its groups: accounts
//! and roles, the course catalog, groups with capacity-limited enrollment,
//! the group lifecycle, notifications, the course quiz and contact messages.
//!
//! ## Architectural Constraints
//!
//! - All state lives behind a [`School`]; there are no globals
//! - Every mutation is one atomic [`store::WriteBatch`]
//! - Errors are returned as [`SchoolError`], never panics
//! - No async and no network dependencies: the HTTP layer lives in the app

// =============================================================================
// MODULES
// =============================================================================

pub mod accounts;
pub mod catalog;
pub mod contact;
pub mod dashboard;
pub mod enrollment;
pub mod groups;
pub mod model;
pub mod notifications;
pub mod primitives;
pub mod quiz;
pub mod school;
pub mod storage;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AgeGroup, ContactStatus, CourseId, EnrollmentId, ExperienceId, FiliaId, GoalId, GroupId,
    GroupStatus, ManagerRole, MemberKind, MembershipAction, MessageId, NotificationId,
    NotificationKind, Role, SchoolError, UserId,
};

// =============================================================================
// RE-EXPORTS: Records & Storage
// =============================================================================

pub use model::{
    ContactMessage, Course, EnrollmentRecord, Experience, Filia, Goal, Group, Notification,
    PasswordHash, Record, User,
};
pub use school::{School, SchoolCounts, StorageBackend};
pub use storage::RedbStore;
pub use store::{MemoryStore, SchoolStore, WriteBatch};
pub use validation::FieldErrors;

// =============================================================================
// RE-EXPORTS: Engines
// =============================================================================

pub use accounts::{Accounts, NewUser, RegistrationForm};
pub use catalog::{
    Catalog, CourseDetails, CourseFilter, CourseForm, FiliaDetails, FiliaForm, SortOption,
};
pub use contact::{Contact, ContactForm};
pub use dashboard::{
    Dashboards, EducationManagerDashboard, ProgramManagerDashboard, StudentDashboard,
    TeacherDashboard, TeachingGroup,
};
pub use enrollment::Enrollment;
pub use groups::{GroupFilter, GroupForm, GroupView, Groups};
pub use notifications::Notifications;
pub use quiz::{Quiz, QuizAnswers, Suggestion, ValidQuiz};
