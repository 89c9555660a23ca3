//! # Records
//!
//! The persisted rows of Schoolhouse. Every record knows the table it lives
//! in and its own key, which is all the storage layer needs.

use crate::store::Table;
use crate::{
    AgeGroup, ContactStatus, CourseId, EnrollmentId, ExperienceId, FiliaId, GoalId, GroupId,
    GroupStatus, MemberKind, MembershipAction, MessageId, NotificationId, NotificationKind, Role,
    UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeSet;

/// A row that can be stored in a [`Table`].
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Table the record is stored in.
    const TABLE: Table;
    /// Human name used in "not found" errors.
    const KIND: &'static str;

    /// Primary key of the record.
    fn key(&self) -> u64;
}

macro_rules! record {
    ($ty:ty, $table:expr, $kind:literal) => {
        impl Record for $ty {
            const TABLE: Table = $table;
            const KIND: &'static str = $kind;

            fn key(&self) -> u64 {
                self.id.0
            }
        }
    };
}

// =============================================================================
// USERS
// =============================================================================

/// Salted password digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash {
    pub salt: [u8; crate::primitives::SALT_LENGTH],
    pub digest: [u8; 32],
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub password: PasswordHash,
    pub role: Role,
    pub is_active: bool,
    pub is_staff: bool,
    pub joined_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

record!(User, Table::Users, "User");

// =============================================================================
// CATALOG
// =============================================================================

/// A campus / branch location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filia {
    pub id: FiliaId,
    pub name: String,
    pub city: String,
    pub address: String,
    pub description: String,
}

record!(Filia, Table::Filias, "Filia");

/// Prior-experience level a course welcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub id: ExperienceId,
    pub name: String,
    pub description: String,
}

record!(Experience, Table::Experiences, "Experience");

/// Learning goal a course serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
}

record!(Goal, Table::Goals, "Goal");

/// A course offered by the school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub description: String,
    pub age_group: Option<AgeGroup>,
    pub experiences: BTreeSet<ExperienceId>,
    pub goals: BTreeSet<GoalId>,
}

record!(Course, Table::Courses, "Course");

// =============================================================================
// GROUPS
// =============================================================================

/// A scheduled cohort of students and teachers following a course at a filia.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub course: CourseId,
    pub filia: FiliaId,
    pub status: GroupStatus,
    pub group_size: u32,
    pub students: BTreeSet<UserId>,
    pub teachers: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Seats left for students. Teachers never take a seat.
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        (self.group_size as usize).saturating_sub(self.students.len())
    }

    /// Membership list for one kind of member.
    #[must_use]
    pub fn members(&self, kind: MemberKind) -> &BTreeSet<UserId> {
        match kind {
            MemberKind::Student => &self.students,
            MemberKind::Teacher => &self.teachers,
        }
    }

    pub fn members_mut(&mut self, kind: MemberKind) -> &mut BTreeSet<UserId> {
        match kind {
            MemberKind::Student => &mut self.students,
            MemberKind::Teacher => &mut self.teachers,
        }
    }

    /// Every student and teacher, ordered by id.
    #[must_use]
    pub fn all_members(&self) -> BTreeSet<UserId> {
        self.students.union(&self.teachers).copied().collect()
    }

    #[must_use]
    pub fn has_member(&self, user: UserId) -> bool {
        self.students.contains(&user) || self.teachers.contains(&user)
    }
}

record!(Group, Table::Groups, "Group");

/// One membership change, kept after the group itself is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub id: EnrollmentId,
    pub group: GroupId,
    pub member: UserId,
    pub member_kind: MemberKind,
    pub action: MembershipAction,
    pub at: DateTime<Utc>,
}

record!(EnrollmentRecord, Table::Enrollments, "Enrollment record");

// =============================================================================
// CONTACT & NOTIFICATIONS
// =============================================================================

/// A message sent through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: MessageId,
    pub name: String,
    pub phone_number: String,
    pub message: String,
    pub suggested_course: Option<String>,
    pub suggestion_details: Option<String>,
    pub status: ContactStatus,
    pub sent_at: DateTime<Utc>,
}

record!(ContactMessage, Table::ContactMessages, "Contact message");

/// A message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub group: Option<GroupId>,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

record!(Notification, Table::Notifications, "Notification");
