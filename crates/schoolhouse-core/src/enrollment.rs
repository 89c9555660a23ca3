//! # Enrollment
//!
//! Group membership and the group lifecycle.
//!
//! Every operation reads the group, checks all of its preconditions and
//! then writes the group, the enrollment history and the notifications in
//! a single `WriteBatch`. A failed check returns before anything is staged,
//! so a rejected request leaves storage untouched.
//!
//! Callers hold exclusive access to the `School` (`&mut School`) for the
//! whole check-then-commit sequence, which keeps two concurrent requests
//! from both seeing the last free seat.
//!
//! ## Lifecycle
//!
//! ```text
//! EnrollmentStarted -> EducationStarted -> EducationCompleted
//! ```
//!
//! | Operation         | Allowed in                               |
//! |-------------------|------------------------------------------|
//! | add students      | `EnrollmentStarted`                      |
//! | remove students   | `EnrollmentStarted`, `EducationStarted`  |
//! | add/remove teachers | `EnrollmentStarted`, `EducationStarted` |

use crate::model::{EnrollmentRecord, Group, User};
use crate::notifications::Notifications;
use crate::primitives::MAX_MEMBERSHIP_BATCH;
use crate::store::WriteBatch;
use crate::{
    EnrollmentId, GroupId, GroupStatus, MemberKind, MembershipAction, NotificationKind, School,
    SchoolError, UserId,
};
use chrono::Utc;
use std::collections::BTreeSet;

/// The Enrollment engine applies membership changes and status transitions.
pub struct Enrollment;

impl Enrollment {
    // =========================================================================
    // MEMBERSHIP
    // =========================================================================

    /// Enroll students. All or nothing.
    pub fn add_students(
        school: &mut School,
        group: GroupId,
        students: &[UserId],
    ) -> Result<Group, SchoolError> {
        Self::add_members(school, group, MemberKind::Student, students)
    }

    /// Withdraw students. All or nothing.
    pub fn remove_students(
        school: &mut School,
        group: GroupId,
        students: &[UserId],
    ) -> Result<Group, SchoolError> {
        Self::remove_members(school, group, MemberKind::Student, students)
    }

    /// Assign teachers. Teachers never take a seat.
    pub fn add_teachers(
        school: &mut School,
        group: GroupId,
        teachers: &[UserId],
    ) -> Result<Group, SchoolError> {
        Self::add_members(school, group, MemberKind::Teacher, teachers)
    }

    /// Unassign teachers.
    pub fn remove_teachers(
        school: &mut School,
        group: GroupId,
        teachers: &[UserId],
    ) -> Result<Group, SchoolError> {
        Self::remove_members(school, group, MemberKind::Teacher, teachers)
    }

    fn add_members(
        school: &mut School,
        group_id: GroupId,
        kind: MemberKind,
        ids: &[UserId],
    ) -> Result<Group, SchoolError> {
        let requested = Self::collapse(kind, ids)?;
        let mut group = school.require::<Group>(group_id.0)?;
        Self::check_open(&group, kind, MembershipAction::Added)?;

        for &user in &requested {
            Self::check_account(school, user, kind)?;
            if group.members(kind).contains(&user) {
                return Err(SchoolError::AlreadyMember {
                    user,
                    group: group.id,
                    kind: kind.as_str(),
                });
            }
        }

        if kind == MemberKind::Student {
            let remaining = group.remaining_capacity();
            if requested.len() > remaining {
                tracing::warn!(
                    group = %group.id,
                    requested = requested.len(),
                    remaining,
                    "enrollment rejected: group is full"
                );
                return Err(SchoolError::CapacityExceeded {
                    requested: requested.len(),
                    remaining,
                });
            }
        }

        group.members_mut(kind).extend(requested.iter().copied());
        Self::commit_membership(school, &group, kind, MembershipAction::Added, &requested)?;

        tracing::info!(
            group = %group.id,
            kind = kind.as_str(),
            added = requested.len(),
            remaining = group.remaining_capacity(),
            "members added"
        );
        Ok(group)
    }

    fn remove_members(
        school: &mut School,
        group_id: GroupId,
        kind: MemberKind,
        ids: &[UserId],
    ) -> Result<Group, SchoolError> {
        let requested = Self::collapse(kind, ids)?;
        let mut group = school.require::<Group>(group_id.0)?;
        Self::check_open(&group, kind, MembershipAction::Removed)?;

        if let Some(&user) = requested.iter().find(|u| !group.members(kind).contains(u)) {
            return Err(SchoolError::NotMember {
                user,
                group: group.id,
                kind: kind.as_str(),
            });
        }

        group.members_mut(kind).retain(|u| !requested.contains(u));
        Self::commit_membership(school, &group, kind, MembershipAction::Removed, &requested)?;

        tracing::info!(
            group = %group.id,
            kind = kind.as_str(),
            removed = requested.len(),
            "members removed"
        );
        Ok(group)
    }

    /// Deduplicate a request and bound its size.
    fn collapse(kind: MemberKind, ids: &[UserId]) -> Result<BTreeSet<UserId>, SchoolError> {
        let field = match kind {
            MemberKind::Student => "students",
            MemberKind::Teacher => "teachers",
        };
        let requested: BTreeSet<UserId> = ids.iter().copied().collect();
        if requested.is_empty() {
            return Err(SchoolError::field(
                field,
                format!("Select at least one {}.", kind.as_str()),
            ));
        }
        if requested.len() > MAX_MEMBERSHIP_BATCH {
            return Err(SchoolError::field(
                field,
                format!(
                    "At most {} users can be changed at once.",
                    MAX_MEMBERSHIP_BATCH
                ),
            ));
        }
        Ok(requested)
    }

    fn check_open(
        group: &Group,
        kind: MemberKind,
        action: MembershipAction,
    ) -> Result<(), SchoolError> {
        let allowed = match (kind, action) {
            (MemberKind::Student, MembershipAction::Added) => {
                group.status == GroupStatus::EnrollmentStarted
            }
            _ => !group.status.is_terminal(),
        };
        if allowed {
            return Ok(());
        }
        let action = match (kind, action) {
            (MemberKind::Student, MembershipAction::Added) => "adding students",
            (MemberKind::Student, MembershipAction::Removed) => "removing students",
            (MemberKind::Teacher, MembershipAction::Added) => "adding teachers",
            (MemberKind::Teacher, MembershipAction::Removed) => "removing teachers",
        };
        Err(SchoolError::StatusLocked {
            status: group.status,
            action,
        })
    }

    fn check_account(school: &School, user: UserId, kind: MemberKind) -> Result<(), SchoolError> {
        let account = school.require::<User>(user.0)?;
        if account.role != kind.required_role() {
            return Err(SchoolError::WrongRole {
                user,
                expected: kind.as_str(),
            });
        }
        if !account.is_active {
            return Err(SchoolError::Precondition(format!(
                "User {} is inactive.",
                user
            )));
        }
        Ok(())
    }

    fn commit_membership(
        school: &mut School,
        group: &Group,
        kind: MemberKind,
        action: MembershipAction,
        members: &BTreeSet<UserId>,
    ) -> Result<(), SchoolError> {
        let notification = match action {
            MembershipAction::Added => NotificationKind::AddedToGroup,
            MembershipAction::Removed => NotificationKind::RemovedFromGroup,
        };
        let now = Utc::now();

        let mut batch = WriteBatch::new();
        batch.put(group)?;
        for &member in members {
            batch.put(&EnrollmentRecord {
                id: EnrollmentId(school.next_id::<EnrollmentRecord>()),
                group: group.id,
                member,
                member_kind: kind,
                action,
                at: now,
            })?;
            Notifications::queue(school, &mut batch, member, group, notification)?;
        }
        school.commit(batch)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Move a group from enrollment into education.
    ///
    /// Requires at least one student and one teacher.
    pub fn start_education(school: &mut School, group: GroupId) -> Result<Group, SchoolError> {
        Self::transition(school, group, GroupStatus::EducationStarted)
    }

    /// Close a group's education. The group is read-only afterwards.
    pub fn finish_education(school: &mut School, group: GroupId) -> Result<Group, SchoolError> {
        Self::transition(school, group, GroupStatus::EducationCompleted)
    }

    /// Advance a group to `to`, which must be the status right after its
    /// current one. Every member is notified.
    pub fn transition(
        school: &mut School,
        group_id: GroupId,
        to: GroupStatus,
    ) -> Result<Group, SchoolError> {
        let mut group = school.require::<Group>(group_id.0)?;
        let from = group.status;
        if from.next() != Some(to) {
            tracing::warn!(group = %group.id, %from, %to, "status transition rejected");
            return Err(SchoolError::InvalidTransition { from, to });
        }

        if to == GroupStatus::EducationStarted {
            if group.students.is_empty() {
                return Err(SchoolError::Precondition(
                    "A group needs at least one student to start education.".into(),
                ));
            }
            if group.teachers.is_empty() {
                return Err(SchoolError::Precondition(
                    "A group needs at least one teacher to start education.".into(),
                ));
            }
        }

        group.status = to;
        let mut batch = WriteBatch::new();
        batch.put(&group)?;
        if let Some(kind) = status_notification(to) {
            for member in group.all_members() {
                Notifications::queue(school, &mut batch, member, &group, kind)?;
            }
        }
        school.commit(batch)?;

        tracing::info!(group = %group.id, %from, %to, "group status changed");
        Ok(group)
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    /// Membership changes of a group, oldest first.
    pub fn history(school: &School, group: GroupId) -> Result<Vec<EnrollmentRecord>, SchoolError> {
        Ok(school
            .list::<EnrollmentRecord>()?
            .into_iter()
            .filter(|r| r.group == group)
            .collect())
    }
}

fn status_notification(status: GroupStatus) -> Option<NotificationKind> {
    match status {
        GroupStatus::EnrollmentStarted => None,
        GroupStatus::EducationStarted => Some(NotificationKind::EducationStarted),
        GroupStatus::EducationCompleted => Some(NotificationKind::EducationCompleted),
    }
}

// =============================================================================
// TESTS
// =============================================================================
