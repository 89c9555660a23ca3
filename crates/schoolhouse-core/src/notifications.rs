//! # Notifications
//!
//! Per-user inbox. Notifications are written by [`crate::Enrollment`] in the
//! same batch as the membership or status change they describe.

use crate::model::{Group, Notification};
use crate::store::WriteBatch;
use crate::{NotificationId, NotificationKind, School, SchoolError, UserId};
use chrono::Utc;

/// Text shown to the recipient for a notification about a group.
#[must_use]
pub fn message_for(kind: NotificationKind, group_name: &str) -> String {
    match kind {
        NotificationKind::AddedToGroup => format!("You have been added to group {}.", group_name),
        NotificationKind::RemovedFromGroup => {
            format!("You have been removed from group {}.", group_name)
        }
        NotificationKind::EducationStarted => {
            format!("Education has started in group {}.", group_name)
        }
        NotificationKind::EducationCompleted => {
            format!("Education has been completed in group {}.", group_name)
        }
    }
}

/// The Notifications engine manages user inboxes.
pub struct Notifications;

impl Notifications {
    /// Stage a notification about `group` for `recipient` in `batch`.
    pub(crate) fn queue(
        school: &mut School,
        batch: &mut WriteBatch,
        recipient: UserId,
        group: &Group,
        kind: NotificationKind,
    ) -> Result<(), SchoolError> {
        let notification = Notification {
            id: NotificationId(school.next_id::<Notification>()),
            recipient,
            group: Some(group.id),
            kind,
            message: message_for(kind, &group.name),
            read: false,
            created_at: Utc::now(),
        };
        batch.put(&notification)
    }

    /// A user's notifications, newest first.
    pub fn list_for(
        school: &School,
        user: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, SchoolError> {
        let mut notes: Vec<Notification> = school
            .list::<Notification>()?
            .into_iter()
            .filter(|n| n.recipient == user && (!unread_only || !n.read))
            .collect();
        notes.reverse();
        Ok(notes)
    }

    pub fn unread_count(school: &School, user: UserId) -> Result<usize, SchoolError> {
        Ok(school
            .list::<Notification>()?
            .iter()
            .filter(|n| n.recipient == user && !n.read)
            .count())
    }

    fn owned(
        school: &School,
        user: UserId,
        id: NotificationId,
    ) -> Result<Notification, SchoolError> {
        let note = school.require::<Notification>(id.0)?;
        if note.recipient != user {
            tracing::warn!(user = %user, notification = %id, "notification owned by another user");
            return Err(SchoolError::Forbidden);
        }
        Ok(note)
    }

    /// Mark one of the user's notifications as read.
    pub fn mark_read(
        school: &mut School,
        user: UserId,
        id: NotificationId,
    ) -> Result<Notification, SchoolError> {
        let mut note = Self::owned(school, user, id)?;
        if !note.read {
            note.read = true;
            let mut batch = WriteBatch::new();
            batch.put(&note)?;
            school.commit(batch)?;
        }
        Ok(note)
    }

    /// Mark every unread notification of the user as read.
    ///
    /// Returns how many changed.
    pub fn mark_all_read(school: &mut School, user: UserId) -> Result<usize, SchoolError> {
        let mut batch = WriteBatch::new();
        for mut note in Self::list_for(school, user, true)? {
            note.read = true;
            batch.put(&note)?;
        }
        let changed = batch.len();
        school.commit(batch)?;
        Ok(changed)
    }

    /// Delete one of the user's notifications.
    pub fn delete(
        school: &mut School,
        user: UserId,
        id: NotificationId,
    ) -> Result<(), SchoolError> {
        Self::owned(school, user, id)?;
        let mut batch = WriteBatch::new();
        batch.delete::<Notification>(id.0);
        school.commit(batch)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CourseId, FiliaId, GroupId, GroupStatus};
    use std::collections::BTreeSet;

    fn group() -> Group {
        Group {
            id: GroupId(1),
            name: "Robots A".into(),
            course: CourseId(1),
            filia: FiliaId(1),
            status: GroupStatus::EnrollmentStarted,
            group_size: 10,
            students: BTreeSet::new(),
            teachers: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    fn seed(school: &mut School, user: UserId, kinds: &[NotificationKind]) {
        let group = group();
        let mut batch = WriteBatch::new();
        for kind in kinds {
            Notifications::queue(school, &mut batch, user, &group, *kind).expect("queue");
        }
        school.commit(batch).expect("commit");
    }

    #[test]
    fn messages_name_the_group() {
        assert_eq!(
            message_for(NotificationKind::AddedToGroup, "Robots A"),
            "You have been added to group Robots A."
        );
        assert!(message_for(NotificationKind::EducationCompleted, "X").contains("completed"));
    }

    #[test]
    fn list_is_newest_first_and_per_user() {
        let mut school = School::new();
        seed(
            &mut school,
            UserId(1),
            &[NotificationKind::AddedToGroup, NotificationKind::EducationStarted],
        );
        seed(&mut school, UserId(2), &[NotificationKind::AddedToGroup]);

        let notes = Notifications::list_for(&school, UserId(1), false).expect("list");
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].kind, NotificationKind::EducationStarted);
        assert_eq!(Notifications::unread_count(&school, UserId(2)).expect("count"), 1);
    }

    #[test]
    fn mark_read_checks_owner() {
        let mut school = School::new();
        seed(&mut school, UserId(1), &[NotificationKind::AddedToGroup]);
        let id = NotificationId(1);

        assert!(matches!(
            Notifications::mark_read(&mut school, UserId(2), id),
            Err(SchoolError::Forbidden)
        ));
        let note = Notifications::mark_read(&mut school, UserId(1), id).expect("read");
        assert!(note.read);
        assert_eq!(Notifications::unread_count(&school, UserId(1)).expect("count"), 0);
        assert!(Notifications::list_for(&school, UserId(1), true)
            .expect("unread")
            .is_empty());
    }

    #[test]
    fn mark_all_read_and_delete() {
        let mut school = School::new();
        seed(
            &mut school,
            UserId(1),
            &[
                NotificationKind::AddedToGroup,
                NotificationKind::EducationStarted,
                NotificationKind::EducationCompleted,
            ],
        );
        assert_eq!(Notifications::mark_all_read(&mut school, UserId(1)).expect("all"), 3);
        assert_eq!(Notifications::mark_all_read(&mut school, UserId(1)).expect("again"), 0);

        assert!(matches!(
            Notifications::delete(&mut school, UserId(9), NotificationId(2)),
            Err(SchoolError::Forbidden)
        ));
        Notifications::delete(&mut school, UserId(1), NotificationId(2)).expect("delete");
        assert_eq!(
            Notifications::list_for(&school, UserId(1), false)
                .expect("list")
                .len(),
            2
        );
        assert!(matches!(
            Notifications::delete(&mut school, UserId(1), NotificationId(2)),
            Err(SchoolError::NotFound { .. })
        ));
    }
}
