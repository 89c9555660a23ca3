//! # Groups
//!
//! Group records as the program manager sees them: create, change, delete
//! and list. Membership and status changes live in [`crate::Enrollment`].

use crate::catalog::SortOption;
use crate::model::{Course, Filia, Group};
use crate::primitives::{DEFAULT_GROUP_SIZE, MAX_GROUP_SIZE, MAX_TITLE_LENGTH, MIN_GROUP_SIZE};
use crate::store::WriteBatch;
use crate::validation::{FieldErrors, check_length};
use crate::{CourseId, FiliaId, GroupId, GroupStatus, School, SchoolError, UserId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Input for creating or changing a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupForm {
    pub name: String,
    pub course: u64,
    pub filia: u64,
    #[serde(default = "default_group_size")]
    pub group_size: u32,
}

fn default_group_size() -> u32 {
    DEFAULT_GROUP_SIZE
}

/// Group listing filter. Each field is any-of; empty fields match all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFilter {
    pub filias: BTreeSet<FiliaId>,
    pub courses: BTreeSet<CourseId>,
    pub statuses: BTreeSet<GroupStatus>,
}

impl GroupFilter {
    #[must_use]
    pub fn matches(&self, group: &Group) -> bool {
        (self.filias.is_empty() || self.filias.contains(&group.filia))
            && (self.courses.is_empty() || self.courses.contains(&group.course))
            && (self.statuses.is_empty() || self.statuses.contains(&group.status))
    }
}

/// A group with its course and filia resolved.
#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub group: Group,
    pub course: Course,
    pub filia: Filia,
    pub remaining_capacity: usize,
}

/// The Groups engine manages group records.
pub struct Groups;

impl Groups {
    fn validate(school: &School, form: &GroupForm) -> Result<(), SchoolError> {
        let mut errors = FieldErrors::new();
        errors.check("name", check_length(&form.name, 1, MAX_TITLE_LENGTH));
        if school.get::<Course>(form.course)?.is_none() {
            errors.add("course", format!("Unknown course: {}", form.course));
        }
        if school.get::<Filia>(form.filia)?.is_none() {
            errors.add("filia", format!("Unknown filia: {}", form.filia));
        }
        if !(MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&form.group_size) {
            errors.add(
                "group_size",
                format!(
                    "Group size must be between {} and {}.",
                    MIN_GROUP_SIZE, MAX_GROUP_SIZE
                ),
            );
        }
        errors.into_result()
    }

    /// Create a group. New groups always start in `EnrollmentStarted`.
    pub fn create(school: &mut School, form: &GroupForm) -> Result<Group, SchoolError> {
        Self::validate(school, form)?;
        let group = Group {
            id: GroupId(school.next_id::<Group>()),
            name: form.name.trim().to_string(),
            course: CourseId(form.course),
            filia: FiliaId(form.filia),
            status: GroupStatus::EnrollmentStarted,
            group_size: form.group_size,
            students: BTreeSet::new(),
            teachers: BTreeSet::new(),
            created_at: Utc::now(),
        };
        let mut batch = WriteBatch::new();
        batch.put(&group)?;
        school.commit(batch)?;
        tracing::info!(group = %group.id, name = %group.name, size = group.group_size, "group created");
        Ok(group)
    }

    /// Change a group's name, course, filia or size. Never touches status.
    pub fn update(
        school: &mut School,
        id: GroupId,
        form: &GroupForm,
    ) -> Result<Group, SchoolError> {
        let mut group = school.require::<Group>(id.0)?;
        if group.status.is_terminal() {
            return Err(SchoolError::StatusLocked {
                status: group.status,
                action: "editing",
            });
        }
        Self::validate(school, form)?;
        if (form.group_size as usize) < group.students.len() {
            return Err(SchoolError::field(
                "group_size",
                "Group size cannot be smaller than the number of enrolled students.",
            ));
        }

        group.name = form.name.trim().to_string();
        group.course = CourseId(form.course);
        group.filia = FiliaId(form.filia);
        group.group_size = form.group_size;

        let mut batch = WriteBatch::new();
        batch.put(&group)?;
        school.commit(batch)?;
        tracing::info!(group = %group.id, "group changed");
        Ok(group)
    }

    /// Delete a group.
    pub fn delete(school: &mut School, id: GroupId) -> Result<Group, SchoolError> {
        let group = school.require::<Group>(id.0)?;
        let mut batch = WriteBatch::new();
        batch.delete::<Group>(id.0);
        school.commit(batch)?;
        tracing::info!(group = %id, "group deleted");
        Ok(group)
    }

    /// Groups matching a filter, sorted.
    pub fn list(
        school: &School,
        filter: &GroupFilter,
        sort: SortOption,
    ) -> Result<Vec<Group>, SchoolError> {
        let mut groups: Vec<Group> = school
            .list::<Group>()?
            .into_iter()
            .filter(|g| filter.matches(g))
            .collect();
        sort.apply(&mut groups, |g| g.name.as_str(), |g| g.id.0);
        Ok(groups)
    }

    /// A group with its course and filia.
    pub fn view(school: &School, id: GroupId) -> Result<GroupView, SchoolError> {
        let group = school.require::<Group>(id.0)?;
        Self::resolve(school, group)
    }

    /// Resolve course and filia for an already loaded group.
    pub fn resolve(school: &School, group: Group) -> Result<GroupView, SchoolError> {
        let course = school.require::<Course>(group.course.0)?;
        let filia = school.require::<Filia>(group.filia.0)?;
        let remaining_capacity = group.remaining_capacity();
        Ok(GroupView {
            group,
            course,
            filia,
            remaining_capacity,
        })
    }

    /// Groups a user belongs to, as student or teacher, ordered by name.
    pub fn for_member(school: &School, user: UserId) -> Result<Vec<Group>, SchoolError> {
        let mut groups: Vec<Group> = school
            .list::<Group>()?
            .into_iter()
            .filter(|g| g.has_member(user))
            .collect();
        SortOption::Name.apply(&mut groups, |g| g.name.as_str(), |g| g.id.0);
        Ok(groups)
    }
}

// =============================================================================
// TESTS
// =============================================================================
