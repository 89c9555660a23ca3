//! # Dashboards
//!
//! Per-role summaries. Each dashboard is a plain read over the School.

use crate::contact::Contact;
use crate::groups::{GroupView, Groups};
use crate::model::{Course, Filia, Group, User};
use crate::notifications::Notifications;
use crate::{GroupStatus, School, SchoolError};
use serde::Serialize;
use std::collections::BTreeMap;

/// A group together with how many students it holds.
#[derive(Debug, Clone, Serialize)]
pub struct TeachingGroup {
    #[serde(flatten)]
    pub view: GroupView,
    pub student_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboard {
    pub groups: Vec<GroupView>,
    pub unread_notifications: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherDashboard {
    pub groups: Vec<TeachingGroup>,
    pub unread_notifications: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EducationManagerDashboard {
    pub groups_by_status: BTreeMap<GroupStatus, usize>,
    /// Groups still enrolling, with their free seats.
    pub open_groups: Vec<GroupView>,
    pub pending_messages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramManagerDashboard {
    pub courses: usize,
    pub groups: usize,
    pub filias: usize,
    pub groups_by_status: BTreeMap<GroupStatus, usize>,
}

pub struct Dashboards;

impl Dashboards {
    pub fn student(school: &School, user: &User) -> Result<StudentDashboard, SchoolError> {
        let groups = Groups::for_member(school, user.id)?
            .into_iter()
            .filter(|g| g.students.contains(&user.id))
            .map(|g| Groups::resolve(school, g))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StudentDashboard {
            groups,
            unread_notifications: Notifications::unread_count(school, user.id)?,
        })
    }

    pub fn teacher(school: &School, user: &User) -> Result<TeacherDashboard, SchoolError> {
        let groups = Groups::for_member(school, user.id)?
            .into_iter()
            .filter(|g| g.teachers.contains(&user.id))
            .map(|g| {
                let student_count = g.students.len();
                Groups::resolve(school, g).map(|view| TeachingGroup {
                    view,
                    student_count,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TeacherDashboard {
            groups,
            unread_notifications: Notifications::unread_count(school, user.id)?,
        })
    }

    pub fn education_manager(school: &School) -> Result<EducationManagerDashboard, SchoolError> {
        let groups = school.list::<Group>()?;
        let groups_by_status = count_by_status(&groups);
        let mut open_groups = groups
            .into_iter()
            .filter(|g| g.status == GroupStatus::EnrollmentStarted)
            .map(|g| Groups::resolve(school, g))
            .collect::<Result<Vec<_>, _>>()?;
        open_groups.sort_by(|a, b| {
            (a.group.name.as_str(), a.group.id).cmp(&(b.group.name.as_str(), b.group.id))
        });
        Ok(EducationManagerDashboard {
            groups_by_status,
            open_groups,
            pending_messages: Contact::pending_count(school)?,
        })
    }

    pub fn program_manager(school: &School) -> Result<ProgramManagerDashboard, SchoolError> {
        let groups = school.list::<Group>()?;
        Ok(ProgramManagerDashboard {
            courses: school.list::<Course>()?.len(),
            groups: groups.len(),
            filias: school.list::<Filia>()?.len(),
            groups_by_status: count_by_status(&groups),
        })
    }
}

fn count_by_status(groups: &[Group]) -> BTreeMap<GroupStatus, usize> {
    let mut counts: BTreeMap<GroupStatus, usize> =
        GroupStatus::ALL.into_iter().map(|s| (s, 0)).collect();
    for group in groups {
        *counts.entry(group.status).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CourseForm, FiliaForm};
    use crate::contact::ContactForm;
    use crate::enrollment::Enrollment;
    use crate::groups::GroupForm;
    use crate::model::PasswordHash;
    use crate::primitives::SALT_LENGTH;
    use crate::store::WriteBatch;
    use crate::{Role, UserId};
    use chrono::Utc;

    fn user(school: &mut School, role: Role) -> User {
        let user = User {
            id: UserId(school.next_id::<User>()),
            email: format!("{}@example.com", role.dashboard()),
            first_name: "Test".into(),
            last_name: "User".into(),
            phone_number: "(050) 123-45-67".into(),
            password: PasswordHash {
                salt: [0; SALT_LENGTH],
                digest: [0; 32],
            },
            role,
            is_active: true,
            is_staff: role.is_manager(),
            joined_at: Utc::now(),
        };
        let mut batch = WriteBatch::new();
        batch.put(&user).expect("put");
        school.commit(batch).expect("commit");
        user
    }

    fn setup() -> (School, User, User, Group) {
        let mut school = School::new();
        let filia = Catalog::create_filia(
            &mut school,
            &FiliaForm {
                name: "North".into(),
                city: "Lviv".into(),
                address: "2 Square".into(),
                description: String::new(),
            },
        )
        .expect("filia");
        let course = Catalog::create_course(
            &mut school,
            &CourseForm {
                name: "Robots".into(),
                ..CourseForm::default()
            },
        )
        .expect("course");
        let group = Groups::create(
            &mut school,
            &GroupForm {
                name: "Robots A".into(),
                course: course.id.0,
                filia: filia.id.0,
                group_size: 4,
            },
        )
        .expect("group");
        Groups::create(
            &mut school,
            &GroupForm {
                name: "Robots B".into(),
                course: course.id.0,
                filia: filia.id.0,
                group_size: 4,
            },
        )
        .expect("group b");
        let student = user(&mut school, Role::Student);
        let teacher = user(&mut school, Role::Teacher);
        Enrollment::add_students(&mut school, group.id, &[student.id]).expect("student");
        Enrollment::add_teachers(&mut school, group.id, &[teacher.id]).expect("teacher");
        (school, student, teacher, group)
    }

    #[test]
    fn student_sees_own_groups_and_unread() {
        let (school, student, _, group) = setup();
        let dash = Dashboards::student(&school, &student).expect("dashboard");
        assert_eq!(dash.groups.len(), 1);
        assert_eq!(dash.groups[0].group.id, group.id);
        assert_eq!(dash.groups[0].course.name, "Robots");
        assert_eq!(dash.unread_notifications, 1);
    }

    #[test]
    fn teacher_sees_student_counts() {
        let (school, _, teacher, _) = setup();
        let dash = Dashboards::teacher(&school, &teacher).expect("dashboard");
        assert_eq!(dash.groups.len(), 1);
        assert_eq!(dash.groups[0].student_count, 1);
    }

    #[test]
    fn education_manager_sees_open_groups_and_pending_messages() {
        let (mut school, _, _, group) = setup();
        Contact::submit(
            &mut school,
            &ContactForm {
                name: "Ira".into(),
                phone_number: "(099) 111-22-33".into(),
                message: String::new(),
            },
            None,
        )
        .expect("contact");
        Enrollment::start_education(&mut school, group.id).expect("start");

        let dash = Dashboards::education_manager(&school).expect("dashboard");
        assert_eq!(dash.open_groups.len(), 1);
        assert_eq!(dash.open_groups[0].remaining_capacity, 4);
        assert_eq!(dash.groups_by_status[&GroupStatus::EducationStarted], 1);
        assert_eq!(dash.groups_by_status[&GroupStatus::EducationCompleted], 0);
        assert_eq!(dash.pending_messages, 1);
    }

    #[test]
    fn program_manager_counts_catalog() {
        let (school, _, _, _) = setup();
        let dash = Dashboards::program_manager(&school).expect("dashboard");
        assert_eq!((dash.courses, dash.groups, dash.filias), (1, 2, 1));
        assert_eq!(dash.groups_by_status[&GroupStatus::EnrollmentStarted], 2);
    }
}
