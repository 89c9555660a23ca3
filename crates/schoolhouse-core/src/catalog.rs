//! # Catalog
//!
//! Filias, experience levels, learning goals and courses: everything the
//! public pages list, plus the program manager's course CRUD.

use crate::model::{Course, Experience, Filia, Goal, Group};
use crate::primitives::{
    HOME_COURSE_COUNT, MAX_ADDRESS_LENGTH, MAX_COURSE_DESCRIPTION_LENGTH, MAX_DESCRIPTION_LENGTH,
    MAX_SHORT_NAME_LENGTH, MAX_TITLE_LENGTH,
};
use crate::store::WriteBatch;
use crate::validation::{FieldErrors, check_length};
use crate::{AgeGroup, CourseId, ExperienceId, FiliaId, GoalId, School, SchoolError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Experience levels created by [`Catalog::seed_defaults`].
pub const DEFAULT_EXPERIENCES: [(&str, &str); 4] = [
    ("Beginner", "Starting from scratch"),
    ("Learner", "Know basic concepts"),
    ("Builder", "Made small projects"),
    ("Inventor", "Created own projects"),
];

/// Learning goals created by [`Catalog::seed_defaults`].
pub const DEFAULT_GOALS: [&str; 4] = [
    "Creative Fun",
    "Future Education",
    "Innovation Exploration",
    "Career Interests",
];

// =============================================================================
// SORTING
// =============================================================================

/// Ordering of course and group listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    Name,
    NameDesc,
    Newest,
}

impl SortOption {
    /// Parse a sort option. Unknown values fall back to `Name`.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("name_desc") => Self::NameDesc,
            Some("newest") => Self::Newest,
            _ => Self::Name,
        }
    }

    /// Sort records by name or by id, given accessors for both.
    pub fn apply<T>(self, items: &mut [T], name: impl Fn(&T) -> &str, id: impl Fn(&T) -> u64) {
        match self {
            Self::Name => items.sort_by(|a, b| (name(a), id(a)).cmp(&(name(b), id(b)))),
            Self::NameDesc => items.sort_by(|a, b| (name(b), id(b)).cmp(&(name(a), id(a)))),
            Self::Newest => items.sort_by_key(|item| std::cmp::Reverse(id(item))),
        }
    }
}

// =============================================================================
// FORMS & FILTERS
// =============================================================================

/// Input for creating or changing a filia.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiliaForm {
    pub name: String,
    pub city: String,
    pub address: String,
    #[serde(default)]
    pub description: String,
}

/// Input for creating or changing a course.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Age group wire value ("6-8", "9-12", ...). Empty means none.
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub experiences: Vec<u64>,
    #[serde(default)]
    pub goals: Vec<u64>,
}

/// Course listing filter. Each field is any-of; empty fields match all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub experiences: BTreeSet<ExperienceId>,
    pub filias: BTreeSet<FiliaId>,
    pub age_groups: BTreeSet<AgeGroup>,
}

impl CourseFilter {
    fn matches(&self, course: &Course, groups: &[Group]) -> bool {
        let experience_ok = self.experiences.is_empty()
            || !self.experiences.is_disjoint(&course.experiences);
        let age_ok = self.age_groups.is_empty()
            || course
                .age_group
                .is_some_and(|age| self.age_groups.contains(&age));
        let filia_ok = self.filias.is_empty()
            || groups
                .iter()
                .any(|g| g.course == course.id && self.filias.contains(&g.filia));
        experience_ok && age_ok && filia_ok
    }
}

/// A course with its experiences and groups resolved.
#[derive(Debug, Clone, Serialize)]
pub struct CourseDetails {
    pub course: Course,
    pub experiences: Vec<Experience>,
    pub goals: Vec<Goal>,
    pub groups: Vec<(Group, Filia)>,
}

/// A filia with the groups it hosts.
#[derive(Debug, Clone, Serialize)]
pub struct FiliaDetails {
    pub filia: Filia,
    pub groups: Vec<Group>,
}

// =============================================================================
// CATALOG ENGINE
// =============================================================================

/// The Catalog engine manages filias, experiences, goals and courses.
pub struct Catalog;

impl Catalog {
    /// Create the default experience levels and goals that do not exist yet.
    ///
    /// Returns how many records were created.
    pub fn seed_defaults(school: &mut School) -> Result<usize, SchoolError> {
        let existing_experiences: BTreeSet<String> = school
            .list::<Experience>()?
            .into_iter()
            .map(|e| e.name)
            .collect();
        let existing_goals: BTreeSet<String> =
            school.list::<Goal>()?.into_iter().map(|g| g.name).collect();

        let mut batch = WriteBatch::new();
        for (name, description) in DEFAULT_EXPERIENCES {
            if !existing_experiences.contains(name) {
                batch.put(&Experience {
                    id: ExperienceId(school.next_id::<Experience>()),
                    name: name.to_string(),
                    description: description.to_string(),
                })?;
            }
        }
        for name in DEFAULT_GOALS {
            if !existing_goals.contains(name) {
                batch.put(&Goal {
                    id: GoalId(school.next_id::<Goal>()),
                    name: name.to_string(),
                })?;
            }
        }

        let created = batch.len();
        school.commit(batch)?;
        if created > 0 {
            tracing::info!(created, "seeded default experiences and goals");
        }
        Ok(created)
    }

    // =========================================================================
    // EXPERIENCES & GOALS
    // =========================================================================

    /// Create an experience level.
    pub fn create_experience(
        school: &mut School,
        name: &str,
        description: &str,
    ) -> Result<Experience, SchoolError> {
        let mut errors = FieldErrors::new();
        errors.check("name", check_length(name, 1, MAX_SHORT_NAME_LENGTH));
        errors.check(
            "description",
            check_length(description, 0, MAX_DESCRIPTION_LENGTH),
        );
        errors.into_result()?;

        let experience = Experience {
            id: ExperienceId(school.next_id::<Experience>()),
            name: name.trim().to_string(),
            description: description.trim().to_string(),
        };
        let mut batch = WriteBatch::new();
        batch.put(&experience)?;
        school.commit(batch)?;
        Ok(experience)
    }

    /// Create a learning goal.
    pub fn create_goal(school: &mut School, name: &str) -> Result<Goal, SchoolError> {
        check_length(name, 1, MAX_SHORT_NAME_LENGTH).map_err(|m| SchoolError::field("name", m))?;

        let goal = Goal {
            id: GoalId(school.next_id::<Goal>()),
            name: name.trim().to_string(),
        };
        let mut batch = WriteBatch::new();
        batch.put(&goal)?;
        school.commit(batch)?;
        Ok(goal)
    }

    pub fn experiences(school: &School) -> Result<Vec<Experience>, SchoolError> {
        school.list::<Experience>()
    }

    pub fn goals(school: &School) -> Result<Vec<Goal>, SchoolError> {
        school.list::<Goal>()
    }

    /// Find an experience level by exact name.
    pub fn experience_by_name(
        school: &School,
        name: &str,
    ) -> Result<Option<Experience>, SchoolError> {
        Ok(school
            .list::<Experience>()?
            .into_iter()
            .find(|e| e.name == name))
    }

    // =========================================================================
    // FILIAS
    // =========================================================================

    fn validate_filia(form: &FiliaForm) -> Result<(), SchoolError> {
        let mut errors = FieldErrors::new();
        errors.check("name", check_length(&form.name, 1, MAX_SHORT_NAME_LENGTH));
        errors.check("city", check_length(&form.city, 1, MAX_SHORT_NAME_LENGTH));
        errors.check("address", check_length(&form.address, 1, MAX_ADDRESS_LENGTH));
        errors.check(
            "description",
            check_length(&form.description, 0, MAX_DESCRIPTION_LENGTH),
        );
        errors.into_result()
    }

    /// Create a filia.
    pub fn create_filia(school: &mut School, form: &FiliaForm) -> Result<Filia, SchoolError> {
        Self::validate_filia(form)?;
        let filia = Filia {
            id: FiliaId(school.next_id::<Filia>()),
            name: form.name.trim().to_string(),
            city: form.city.trim().to_string(),
            address: form.address.trim().to_string(),
            description: form.description.trim().to_string(),
        };
        let mut batch = WriteBatch::new();
        batch.put(&filia)?;
        school.commit(batch)?;
        tracing::info!(filia = %filia.id, name = %filia.name, "filia created");
        Ok(filia)
    }

    /// Change a filia.
    pub fn update_filia(
        school: &mut School,
        id: FiliaId,
        form: &FiliaForm,
    ) -> Result<Filia, SchoolError> {
        Self::validate_filia(form)?;
        let mut filia = school.require::<Filia>(id.0)?;
        filia.name = form.name.trim().to_string();
        filia.city = form.city.trim().to_string();
        filia.address = form.address.trim().to_string();
        filia.description = form.description.trim().to_string();

        let mut batch = WriteBatch::new();
        batch.put(&filia)?;
        school.commit(batch)?;
        Ok(filia)
    }

    /// Delete a filia together with the groups it hosts.
    pub fn delete_filia(school: &mut School, id: FiliaId) -> Result<Filia, SchoolError> {
        let filia = school.require::<Filia>(id.0)?;
        let mut batch = WriteBatch::new();
        for group in school.list::<Group>()?.into_iter().filter(|g| g.filia == id) {
            batch.delete::<Group>(group.id.0);
        }
        batch.delete::<Filia>(id.0);
        school.commit(batch)?;
        tracing::info!(filia = %id, "filia deleted");
        Ok(filia)
    }

    /// All filias ordered by name.
    pub fn filias(school: &School) -> Result<Vec<Filia>, SchoolError> {
        let mut filias = school.list::<Filia>()?;
        SortOption::Name.apply(&mut filias, |f| f.name.as_str(), |f| f.id.0);
        Ok(filias)
    }

    /// A filia with its groups.
    pub fn filia_details(school: &School, id: FiliaId) -> Result<FiliaDetails, SchoolError> {
        let filia = school.require::<Filia>(id.0)?;
        let mut groups: Vec<Group> = school
            .list::<Group>()?
            .into_iter()
            .filter(|g| g.filia == id)
            .collect();
        SortOption::Name.apply(&mut groups, |g| g.name.as_str(), |g| g.id.0);
        Ok(FiliaDetails { filia, groups })
    }

    // =========================================================================
    // COURSES
    // =========================================================================

    fn validate_course(
        school: &School,
        form: &CourseForm,
    ) -> Result<
        (
            Option<AgeGroup>,
            BTreeSet<ExperienceId>,
            BTreeSet<GoalId>,
        ),
        SchoolError,
    > {
        let mut errors = FieldErrors::new();
        errors.check("name", check_length(&form.name, 1, MAX_TITLE_LENGTH));
        errors.check(
            "description",
            check_length(&form.description, 0, MAX_COURSE_DESCRIPTION_LENGTH),
        );

        let age_group = match form.age_group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => match AgeGroup::from_str(value) {
                Ok(age) => Some(age),
                Err(_) => {
                    errors.add(
                        "age_group",
                        format!("Select a valid choice. {} is not one of the available choices.", value),
                    );
                    None
                }
            },
        };

        let mut experiences = BTreeSet::new();
        for id in &form.experiences {
            if school.get::<Experience>(*id)?.is_some() {
                experiences.insert(ExperienceId(*id));
            } else {
                errors.add("experiences", format!("Unknown experience: {}", id));
            }
        }
        let mut goals = BTreeSet::new();
        for id in &form.goals {
            if school.get::<Goal>(*id)?.is_some() {
                goals.insert(GoalId(*id));
            } else {
                errors.add("goals", format!("Unknown goal: {}", id));
            }
        }

        errors.into_result()?;
        Ok((age_group, experiences, goals))
    }

    /// Create a course.
    pub fn create_course(school: &mut School, form: &CourseForm) -> Result<Course, SchoolError> {
        let (age_group, experiences, goals) = Self::validate_course(school, form)?;
        let course = Course {
            id: CourseId(school.next_id::<Course>()),
            name: form.name.trim().to_string(),
            description: form.description.trim().to_string(),
            age_group,
            experiences,
            goals,
        };
        let mut batch = WriteBatch::new();
        batch.put(&course)?;
        school.commit(batch)?;
        tracing::info!(course = %course.id, name = %course.name, "course created");
        Ok(course)
    }

    /// Change a course.
    pub fn update_course(
        school: &mut School,
        id: CourseId,
        form: &CourseForm,
    ) -> Result<Course, SchoolError> {
        let mut course = school.require::<Course>(id.0)?;
        let (age_group, experiences, goals) = Self::validate_course(school, form)?;
        course.name = form.name.trim().to_string();
        course.description = form.description.trim().to_string();
        course.age_group = age_group;
        course.experiences = experiences;
        course.goals = goals;

        let mut batch = WriteBatch::new();
        batch.put(&course)?;
        school.commit(batch)?;
        tracing::info!(course = %course.id, "course changed");
        Ok(course)
    }

    /// Delete a course together with its groups.
    pub fn delete_course(school: &mut School, id: CourseId) -> Result<Course, SchoolError> {
        let course = school.require::<Course>(id.0)?;
        let mut batch = WriteBatch::new();
        for group in school.list::<Group>()?.into_iter().filter(|g| g.course == id) {
            batch.delete::<Group>(group.id.0);
        }
        batch.delete::<Course>(id.0);
        school.commit(batch)?;
        tracing::info!(course = %id, "course deleted");
        Ok(course)
    }

    /// Courses matching a filter, distinct and sorted.
    pub fn courses(
        school: &School,
        filter: &CourseFilter,
        sort: SortOption,
    ) -> Result<Vec<Course>, SchoolError> {
        let groups = if filter.filias.is_empty() {
            Vec::new()
        } else {
            school.list::<Group>()?
        };
        let mut courses: Vec<Course> = school
            .list::<Course>()?
            .into_iter()
            .filter(|c| filter.matches(c, &groups))
            .collect();
        sort.apply(&mut courses, |c| c.name.as_str(), |c| c.id.0);
        Ok(courses)
    }

    /// The first courses by name, for the home page.
    pub fn home_courses(school: &School) -> Result<Vec<Course>, SchoolError> {
        let mut courses = Self::courses(school, &CourseFilter::default(), SortOption::Name)?;
        courses.truncate(HOME_COURSE_COUNT);
        Ok(courses)
    }

    /// A course with its experiences, goals and groups (each with its filia).
    pub fn course_details(school: &School, id: CourseId) -> Result<CourseDetails, SchoolError> {
        let course = school.require::<Course>(id.0)?;

        let mut experiences = Vec::with_capacity(course.experiences.len());
        for exp in &course.experiences {
            if let Some(e) = school.get::<Experience>(exp.0)? {
                experiences.push(e);
            }
        }
        let mut goals = Vec::with_capacity(course.goals.len());
        for goal in &course.goals {
            if let Some(g) = school.get::<Goal>(goal.0)? {
                goals.push(g);
            }
        }

        let mut groups = Vec::new();
        for group in school.list::<Group>()?.into_iter().filter(|g| g.course == id) {
            let filia = school.require::<Filia>(group.filia.0)?;
            groups.push((group, filia));
        }
        groups.sort_by(|(a, _), (b, _)| (a.name.as_str(), a.id).cmp(&(b.name.as_str(), b.id)));

        Ok(CourseDetails {
            course,
            experiences,
            goals,
            groups,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
