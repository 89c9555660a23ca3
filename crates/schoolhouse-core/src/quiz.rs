//! # Course Quiz
//!
//! Matches a visitor's quiz answers against the course catalog.

use crate::model::{Course, Experience, Goal};
use crate::primitives::NO_SUITABLE_COURSE;
use crate::validation::FieldErrors;
use crate::{AgeGroup, School, SchoolError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw quiz answers. Experience and goals are given by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswers {
    #[serde(default)]
    pub age_group: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub learning_goals: Vec<String>,
}

impl QuizAnswers {
    /// True when every answer has been given.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.age_group.trim().is_empty()
            && !self.experience.trim().is_empty()
            && !self.learning_goals.is_empty()
    }
}

/// Answers checked against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidQuiz {
    pub age_group: AgeGroup,
    pub experience: Experience,
    pub goals: Vec<Goal>,
}

/// The quiz outcome shown to the visitor and stored with a contact message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggested_course: String,
    pub suggestion_details: String,
}

pub struct Quiz;

impl Quiz {
    /// Validate answers against the catalog.
    pub fn validate(school: &School, answers: &QuizAnswers) -> Result<ValidQuiz, SchoolError> {
        let mut errors = FieldErrors::new();

        let age_group = match answers.age_group.trim() {
            "" => {
                errors.add("age_group", "Please select an age group.");
                None
            }
            value => match AgeGroup::from_str(value) {
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

        let experiences = school.list::<Experience>()?;
        let experience = match answers.experience.trim() {
            "" => {
                errors.add("experience", "Please select your experience level.");
                None
            }
            value => {
                let found = experiences.into_iter().find(|e| e.name == value);
                if found.is_none() {
                    errors.add(
                        "experience",
                        format!("Select a valid choice. {} is not one of the available choices.", value),
                    );
                }
                found
            }
        };

        let all_goals = school.list::<Goal>()?;
        let mut goals = Vec::new();
        if answers.learning_goals.is_empty() {
            errors.add("learning_goals", "Please choose a learning goal.");
        }
        for name in &answers.learning_goals {
            match all_goals.iter().find(|g| g.name == name.trim()) {
                Some(goal) if !goals.contains(goal) => goals.push(goal.clone()),
                Some(_) => {}
                None => errors.add(
                    "learning_goals",
                    format!("Select a valid choice. {} is not one of the available choices.", name),
                ),
            }
        }

        errors.into_result()?;
        match (age_group, experience) {
            (Some(age_group), Some(experience)) => Ok(ValidQuiz {
                age_group,
                experience,
                goals,
            }),
            _ => Err(SchoolError::field("age_group", "Please select an age group.")),
        }
    }

    /// The first course, by id, for the age group that welcomes the
    /// experience level and serves any of the goals.
    pub fn select_course(school: &School, quiz: &ValidQuiz) -> Result<Option<Course>, SchoolError> {
        Ok(school.list::<Course>()?.into_iter().find(|course| {
            course.age_group == Some(quiz.age_group)
                && course.experiences.contains(&quiz.experience.id)
                && quiz.goals.iter().any(|g| course.goals.contains(&g.id))
        }))
    }

    /// Summary line of the answers, e.g. `Age: 9-12. Experience: Builder. Goal: Creative Fun.`
    #[must_use]
    pub fn suggestion_details(quiz: &ValidQuiz) -> String {
        let goals: Vec<&str> = quiz.goals.iter().map(|g| g.name.as_str()).collect();
        format!(
            "Age: {}. Experience: {}. Goal: {}.",
            quiz.age_group,
            quiz.experience.name,
            goals.join(", ")
        )
    }

    /// Validate the answers and build the suggestion.
    pub fn suggest(school: &School, answers: &QuizAnswers) -> Result<Suggestion, SchoolError> {
        let quiz = Self::validate(school, answers)?;
        let suggested_course = Self::select_course(school, &quiz)?
            .map_or_else(|| NO_SUITABLE_COURSE.to_string(), |c| c.name);
        Ok(Suggestion {
            suggested_course,
            suggestion_details: Self::suggestion_details(&quiz),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
