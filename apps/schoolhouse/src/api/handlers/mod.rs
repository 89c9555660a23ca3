//! # API Endpoint Handlers
//!
//! Handlers are grouped by audience:
//! - [`public`]: catalog pages, quiz and contact form (no login)
//! - [`accounts`]: registration, login and dashboards
//! - [`manage`]: program and education manager tools
//! - [`members`]: group pages and notifications for logged-in members

pub mod accounts;
pub mod manage;
pub mod members;
pub mod public;

use crate::api::types::{ApiError, GroupDetailsResponse, UserView};
use schoolhouse_core::{Group, Groups, School, User, UserId, primitives::SALT_LENGTH};
use std::collections::BTreeSet;

/// A fresh random password salt.
pub(crate) fn new_salt() -> [u8; SALT_LENGTH] {
    *uuid::Uuid::new_v4().as_bytes()
}

fn users(school: &School, ids: &BTreeSet<UserId>) -> Result<Vec<UserView>, ApiError> {
    ids.iter()
        .map(|id| Ok(UserView::from(&school.require::<User>(id.0)?)))
        .collect()
}

/// A group with course, filia and member accounts resolved.
pub(crate) fn group_details(
    school: &School,
    group: Group,
) -> Result<GroupDetailsResponse, ApiError> {
    let students = users(school, &group.students)?;
    let teachers = users(school, &group.teachers)?;
    Ok(GroupDetailsResponse {
        view: Groups::resolve(school, group)?,
        students,
        teachers,
    })
}
