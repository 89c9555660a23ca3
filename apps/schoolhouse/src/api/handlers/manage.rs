//! Manager tools.
//!
//! Program managers curate courses, groups and filias. Education managers
//! run enrollment, the group lifecycle and the contact inbox.

use super::group_details;
use crate::api::{
    AppState,
    auth::CurrentUser,
    types::{
        ActionResponse, ApiError, CourseQuery, GroupDetailsResponse, GroupQuery, MembersRequest,
        MessageQuery, Saved, StatusRequest, UserView,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use schoolhouse_core::{
    Accounts, Catalog, Contact, ContactMessage, ContactStatus, Course, CourseDetails, CourseForm,
    CourseId, Enrollment, EnrollmentRecord, Filia, FiliaForm, FiliaId, Group, GroupForm, GroupId,
    GroupView, Groups, MessageId, Role, School, SchoolError, User, UserId,
    accounts::{is_education_manager, is_program_manager},
};

type Created<T> = (StatusCode, Json<Saved<T>>);

fn member_ids(request: &MembersRequest) -> Vec<UserId> {
    request.ids.iter().copied().map(UserId).collect()
}

// =============================================================================
// COURSES (program manager)
// =============================================================================

pub async fn list_courses_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<CourseQuery>,
) -> Result<Json<Vec<Course>>, ApiError> {
    current.require(is_program_manager)?;
    let filter = query.filter()?;
    let school = state.school.read().await;
    Ok(Json(Catalog::courses(&school, &filter, query.sort())?))
}

pub async fn create_course_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(form): Json<CourseForm>,
) -> Result<Created<Course>, ApiError> {
    current.require(is_program_manager)?;
    let mut school = state.school.write().await;
    let course = Catalog::create_course(&mut school, &form)?;
    Ok((
        StatusCode::CREATED,
        Json(Saved::new(format!("Course {} created.", course.name), course)),
    ))
}

pub async fn get_course_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<CourseDetails>, ApiError> {
    current.require(is_program_manager)?;
    let school = state.school.read().await;
    Ok(Json(Catalog::course_details(&school, CourseId(id))?))
}

pub async fn update_course_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
    Json(form): Json<CourseForm>,
) -> Result<Json<Saved<Course>>, ApiError> {
    current.require(is_program_manager)?;
    let mut school = state.school.write().await;
    let course = Catalog::update_course(&mut school, CourseId(id), &form)?;
    Ok(Json(Saved::new(
        format!("Course {} updated.", course.name),
        course,
    )))
}

/// Deleting a course also deletes its groups.
pub async fn delete_course_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<ActionResponse>, ApiError> {
    current.require(is_program_manager)?;
    let mut school = state.school.write().await;
    let course = Catalog::delete_course(&mut school, CourseId(id))?;
    Ok(Json(ActionResponse::success(format!(
        "Course {} deleted.",
        course.name
    ))))
}

// =============================================================================
// GROUPS (program manager)
// =============================================================================

pub async fn list_groups_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<GroupQuery>,
) -> Result<Json<Vec<GroupView>>, ApiError> {
    current.require(|u| u.role.is_manager())?;
    let filter = query.filter()?;
    let school = state.school.read().await;
    let views = Groups::list(&school, &filter, query.sort())?
        .into_iter()
        .map(|group| Groups::resolve(&school, group))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(views))
}

pub async fn create_group_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(form): Json<GroupForm>,
) -> Result<Created<Group>, ApiError> {
    current.require(is_program_manager)?;
    let mut school = state.school.write().await;
    let group = Groups::create(&mut school, &form)?;
    Ok((
        StatusCode::CREATED,
        Json(Saved::new(format!("Group {} created.", group.name), group)),
    ))
}

pub async fn get_group_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<GroupDetailsResponse>, ApiError> {
    current.require(|u| u.role.is_manager())?;
    let school = state.school.read().await;
    let group = school.require::<Group>(id)?;
    Ok(Json(group_details(&school, group)?))
}

pub async fn update_group_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
    Json(form): Json<GroupForm>,
) -> Result<Json<Saved<Group>>, ApiError> {
    current.require(is_program_manager)?;
    let mut school = state.school.write().await;
    let group = Groups::update(&mut school, GroupId(id), &form)?;
    Ok(Json(Saved::new(
        format!("Group {} updated.", group.name),
        group,
    )))
}

pub async fn delete_group_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<ActionResponse>, ApiError> {
    current.require(is_program_manager)?;
    let mut school = state.school.write().await;
    let group = Groups::delete(&mut school, GroupId(id))?;
    Ok(Json(ActionResponse::success(format!(
        "Group {} deleted.",
        group.name
    ))))
}

pub async fn create_filia_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(form): Json<FiliaForm>,
) -> Result<Created<Filia>, ApiError> {
    current.require(is_program_manager)?;
    let mut school = state.school.write().await;
    let filia = Catalog::create_filia(&mut school, &form)?;
    Ok((
        StatusCode::CREATED,
        Json(Saved::new(format!("Filia {} created.", filia.name), filia)),
    ))
}

pub async fn update_filia_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
    Json(form): Json<FiliaForm>,
) -> Result<Json<Saved<Filia>>, ApiError> {
    current.require(is_program_manager)?;
    let mut school = state.school.write().await;
    let filia = Catalog::update_filia(&mut school, FiliaId(id), &form)?;
    Ok(Json(Saved::new(
        format!("Filia {} updated.", filia.name),
        filia,
    )))
}

/// Deleting a filia also deletes the groups it hosts.
pub async fn delete_filia_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<ActionResponse>, ApiError> {
    current.require(is_program_manager)?;
    let mut school = state.school.write().await;
    let filia = Catalog::delete_filia(&mut school, FiliaId(id))?;
    Ok(Json(ActionResponse::success(format!(
        "Filia {} deleted.",
        filia.name
    ))))
}

// =============================================================================
// ENROLLMENT & LIFECYCLE (education manager)
// =============================================================================

type MembershipOp = fn(&mut School, GroupId, &[UserId]) -> Result<Group, SchoolError>;

/// Run one membership change under the write lock and answer with the new group.
async fn change_members(
    state: &AppState,
    current: CurrentUser,
    id: u64,
    request: &MembersRequest,
    op: MembershipOp,
    done: &str,
) -> Result<Json<Saved<GroupDetailsResponse>>, ApiError> {
    current.require(is_education_manager)?;
    let mut school = state.school.write().await;
    let group = op(&mut school, GroupId(id), &member_ids(request))?;
    let message = format!("{} group {}.", done, group.name);
    Ok(Json(Saved::new(message, group_details(&school, group)?)))
}

pub async fn add_students_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
    Json(request): Json<MembersRequest>,
) -> Result<Json<Saved<GroupDetailsResponse>>, ApiError> {
    change_members(
        &state,
        current,
        id,
        &request,
        Enrollment::add_students,
        "Students added to",
    )
    .await
}

pub async fn remove_students_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
    Json(request): Json<MembersRequest>,
) -> Result<Json<Saved<GroupDetailsResponse>>, ApiError> {
    change_members(
        &state,
        current,
        id,
        &request,
        Enrollment::remove_students,
        "Students removed from",
    )
    .await
}

pub async fn add_teachers_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
    Json(request): Json<MembersRequest>,
) -> Result<Json<Saved<GroupDetailsResponse>>, ApiError> {
    change_members(
        &state,
        current,
        id,
        &request,
        Enrollment::add_teachers,
        "Teachers added to",
    )
    .await
}

pub async fn remove_teachers_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
    Json(request): Json<MembersRequest>,
) -> Result<Json<Saved<GroupDetailsResponse>>, ApiError> {
    change_members(
        &state,
        current,
        id,
        &request,
        Enrollment::remove_teachers,
        "Teachers removed from",
    )
    .await
}

pub async fn start_education_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Saved<Group>>, ApiError> {
    current.require(is_education_manager)?;
    let mut school = state.school.write().await;
    let group = Enrollment::start_education(&mut school, GroupId(id))?;
    Ok(Json(Saved::new(
        format!("Education started for group {}.", group.name),
        group,
    )))
}

pub async fn finish_education_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Saved<Group>>, ApiError> {
    current.require(is_education_manager)?;
    let mut school = state.school.write().await;
    let group = Enrollment::finish_education(&mut school, GroupId(id))?;
    Ok(Json(Saved::new(
        format!("Education completed for group {}.", group.name),
        group,
    )))
}

/// Membership changes of one group, oldest first.
pub async fn group_history_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Vec<EnrollmentRecord>>, ApiError> {
    current.require(is_education_manager)?;
    let school = state.school.read().await;
    school.require::<Group>(id)?;
    Ok(Json(Enrollment::history(&school, GroupId(id))?))
}

// =============================================================================
// PEOPLE & MESSAGES (education manager)
// =============================================================================

async fn people(
    state: &AppState,
    current: CurrentUser,
    role: Role,
) -> Result<Json<Vec<UserView>>, ApiError> {
    current.require(is_education_manager)?;
    let school = state.school.read().await;
    let users: Vec<User> = Accounts::users_with_role(&school, role)?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

pub async fn list_students_handler(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserView>>, ApiError> {
    people(&state, current, Role::Student).await
}

pub async fn list_teachers_handler(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserView>>, ApiError> {
    people(&state, current, Role::Teacher).await
}

pub async fn list_messages_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<MessageQuery>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    current.require(is_education_manager)?;
    let status = query.status()?;
    let school = state.school.read().await;
    Ok(Json(Contact::list(&school, status)?))
}

pub async fn set_message_status_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Saved<ContactMessage>>, ApiError> {
    current.require(is_education_manager)?;
    let status: ContactStatus = request.status.trim().parse()?;
    let mut school = state.school.write().await;
    let message = Contact::set_status(&mut school, MessageId(id), status)?;
    Ok(Json(Saved::new(
        format!("Message marked as {}.", status.as_str()),
        message,
    )))
}
