//! Integration tests for the Schoolhouse HTTP API.
//!
//! Uses axum-test to exercise the handlers without starting a real server.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum_test::{TestResponse, TestServer};
use schoolhouse::api::{AppState, HealthResponse, LoginResponse, create_router};
use schoolhouse::config::Config;
use schoolhouse_core::{
    Accounts, Catalog, CourseForm, FiliaForm, GroupForm, Groups, ManagerRole, NewUser, Role,
    School,
};
use serde_json::{Value, json};
use tower::ServiceExt;

const PASSWORD: &str = "changeme123";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// A seeded school behind a test server.
struct Fixture {
    server: TestServer,
    /// Shared with `server`; another router over it sees the same school.
    state: AppState,
    course: u64,
    group: u64,
    /// Students s1..s4, in creation order.
    students: Vec<u64>,
    teacher: u64,
}

fn test_config() -> Config {
    Config {
        rate_limit: 0,
        ..Config::default()
    }
}

fn add_user(school: &mut School, email: &str, role: Role) -> u64 {
    Accounts::create_user(
        school,
        &NewUser {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone_number: "(050) 123-45-67".to_string(),
            password: PASSWORD.to_string(),
            role,
        },
        [7; 16],
    )
    .unwrap()
    .id
    .0
}

/// Managers, one teacher, four students, a quiz-matching course and a
/// group of size 2.
fn create_fixture() -> Fixture {
    let mut school = School::new();
    Catalog::seed_defaults(&mut school).unwrap();

    add_user(&mut school, "pm@school.test", Role::Manager(ManagerRole::Program));
    add_user(&mut school, "em@school.test", Role::Manager(ManagerRole::Education));
    let teacher = add_user(&mut school, "teacher@school.test", Role::Teacher);
    let students = (1..=4)
        .map(|i| add_user(&mut school, &format!("s{}@school.test", i), Role::Student))
        .collect();

    let builder = Catalog::experience_by_name(&school, "Builder")
        .unwrap()
        .unwrap()
        .id
        .0;
    let creative = Catalog::goals(&school)
        .unwrap()
        .into_iter()
        .find(|g| g.name == "Creative Fun")
        .unwrap()
        .id
        .0;
    let filia = Catalog::create_filia(
        &mut school,
        &FiliaForm {
            name: "Podil".into(),
            city: "Kyiv".into(),
            address: "Sahaidachnoho 1".into(),
            description: String::new(),
        },
    )
    .unwrap();
    let course = Catalog::create_course(
        &mut school,
        &CourseForm {
            name: "Robotics".into(),
            description: "Build and program robots".into(),
            age_group: Some("9-12".into()),
            experiences: vec![builder],
            goals: vec![creative],
        },
    )
    .unwrap();
    let group = Groups::create(
        &mut school,
        &GroupForm {
            name: "Robotics A".into(),
            course: course.id.0,
            filia: filia.id.0,
            group_size: 2,
        },
    )
    .unwrap();

    let state = AppState::new(school, test_config());
    Fixture {
        server: TestServer::new(create_router(state.clone())).unwrap(),
        state,
        course: course.id.0,
        group: group.id.0,
        students,
        teacher,
    }
}

fn bearer(token: &str) -> HeaderValue {
    format!("Bearer {}", token).parse::<HeaderValue>().unwrap()
}

async fn login(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/login")
        .json(&json!({"email": email, "password": PASSWORD}))
        .await;
    response.assert_status_ok();
    response.json::<LoginResponse>().token
}

async fn get_as(server: &TestServer, token: &str, path: &str) -> TestResponse {
    server
        .get(path)
        .add_header(header::AUTHORIZATION, bearer(token))
        .await
}

async fn post_as(server: &TestServer, token: &str, path: &str, body: Value) -> TestResponse {
    server
        .post(path)
        .add_header(header::AUTHORIZATION, bearer(token))
        .json(&body)
        .await
}

fn student_count(group: &Value) -> usize {
    group["group"]["students"].as_array().unwrap().len()
}

// =============================================================================
// HEALTH & CATALOG
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fx = create_fixture();

    let response = fx.server.get("/health").await;
    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn test_courses_filter_by_age_group() {
    let fx = create_fixture();

    let response = fx.server.get("/courses?age_group=9-12").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["courses"][0]["name"], "Robotics");

    let response = fx.server.get("/courses?age_group=6-8").await;
    let body: Value = response.json();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_course_details_and_missing_course() {
    let fx = create_fixture();

    let response = fx.server.get(&format!("/courses/{}", fx.course)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["course"]["name"], "Robotics");
    assert_eq!(body["groups"].as_array().unwrap().len(), 1);

    fx.server.get("/courses/999").await.assert_status_not_found();
}

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let fx = create_fixture();
    fx.server.get("/unknown").await.assert_status_not_found();
}

// =============================================================================
// ACCOUNTS
// =============================================================================

#[tokio::test]
async fn test_register_login_and_dashboard_redirect() {
    let fx = create_fixture();

    let response = fx
        .server
        .post("/register")
        .json(&json!({
            "email": "new@school.test",
            "first_name": "Nadia",
            "last_name": "Bondar",
            "phone_number": "(067) 555-12-34",
            "password": "longenough",
            "password_confirm": "longenough"
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["role"], "student");
    assert!(body["data"].get("password").is_none());

    let response = fx
        .server
        .post("/login")
        .json(&json!({"email": "new@school.test", "password": "longenough"}))
        .await;
    response.assert_status_ok();
    let cookie = response.header(header::SET_COOKIE);
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with("schoolhouse_session="));
    assert!(!cookie.contains("Max-Age"));
    let login: LoginResponse = response.json();
    assert_eq!(login.dashboard, "/dashboard/student");

    let response = get_as(&fx.server, &login.token, "/dashboard").await;
    assert_eq!(response.status_code().as_u16(), 303);
    assert_eq!(response.header(header::LOCATION), "/dashboard/student");

    let response = get_as(&fx.server, &login.token, "/dashboard/student").await;
    response.assert_status_ok();
    let dashboard: Value = response.json();
    assert_eq!(dashboard["unread_notifications"], 0);
}

#[tokio::test]
async fn test_remember_me_sets_max_age() {
    let fx = create_fixture();

    let response = fx
        .server
        .post("/login")
        .json(&json!({"email": "s1@school.test", "password": PASSWORD, "remember": true}))
        .await;
    response.assert_status_ok();
    let cookie = response.header(header::SET_COOKIE);
    assert!(cookie.to_str().unwrap().contains("Max-Age="));
}

#[tokio::test]
async fn test_register_password_mismatch_returns_field_errors() {
    let fx = create_fixture();

    let response = fx
        .server
        .post("/register")
        .json(&json!({
            "email": "bad@school.test",
            "first_name": "Bad",
            "last_name": "Input",
            "phone_number": "0501234567",
            "password": "longenough",
            "password_confirm": "different1"
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 422);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["errors"]["password_confirm"].is_array());
    assert!(body["errors"]["phone_number"].is_array());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let fx = create_fixture();

    let response = fx
        .server
        .post("/register")
        .json(&json!({
            "email": "S1@school.test",
            "first_name": "Dup",
            "last_name": "Licate",
            "phone_number": "(067) 555-12-34",
            "password": "longenough",
            "password_confirm": "longenough"
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 422);
    let body: Value = response.json();
    assert!(body["errors"]["email"].is_array());
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let fx = create_fixture();

    let response = fx
        .server
        .post("/login")
        .json(&json!({"email": "s1@school.test", "password": "wrong-password"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 401);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let fx = create_fixture();
    let token = login(&fx.server, "s1@school.test").await;

    let response = post_as(&fx.server, &token, "/logout", json!({})).await;
    response.assert_status_ok();
    assert!(
        response
            .header(header::SET_COOKIE)
            .to_str()
            .unwrap()
            .contains("Max-Age=0")
    );

    let response = get_as(&fx.server, &token, "/dashboard/student").await;
    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let fx = create_fixture();
    let token = login(&fx.server, "s1@school.test").await;

    let response = fx
        .server
        .get("/dashboard/student")
        .add_header(
            header::COOKIE,
            format!("schoolhouse_session={}", token)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;
    response.assert_status_ok();
}

// =============================================================================
// ROLE GATES
// =============================================================================

#[tokio::test]
async fn test_manage_requires_login() {
    let fx = create_fixture();

    let response = fx.server.get("/manage/courses").await;
    assert_eq!(response.status_code().as_u16(), 401);

    let response = fx.server.get("/dashboard").await;
    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_wrong_role_is_forbidden() {
    let fx = create_fixture();
    let student = login(&fx.server, "s1@school.test").await;
    let program = login(&fx.server, "pm@school.test").await;
    let education = login(&fx.server, "em@school.test").await;

    let response = get_as(&fx.server, &student, "/manage/courses").await;
    assert_eq!(response.status_code().as_u16(), 403);
    let response = get_as(&fx.server, &student, "/dashboard/teacher").await;
    assert_eq!(response.status_code().as_u16(), 403);

    let response = post_as(
        &fx.server,
        &program,
        &format!("/manage/groups/{}/students", fx.group),
        json!({"students": [fx.students[0]]}),
    )
    .await;
    assert_eq!(response.status_code().as_u16(), 403);

    let response = post_as(
        &fx.server,
        &education,
        "/manage/courses",
        json!({"name": "Chess"}),
    )
    .await;
    assert_eq!(response.status_code().as_u16(), 403);

    get_as(&fx.server, &program, "/manage/courses")
        .await
        .assert_status_ok();
    get_as(&fx.server, &education, "/dashboard/education-manager")
        .await
        .assert_status_ok();
}

// =============================================================================
// PROGRAM MANAGER
// =============================================================================

#[tokio::test]
async fn test_program_manager_course_and_group_crud() {
    let fx = create_fixture();
    let token = login(&fx.server, "pm@school.test").await;

    let response = post_as(
        &fx.server,
        &token,
        "/manage/courses",
        json!({"name": "Chess", "description": "Openings", "age_group": "6-8"}),
    )
    .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let chess: Value = response.json();
    let chess_id = chess["data"]["id"].as_u64().unwrap();

    let response = post_as(
        &fx.server,
        &token,
        "/manage/courses",
        json!({"name": "Chess", "age_group": "99-100"}),
    )
    .await;
    assert_eq!(response.status_code().as_u16(), 422);

    let response = fx
        .server
        .post("/manage/filias")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({"name": "Obolon", "city": "Kyiv", "address": "Heroiv 5"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let filia: Value = response.json();
    let filia_id = filia["data"]["id"].as_u64().unwrap();

    let response = post_as(
        &fx.server,
        &token,
        "/manage/groups",
        json!({"name": "Chess 1", "course": chess_id, "filia": filia_id, "group_size": 8}),
    )
    .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let group: Value = response.json();
    assert_eq!(group["data"]["status"], "enrollment_started");

    let response = get_as(&fx.server, &token, "/manage/groups?status=enrollment_started&sort=name").await;
    response.assert_status_ok();
    let groups: Value = response.json();
    assert_eq!(groups.as_array().unwrap().len(), 2);
    assert_eq!(groups[0]["group"]["name"], "Chess 1");

    let response = fx
        .server
        .delete(&format!("/manage/courses/{}", chess_id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();

    let response = get_as(&fx.server, &token, "/manage/groups").await;
    let groups: Value = response.json();
    assert_eq!(groups.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_group_size_cannot_drop_below_enrollment() {
    let fx = create_fixture();
    let program = login(&fx.server, "pm@school.test").await;
    let education = login(&fx.server, "em@school.test").await;

    post_as(
        &fx.server,
        &education,
        &format!("/manage/groups/{}/students", fx.group),
        json!({"students": [fx.students[0], fx.students[1]]}),
    )
    .await
    .assert_status_ok();

    let response = fx
        .server
        .put(&format!("/manage/groups/{}", fx.group))
        .add_header(header::AUTHORIZATION, bearer(&program))
        .json(&json!({"name": "Robotics A", "course": fx.course, "filia": 1, "group_size": 1}))
        .await;
    assert_eq!(response.status_code().as_u16(), 422);
    let body: Value = response.json();
    assert!(body["errors"]["group_size"].is_array());
}

#[tokio::test]
async fn test_filia_update_and_delete_cascade() {
    let fx = create_fixture();
    let token = login(&fx.server, "pm@school.test").await;

    let response = fx
        .server
        .put("/manage/filias/1")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({"name": "Podil Hub", "city": "Kyiv", "address": "Sahaidachnoho 3"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "Podil Hub");

    let response = fx
        .server
        .put("/manage/filias/1")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({"name": "", "city": "Kyiv", "address": "Sahaidachnoho 3"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 422);

    let response = fx
        .server
        .put("/manage/filias/999")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({"name": "Nowhere", "city": "Kyiv", "address": "Unknown 1"}))
        .await;
    response.assert_status_not_found();

    let response = fx
        .server
        .delete("/manage/filias/1")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Filia Podil Hub deleted.");

    // hosted groups go with it
    get_as(&fx.server, &token, &format!("/manage/groups/{}", fx.group))
        .await
        .assert_status_not_found();
    fx.server.get("/filias/1").await.assert_status_not_found();

    let response = fx
        .server
        .delete("/manage/filias/1")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_not_found();

    let student = login(&fx.server, "s1@school.test").await;
    let response = fx
        .server
        .delete("/manage/filias/1")
        .add_header(header::AUTHORIZATION, bearer(&student))
        .await;
    assert_eq!(response.status_code().as_u16(), 403);
}

// =============================================================================
// ENROLLMENT
// =============================================================================

#[tokio::test]
async fn test_over_capacity_is_rejected_and_membership_unchanged() {
    let fx = create_fixture();
    let token = login(&fx.server, "em@school.test").await;
    let path = format!("/manage/groups/{}/students", fx.group);

    let response = post_as(
        &fx.server,
        &token,
        &path,
        json!({"students": [fx.students[0], fx.students[1], fx.students[2]]}),
    )
    .await;
    assert_eq!(response.status_code().as_u16(), 409);
    let body: Value = response.json();
    assert_eq!(body["success"], false);

    let group: Value = get_as(&fx.server, &token, &format!("/manage/groups/{}", fx.group))
        .await
        .json();
    assert_eq!(student_count(&group), 0);

    let response = post_as(
        &fx.server,
        &token,
        &path,
        json!({"students": [fx.students[0], fx.students[1]]}),
    )
    .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["remaining_capacity"], 0);
    assert_eq!(body["data"]["students"].as_array().unwrap().len(), 2);

    let response = post_as(&fx.server, &token, &path, json!({"students": [fx.students[2]]})).await;
    assert_eq!(response.status_code().as_u16(), 409);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enrollment_fills_last_seat_once() {
    let fx = create_fixture();
    let token = login(&fx.server, "em@school.test").await;
    let path = format!("/manage/groups/{}/students", fx.group);

    post_as(&fx.server, &token, &path, json!({"students": [fx.students[0]]}))
        .await
        .assert_status_ok();

    let router = create_router(fx.state.clone());
    let tasks: Vec<_> = fx.students[1..]
        .iter()
        .map(|&student| {
            let router = router.clone();
            let request = Request::post(&path)
                .header(header::AUTHORIZATION, bearer(&token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"students": [student]}).to_string()))
                .unwrap();
            tokio::spawn(async move { router.oneshot(request).await.unwrap().status() })
        })
        .collect();

    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap());
    }
    let accepted = statuses.iter().filter(|&&s| s == StatusCode::OK).count();
    let conflicts = statuses.iter().filter(|&&s| s == StatusCode::CONFLICT).count();
    assert_eq!(accepted, 1, "{:?}", statuses);
    assert_eq!(conflicts, statuses.len() - 1, "{:?}", statuses);

    let group: Value = get_as(&fx.server, &token, &format!("/manage/groups/{}", fx.group))
        .await
        .json();
    assert_eq!(student_count(&group), 2);
    assert_eq!(group["group"]["group_size"], 2);
}

#[tokio::test]
async fn test_enrolling_wrong_role_or_unknown_user() {
    let fx = create_fixture();
    let token = login(&fx.server, "em@school.test").await;
    let path = format!("/manage/groups/{}/students", fx.group);

    let response = post_as(&fx.server, &token, &path, json!({"students": [fx.teacher]})).await;
    assert_eq!(response.status_code().as_u16(), 422);

    let response = post_as(&fx.server, &token, &path, json!({"students": [999]})).await;
    assert_eq!(response.status_code().as_u16(), 404);

    let response = post_as(&fx.server, &token, &path, json!({"students": []})).await;
    assert_eq!(response.status_code().as_u16(), 422);
}

#[tokio::test]
async fn test_group_lifecycle_only_moves_forward() {
    let fx = create_fixture();
    let token = login(&fx.server, "em@school.test").await;
    let group = fx.group;

    let response = post_as(&fx.server, &token, &format!("/manage/groups/{}/finish", group), json!({})).await;
    assert_eq!(response.status_code().as_u16(), 409);

    // no members yet
    let response = post_as(&fx.server, &token, &format!("/manage/groups/{}/start", group), json!({})).await;
    assert_eq!(response.status_code().as_u16(), 409);

    post_as(
        &fx.server,
        &token,
        &format!("/manage/groups/{}/students", group),
        json!({"students": [fx.students[0]]}),
    )
    .await
    .assert_status_ok();
    post_as(
        &fx.server,
        &token,
        &format!("/manage/groups/{}/teachers", group),
        json!({"teachers": [fx.teacher]}),
    )
    .await
    .assert_status_ok();

    let response = post_as(&fx.server, &token, &format!("/manage/groups/{}/start", group), json!({})).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "education_started");

    let response = post_as(&fx.server, &token, &format!("/manage/groups/{}/start", group), json!({})).await;
    assert_eq!(response.status_code().as_u16(), 409);

    let response = post_as(
        &fx.server,
        &token,
        &format!("/manage/groups/{}/students", group),
        json!({"students": [fx.students[1]]}),
    )
    .await;
    assert_eq!(response.status_code().as_u16(), 409);

    let response = post_as(&fx.server, &token, &format!("/manage/groups/{}/finish", group), json!({})).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "education_completed");

    let response = post_as(
        &fx.server,
        &token,
        &format!("/manage/groups/{}/students/remove", group),
        json!({"students": [fx.students[0]]}),
    )
    .await;
    assert_eq!(response.status_code().as_u16(), 409);
}

#[tokio::test]
async fn test_group_history_lists_membership_changes() {
    let fx = create_fixture();
    let token = login(&fx.server, "em@school.test").await;

    post_as(
        &fx.server,
        &token,
        &format!("/manage/groups/{}/students", fx.group),
        json!({"students": [fx.students[0]]}),
    )
    .await
    .assert_status_ok();
    post_as(
        &fx.server,
        &token,
        &format!("/manage/groups/{}/students/remove", fx.group),
        json!({"students": [fx.students[0]]}),
    )
    .await
    .assert_status_ok();

    let response = get_as(&fx.server, &token, &format!("/manage/groups/{}/history", fx.group)).await;
    response.assert_status_ok();
    let history: Value = response.json();
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["action"], "added");
    assert_eq!(history[1]["action"], "removed");
    assert_eq!(history[0]["member"], fx.students[0]);
    assert_eq!(history[0]["member_kind"], "student");

    get_as(&fx.server, &token, "/manage/groups/999/history")
        .await
        .assert_status_not_found();

    let program = login(&fx.server, "pm@school.test").await;
    let response = get_as(&fx.server, &program, &format!("/manage/groups/{}/history", fx.group)).await;
    assert_eq!(response.status_code().as_u16(), 403);
}

#[tokio::test]
async fn test_group_page_for_members_only() {
    let fx = create_fixture();
    let education = login(&fx.server, "em@school.test").await;
    post_as(
        &fx.server,
        &education,
        &format!("/manage/groups/{}/students", fx.group),
        json!({"students": [fx.students[0]]}),
    )
    .await
    .assert_status_ok();

    let member = login(&fx.server, "s1@school.test").await;
    let outsider = login(&fx.server, "s2@school.test").await;
    let path = format!("/groups/{}", fx.group);

    let response = get_as(&fx.server, &member, &path).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["course"]["name"], "Robotics");

    let response = get_as(&fx.server, &outsider, &path).await;
    assert_eq!(response.status_code().as_u16(), 403);

    let dashboard: Value = get_as(&fx.server, &member, "/dashboard/student").await.json();
    assert_eq!(dashboard["groups"].as_array().unwrap().len(), 1);
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[tokio::test]
async fn test_enrollment_notifies_each_member_once() {
    let fx = create_fixture();
    let education = login(&fx.server, "em@school.test").await;
    post_as(
        &fx.server,
        &education,
        &format!("/manage/groups/{}/students", fx.group),
        json!({"students": [fx.students[0], fx.students[1]]}),
    )
    .await
    .assert_status_ok();

    let s1 = login(&fx.server, "s1@school.test").await;
    let s2 = login(&fx.server, "s2@school.test").await;
    let s3 = login(&fx.server, "s3@school.test").await;

    let notes: Value = get_as(&fx.server, &s1, "/notifications?unread=true").await.json();
    let notes = notes.as_array().unwrap().clone();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["message"], "You have been added to group Robotics A.");
    assert_eq!(notes[0]["read"], false);
    let note_id = notes[0]["id"].as_u64().unwrap();

    let others: Value = get_as(&fx.server, &s3, "/notifications").await.json();
    assert!(others.as_array().unwrap().is_empty());

    // someone else's notification
    let response = post_as(&fx.server, &s2, &format!("/notifications/{}/read", note_id), json!({})).await;
    assert_eq!(response.status_code().as_u16(), 403);

    let response = post_as(&fx.server, &s1, &format!("/notifications/{}/read", note_id), json!({})).await;
    response.assert_status_ok();
    let unread: Value = get_as(&fx.server, &s1, "/notifications?unread=true").await.json();
    assert!(unread.as_array().unwrap().is_empty());

    let response = fx
        .server
        .delete(&format!("/notifications/{}", note_id))
        .add_header(header::AUTHORIZATION, bearer(&s1))
        .await;
    response.assert_status_ok();
    let all: Value = get_as(&fx.server, &s1, "/notifications").await.json();
    assert!(all.as_array().unwrap().is_empty());

    let response = post_as(&fx.server, &s2, "/notifications/read-all", json!({})).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "1 notification(s) marked as read.");
}

// =============================================================================
// QUIZ & CONTACT
// =============================================================================

fn quiz_answers() -> Value {
    json!({
        "age_group": "9-12",
        "experience": "Builder",
        "learning_goals": ["Creative Fun"]
    })
}

#[tokio::test]
async fn test_quiz_suggests_matching_course() {
    let fx = create_fixture();

    let response = fx.server.post("/quiz").json(&quiz_answers()).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["suggested_course"], "Robotics");
    assert_eq!(
        body["suggestion_details"],
        "Age: 9-12. Experience: Builder. Goal: Creative Fun."
    );
    assert!(
        response
            .header(header::SET_COOKIE)
            .to_str()
            .unwrap()
            .starts_with("schoolhouse_quiz=")
    );
}

#[tokio::test]
async fn test_quiz_rejects_incomplete_answers() {
    let fx = create_fixture();

    let response = fx
        .server
        .post("/quiz")
        .json(&json!({"age_group": "9-12", "experience": "", "learning_goals": []}))
        .await;
    assert_eq!(response.status_code().as_u16(), 422);
    let body: Value = response.json();
    assert!(body["errors"]["experience"].is_array());
    assert!(body["errors"]["learning_goals"].is_array());
}

#[tokio::test]
async fn test_quiz_contact_without_answers_redirects_to_quiz() {
    let fx = create_fixture();

    let response = fx.server.get("/quiz/contact").await;
    assert_eq!(response.status_code().as_u16(), 303);
    assert_eq!(response.header(header::LOCATION), "/quiz");

    let response = fx
        .server
        .post("/quiz/contact")
        .json(&json!({"name": "Olena", "phone_number": "(067) 555-12-34", "message": ""}))
        .await;
    assert_eq!(response.status_code().as_u16(), 303);
}

#[tokio::test]
async fn test_quiz_contact_stores_suggestion() {
    let fx = create_fixture();

    let response = fx.server.post("/quiz").json(&quiz_answers()).await;
    let set_cookie = response.header(header::SET_COOKIE);
    let cookie = set_cookie.to_str().unwrap().split(';').next().unwrap().to_string();
    let cookie = cookie.parse::<HeaderValue>().unwrap();

    let response = fx
        .server
        .get("/quiz/contact")
        .add_header(header::COOKIE, cookie.clone())
        .await;
    response.assert_status_ok();

    let response = fx
        .server
        .post("/quiz/contact")
        .add_header(header::COOKIE, cookie)
        .json(&json!({"name": "Olena", "phone_number": "(067) 555-12-34", "message": "Call me"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let body: Value = response.json();
    assert_eq!(body["data"]["suggested_course"], "Robotics");
    assert_eq!(body["data"]["status"], "pending");

    let education = login(&fx.server, "em@school.test").await;
    let messages: Value = get_as(&fx.server, &education, "/manage/messages?status=pending").await.json();
    assert_eq!(messages.as_array().unwrap().len(), 1);
    assert_eq!(
        messages[0]["suggestion_details"],
        "Age: 9-12. Experience: Builder. Goal: Creative Fun."
    );
}

#[tokio::test]
async fn test_contact_validation_and_status_change() {
    let fx = create_fixture();

    let response = fx
        .server
        .post("/contact")
        .json(&json!({"name": "", "phone_number": "12345", "message": ""}))
        .await;
    assert_eq!(response.status_code().as_u16(), 422);
    let body: Value = response.json();
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["phone_number"].is_array());

    let response = fx
        .server
        .post("/contact")
        .json(&json!({"name": "Olena", "phone_number": "(067) 555-12-34", "message": ""}))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let body: Value = response.json();
    let id = body["data"]["id"].as_u64().unwrap();
    assert!(body["data"]["suggested_course"].is_null());

    let education = login(&fx.server, "em@school.test").await;
    let dashboard: Value = get_as(&fx.server, &education, "/dashboard/education-manager")
        .await
        .json();
    assert_eq!(dashboard["pending_messages"], 1);

    let response = post_as(
        &fx.server,
        &education,
        &format!("/manage/messages/{}/status", id),
        json!({"status": "completed"}),
    )
    .await;
    response.assert_status_ok();

    let pending: Value = get_as(&fx.server, &education, "/manage/messages?status=pending")
        .await
        .json();
    assert!(pending.as_array().unwrap().is_empty());
}
