use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::db::types::Role;
use crate::test_support::{self, TestContext};

async fn call(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, Some(token), body))
        .await
        .expect("response");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

#[tokio::test]
async fn teacher_creates_and_lists_students() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let teacher =
        test_support::insert_user(db, "maria@school.ph", "Maria", "Cruz", "teacher-pass", Role::Teacher)
            .await;
    let parent =
        test_support::insert_user(db, "jose@family.ph", "Jose", "Reyes", "parent-pass", Role::Parent)
            .await;
    let token = test_support::bearer_token(&teacher, &[Role::Teacher], ctx.state.settings());

    let (status, json) = call(
        &ctx,
        Method::POST,
        "/api/students",
        &token,
        Some(json!({
            "idNumber": "2025010",
            "firstName": "Ana",
            "lastName": "Reyes",
            "gradeLevel": "Grade 1",
            "section": "Sampaguita",
            "parentId": parent.id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {json}");
    assert_eq!(json["data"]["fullName"], "Ana Reyes");
    assert_eq!(json["data"]["parentId"], parent.id.as_str());

    let (status, json) = call(
        &ctx,
        Method::POST,
        "/api/students",
        &token,
        Some(json!({
            "idNumber": "2025010",
            "firstName": "Other",
            "lastName": "Child",
            "gradeLevel": "Grade 2"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);

    test_support::insert_student(db, "2025011", "Ben", None).await;

    let (status, json) = call(&ctx, Method::GET, "/api/students?search=ana", &token, None).await;
    assert_eq!(status, StatusCode::OK, "response: {json}");
    assert_eq!(json["data"]["totalCount"], 1);
    assert_eq!(json["data"]["items"][0]["idNumber"], "2025010");

    let (status, json) = call(&ctx, Method::GET, "/api/students?limit=1", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["totalCount"], 2);
    assert_eq!(json["data"]["items"].as_array().expect("items").len(), 1);
}

#[tokio::test]
async fn parents_see_only_their_children() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let parent =
        test_support::insert_user(db, "jose@family.ph", "Jose", "Reyes", "parent-pass", Role::Parent)
            .await;
    let child = test_support::insert_student(db, "2025020", "Ana", Some(&parent.id)).await;
    let stranger = test_support::insert_student(db, "2025021", "Carlo", None).await;
    let token = test_support::bearer_token(&parent, &[Role::Parent], ctx.state.settings());

    let (status, json) = call(&ctx, Method::GET, "/api/parents/me/children", &token, None).await;
    assert_eq!(status, StatusCode::OK, "response: {json}");
    let children = json["data"].as_array().expect("children");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["id"], child.id.as_str());

    let (status, _) =
        call(&ctx, Method::GET, &format!("/api/students/{}", child.id), &token, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        call(&ctx, Method::GET, &format!("/api/students/{}", stranger.id), &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&ctx, Method::GET, "/api/students", &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn category_results_feed_the_iep_report() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let teacher =
        test_support::insert_user(db, "maria@school.ph", "Maria", "Cruz", "teacher-pass", Role::Teacher)
            .await;
    let student = test_support::insert_student(db, "2025030", "Ana", None).await;
    let token = test_support::bearer_token(&teacher, &[Role::Teacher], ctx.state.settings());

    let (status, json) = call(
        &ctx,
        Method::POST,
        "/api/assessments/category-results",
        &token,
        Some(json!({
            "studentId": student.id,
            "readingLevel": "Transitioning",
            "categories": [
                {"categoryName": "Phonological Awareness", "totalQuestions": 10, "correctAnswers": 8, "score": 80},
                {"categoryName": "reading_comprehension", "totalQuestions": 10, "correctAnswers": 5, "score": 50}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {json}");
    assert_eq!(json["data"]["overallScore"], 65.0);
    assert_eq!(json["data"]["categories"][0]["isPassed"], true);
    assert_eq!(json["data"]["categories"][1]["isPassed"], false);
    assert_eq!(json["data"]["categories"][1]["categoryName"], "Reading Comprehension");

    let (status, _) = call(
        &ctx,
        Method::POST,
        "/api/assessments/category-results",
        &token,
        Some(json!({
            "studentId": student.id,
            "categories": [{"categoryName": "Spelling", "score": 10}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &ctx,
        Method::POST,
        "/api/assessments/category-results",
        &token,
        Some(json!({"studentId": student.id, "categories": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) =
        call(&ctx, Method::GET, &format!("/api/iep/student/{}", student.id), &token, None).await;
    assert_eq!(status, StatusCode::OK, "response: {json}");
    assert_eq!(json["data"]["readingLevel"], "Transitioning");
    assert_eq!(json["data"]["objectives"][0]["status"], "mastered");
    assert_eq!(json["data"]["objectives"][1]["status"], "in_progress");
}

#[tokio::test]
async fn interventions_are_created_and_filtered_by_status() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let teacher =
        test_support::insert_user(db, "maria@school.ph", "Maria", "Cruz", "teacher-pass", Role::Teacher)
            .await;
    let student = test_support::insert_student(db, "2025040", "Ana", None).await;
    let token = test_support::bearer_token(&teacher, &[Role::Teacher], ctx.state.settings());

    let (status, json) = call(
        &ctx,
        Method::POST,
        "/api/interventions",
        &token,
        Some(json!({
            "studentId": student.id,
            "category": "Decoding",
            "name": "Blending games"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {json}");
    assert_eq!(json["data"]["status"], "active");

    let (status, json) = call(
        &ctx,
        Method::POST,
        "/api/interventions",
        &token,
        Some(json!({
            "studentId": student.id,
            "category": "Decoding",
            "name": "   ",
            "description": "Untitled"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {json}");

    let (status, json) = call(
        &ctx,
        Method::POST,
        "/api/interventions",
        &token,
        Some(json!({
            "studentId": student.id,
            "category": "Decoding",
            "name": format!("  {}  ", "b".repeat(200))
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {json}");
    assert_eq!(json["data"]["name"], "b".repeat(200));

    let (status, _) = call(
        &ctx,
        Method::POST,
        "/api/interventions",
        &token,
        Some(json!({
            "studentId": student.id,
            "category": "word-recognition",
            "name": "Sight word flashcards",
            "status": "draft"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = call(
        &ctx,
        Method::GET,
        &format!("/api/interventions/student/{}?status=draft", student.id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = json["data"].as_array().expect("interventions");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["category"], "Word Recognition");

    let (status, _) = call(
        &ctx,
        Method::GET,
        &format!("/api/interventions/student/{}?status=paused", student.id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
