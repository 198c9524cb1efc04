use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::db::types::{ReadingCategory, Role};
use crate::test_support::{self, TestContext};

async fn call(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, token, body))
        .await
        .expect("response");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

#[tokio::test]
async fn login_normalizes_legacy_role_names() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user_with_role_name(ctx.state.db(), "guro@school.ph", "guro-pass", "guro")
        .await;

    let (status, json) = call(
        &ctx,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "GURO@school.ph", "password": "guro-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {json}");
    assert_eq!(json["data"]["user"]["roles"], json!(["teacher"]));
    assert_eq!(json["data"]["user"]["firstName"], "Legacy");
    let token = json["data"]["token"].as_str().expect("token").to_string();

    let (status, json) = call(&ctx, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["email"], "guro@school.ph");
    assert_eq!(json["data"]["roles"], json!(["teacher"]));

    let (status, _) = call(&ctx, Method::GET, "/api/students", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(
        ctx.state.db(),
        "maria@school.ph",
        "Maria",
        "Cruz",
        "teacher-pass",
        Role::Teacher,
    )
    .await;

    for body in [
        json!({"email": "maria@school.ph", "password": "wrong-pass"}),
        json!({"email": "nobody@school.ph", "password": "teacher-pass"}),
    ] {
        let (status, json) = call(&ctx, Method::POST, "/api/auth/login", None, Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Invalid email or password");
    }

    let (status, _) = call(
        &ctx,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "not-an-email", "password": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = call(&ctx, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Authentication required");
}

#[tokio::test]
async fn login_attempts_are_rate_limited() {
    let ctx = test_support::setup_test_context().await;
    let body = json!({"email": "maria@school.ph", "password": "wrong-pass"});

    let mut last = StatusCode::OK;
    for _ in 0..11 {
        let (status, _) =
            call(&ctx, Method::POST, "/api/auth/login", None, Some(body.clone())).await;
        last = status;
    }
    assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn admin_manages_accounts_and_sees_dashboard() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let admin =
        test_support::insert_user(db, "admin@school.ph", "Ada", "Admin", "admin-pass", Role::Admin)
            .await;
    let token = test_support::bearer_token(&admin, &[Role::Admin], ctx.state.settings());
    test_support::insert_user_with_role_name(db, "guro@school.ph", "guro-pass", "guro").await;

    let payload = json!({
        "email": "Maria@School.ph",
        "password": "teacher-pass",
        "firstName": "Maria",
        "lastName": "Cruz",
        "role": "teacher"
    });
    let (status, json) =
        call(&ctx, Method::POST, "/api/admin/users", Some(&token), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "response: {json}");
    assert_eq!(json["data"]["email"], "maria@school.ph");
    assert_eq!(json["data"]["roles"], json!(["teacher"]));

    let (status, _) =
        call(&ctx, Method::POST, "/api/admin/users", Some(&token), Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &ctx,
        Method::POST,
        "/api/admin/users",
        Some(&token),
        Some(json!({
            "email": "short@school.ph",
            "password": "short",
            "firstName": "S",
            "lastName": "P",
            "role": "parent"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) =
        call(&ctx, Method::GET, "/api/admin/users?role=teacher", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let teachers = json["data"].as_array().expect("users");
    assert_eq!(teachers.len(), 2);
    assert!(teachers.iter().all(|user| user["roles"] == json!(["teacher"])));

    let student = test_support::insert_student(db, "2025050", "Ana", None).await;
    test_support::insert_category_result(
        db,
        &student.id,
        vec![test_support::category(ReadingCategory::Decoding, 60.0, false)],
    )
    .await;

    let (status, json) =
        call(&ctx, Method::GET, "/api/admin/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["students"], 1);
    assert_eq!(json["data"]["teachers"], 2);
    assert_eq!(json["data"]["parents"], 0);
    assert_eq!(json["data"]["activeIepReports"], 0);

    let teacher_token = test_support::bearer_token(&admin, &[Role::Teacher], ctx.state.settings());
    let (status, json) =
        call(&ctx, Method::GET, "/api/admin/dashboard", Some(&teacher_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "Access denied");
}
