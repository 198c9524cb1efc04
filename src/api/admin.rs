use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::CurrentUser;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::Role;
use crate::repositories;
use crate::schemas::user::{AdminUserCreate, DashboardStats, UserListQuery, UserResponse};
use crate::schemas::ApiSuccess;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/dashboard", get(dashboard))
}

async fn create_user(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AdminUserCreate>,
) -> Result<(StatusCode, Json<ApiSuccess<UserResponse>>), ApiError> {
    auth.require_any(&[Role::Admin])?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let role = Role::parse(&payload.role)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown role '{}'", payload.role)))?;
    let email = payload.email.trim().to_lowercase();

    let existing = repositories::users::find_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let user = repositories::users::create(
        &mut *tx,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            hashed_password,
            first_name: payload.first_name.trim(),
            last_name: payload.last_name.trim(),
            is_active: true,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    repositories::users::assign_role(&mut *tx, &user.id, role)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assign role"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit user"))?;

    tracing::info!(user_id = %user.id, role = role.as_str(), created_by = %auth.id, "Account created");

    Ok((
        StatusCode::CREATED,
        Json(ApiSuccess::with_message(
            UserResponse::from_db(user, vec![role]),
            "Account created",
        )),
    ))
}

async fn list_users(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<UserListQuery>,
) -> Result<Json<ApiSuccess<Vec<UserResponse>>>, ApiError> {
    auth.require_any(&[Role::Admin])?;

    let role = match params.role.as_deref() {
        Some(raw) => Some(
            Role::parse(raw).ok_or_else(|| ApiError::BadRequest(format!("Unknown role '{raw}'")))?,
        ),
        None => None,
    };

    let users = repositories::users::list(state.db(), role, params.skip, params.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    let ids: Vec<String> = users.iter().map(|user| user.id.clone()).collect();
    let role_rows = repositories::users::role_names_for_users(state.db(), &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user roles"))?;

    let mut roles_by_user: HashMap<String, Vec<String>> = HashMap::new();
    for (user_id, name) in role_rows {
        roles_by_user.entry(user_id).or_default().push(name);
    }

    let items = users
        .into_iter()
        .map(|user| {
            let names = roles_by_user.remove(&user.id).unwrap_or_default();
            let roles = Role::normalize_all(names.iter().map(String::as_str));
            UserResponse::from_db(user, roles)
        })
        .collect();

    Ok(Json(ApiSuccess::new(items)))
}

async fn dashboard(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiSuccess<DashboardStats>>, ApiError> {
    auth.require_any(&[Role::Admin])?;
    let db = state.db();

    let students = repositories::students::count(db, Default::default())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;
    let teachers = repositories::users::count_with_role(db, Role::Teacher)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count teachers"))?;
    let parents = repositories::users::count_with_role(db, Role::Parent)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count parents"))?;
    let active_iep_reports = repositories::iep_reports::count_active(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count IEP reports"))?;
    let active_interventions = repositories::interventions::count_active(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count interventions"))?;

    Ok(Json(ApiSuccess::new(DashboardStats {
        students,
        teachers,
        parents,
        active_iep_reports,
        active_interventions,
    })))
}

#[cfg(test)]
mod tests;
