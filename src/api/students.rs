use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{CurrentUser, STAFF};
use crate::api::pagination::PaginatedResponse;
use crate::api::validation::validate_uuid;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Student;
use crate::db::types::Role;
use crate::repositories;
use crate::repositories::students::StudentFilter;
use crate::schemas::student::{StudentCreate, StudentListQuery, StudentResponse};
use crate::schemas::ApiSuccess;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/:student_id", get(get_student))
}

pub(crate) fn parents_router() -> Router<AppState> {
    Router::new().route("/me/children", get(my_children))
}

/// Validates the id format, then loads the student or fails with 404.
pub(crate) async fn load_student(state: &AppState, student_id: &str) -> Result<Student, ApiError> {
    validate_uuid(student_id, "student")?;

    repositories::students::find_by_id(state.db(), student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))
}

async fn create_student(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<StudentCreate>,
) -> Result<(StatusCode, Json<ApiSuccess<StudentResponse>>), ApiError> {
    auth.require_any(STAFF)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let id_number = payload.id_number.trim();
    let existing = repositories::students::find_by_id_number(state.db(), id_number)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing student"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Student with this ID number already exists".to_string()));
    }

    if let Some(parent_id) = payload.parent_id.as_deref() {
        validate_uuid(parent_id, "parent")?;
        let parent = repositories::users::find_by_id(state.db(), parent_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch parent"))?;
        if parent.is_none() {
            return Err(ApiError::NotFound("Parent not found".to_string()));
        }
    }

    let student = repositories::students::create(
        state.db(),
        repositories::students::CreateStudent {
            id: &Uuid::new_v4().to_string(),
            id_number,
            first_name: payload.first_name.trim(),
            last_name: payload.last_name.trim(),
            grade_level: payload.grade_level.trim(),
            section: payload.section.as_deref(),
            reading_level: payload.reading_level.as_deref(),
            parent_id: payload.parent_id.as_deref(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create student"))?;

    tracing::info!(student_id = %student.id, created_by = %auth.id, "Student created");

    Ok((StatusCode::CREATED, Json(ApiSuccess::new(StudentResponse::from_db(student)))))
}

async fn list_students(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<StudentListQuery>,
) -> Result<Json<ApiSuccess<PaginatedResponse<StudentResponse>>>, ApiError> {
    auth.require_any(STAFF)?;

    let filter = || StudentFilter {
        search: params.search.as_deref(),
        grade_level: params.grade_level.as_deref(),
        section: params.section.as_deref(),
    };

    let students = repositories::students::list(state.db(), filter(), params.skip, params.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;
    let total_count = repositories::students::count(state.db(), filter())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;

    Ok(Json(ApiSuccess::new(PaginatedResponse {
        items: students.into_iter().map(StudentResponse::from_db).collect(),
        total_count,
        skip: params.skip.max(0),
        limit: params.limit.clamp(1, 1000),
    })))
}

async fn get_student(
    Path(student_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiSuccess<StudentResponse>>, ApiError> {
    let student = load_student(&state, &student_id).await?;
    auth.require_student_access(&student)?;
    Ok(Json(ApiSuccess::new(StudentResponse::from_db(student))))
}

async fn my_children(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiSuccess<Vec<StudentResponse>>>, ApiError> {
    auth.require_any(&[Role::Parent])?;

    let children = repositories::students::list_by_parent(state.db(), &auth.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list children"))?;

    Ok(Json(ApiSuccess::new(children.into_iter().map(StudentResponse::from_db).collect())))
}

#[cfg(test)]
mod tests;
