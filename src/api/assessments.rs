use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{CurrentUser, STAFF};
use crate::api::students::load_student;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::CategoryScore;
use crate::db::types::ReadingCategory;
use crate::repositories;
use crate::schemas::assessment::{CategoryResultCreate, CategoryResultResponse, CategoryScoreInput};
use crate::schemas::ApiSuccess;
use crate::services::iep;

const DEFAULT_ASSESSMENT_TYPE: &str = "main-assessment";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/category-results", post(create_category_result))
        .route("/category-results/student/:student_id", get(list_category_results))
}

async fn create_category_result(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CategoryResultCreate>,
) -> Result<(StatusCode, Json<ApiSuccess<CategoryResultResponse>>), ApiError> {
    auth.require_any(STAFF)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let default_threshold = state.settings().iep().passing_threshold;
    let categories = payload
        .categories
        .iter()
        .map(|entry| to_category_score(entry, default_threshold))
        .collect::<Result<Vec<_>, _>>()?;

    let student = load_student(&state, &payload.student_id).await?;

    let overall_score = payload.overall_score.unwrap_or_else(|| iep::overall_score(&categories));
    let result = repositories::category_results::create(
        state.db(),
        repositories::category_results::CreateCategoryResult {
            id: &Uuid::new_v4().to_string(),
            student_id: &student.id,
            assessment_id: payload.assessment_id.as_deref(),
            assessment_type: payload.assessment_type.as_deref().unwrap_or(DEFAULT_ASSESSMENT_TYPE),
            reading_level: payload.reading_level.as_deref(),
            overall_score,
            categories,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save category result"))?;

    tracing::info!(student_id = %student.id, result_id = %result.id, "Category result recorded");

    Ok((StatusCode::CREATED, Json(ApiSuccess::new(CategoryResultResponse::from_db(result)))))
}

fn to_category_score(
    entry: &CategoryScoreInput,
    default_threshold: f64,
) -> Result<CategoryScore, ApiError> {
    let category_name = ReadingCategory::parse(&entry.category_name).ok_or_else(|| {
        ApiError::BadRequest(format!("Unknown reading category '{}'", entry.category_name))
    })?;
    let threshold = entry.passing_threshold.unwrap_or(default_threshold);

    Ok(CategoryScore {
        category_name,
        total_questions: entry.total_questions,
        correct_answers: entry.correct_answers,
        score: entry.score,
        is_passed: entry.is_passed.unwrap_or(entry.score >= threshold),
        passing_threshold: entry.passing_threshold,
    })
}

async fn list_category_results(
    Path(student_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiSuccess<Vec<CategoryResultResponse>>>, ApiError> {
    let student = load_student(&state, &student_id).await?;
    auth.require_student_access(&student)?;

    let results = repositories::category_results::list_by_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list category results"))?;

    Ok(Json(ApiSuccess::new(results.into_iter().map(CategoryResultResponse::from_db).collect())))
}
