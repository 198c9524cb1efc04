use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{CurrentUser, STAFF};
use crate::api::students::load_student;
use crate::api::validation::validate_uuid;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{InterventionStatus, ReadingCategory};
use crate::repositories;
use crate::schemas::intervention::{
    InterventionCreate, InterventionListQuery, InterventionResponse, InterventionStatusUpdate,
};
use crate::schemas::ApiSuccess;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_intervention))
        .route("/student/:student_id", get(list_interventions))
        .route("/:intervention_id/status", patch(update_status))
}

fn parse_status(raw: &str) -> Result<InterventionStatus, ApiError> {
    InterventionStatus::parse(raw)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid intervention status '{raw}'")))
}

async fn create_intervention(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<InterventionCreate>,
) -> Result<(StatusCode, Json<ApiSuccess<InterventionResponse>>), ApiError> {
    auth.require_any(STAFF)?;
    payload.name = payload.name.trim().to_string();
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let category = ReadingCategory::parse(&payload.category).ok_or_else(|| {
        ApiError::BadRequest(format!("Unknown reading category '{}'", payload.category))
    })?;
    let status = match payload.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => InterventionStatus::Active,
    };

    let student = load_student(&state, &payload.student_id).await?;

    let intervention = repositories::interventions::create(
        state.db(),
        repositories::interventions::CreateIntervention {
            id: &Uuid::new_v4().to_string(),
            student_id: &student.id,
            category,
            name: &payload.name,
            description: payload.description.as_deref(),
            status,
            created_by: &auth.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create intervention"))?;

    tracing::info!(
        student_id = %student.id,
        intervention_id = %intervention.id,
        category = category.display_name(),
        "Intervention created"
    );

    Ok((StatusCode::CREATED, Json(ApiSuccess::new(InterventionResponse::from_db(intervention)))))
}

async fn list_interventions(
    Path(student_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<InterventionListQuery>,
) -> Result<Json<ApiSuccess<Vec<InterventionResponse>>>, ApiError> {
    let status = params.status.as_deref().map(parse_status).transpose()?;
    let student = load_student(&state, &student_id).await?;
    auth.require_student_access(&student)?;

    let interventions =
        repositories::interventions::list_by_student(state.db(), &student.id, status)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list interventions"))?;

    Ok(Json(ApiSuccess::new(
        interventions.into_iter().map(InterventionResponse::from_db).collect(),
    )))
}

async fn update_status(
    Path(intervention_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<InterventionStatusUpdate>,
) -> Result<Json<ApiSuccess<InterventionResponse>>, ApiError> {
    auth.require_any(STAFF)?;
    validate_uuid(&intervention_id, "intervention")?;
    let status = parse_status(&payload.status)?;

    let intervention = repositories::interventions::update_status(
        state.db(),
        &intervention_id,
        status,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update intervention"))?
    .ok_or_else(|| ApiError::NotFound("Intervention not found".to_string()))?;

    tracing::info!(intervention_id = %intervention.id, status = ?status, "Intervention status changed");

    Ok(Json(ApiSuccess::new(InterventionResponse::from_db(intervention))))
}
