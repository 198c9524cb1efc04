use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::helpers::{self, LoadedReport};
use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{AuthContext, CurrentUser, STAFF};
use crate::api::students::load_student;
use crate::api::validation::{validate_academic_year, validate_uuid};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::{current_academic_year, primitive_now_utc};
use crate::db::models::IepObjective;
use crate::repositories;
use crate::schemas::iep::{
    BulkUpdateBody, BulkUpdateResponse, ClassQuery, IepReportResponse, ObjectiveResponse,
    RefreshResponse, RemarksBody, ReportQuery, SupportLevelBody,
};
use crate::schemas::ApiSuccess;
use crate::services::iep::{self, ObjectivePatch};

pub(super) async fn get_report(
    Path(student_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<ApiSuccess<IepReportResponse>>, ApiError> {
    validate_academic_year(params.academic_year.as_deref())?;
    let student = load_student(&state, &student_id).await?;
    auth.require_student_access(&student)?;

    let loaded =
        helpers::load_or_create_report(&state, &student, params.academic_year.as_deref()).await?;
    let response = helpers::report_response(&state, loaded, &student).await?;

    Ok(Json(ApiSuccess::new(response)))
}

pub(super) async fn class_reports(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ClassQuery>,
) -> Result<Json<ApiSuccess<Vec<IepReportResponse>>>, ApiError> {
    auth.require_any(STAFF)?;
    validate_academic_year(params.academic_year.as_deref())?;

    let student_ids: Option<Vec<String>> = params.student_ids.as_deref().map(|raw| {
        raw.split(',').map(str::trim).filter(|id| !id.is_empty()).map(str::to_string).collect()
    });
    if let Some(ids) = &student_ids {
        for id in ids {
            validate_uuid(id, "student")?;
        }
    }

    let academic_year = match (&student_ids, params.academic_year) {
        (_, Some(year)) => Some(year),
        (None, None) => {
            Some(current_academic_year(state.settings().iep().school_year_start_month))
        }
        (Some(_), None) => None,
    };

    let reports = repositories::iep_reports::list_active(
        state.db(),
        student_ids.as_deref(),
        academic_year.as_deref(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list IEP reports"))?;

    let report_ids: Vec<String> = reports.iter().map(|report| report.id.clone()).collect();
    let mut objectives_by_report: HashMap<String, Vec<IepObjective>> = HashMap::new();
    for objective in repositories::iep_reports::list_objectives_for_reports(state.db(), &report_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch IEP objectives"))?
    {
        objectives_by_report.entry(objective.report_id.clone()).or_default().push(objective);
    }

    let report_student_ids: Vec<String> =
        reports.iter().map(|report| report.student_id.clone()).collect();
    let students: HashMap<String, _> =
        repositories::students::find_many(state.db(), &report_student_ids)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch students"))?
            .into_iter()
            .map(|student| (student.id.clone(), student))
            .collect();

    let editors = helpers::editor_names(&state, &reports).await?;

    let items = reports
        .into_iter()
        .map(|report| {
            let objectives = objectives_by_report.remove(&report.id).unwrap_or_default();
            let editor_name =
                report.last_modified_by.as_deref().and_then(|id| editors.get(id).cloned());
            let student = students.get(&report.student_id);
            IepReportResponse::from_db(report, objectives, student, editor_name)
        })
        .collect();

    Ok(Json(ApiSuccess::new(items)))
}

pub(super) async fn update_support_level(
    Path(objective_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SupportLevelBody>,
) -> Result<Json<ApiSuccess<ObjectiveResponse>>, ApiError> {
    auth.require_any(STAFF)?;
    let student_id = payload
        .student_id
        .clone()
        .ok_or_else(|| ApiError::BadRequest("studentId is required".to_string()))?;

    apply_support_level(auth, state, student_id, objective_id, payload).await
}

pub(super) async fn update_support_level_legacy(
    Path((student_id, objective_id)): Path<(String, String)>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SupportLevelBody>,
) -> Result<Json<ApiSuccess<ObjectiveResponse>>, ApiError> {
    apply_support_level(auth, state, student_id, objective_id, payload).await
}

async fn apply_support_level(
    auth: AuthContext,
    state: AppState,
    student_id: String,
    objective_id: String,
    payload: SupportLevelBody,
) -> Result<Json<ApiSuccess<ObjectiveResponse>>, ApiError> {
    auth.require_any(STAFF)?;
    validate_uuid(&student_id, "student")?;
    validate_uuid(&objective_id, "objective")?;
    let requested = iep::parse_support_level(payload.support_level.as_ref())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let student = load_student(&state, &student_id).await?;
    let LoadedReport { report, mut objectives } =
        helpers::load_active_report(&state, &student.id).await?;
    let index = helpers::objective_index(&objectives, &objective_id)?;

    let now = primitive_now_utc();
    let objective = &mut objectives[index];
    iep::set_support_level(objective, requested, now);

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    repositories::iep_reports::update_objective(&mut *tx, objective)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update support level"))?;
    repositories::iep_reports::touch(&mut *tx, &report.id, None, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update IEP report"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit support level"))?;

    metrics::record_objective_updates("support_level", 1);
    tracing::info!(
        student_id = %student.id,
        report_id = %report.id,
        objective_id = %objective.id,
        support_level = ?objective.support_level,
        action = "support_level",
        "Objective support level updated"
    );

    Ok(Json(ApiSuccess::with_message(
        ObjectiveResponse::from_db(objective.clone()),
        "Support level updated",
    )))
}

pub(super) async fn update_remarks(
    Path((student_id, objective_id)): Path<(String, String)>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RemarksBody>,
) -> Result<Json<ApiSuccess<ObjectiveResponse>>, ApiError> {
    auth.require_any(STAFF)?;
    validate_uuid(&student_id, "student")?;
    validate_uuid(&objective_id, "objective")?;

    let student = load_student(&state, &student_id).await?;
    let LoadedReport { report, mut objectives } =
        helpers::load_active_report(&state, &student.id).await?;
    let index = helpers::objective_index(&objectives, &objective_id)?;

    let now = primitive_now_utc();
    let objective = &mut objectives[index];
    iep::set_remarks(objective, payload.remarks, now);

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    repositories::iep_reports::update_objective(&mut *tx, objective)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update remarks"))?;
    repositories::iep_reports::touch(&mut *tx, &report.id, Some(&auth.id), now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update IEP report"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit remarks"))?;

    metrics::record_objective_updates("remarks", 1);
    tracing::info!(
        student_id = %student.id,
        report_id = %report.id,
        objective_id = %objective.id,
        action = "remarks",
        "Objective remarks updated"
    );

    Ok(Json(ApiSuccess::with_message(
        ObjectiveResponse::from_db(objective.clone()),
        "Remarks updated",
    )))
}

pub(super) async fn bulk_update(
    Path(student_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BulkUpdateBody>,
) -> Result<Json<ApiSuccess<BulkUpdateResponse>>, ApiError> {
    auth.require_any(STAFF)?;
    validate_uuid(&student_id, "student")?;

    let patches = payload
        .updates
        .into_iter()
        .map(|item| {
            ObjectivePatch::from_json(
                item.objective_id,
                item.support_level.as_ref(),
                item.remarks.as_ref(),
            )
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let student = load_student(&state, &student_id).await?;
    let LoadedReport { report, mut objectives } =
        helpers::load_active_report(&state, &student.id).await?;

    let now = primitive_now_utc();
    let changed = iep::apply_bulk(&mut objectives, &patches, now);

    if !changed.is_empty() {
        let mut tx = state
            .db()
            .begin()
            .await
            .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
        for index in &changed {
            repositories::iep_reports::update_objective(&mut *tx, &objectives[*index])
                .await
                .map_err(|e| ApiError::internal(e, "Failed to update IEP objectives"))?;
        }
        repositories::iep_reports::touch(&mut *tx, &report.id, Some(&auth.id), now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update IEP report"))?;
        tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit bulk update"))?;
    }

    metrics::record_objective_updates("bulk", changed.len());
    tracing::info!(
        student_id = %student.id,
        report_id = %report.id,
        requested = patches.len(),
        changed = changed.len(),
        action = "bulk_update",
        "IEP objectives bulk updated"
    );

    let updated: Vec<ObjectiveResponse> = changed
        .iter()
        .map(|index| ObjectiveResponse::from_db(objectives[*index].clone()))
        .collect();

    Ok(Json(ApiSuccess::with_message(
        BulkUpdateResponse { updated_count: updated.len(), objectives: updated },
        "IEP objectives updated",
    )))
}

pub(super) async fn refresh_interventions(
    Path(student_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiSuccess<RefreshResponse>>, ApiError> {
    auth.require_any(STAFF)?;
    let student = load_student(&state, &student_id).await?;
    let LoadedReport { report, mut objectives } =
        helpers::load_active_report(&state, &student.id).await?;

    let interventions =
        repositories::interventions::list_linkable(state.db(), &student.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch interventions"))?;

    let now = primitive_now_utc();
    let changed = iep::resync_interventions(&mut objectives, &interventions, now);

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    for objective in &objectives {
        repositories::iep_reports::update_objective(&mut *tx, objective)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update intervention linkage"))?;
    }
    if changed > 0 {
        repositories::iep_reports::touch(&mut *tx, &report.id, None, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update IEP report"))?;
    }
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit intervention linkage"))?;

    let linked_count = objectives.iter().filter(|objective| objective.has_intervention).count();
    metrics::record_objective_updates("interventions", changed);
    tracing::info!(
        student_id = %student.id,
        report_id = %report.id,
        interventions = interventions.len(),
        linked = linked_count,
        changed,
        action = "refresh_interventions",
        "IEP intervention linkage refreshed"
    );

    let response =
        helpers::report_response(&state, LoadedReport { report, objectives }, &student).await?;

    Ok(Json(ApiSuccess::with_message(
        RefreshResponse { linked_count, changed_count: changed, report: response },
        "Intervention data refreshed",
    )))
}
