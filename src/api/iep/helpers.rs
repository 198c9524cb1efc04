use std::collections::HashMap;

use crate::api::errors::ApiError;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::{current_academic_year, primitive_now_utc};
use crate::db::models::{IepObjective, IepReport, Student};
use crate::repositories;
use crate::schemas::iep::IepReportResponse;
use crate::services::iep;

pub(super) const NO_ASSESSMENT_DATA: &str =
    "No assessment data found for this student. Please complete an assessment first.";

/// Active report with its objectives in position order.
pub(super) struct LoadedReport {
    pub(super) report: IepReport,
    pub(super) objectives: Vec<IepObjective>,
}

pub(super) async fn load_active_report(
    state: &AppState,
    student_id: &str,
) -> Result<LoadedReport, ApiError> {
    let report = repositories::iep_reports::find_active(state.db(), student_id, None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch IEP report"))?
        .ok_or_else(|| ApiError::NotFound("IEP report not found".to_string()))?;

    let objectives = repositories::iep_reports::list_objectives(state.db(), &report.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch IEP objectives"))?;

    Ok(LoadedReport { report, objectives })
}

/// Returns the active report, deriving and storing one from the newest category result when the
/// student has none yet.
pub(super) async fn load_or_create_report(
    state: &AppState,
    student: &Student,
    academic_year: Option<&str>,
) -> Result<LoadedReport, ApiError> {
    let existing = repositories::iep_reports::find_active(state.db(), &student.id, academic_year)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch IEP report"))?;

    if let Some(report) = existing {
        let objectives = repositories::iep_reports::list_objectives(state.db(), &report.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch IEP objectives"))?;
        return Ok(LoadedReport { report, objectives });
    }

    let source = repositories::category_results::latest_for_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch category results"))?
        .ok_or_else(|| ApiError::NotFound(NO_ASSESSMENT_DATA.to_string()))?;

    let settings = state.settings().iep();
    let year = match academic_year {
        Some(year) => year.to_string(),
        None => current_academic_year(settings.school_year_start_month),
    };

    let generated =
        iep::generate_report(student, &source, &year, settings.passing_threshold, primitive_now_utc());

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let report = &generated.report;
    let inserted = repositories::iep_reports::insert_if_absent(
        &mut *tx,
        repositories::iep_reports::CreateReport {
            id: &report.id,
            student_id: &report.student_id,
            student_number: &report.student_number,
            reading_level: report.reading_level.as_deref(),
            overall_score: report.overall_score,
            source_result_id: report.source_result_id.as_deref(),
            academic_year: &report.academic_year,
            created_at: report.created_at,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create IEP report"))?;

    if inserted {
        repositories::iep_reports::insert_objectives(&mut *tx, &generated.objectives)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create IEP objectives"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit IEP report"))?;

    if inserted {
        metrics::record_report_created();
        tracing::info!(
            student_id = %student.id,
            report_id = %report.id,
            source_result_id = %source.id,
            academic_year = %year,
            objectives = generated.objectives.len(),
            "Derived IEP report from category results"
        );
    } else {
        tracing::debug!(student_id = %student.id, academic_year = %year, "IEP report created concurrently");
    }

    let report = repositories::iep_reports::find_active(state.db(), &student.id, Some(&year))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch IEP report"))?
        .ok_or_else(|| ApiError::NotFound("IEP report not found".to_string()))?;
    let objectives = repositories::iep_reports::list_objectives(state.db(), &report.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch IEP objectives"))?;

    Ok(LoadedReport { report, objectives })
}

pub(super) fn objective_index(
    objectives: &[IepObjective],
    objective_id: &str,
) -> Result<usize, ApiError> {
    objectives
        .iter()
        .position(|objective| objective.id == objective_id)
        .ok_or_else(|| ApiError::NotFound("Objective not found".to_string()))
}

pub(super) async fn editor_names(
    state: &AppState,
    reports: &[IepReport],
) -> Result<HashMap<String, String>, ApiError> {
    let mut names = HashMap::new();
    for editor_id in reports.iter().filter_map(|report| report.last_modified_by.as_deref()) {
        if names.contains_key(editor_id) {
            continue;
        }
        let user = repositories::users::find_by_id(state.db(), editor_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch report editor"))?;
        if let Some(user) = user {
            names.insert(editor_id.to_string(), user.full_name());
        }
    }
    Ok(names)
}

pub(super) async fn report_response(
    state: &AppState,
    loaded: LoadedReport,
    student: &Student,
) -> Result<IepReportResponse, ApiError> {
    let mut names = editor_names(state, std::slice::from_ref(&loaded.report)).await?;
    let editor_name =
        loaded.report.last_modified_by.as_deref().and_then(|editor_id| names.remove(editor_id));

    Ok(IepReportResponse::from_db(loaded.report, loaded.objectives, Some(student), editor_name))
}
