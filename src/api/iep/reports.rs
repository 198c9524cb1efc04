use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;
use validator::ValidateEmail;

use super::helpers::{self, LoadedReport};
use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{CurrentUser, STAFF};
use crate::api::students::load_student;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Student;
use crate::repositories;
use crate::schemas::iep::{SendReportBody, SentReportResponse};
use crate::schemas::ApiSuccess;
use crate::services::mailer::progress_report_body;
use crate::services::storage::{report_key, PDF_CONTENT_TYPE};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Decodes a base64 PDF, tolerating a `data:` URL prefix, and checks the magic bytes and size.
pub(super) fn decode_pdf(encoded: &str, max_bytes: usize) -> Result<Vec<u8>, ApiError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| ApiError::BadRequest("pdfBase64 is not valid base64".to_string()))?;

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ApiError::BadRequest("Uploaded file is not a PDF".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(ApiError::BadRequest(format!(
            "PDF exceeds the maximum size of {} MB",
            max_bytes / (1024 * 1024)
        )));
    }

    Ok(bytes)
}

pub(super) fn report_file_name(requested: Option<&str>, student: &Student, academic_year: &str) -> String {
    let base = requested
        .map(|name| {
            name.trim()
                .trim_end_matches(".pdf")
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect::<String>()
        })
        .filter(|name| !name.trim_matches('_').is_empty())
        .unwrap_or_else(|| format!("IEP_Report_{}_{}", student.id_number, academic_year));

    format!("{base}.pdf")
}

async fn resolve_parent_email(
    state: &AppState,
    student: &Student,
    requested: Option<&str>,
) -> Result<String, ApiError> {
    if let Some(email) = requested.map(str::trim).filter(|email| !email.is_empty()) {
        if !email.validate_email() {
            return Err(ApiError::BadRequest("parentEmail must be a valid address".to_string()));
        }
        return Ok(email.to_lowercase());
    }

    let Some(parent_id) = student.parent_id.as_deref() else {
        return Err(ApiError::BadRequest("No parent email available for this student".to_string()));
    };

    repositories::users::find_by_id(state.db(), parent_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch parent"))?
        .map(|parent| parent.email)
        .ok_or_else(|| ApiError::BadRequest("No parent email available for this student".to_string()))
}

pub(super) async fn send_report(
    Path(student_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SendReportBody>,
) -> Result<(StatusCode, Json<ApiSuccess<SentReportResponse>>), ApiError> {
    auth.require_any(STAFF)?;

    let iep_settings = state.settings().iep();
    let pdf = decode_pdf(&payload.pdf_base64, iep_settings.max_report_bytes())?;

    let student = load_student(&state, &student_id).await?;
    let LoadedReport { report, .. } = helpers::load_active_report(&state, &student.id).await?;
    let parent_email = resolve_parent_email(&state, &student, payload.parent_email.as_deref()).await?;

    let storage = state
        .storage()
        .ok_or_else(|| ApiError::ServiceUnavailable("Report storage is not configured".to_string()))?;

    let file_name = report_file_name(payload.file_name.as_deref(), &student, &report.academic_year);
    let storage_key = report_key(&student.id, &Uuid::new_v4().to_string());

    let stored = storage
        .upload_bytes(&storage_key, PDF_CONTENT_TYPE, pdf)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to upload progress report"))?;

    tracing::info!(
        student_id = %student.id,
        report_id = %report.id,
        storage_key = %storage_key,
        size = stored.size,
        "Progress report uploaded"
    );

    let expires_in = Duration::from_secs(iep_settings.report_url_expire_minutes * 60);
    let download_url = storage.presign_get(&storage_key, expires_in).await.map_err(|e| {
        tracing::error!(storage_key = %storage_key, "Uploaded report left without a delivery record");
        ApiError::internal(e, "Failed to create report download link")
    })?;

    let email_sent = match state.mailer() {
        Some(mailer) => {
            let subject = format!("IEP progress report: {}", student.full_name());
            let body = progress_report_body(
                &student.full_name(),
                &report.academic_year,
                &download_url,
                payload.message.as_deref(),
            );
            match mailer.send(&parent_email, &subject, &body).await {
                Ok(()) => true,
                Err(err) => {
                    tracing::error!(error = %err, student_id = %student.id, "Failed to email progress report");
                    false
                }
            }
        }
        None => {
            tracing::warn!(student_id = %student.id, "Mail not configured; progress report email skipped");
            false
        }
    };

    let sent = repositories::sent_reports::create(
        state.db(),
        repositories::sent_reports::CreateSentReport {
            id: &Uuid::new_v4().to_string(),
            student_id: &student.id,
            report_id: &report.id,
            parent_email: &parent_email,
            storage_key: &storage_key,
            file_name: &file_name,
            file_size: stored.size,
            sha256: &stored.sha256,
            email_sent,
            sent_by: &auth.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(storage_key = %storage_key, "Uploaded report left without a delivery record");
        ApiError::internal(e, "Failed to record sent report")
    })?;

    metrics::record_report_sent(email_sent);

    let message = if email_sent {
        "Progress report sent to parent"
    } else {
        "Progress report stored; email was not sent"
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiSuccess::with_message(SentReportResponse::from_db(sent, Some(download_url)), message)),
    ))
}

pub(super) async fn list_sent_reports(
    Path(student_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiSuccess<Vec<SentReportResponse>>>, ApiError> {
    let student = load_student(&state, &student_id).await?;
    auth.require_student_access(&student)?;

    let sent = repositories::sent_reports::list_by_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list sent reports"))?;

    let expires_in =
        Duration::from_secs(state.settings().iep().report_url_expire_minutes * 60);
    let mut items = Vec::with_capacity(sent.len());
    for report in sent {
        let view_url = match state.storage() {
            Some(storage) => match storage.presign_get(&report.storage_key, expires_in).await {
                Ok(url) => Some(url),
                Err(err) => {
                    tracing::warn!(error = %err, storage_key = %report.storage_key, "Failed to presign report URL");
                    None
                }
            },
            None => None,
        };
        items.push(SentReportResponse::from_db(report, view_url));
    }

    Ok(Json(ApiSuccess::new(items)))
}
