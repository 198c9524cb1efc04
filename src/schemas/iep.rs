use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::time::format_primitive;
use crate::db::models::{IepObjective, IepReport, SentReport, Student};
use crate::db::types::{InterventionStatus, ObjectiveStatus, ReadingCategory, SupportLevel};

/// Keeps an explicit `null` distinguishable from an omitted field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReportQuery {
    #[serde(default)]
    pub(crate) academic_year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClassQuery {
    #[serde(default)]
    pub(crate) student_ids: Option<String>,
    #[serde(default)]
    pub(crate) academic_year: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SupportLevelBody {
    #[serde(default)]
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    pub(crate) support_level: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemarksBody {
    #[serde(default)]
    pub(crate) remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BulkUpdateItem {
    pub(crate) objective_id: String,
    #[serde(default, deserialize_with = "present")]
    pub(crate) support_level: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub(crate) remarks: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkUpdateBody {
    pub(crate) updates: Vec<BulkUpdateItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendReportBody {
    pub(crate) pdf_base64: String,
    #[serde(default)]
    pub(crate) file_name: Option<String>,
    #[serde(default)]
    pub(crate) parent_email: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObjectiveResponse {
    pub(crate) id: String,
    pub(crate) category_name: ReadingCategory,
    pub(crate) lesson: String,
    pub(crate) status: ObjectiveStatus,
    pub(crate) completed: bool,
    pub(crate) support_level: Option<SupportLevel>,
    pub(crate) remarks: String,
    pub(crate) score: f64,
    pub(crate) passing_threshold: f64,
    pub(crate) has_intervention: bool,
    pub(crate) intervention_id: Option<String>,
    pub(crate) intervention_name: Option<String>,
    pub(crate) intervention_status: Option<InterventionStatus>,
    pub(crate) intervention_created_at: Option<String>,
    pub(crate) updated_at: String,
}

impl ObjectiveResponse {
    pub(crate) fn from_db(objective: IepObjective) -> Self {
        Self {
            id: objective.id,
            category_name: objective.category,
            lesson: objective.lesson,
            status: objective.status,
            completed: objective.completed,
            support_level: objective.support_level,
            remarks: objective.remarks,
            score: objective.score,
            passing_threshold: objective.passing_threshold,
            has_intervention: objective.has_intervention,
            intervention_id: objective.intervention_id,
            intervention_name: objective.intervention_name,
            intervention_status: objective.intervention_status,
            intervention_created_at: objective.intervention_created_at.map(format_primitive),
            updated_at: format_primitive(objective.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReportStudent {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) id_number: String,
    pub(crate) grade_level: String,
    pub(crate) section: Option<String>,
}

impl ReportStudent {
    pub(crate) fn from_db(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            name: student.full_name(),
            id_number: student.id_number.clone(),
            grade_level: student.grade_level.clone(),
            section: student.section.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IepReportResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_number: String,
    pub(crate) student: Option<ReportStudent>,
    pub(crate) reading_level: Option<String>,
    pub(crate) overall_score: f64,
    pub(crate) source_result_id: Option<String>,
    pub(crate) academic_year: String,
    pub(crate) is_active: bool,
    pub(crate) last_modified_by: Option<String>,
    pub(crate) last_modified_by_name: Option<String>,
    pub(crate) objectives: Vec<ObjectiveResponse>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl IepReportResponse {
    pub(crate) fn from_db(
        report: IepReport,
        objectives: Vec<IepObjective>,
        student: Option<&Student>,
        last_modified_by_name: Option<String>,
    ) -> Self {
        Self {
            id: report.id,
            student_id: report.student_id,
            student_number: report.student_number,
            student: student.map(ReportStudent::from_db),
            reading_level: report.reading_level,
            overall_score: report.overall_score,
            source_result_id: report.source_result_id,
            academic_year: report.academic_year,
            is_active: report.is_active,
            last_modified_by: report.last_modified_by,
            last_modified_by_name,
            objectives: objectives.into_iter().map(ObjectiveResponse::from_db).collect(),
            created_at: format_primitive(report.created_at),
            updated_at: format_primitive(report.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BulkUpdateResponse {
    pub(crate) updated_count: usize,
    pub(crate) objectives: Vec<ObjectiveResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    pub(crate) linked_count: usize,
    pub(crate) changed_count: usize,
    pub(crate) report: IepReportResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SentReportResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) report_id: String,
    pub(crate) parent_email: String,
    pub(crate) file_name: String,
    pub(crate) file_size: i64,
    pub(crate) sha256: String,
    pub(crate) email_sent: bool,
    pub(crate) sent_by: Option<String>,
    pub(crate) created_at: String,
    pub(crate) view_url: Option<String>,
}

impl SentReportResponse {
    pub(crate) fn from_db(report: SentReport, view_url: Option<String>) -> Self {
        Self {
            id: report.id,
            student_id: report.student_id,
            report_id: report.report_id,
            parent_email: report.parent_email,
            file_name: report.file_name,
            file_size: report.file_size,
            sha256: report.sha256,
            email_sent: report.email_sent,
            sent_by: report.sent_by,
            created_at: format_primitive(report.created_at),
            view_url,
        }
    }
}
