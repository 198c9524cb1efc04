use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{InterventionStatus, ObjectiveStatus, ReadingCategory, SupportLevel};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) id_number: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) grade_level: String,
    pub(crate) section: Option<String>,
    pub(crate) reading_level: Option<String>,
    pub(crate) parent_id: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Student {
    pub(crate) fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// One category line of an assessment result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryScore {
    pub(crate) category_name: ReadingCategory,
    #[serde(default)]
    pub(crate) total_questions: i32,
    #[serde(default)]
    pub(crate) correct_answers: i32,
    pub(crate) score: f64,
    pub(crate) is_passed: bool,
    #[serde(default)]
    pub(crate) passing_threshold: Option<f64>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct CategoryResult {
    pub(crate) id: String,
    pub(crate) student_id: Option<String>,
    pub(crate) assessment_id: Option<String>,
    pub(crate) assessment_type: String,
    pub(crate) reading_level: Option<String>,
    pub(crate) overall_score: f64,
    pub(crate) categories: Json<Vec<CategoryScore>>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Intervention {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) category: ReadingCategory,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) status: InterventionStatus,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct IepReport {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_number: String,
    pub(crate) reading_level: Option<String>,
    pub(crate) overall_score: f64,
    pub(crate) source_result_id: Option<String>,
    pub(crate) last_modified_by: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) academic_year: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct IepObjective {
    pub(crate) id: String,
    pub(crate) report_id: String,
    pub(crate) position: i32,
    pub(crate) category: ReadingCategory,
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
    pub(crate) intervention_created_at: Option<PrimitiveDateTime>,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct SentReport {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) report_id: String,
    pub(crate) parent_email: String,
    pub(crate) storage_key: String,
    pub(crate) file_name: String,
    pub(crate) file_size: i64,
    pub(crate) sha256: String,
    pub(crate) email_sent: bool,
    pub(crate) sent_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}
