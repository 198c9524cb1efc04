use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{CategoryResult, CategoryScore};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryScoreInput {
    pub(crate) category_name: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "totalQuestions must be non-negative"))]
    pub(crate) total_questions: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "correctAnswers must be non-negative"))]
    pub(crate) correct_answers: i32,
    #[validate(range(min = 0.0, max = 100.0, message = "score must be between 0 and 100"))]
    pub(crate) score: f64,
    #[serde(default)]
    pub(crate) is_passed: Option<bool>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "passingThreshold must be between 0 and 100"))]
    pub(crate) passing_threshold: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryResultCreate {
    pub(crate) student_id: String,
    #[serde(default)]
    pub(crate) assessment_id: Option<String>,
    #[serde(default)]
    pub(crate) assessment_type: Option<String>,
    #[serde(default)]
    pub(crate) reading_level: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "overallScore must be between 0 and 100"))]
    pub(crate) overall_score: Option<f64>,
    #[validate(length(min = 1, message = "categories must not be empty"), nested)]
    pub(crate) categories: Vec<CategoryScoreInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryResultResponse {
    pub(crate) id: String,
    pub(crate) student_id: Option<String>,
    pub(crate) assessment_id: Option<String>,
    pub(crate) assessment_type: String,
    pub(crate) reading_level: Option<String>,
    pub(crate) overall_score: f64,
    pub(crate) categories: Vec<CategoryScore>,
    pub(crate) created_at: String,
}

impl CategoryResultResponse {
    pub(crate) fn from_db(result: CategoryResult) -> Self {
        Self {
            id: result.id,
            student_id: result.student_id,
            assessment_id: result.assessment_id,
            assessment_type: result.assessment_type,
            reading_level: result.reading_level,
            overall_score: result.overall_score,
            categories: result.categories.0,
            created_at: format_primitive(result.created_at),
        }
    }
}
