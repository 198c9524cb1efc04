use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Student;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentCreate {
    #[validate(length(min = 1, max = 32, message = "idNumber must be 1-32 characters"))]
    pub(crate) id_number: String,
    #[validate(length(min = 1, max = 100, message = "firstName must be 1-100 characters"))]
    pub(crate) first_name: String,
    #[validate(length(min = 1, max = 100, message = "lastName must be 1-100 characters"))]
    pub(crate) last_name: String,
    #[validate(length(min = 1, max = 32, message = "gradeLevel must be 1-32 characters"))]
    pub(crate) grade_level: String,
    #[serde(default)]
    pub(crate) section: Option<String>,
    #[serde(default)]
    pub(crate) reading_level: Option<String>,
    #[serde(default)]
    pub(crate) parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentListQuery {
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) grade_level: Option<String>,
    #[serde(default)]
    pub(crate) section: Option<String>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) id_number: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) full_name: String,
    pub(crate) grade_level: String,
    pub(crate) section: Option<String>,
    pub(crate) reading_level: Option<String>,
    pub(crate) parent_id: Option<String>,
    pub(crate) created_at: String,
}

impl StudentResponse {
    pub(crate) fn from_db(student: Student) -> Self {
        Self {
            full_name: student.full_name(),
            id: student.id,
            id_number: student.id_number,
            first_name: student.first_name,
            last_name: student.last_name,
            grade_level: student.grade_level,
            section: student.section,
            reading_level: student.reading_level,
            parent_id: student.parent_id,
            created_at: format_primitive(student.created_at),
        }
    }
}
