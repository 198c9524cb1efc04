use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Intervention;
use crate::db::types::{InterventionStatus, ReadingCategory};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InterventionCreate {
    pub(crate) student_id: String,
    pub(crate) category: String,
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InterventionStatusUpdate {
    pub(crate) status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InterventionListQuery {
    #[serde(default)]
    pub(crate) status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InterventionResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) category: ReadingCategory,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) status: InterventionStatus,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl InterventionResponse {
    pub(crate) fn from_db(intervention: Intervention) -> Self {
        Self {
            id: intervention.id,
            student_id: intervention.student_id,
            category: intervention.category,
            name: intervention.name,
            description: intervention.description,
            status: intervention.status,
            created_by: intervention.created_by,
            created_at: format_primitive(intervention.created_at),
            updated_at: format_primitive(intervention.updated_at),
        }
    }
}
