use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::{CategoryResult, CategoryScore};

const COLUMNS: &str = "id, student_id, assessment_id, assessment_type, reading_level, \
     overall_score, categories, created_at";

pub(crate) struct CreateCategoryResult<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub assessment_id: Option<&'a str>,
    pub assessment_type: &'a str,
    pub reading_level: Option<&'a str>,
    pub overall_score: f64,
    pub categories: Vec<CategoryScore>,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateCategoryResult<'_>,
) -> Result<CategoryResult, sqlx::Error> {
    sqlx::query_as::<_, CategoryResult>(&format!(
        "INSERT INTO category_results (
            id, student_id, assessment_id, assessment_type, reading_level, overall_score,
            categories, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.assessment_id)
    .bind(params.assessment_type)
    .bind(params.reading_level)
    .bind(params.overall_score)
    .bind(Json(params.categories))
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

/// Newest result for the student that has at least one category entry.
pub(crate) async fn latest_for_student(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<Option<CategoryResult>, sqlx::Error> {
    sqlx::query_as::<_, CategoryResult>(&format!(
        "SELECT {COLUMNS}
         FROM category_results
         WHERE student_id = $1 AND jsonb_array_length(categories) > 0
         ORDER BY created_at DESC, id DESC
         LIMIT 1"
    ))
    .bind(student_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<CategoryResult>, sqlx::Error> {
    sqlx::query_as::<_, CategoryResult>(&format!(
        "SELECT {COLUMNS} FROM category_results WHERE student_id = $1 ORDER BY created_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

/// Rows imported without a resolved student: `(id, legacy_student_ref)`.
pub(crate) async fn list_unresolved(pool: &PgPool) -> Result<Vec<(String, String)>, sqlx::Error> {
    sqlx::query_as::<_, (String, String)>(
        "SELECT id, legacy_student_ref
         FROM category_results
         WHERE student_id IS NULL AND legacy_student_ref IS NOT NULL
         ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn set_student_id(
    pool: &PgPool,
    id: &str,
    student_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE category_results SET student_id = $1 WHERE id = $2 AND student_id IS NULL")
        .bind(student_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
