use sqlx::PgPool;

use crate::db::models::Intervention;
use crate::db::types::{InterventionStatus, ReadingCategory};

const COLUMNS: &str =
    "id, student_id, category, name, description, status, created_by, created_at, updated_at";

pub(crate) struct CreateIntervention<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub category: ReadingCategory,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub status: InterventionStatus,
    pub created_by: &'a str,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateIntervention<'_>,
) -> Result<Intervention, sqlx::Error> {
    sqlx::query_as::<_, Intervention>(&format!(
        "INSERT INTO interventions (
            id, student_id, category, name, description, status, created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.category)
    .bind(params.name)
    .bind(params.description)
    .bind(params.status)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
    status: Option<InterventionStatus>,
) -> Result<Vec<Intervention>, sqlx::Error> {
    sqlx::query_as::<_, Intervention>(&format!(
        "SELECT {COLUMNS}
         FROM interventions
         WHERE student_id = $1 AND ($2::intervention_status IS NULL OR status = $2)
         ORDER BY created_at DESC"
    ))
    .bind(student_id)
    .bind(status)
    .fetch_all(pool)
    .await
}

/// Interventions that link to IEP objectives, oldest first.
pub(crate) async fn list_linkable(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<Vec<Intervention>, sqlx::Error> {
    sqlx::query_as::<_, Intervention>(&format!(
        "SELECT {COLUMNS}
         FROM interventions
         WHERE student_id = $1 AND status = ANY($2)
         ORDER BY created_at ASC, id ASC"
    ))
    .bind(student_id)
    .bind(InterventionStatus::LINKABLE.to_vec())
    .fetch_all(executor)
    .await
}

pub(crate) async fn update_status(
    pool: &PgPool,
    id: &str,
    status: InterventionStatus,
    now: time::PrimitiveDateTime,
) -> Result<Option<Intervention>, sqlx::Error> {
    sqlx::query_as::<_, Intervention>(&format!(
        "UPDATE interventions SET status = $1, updated_at = $2 WHERE id = $3 RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM interventions WHERE status = 'active'")
        .fetch_one(pool)
        .await
}
