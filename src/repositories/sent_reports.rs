use sqlx::PgPool;

use crate::db::models::SentReport;

const COLUMNS: &str = "id, student_id, report_id, parent_email, storage_key, file_name, \
     file_size, sha256, email_sent, sent_by, created_at";

pub(crate) struct CreateSentReport<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub report_id: &'a str,
    pub parent_email: &'a str,
    pub storage_key: &'a str,
    pub file_name: &'a str,
    pub file_size: i64,
    pub sha256: &'a str,
    pub email_sent: bool,
    pub sent_by: &'a str,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSentReport<'_>,
) -> Result<SentReport, sqlx::Error> {
    sqlx::query_as::<_, SentReport>(&format!(
        "INSERT INTO iep_sent_reports (
            id, student_id, report_id, parent_email, storage_key, file_name, file_size, sha256,
            email_sent, sent_by, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.report_id)
    .bind(params.parent_email)
    .bind(params.storage_key)
    .bind(params.file_name)
    .bind(params.file_size)
    .bind(params.sha256)
    .bind(params.email_sent)
    .bind(params.sent_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<SentReport>, sqlx::Error> {
    sqlx::query_as::<_, SentReport>(&format!(
        "SELECT {COLUMNS} FROM iep_sent_reports WHERE student_id = $1 ORDER BY created_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}
