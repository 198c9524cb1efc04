use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{IepObjective, IepReport};

const COLUMNS: &str = "id, student_id, student_number, reading_level, overall_score, \
     source_result_id, last_modified_by, is_active, academic_year, created_at, updated_at";

const OBJECTIVE_COLUMNS: &str = "id, report_id, position, category, lesson, status, completed, \
     support_level, remarks, score, passing_threshold, has_intervention, intervention_id, \
     intervention_name, intervention_status, intervention_created_at, updated_at";

/// Most recent active report for the student, optionally restricted to one academic year.
pub(crate) async fn find_active(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    academic_year: Option<&str>,
) -> Result<Option<IepReport>, sqlx::Error> {
    sqlx::query_as::<_, IepReport>(&format!(
        "SELECT {COLUMNS}
         FROM iep_reports
         WHERE student_id = $1 AND is_active AND ($2::text IS NULL OR academic_year = $2)
         ORDER BY created_at DESC, academic_year DESC
         LIMIT 1"
    ))
    .bind(student_id)
    .bind(academic_year)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateReport<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub student_number: &'a str,
    pub reading_level: Option<&'a str>,
    pub overall_score: f64,
    pub source_result_id: Option<&'a str>,
    pub academic_year: &'a str,
    pub created_at: time::PrimitiveDateTime,
}

/// Inserts an active report unless one already exists for the student and year.
/// Returns `false` when a concurrent writer got there first.
pub(crate) async fn insert_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateReport<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO iep_reports (
            id, student_id, student_number, reading_level, overall_score, source_result_id,
            is_active, academic_year, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,TRUE,$7,$8,$8)
        ON CONFLICT (student_id, academic_year) WHERE is_active DO NOTHING",
    )
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.student_number)
    .bind(params.reading_level)
    .bind(params.overall_score)
    .bind(params.source_result_id)
    .bind(params.academic_year)
    .bind(params.created_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn list_active(
    pool: &PgPool,
    student_ids: Option<&[String]>,
    academic_year: Option<&str>,
) -> Result<Vec<IepReport>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM iep_reports WHERE is_active"
    ));

    if let Some(student_ids) = student_ids {
        builder.push(" AND student_id = ANY(");
        builder.push_bind(student_ids.to_vec());
        builder.push(")");
    }

    if let Some(academic_year) = academic_year {
        builder.push(" AND academic_year = ");
        builder.push_bind(academic_year.to_string());
    }

    builder.push(" ORDER BY created_at DESC");
    builder.build_query_as::<IepReport>().fetch_all(pool).await
}

pub(crate) async fn touch(
    executor: impl sqlx::PgExecutor<'_>,
    report_id: &str,
    modified_by: Option<&str>,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE iep_reports
         SET last_modified_by = COALESCE($1, last_modified_by), updated_at = $2
         WHERE id = $3",
    )
    .bind(modified_by)
    .bind(now)
    .bind(report_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM iep_reports WHERE is_active")
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_objectives(
    executor: impl sqlx::PgExecutor<'_>,
    report_id: &str,
) -> Result<Vec<IepObjective>, sqlx::Error> {
    sqlx::query_as::<_, IepObjective>(&format!(
        "SELECT {OBJECTIVE_COLUMNS} FROM iep_objectives WHERE report_id = $1 ORDER BY position"
    ))
    .bind(report_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_objectives_for_reports(
    pool: &PgPool,
    report_ids: &[String],
) -> Result<Vec<IepObjective>, sqlx::Error> {
    if report_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, IepObjective>(&format!(
        "SELECT {OBJECTIVE_COLUMNS}
         FROM iep_objectives
         WHERE report_id = ANY($1)
         ORDER BY report_id, position"
    ))
    .bind(report_ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn insert_objectives(
    executor: impl sqlx::PgExecutor<'_>,
    objectives: &[IepObjective],
) -> Result<(), sqlx::Error> {
    if objectives.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "INSERT INTO iep_objectives ({OBJECTIVE_COLUMNS}) "
    ));
    builder.push_values(objectives, |mut row, objective| {
        row.push_bind(objective.id.clone())
            .push_bind(objective.report_id.clone())
            .push_bind(objective.position)
            .push_bind(objective.category)
            .push_bind(objective.lesson.clone())
            .push_bind(objective.status)
            .push_bind(objective.completed)
            .push_bind(objective.support_level)
            .push_bind(objective.remarks.clone())
            .push_bind(objective.score)
            .push_bind(objective.passing_threshold)
            .push_bind(objective.has_intervention)
            .push_bind(objective.intervention_id.clone())
            .push_bind(objective.intervention_name.clone())
            .push_bind(objective.intervention_status)
            .push_bind(objective.intervention_created_at)
            .push_bind(objective.updated_at);
    });

    builder.build().execute(executor).await?;
    Ok(())
}

/// Writes the teacher-editable and intervention fields of one objective.
pub(crate) async fn update_objective(
    executor: impl sqlx::PgExecutor<'_>,
    objective: &IepObjective,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE iep_objectives
         SET support_level = $1,
             remarks = $2,
             has_intervention = $3,
             intervention_id = $4,
             intervention_name = $5,
             intervention_status = $6,
             intervention_created_at = $7,
             updated_at = $8
         WHERE id = $9 AND report_id = $10",
    )
    .bind(objective.support_level)
    .bind(&objective.remarks)
    .bind(objective.has_intervention)
    .bind(&objective.intervention_id)
    .bind(&objective.intervention_name)
    .bind(objective.intervention_status)
    .bind(objective.intervention_created_at)
    .bind(objective.updated_at)
    .bind(&objective.id)
    .bind(&objective.report_id)
    .execute(executor)
    .await?;
    Ok(())
}
