use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Student;

const COLUMNS: &str = "id, id_number, first_name, last_name, grade_level, section, reading_level, \
     parent_id, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_by_id_number(
    executor: impl sqlx::PgExecutor<'_>,
    id_number: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id_number = $1"))
        .bind(id_number)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_many(pool: &PgPool, ids: &[String]) -> Result<Vec<Student>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = ANY($1)"))
        .bind(ids)
        .fetch_all(pool)
        .await
}

pub(crate) struct CreateStudent<'a> {
    pub id: &'a str,
    pub id_number: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub grade_level: &'a str,
    pub section: Option<&'a str>,
    pub reading_level: Option<&'a str>,
    pub parent_id: Option<&'a str>,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateStudent<'_>,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (
            id, id_number, first_name, last_name, grade_level, section, reading_level,
            parent_id, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.id_number)
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.grade_level)
    .bind(params.section)
    .bind(params.reading_level)
    .bind(params.parent_id)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

#[derive(Debug, Default)]
pub(crate) struct StudentFilter<'a> {
    pub search: Option<&'a str>,
    pub grade_level: Option<&'a str>,
    pub section: Option<&'a str>,
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: StudentFilter<'_>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Student>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM students"));
    push_filters(&mut builder, &filter);
    builder.push(" ORDER BY last_name, first_name OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Student>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: StudentFilter<'_>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM students");
    push_filters(&mut builder, &filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &StudentFilter<'_>) {
    let mut has_where = false;
    let mut push_clause = |builder: &mut QueryBuilder<'_, Postgres>| {
        builder.push(if has_where { " AND " } else { " WHERE " });
        has_where = true;
    };

    if let Some(search) = filter.search.map(str::trim).filter(|value| !value.is_empty()) {
        let pattern = format!("%{search}%");
        push_clause(builder);
        builder.push("(first_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR last_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR id_number ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(grade_level) = filter.grade_level {
        push_clause(builder);
        builder.push("grade_level = ");
        builder.push_bind(grade_level.to_string());
    }

    if let Some(section) = filter.section {
        push_clause(builder);
        builder.push("section = ");
        builder.push_bind(section.to_string());
    }
}

pub(crate) async fn list_by_parent(
    pool: &PgPool,
    parent_id: &str,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS} FROM students WHERE parent_id = $1 ORDER BY first_name, last_name"
    ))
    .bind(parent_id)
    .fetch_all(pool)
    .await
}
