use sqlx::PgPool;

use crate::db::models::User;
use crate::db::types::Role;

const COLUMNS: &str = "id, email, hashed_password, first_name, last_name, is_active, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Role names as stored, resolved through `user_roles`.
pub(crate) async fn role_names(pool: &PgPool, user_id: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT r.name
         FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = $1
         ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn role_names_for_users(
    pool: &PgPool,
    user_ids: &[String],
) -> Result<Vec<(String, String)>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, (String, String)>(
        "SELECT ur.user_id, r.name
         FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = ANY($1)",
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub hashed_password: String,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub is_active: bool,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, email, hashed_password, first_name, last_name, is_active, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.is_active)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Links the canonical role row. Existing alias rows (`guro`, `magulang`) are left alone.
pub(crate) async fn assign_role(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    role: Role,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id)
         SELECT $1, id FROM roles WHERE name = $2
         ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role.as_str())
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn reset_credentials(
    pool: &PgPool,
    id: &str,
    hashed_password: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET hashed_password = $1, is_active = TRUE, updated_at = $2 WHERE id = $3",
    )
    .bind(hashed_password)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn list(
    pool: &PgPool,
    role: Option<Role>,
    skip: i64,
    limit: i64,
) -> Result<Vec<User>, sqlx::Error> {
    let aliases: Option<Vec<&str>> = role.map(|role| role.aliases().to_vec());

    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS}
         FROM users u
         WHERE $1::text[] IS NULL OR EXISTS (
             SELECT 1 FROM user_roles ur
             JOIN roles r ON r.id = ur.role_id
             WHERE ur.user_id = u.id AND lower(r.name) = ANY($1)
         )
         ORDER BY created_at DESC
         OFFSET $2 LIMIT $3"
    ))
    .bind(aliases)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_with_role(pool: &PgPool, role: Role) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(DISTINCT ur.user_id)
         FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         WHERE lower(r.name) = ANY($1)",
    )
    .bind(role.aliases().to_vec())
    .fetch_one(pool)
    .await
}
