use serde_json::Value;
use sqlx::PgPool;

use crate::db::models::Student;
use crate::repositories;

/// A way of locating a student from a legacy reference, in lookup order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StudentRef {
    Id(String),
    IdNumber(String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BackfillSummary {
    pub(crate) scanned: usize,
    pub(crate) resolved: usize,
    pub(crate) unresolved: usize,
}

/// Expands a raw legacy reference into lookup candidates: the value as an id, the value without
/// surrounding quotes as an id, an extended-JSON `$oid`, then the external ID number (plain or
/// `$numberInt`/`$numberLong`).
pub(crate) fn candidates(raw: &str) -> Vec<StudentRef> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut refs = Vec::new();
    let mut push = |candidate: StudentRef| {
        if !refs.contains(&candidate) {
            refs.push(candidate);
        }
    };

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
            if let Some(oid) = map.get("$oid").and_then(scalar_text) {
                push(StudentRef::Id(oid));
            }
            for key in ["$numberInt", "$numberLong"] {
                if let Some(number) = map.get(key).and_then(scalar_text) {
                    push(StudentRef::IdNumber(number));
                }
            }
        }
        return refs;
    }

    push(StudentRef::Id(trimmed.to_string()));

    let unquoted = trimmed.trim_matches(|c| c == '"' || c == '\'').trim();
    if unquoted.is_empty() {
        return Vec::new();
    }
    push(StudentRef::Id(unquoted.to_string()));
    push(StudentRef::IdNumber(unquoted.to_string()));

    refs
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

pub(crate) async fn resolve(pool: &PgPool, raw: &str) -> Result<Option<Student>, sqlx::Error> {
    for candidate in candidates(raw) {
        let found = match &candidate {
            StudentRef::Id(id) => repositories::students::find_by_id(pool, id).await?,
            StudentRef::IdNumber(number) => {
                repositories::students::find_by_id_number(pool, number).await?
            }
        };
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

/// Writes the normalized student id onto every legacy category result that can be resolved.
pub(crate) async fn backfill(pool: &PgPool) -> Result<BackfillSummary, sqlx::Error> {
    let rows = repositories::category_results::list_unresolved(pool).await?;
    let mut summary = BackfillSummary { scanned: rows.len(), ..BackfillSummary::default() };

    for (result_id, raw) in rows {
        match resolve(pool, &raw).await? {
            Some(student) => {
                repositories::category_results::set_student_id(pool, &result_id, &student.id)
                    .await?;
                tracing::debug!(result_id = %result_id, student_id = %student.id, "Resolved legacy student reference");
                summary.resolved += 1;
            }
            None => {
                tracing::warn!(result_id = %result_id, legacy_ref = %raw, "Unresolved legacy student reference");
                summary.unresolved += 1;
            }
        }
    }

    Ok(summary)
}
