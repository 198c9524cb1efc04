use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::Student;
use crate::db::types::Role;

/// Caller identity decoded from the bearer token.
#[derive(Debug, Clone)]
pub(crate) struct AuthContext {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) roles: Vec<Role>,
}

impl AuthContext {
    pub(crate) fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub(crate) fn require_any(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.iter().any(|role| self.has_role(*role)) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Access denied"))
        }
    }

    /// Staff may see every student; a parent only their own children.
    pub(crate) fn require_student_access(&self, student: &Student) -> Result<(), ApiError> {
        if self.has_role(Role::Admin) || self.has_role(Role::Teacher) {
            return Ok(());
        }
        if self.has_role(Role::Parent) && student.parent_id.as_deref() == Some(self.id.as_str()) {
            return Ok(());
        }
        Err(ApiError::Forbidden("Access denied"))
    }
}

pub(crate) const STAFF: &[Role] = &[Role::Admin, Role::Teacher];

pub(crate) struct CurrentUser(pub(crate) AuthContext);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Authentication required"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        Ok(CurrentUser(AuthContext {
            id: claims.sub,
            email: claims.email,
            roles: Role::normalize_all(claims.roles.iter().map(String::as_str)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn context(roles: Vec<Role>) -> AuthContext {
        AuthContext { id: "parent-1".to_string(), email: "p@example.com".to_string(), roles }
    }

    fn student(parent_id: Option<&str>) -> Student {
        Student {
            id: "student-1".to_string(),
            id_number: "2025001".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Santos".to_string(),
            grade_level: "Grade 1".to_string(),
            section: None,
            reading_level: None,
            parent_id: parent_id.map(str::to_string),
            created_at: datetime!(2025-06-01 00:00:00),
            updated_at: datetime!(2025-06-01 00:00:00),
        }
    }

    #[test]
    fn require_any_matches_one_of_roles() {
        assert!(context(vec![Role::Teacher]).require_any(STAFF).is_ok());
        assert!(matches!(
            context(vec![Role::Parent]).require_any(STAFF),
            Err(ApiError::Forbidden("Access denied"))
        ));
        assert!(context(vec![]).require_any(&[Role::Admin]).is_err());
    }

    #[test]
    fn parents_only_reach_their_children() {
        let parent = context(vec![Role::Parent]);
        assert!(parent.require_student_access(&student(Some("parent-1"))).is_ok());
        assert!(parent.require_student_access(&student(Some("someone-else"))).is_err());
        assert!(parent.require_student_access(&student(None)).is_err());
        assert!(context(vec![Role::Teacher]).require_student_access(&student(None)).is_ok());
    }
}
