use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::Role;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LoginRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthUser {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) roles: Vec<Role>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    pub(crate) token: String,
    pub(crate) user: AuthUser,
}

#[derive(Debug, Serialize)]
pub(crate) struct MeResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) roles: Vec<Role>,
}
