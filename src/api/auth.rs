use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::CurrentUser;
use crate::core::security;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::db::types::Role;
use crate::repositories;
use crate::schemas::auth::{AuthUser, LoginRequest, LoginResponse, MeResponse};
use crate::schemas::ApiSuccess;

/// Max login attempts per email per window.
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/login", post(login)).route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiSuccess<LoginResponse>>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let email = payload.email.trim().to_lowercase();

    let rate_key = format!("rl:login:{email}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let user = fetch_user_by_email(&state, &email).await?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS))?;
    if !verified || !user.is_active {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    let role_names = repositories::users::role_names(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user roles"))?;
    let roles = Role::normalize_all(role_names.iter().map(String::as_str));

    let token = security::create_access_token(&user.id, &user.email, &roles, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(user_id = %user.id, action = "login", "User logged in");

    Ok(Json(ApiSuccess::new(LoginResponse {
        token,
        user: AuthUser {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            roles,
        },
    })))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<ApiSuccess<MeResponse>> {
    Json(ApiSuccess::new(MeResponse { id: user.id, email: user.email, roles: user.roles }))
}

async fn fetch_user_by_email(state: &AppState, email: &str) -> Result<User, ApiError> {
    repositories::users::find_by_email(state.db(), email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))
}
