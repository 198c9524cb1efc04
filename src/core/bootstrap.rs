use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::Role;
use crate::repositories;

/// Makes sure the configured first admin account exists, can log in with the configured
/// password and holds the admin role.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin creation");
        return Ok(());
    }

    let email = admin.first_admin_email.trim().to_lowercase();
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_email(state.db(), &email).await? {
        let verified = security::verify_password(&admin.first_admin_password, &user.hashed_password)
            .unwrap_or(false);
        let roles = repositories::users::role_names(state.db(), &user.id).await?;
        let is_admin = Role::normalize_all(roles.iter().map(String::as_str)).contains(&Role::Admin);

        if verified && user.is_active && is_admin {
            tracing::info!("Default admin already up to date");
            return Ok(());
        }

        if !verified || !user.is_active {
            let hashed_password = if verified {
                user.hashed_password.clone()
            } else {
                security::hash_password(&admin.first_admin_password)?
            };
            repositories::users::reset_credentials(state.db(), &user.id, &hashed_password, now)
                .await?;
        }
        if !is_admin {
            repositories::users::assign_role(state.db(), &user.id, Role::Admin).await?;
        }

        tracing::info!(email = %email, "Updated default admin");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_admin_password)?;
    let mut tx = state.db().begin().await?;
    let user = repositories::users::create(
        &mut *tx,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            hashed_password,
            first_name: "System",
            last_name: "Administrator",
            is_active: true,
            created_at: now,
        },
    )
    .await?;
    repositories::users::assign_role(&mut *tx, &user.id, Role::Admin).await?;
    tx.commit().await?;

    tracing::info!(email = %email, "Created default admin");
    Ok(())
}
