use serde_json::json;

use crate::api::validation::{is_valid_email, normalize_email};
use crate::auth::hash_password_blocking;
use crate::cli::utils::{output_details, output_success};
use crate::cli::{short_id, OutputFormat};
use crate::config;
use crate::database::models::User;
use crate::database::repository::users::NewUser;
use crate::database::repository::{field_admins, profiles, users};
use crate::database::DatabaseManager;
use crate::types::Role;

/// Insert a user with a profile row unless the email is taken.
/// Returns the stored user and whether it was created.
pub async fn ensure_user(
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    field: Option<&str>,
    batch_year: Option<i32>,
) -> anyhow::Result<(User, bool)> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        anyhow::bail!("Invalid email address '{}'", email);
    }

    let pool = DatabaseManager::pool().await?;
    if let Some(existing) = users::find_by_email(&pool, &email).await? {
        return Ok((existing, false));
    }

    let min = config::config().security.min_password_length;
    if password.chars().count() < min {
        anyhow::bail!("Password must be at least {} characters", min);
    }
    let password_hash = hash_password_blocking(password.to_string()).await?;

    let mut tx = pool.begin().await?;
    let user = users::insert(
        &mut *tx,
        NewUser {
            name,
            email: &email,
            password_hash: &password_hash,
            role,
            field,
            batch_year,
        },
    )
    .await?;
    profiles::create_empty(&mut *tx, user.id).await?;
    tx.commit().await?;

    Ok((user, true))
}

pub async fn create_super_admin(
    email: &str,
    name: &str,
    password: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let (user, created) = ensure_user(name, email, password, Role::SuperAdmin, None, None).await?;

    if !created && user.role != Role::SuperAdmin {
        let pool = DatabaseManager::pool().await?;
        let mut tx = pool.begin().await?;
        // A super admin never holds a field assignment
        let released = field_admins::deactivate_for_user(&mut *tx, user.id).await?;
        users::update_role(&mut *tx, user.id, Role::SuperAdmin).await?;
        tx.commit().await?;
        tracing::info!("Promoted {} to super admin (released fields: {:?})", user.id, released);
    }

    let message = if created {
        format!("Created super admin {}", user.email)
    } else {
        format!("{} is a super admin", user.email)
    };
    output_success(
        &output_format,
        &message,
        Some(json!({ "user_id": user.id, "email": user.email, "created": created })),
    )?;
    output_details(&output_format, &[("id", short_id(user.id))]);
    Ok(())
}
