use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::repository::{fields, users};
use crate::database::DatabaseManager;
use crate::services::FieldAdminService;

pub async fn add_field(name: &str, description: Option<&str>, output_format: OutputFormat) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Field name cannot be empty");
    }

    let pool = DatabaseManager::pool().await?;
    if fields::exists(&pool, name).await? {
        anyhow::bail!("Field '{}' already exists", name);
    }
    let field = fields::insert(&pool, name, description).await?;

    output_success(
        &output_format,
        &format!("Added field '{}'", field.name),
        Some(json!({ "field": field })),
    )
}

pub async fn assign_field_admin(field: &str, email: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await?;
    let user = users::find_by_email(&pool, email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No user with email '{}'", email))?;

    let service = FieldAdminService::new().await?;
    let outcome = service.assign(field, user.id, None).await?;

    let message = if outcome.changed {
        format!("{} is now the admin of '{}'", user.email, field)
    } else {
        format!("{} already administers '{}'", user.email, field)
    };
    output_success(&output_format, &message, Some(json!({ "assignment": outcome })))
}
