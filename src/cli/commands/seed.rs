use serde::Deserialize;
use serde_json::json;
use std::path::Path;

use super::accounts::ensure_user;
use crate::cli::utils::{output_details, output_success};
use crate::cli::OutputFormat;
use crate::database::repository::{fields, users};
use crate::database::DatabaseManager;
use crate::services::FieldAdminService;
use crate::types::Role;

/// YAML fixture:
///
/// ```yaml
/// fields:
///   - name: Physics
///     description: Department of Physics
/// users:
///   - name: Ada Lovelace
///     email: ada@example.org
///     password: change-me-please
///     role: alumni
///     field: Physics
///     batch_year: 2015
/// field_admins:
///   - field: Physics
///     email: ada@example.org
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub fields: Vec<FieldFixture>,
    pub users: Vec<UserFixture>,
    pub field_admins: Vec<FieldAdminFixture>,
}

#[derive(Debug, Deserialize)]
pub struct FieldFixture {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserFixture {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
    pub field: Option<String>,
    pub batch_year: Option<i32>,
}

fn default_role() -> Role {
    Role::Alumni
}

#[derive(Debug, Deserialize)]
pub struct FieldAdminFixture {
    pub field: String,
    pub email: String,
}

#[derive(Debug, Default)]
struct SeedCounts {
    fields: usize,
    users: usize,
    skipped_users: usize,
    field_admins: usize,
}

pub fn parse_fixture(text: &str) -> anyhow::Result<Fixture> {
    let fixture: Fixture = serde_yaml::from_str(text)?;
    if let Some(user) = fixture.users.iter().find(|u| u.role == Role::FieldAdmin) {
        anyhow::bail!(
            "User {} has role field_admin; list them under field_admins instead",
            user.email
        );
    }
    Ok(fixture)
}

/// Load a fixture. Existing fields and users are left untouched, so a
/// fixture can be applied more than once.
pub async fn seed(path: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(path).await?;
    let fixture = parse_fixture(&text)?;
    let pool = DatabaseManager::pool().await?;
    let mut counts = SeedCounts::default();

    for field in &fixture.fields {
        if !fields::exists(&pool, &field.name).await? {
            fields::insert(&pool, &field.name, field.description.as_deref()).await?;
            counts.fields += 1;
        }
    }

    for user in &fixture.users {
        let (_, created) = ensure_user(
            &user.name,
            &user.email,
            &user.password,
            user.role,
            user.field.as_deref(),
            user.batch_year,
        )
        .await?;
        if created {
            counts.users += 1;
        } else {
            counts.skipped_users += 1;
        }
    }

    if !fixture.field_admins.is_empty() {
        let service = FieldAdminService::new().await?;
        for admin in &fixture.field_admins {
            let user = users::find_by_email(&pool, &admin.email)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Field admin {} is not a known user", admin.email))?;
            if service.assign(&admin.field, user.id, None).await?.changed {
                counts.field_admins += 1;
            }
        }
    }

    tracing::info!("Seed fixture {} applied: {:?}", path.display(), counts);
    output_success(
        &output_format,
        &format!("Seeded {}", path.display()),
        Some(json!({
            "fields": counts.fields,
            "users": counts.users,
            "skipped_users": counts.skipped_users,
            "field_admins": counts.field_admins
        })),
    )?;
    output_details(
        &output_format,
        &[
            ("fields added", counts.fields.to_string()),
            ("users added", counts.users.to_string()),
            ("users skipped", counts.skipped_users.to_string()),
            ("field admins assigned", counts.field_admins.to_string()),
        ],
    );
    Ok(())
}
