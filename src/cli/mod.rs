pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "alumni")]
#[command(about = "Alumni CLI - operator tooling for the Alumni Directory API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply database migrations")]
    Migrate,

    #[command(about = "Create a super admin account (or promote an existing one)")]
    CreateSuperAdmin {
        #[arg(long, help = "Account email")]
        email: String,
        #[arg(long, help = "Display name", default_value = "Administrator")]
        name: String,
        #[arg(long, env = "ALUMNI_ADMIN_PASSWORD", help = "Password (or ALUMNI_ADMIN_PASSWORD)")]
        password: String,
    },

    #[command(about = "Add a field to the catalogue")]
    AddField {
        #[arg(help = "Field name")]
        name: String,
        #[arg(long, help = "Field description")]
        description: Option<String>,
    },

    #[command(about = "Make a verified user the admin of a field")]
    AssignFieldAdmin {
        #[arg(help = "Field name")]
        field: String,
        #[arg(help = "Email of the user to assign")]
        email: String,
    },

    #[command(about = "Load fields, users and field admins from a YAML fixture")]
    Seed {
        #[arg(help = "Path to the fixture file")]
        file: PathBuf,
    },

    #[command(about = "Check a running server's /health endpoint")]
    Ping {
        #[arg(long, env = "ALUMNI_API_URL", default_value = "http://localhost:3000", help = "Server base URL")]
        url: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::database::migrate(output_format).await,
        Commands::CreateSuperAdmin { email, name, password } => {
            commands::accounts::create_super_admin(&email, &name, &password, output_format).await
        }
        Commands::AddField { name, description } => {
            commands::fields::add_field(&name, description.as_deref(), output_format).await
        }
        Commands::AssignFieldAdmin { field, email } => {
            commands::fields::assign_field_admin(&field, &email, output_format).await
        }
        Commands::Seed { file } => commands::seed::seed(&file, output_format).await,
        Commands::Ping { url } => commands::ping::ping(&url, output_format).await,
    }
}

/// Convenience for commands that print a created id
pub(crate) fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_json_flag_parses_after_subcommand() {
        let cli = Cli::try_parse_from(["alumni", "add-field", "Physics", "--json"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert!(matches!(cli.command, Commands::AddField { ref name, .. } if name == "Physics"));
    }

    #[test]
    fn ping_has_a_default_url() {
        let cli = Cli::try_parse_from(["alumni", "ping"]).unwrap();
        match cli.command {
            Commands::Ping { url } => assert!(url.starts_with("http")),
            _ => panic!("expected ping"),
        }
    }

    #[test]
    fn assign_requires_field_and_email() {
        assert!(Cli::try_parse_from(["alumni", "assign-field-admin", "Physics"]).is_err());
    }
}
