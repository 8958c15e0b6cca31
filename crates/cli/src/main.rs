//! Bundlehub CLI - Database migrations and operations tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bh-cli migrate
//!
//! # Create admin user
//! bh-cli admin create -e admin@example.com -n "Admin Name" -p 'long password'
//!
//! # Settle orders stuck in processing for more than 10 minutes
//! bh-cli reconcile --older-than-minutes 10
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin users
//! - `reconcile` - Re-check stuck orders with the vendor

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bh-cli")]
#[command(author, version, about = "Bundlehub CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Re-check orders stuck in processing with the vendor
    Reconcile {
        /// Only orders processing for longer than this
        #[arg(long, default_value_t = 10)]
        older_than_minutes: u64,

        /// Most orders to check in one run
        #[arg(long, default_value_t = 100)]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&email, &name, &password).await?;
            }
        },
        Commands::Reconcile {
            older_than_minutes,
            limit,
        } => {
            let report = commands::reconcile::run(older_than_minutes, limit).await?;
            if report.errors > 0 {
                return Err(format!("{} orders could not be reconciled", report.errors).into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_reconcile_defaults() {
        let cli = Cli::try_parse_from(["bh-cli", "reconcile"]).unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Reconcile {
                older_than_minutes: 10,
                limit: 100
            }
        ));
    }

    #[test]
    fn test_admin_create_requires_password() {
        assert!(Cli::try_parse_from(["bh-cli", "admin", "create", "-e", "a@b.co", "-n", "A"]).is_err());
    }
}
