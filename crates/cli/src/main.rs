//! Karat CLI - Database migrations and back-office operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run admin document store migrations
//! karat-cli migrate
//!
//! # Register an admin identity
//! karat-cli admin create --uid u-owner --email owner@karat.example --role super_admin
//!
//! # Inspect the approval queue
//! karat-cli approvals list --status pending
//! karat-cli approvals pending
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create or replace admin identities
//! - `approvals` - Read the approval ledger

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "karat-cli")]
#[command(author, version, about = "Karat CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin identities
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Inspect the approval queue
    Approvals {
        #[command(subcommand)]
        action: ApprovalsAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create or replace an admin identity
    Create {
        /// Gateway uid of the operator
        #[arg(short, long)]
        uid: String,

        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin role (`super_admin`, `admin`, `editor`)
        #[arg(short, long, default_value = "editor")]
        role: String,

        /// Capability flag; repeat for several (`manage_products`, `manage_rates`,
        /// `manage_banners`, `view_approvals`)
        #[arg(short, long = "permission")]
        permissions: Vec<String>,

        /// Register the identity as deactivated
        #[arg(long)]
        inactive: bool,
    },
}

#[derive(Subcommand)]
enum ApprovalsAction {
    /// List proposals, most recent first
    List {
        /// Filter by status (`pending`, `approved`, `rejected`)
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by entity type (`product`, `metalRates`, `banner`)
        #[arg(short = 't', long)]
        entity_type: Option<String>,

        /// Maximum number of entries
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print the number of pending proposals
    Pending,
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
                uid,
                email,
                role,
                permissions,
                inactive,
            } => {
                commands::admin::create_user(&uid, &email, &role, &permissions, inactive).await?;
            }
        },
        Commands::Approvals { action } => match action {
            ApprovalsAction::List {
                status,
                entity_type,
                limit,
            } => {
                commands::approvals::list(status.as_deref(), entity_type.as_deref(), limit).await?;
            }
            ApprovalsAction::Pending => commands::approvals::pending().await?,
        },
    }
    Ok(())
}
