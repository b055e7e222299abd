//! User Registry CLI - Migrations, validation and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! user-registry migrate
//!
//! # Check a candidate document without touching the database
//! user-registry validate candidate.json
//!
//! # Manage users
//! user-registry user create -u jdoe -f Jane -l Doe -e jane@example.com -p '$2b$...' -a 34
//! user-registry user show -e jane@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `validate` - Validate and normalize a candidate user document
//! - `user create|show|touch|delete` - Manage user records

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use user_registry_core::{CartId, Role};

use crate::config::LogFormat;
use crate::error::CliError;

mod commands;
mod config;
mod error;

#[derive(Parser)]
#[command(name = "user-registry")]
#[command(author, version, about = "User registry CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Validate a candidate user document (JSON file) without a database
    Validate {
        /// Path to the JSON document
        file: PathBuf,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new user
    Create {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        first_name: String,

        #[arg(short, long)]
        last_name: String,

        #[arg(short, long)]
        email: String,

        /// Password, already hashed; stored as given
        #[arg(short, long)]
        password: String,

        #[arg(short, long)]
        age: i64,

        /// Role (`user`, `premium`); defaults to `user`
        #[arg(short, long)]
        role: Option<Role>,

        /// Cart identifier (UUID)
        #[arg(short, long)]
        cart: Option<CartId>,
    },
    /// Print a user record
    Show {
        #[arg(short, long)]
        email: String,
    },
    /// Set a user's last connection to now
    Touch {
        #[arg(short, long)]
        email: String,
    },
    /// Delete a user
    Delete {
        #[arg(short, long)]
        email: String,
    },
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "user_registry=info,user_registry_core=info,user_registry_store=info".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() {
    init_tracing(LogFormat::from_env());

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Validate { file } => commands::validate::run(&file)?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                first_name,
                last_name,
                email,
                password,
                age,
                role,
                cart,
            } => {
                let args = commands::user::CreateArgs {
                    username,
                    first_name,
                    last_name,
                    email,
                    password,
                    age,
                    role,
                    cart,
                };
                commands::user::create(&args).await?;
            }
            UserAction::Show { email } => commands::user::show(&email).await?,
            UserAction::Touch { email } => commands::user::touch(&email).await?,
            UserAction::Delete { email } => commands::user::delete(&email).await?,
        },
    }
    Ok(())
}
