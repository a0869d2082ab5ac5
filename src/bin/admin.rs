//! Admin CLI: installs an encrypted application-config blob and prints the
//! age recipient string operators need to encrypt one. Grounded in the
//! teacher's `bin/admin_setup.rs` (`clap::Subcommand` over a small set of
//! one-shot database operations).

use std::path::PathBuf;

use anyhow::{Context, Result};
use auth_backend::constants::config_scope;
use auth_backend::crypto::SecureStore;
use auth_backend::database::Database;
use clap::{Parser, Subcommand};
use tracing::info;

/// Command-line entry point for the auth backend admin tool.
#[derive(Parser)]
#[command(name = "auth-backend-admin")]
#[command(about = "Install or inspect encrypted application configuration")]
struct AdminArgs {
    /// Path to the SQLite database file.
    database_path: PathBuf,

    /// Path to the age identity file used to decrypt/encrypt blobs.
    #[arg(long, env = "AGE_IDENTITY_PATH")]
    age_identity: PathBuf,

    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Print the age recipient string for this identity, for operators to
    /// encrypt a new config blob against before calling `install`.
    Recipient,
    /// Encrypt a TOML config file and install it as the next generation.
    Install {
        /// Path to a plaintext TOML config file.
        config_path: PathBuf,
        /// Free-text description stored alongside the generation.
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = AdminArgs::parse();

    let db = Database::new(&args.database_path.display().to_string())
        .await
        .context("opening database")?;
    let store = SecureStore::load(&args.age_identity, db).context("loading age identity")?;

    match args.command {
        AdminCommand::Recipient => {
            println!("{}", store.recipient_string());
        }
        AdminCommand::Install {
            config_path,
            description,
        } => {
            let plaintext = std::fs::read(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            toml::from_str::<toml::Value>(&String::from_utf8_lossy(&plaintext))
                .context("config file is not valid TOML")?;
            let generation = store
                .save(config_scope::APP, &plaintext, config_scope::FORMAT_TOML, &description)
                .await
                .context("encrypting and installing config")?;
            info!(generation, "installed new application config generation");
        }
    }
    Ok(())
}
