//! Auth backend server binary.
//!
//! Boots the database, decrypts the application configuration, builds
//! the mailer/notifier collaborators from it, spawns the job scheduler,
//! and serves the HTTP API until shutdown. Grounded in the teacher's
//! `bin/multitenant_server.rs` shape (`clap::Parser` args, `#[tokio::main]`,
//! `anyhow::Result`), narrowed to this backend's single bootstrap surface.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use auth_backend::config::{Bootstrap, ConfigProvider, LogLevel};
use auth_backend::crypto::SecureStore;
use auth_backend::database::Database;
use auth_backend::jobs::Scheduler;
use auth_backend::logging::LoggingConfig;
use auth_backend::mailer::{Mailer, NoopMailer, SmtpMailer};
use auth_backend::middleware::{BlockList, Metrics};
use auth_backend::notifier::discord::DiscordNotifier;
use auth_backend::notifier::{MultiNotifier, NilNotifier, Notify};
use auth_backend::state::AppState;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// Command-line entry point for the auth backend server.
#[derive(Parser)]
#[command(name = "auth-backend-server")]
#[command(about = "Self-contained authentication and background-work backend")]
struct CliArgs {
    /// Path to the SQLite database file.
    database_path: PathBuf,

    /// Path to the age identity file used to decrypt configuration blobs.
    #[arg(long, env = "AGE_IDENTITY_PATH")]
    age_identity: PathBuf,

    /// HTTP bind address used until the first config blob is installed.
    #[arg(long)]
    bind: Option<String>,

    /// Initial log level, overridden by the encrypted config once loaded.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl CliArgs {
    fn into_bootstrap(self) -> Bootstrap {
        Bootstrap {
            database_path: self.database_path,
            age_identity_path: self.age_identity,
            bind_addr: self.bind.unwrap_or_else(|| Bootstrap::DEFAULT_BIND_ADDR.to_string()),
            log_level: LogLevel::from_str_or_default(&self.log_level),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let bootstrap = CliArgs::parse().into_bootstrap();
    LoggingConfig::from_level(bootstrap.log_level)
        .init()
        .context("initializing logging")?;

    let db = Database::new(&bootstrap.database_path.display().to_string())
        .await
        .context("opening database")?;
    let secure_store =
        Arc::new(SecureStore::load(&bootstrap.age_identity_path, db.clone()).context("loading age identity")?);
    let config = Arc::new(
        ConfigProvider::load(&secure_store)
            .await
            .context("loading application config")?,
    );

    let mailer: Arc<dyn Mailer> = match &config.get().smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp).context("building SMTP mailer")?),
        None => Arc::new(NoopMailer),
    };
    let notifier: Arc<dyn Notify> = match &config.get().notifier.discord_webhook_url {
        Some(webhook_url) => Arc::new(MultiNotifier::new(vec![Box::new(DiscordNotifier::new(
            webhook_url.clone(),
        ))])),
        None => Arc::new(NilNotifier),
    };

    let state = AppState {
        db: db.clone(),
        config: Arc::clone(&config),
        secure_store: Arc::clone(&secure_store),
        mailer: Arc::clone(&mailer),
        notifier,
        block_list: Arc::new(BlockList::new()),
        metrics: Arc::new(Metrics::new()),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(db, Arc::clone(&config), mailer);
    let scheduler_task = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    let bind_addr = config.get().bind_addr.clone();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(bind_addr = %bind_addr, "auth-backend-server listening");

    let router = auth_backend::app::build(state)
        .into_make_service_with_connect_info::<std::net::SocketAddr>();

    let reload_store = Arc::clone(&secure_store);
    let reload_config = Arc::clone(&config);
    tokio::spawn(async move { watch_for_reload(reload_config, reload_store).await });

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    let _ = shutdown_tx.send(true);
    if let Err(err) = scheduler_task.await {
        error!(error = %err, "scheduler task panicked");
    }
    Ok(())
}

/// Waits for SIGHUP and reloads the active configuration from the latest
/// encrypted blob (spec §4.8 "hot reload"). Runs until the process exits.
async fn watch_for_reload(config: Arc<ConfigProvider>, store: Arc<SecureStore>) {
    #[cfg(unix)]
    {
        let Ok(mut sighup) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
        else {
            return;
        };
        loop {
            sighup.recv().await;
            info!("received SIGHUP, reloading configuration");
            if let Err(err) = config.reload(&store).await {
                error!(error = %err, "configuration reload failed, keeping previous config");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (config, store);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            sig.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
