//! Shared integration-test scaffolding: builds a real [`AppState`] over a
//! tempfile-backed SQLite database and a throwaway age identity, so tests
//! drive the actual router instead of mocked collaborators.

use std::sync::Arc;

pub mod http;

use age::secrecy::ExposeSecret;
use auth_backend::config::provider::{AuthConfig, Config, CooldownConfig, NotifierConfig};
use auth_backend::config::ConfigProvider;
use auth_backend::crypto::SecureStore;
use auth_backend::database::Database;
use auth_backend::mailer::{Mailer, NoopMailer};
use auth_backend::middleware::{BlockList, Metrics};
use auth_backend::notifier::{NilNotifier, Notify};
use auth_backend::state::AppState;

/// Builds an isolated [`AppState`] backed by a fresh tempfile database and
/// age identity. The returned [`tempfile::TempDir`] must be kept alive for
/// the lifetime of the test (dropping it deletes the backing files).
pub async fn build_state() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("test.sqlite3");
    let identity_path = dir.path().join("identity.txt");

    let identity = age::x25519::Identity::generate();
    let identity_line = identity.to_string().expose_secret().to_string();
    std::fs::write(&identity_path, identity_line).expect("write identity");

    let db = Database::new(&db_path.display().to_string())
        .await
        .expect("open database");
    let secure_store = SecureStore::load(&identity_path, db.clone()).expect("load secure store");
    let config = ConfigProvider::from_config(test_config());

    let mailer: Arc<dyn Mailer> = Arc::new(NoopMailer);
    let notifier: Arc<dyn Notify> = Arc::new(NilNotifier);

    let state = AppState {
        db,
        config: Arc::new(config),
        secure_store: Arc::new(secure_store),
        mailer,
        notifier,
        block_list: Arc::new(BlockList::new()),
        metrics: Arc::new(Metrics::new()),
    };
    (state, dir)
}

fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        auth: AuthConfig {
            session_secret: "s".repeat(32),
            verification_email_secret: "v".repeat(32),
            password_reset_secret: "p".repeat(32),
            email_change_secret: "e".repeat(32),
            session_ttl_secs: 3600,
            email_verification_ttl_secs: 3600,
            password_reset_ttl_secs: 3600,
            email_change_ttl_secs: 3600,
        },
        cooldowns: CooldownConfig {
            email_verification_secs: 300,
            password_reset_secs: 300,
            email_change_secs: 300,
        },
        smtp: None,
        oauth2_providers: vec![],
        notifier: NotifierConfig::default(),
    }
}
