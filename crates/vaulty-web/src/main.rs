//! Vaulty web server.

use std::net::TcpListener;

use anyhow::Context;
use tracing::{info, warn};
use vaulty_core::Database;
use vaulty_web::{AppState, Config, run, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = Config::load().context("failed to load configuration")?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db_path = config.database_path.to_string_lossy();
    let db = Database::open(&db_path)
        .await
        .with_context(|| format!("failed to open database {db_path}"))?;

    let state = AppState::from_config(&config, db).context("invalid configuration")?;
    if config.admin.password.is_none() {
        warn!("VAULTY_WEB_ADMIN_PASS is not set; the admin console is locked");
    }
    if config.mail.host.is_none() {
        info!("VAULTY_WEB_MAIL_HOST is not set; confirmation mail will only be logged");
    }

    let listener = TcpListener::bind(config.bind_address())
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    info!(
        address = %listener.local_addr()?,
        production = config.is_prod,
        dropbox = state.dropbox.is_some(),
        "Starting Vaulty web"
    );

    run(listener, state)?.await?;
    Ok(())
}
