mod auth;
mod config;
mod error;
mod http;
mod state;

use adapter::account::{AccountOptions, AccountService, ModPostScraper};
use adapter::legacy::run_periodic_hydration;
use adapter::{build_legacy_client, LegacyConfig, ModService};
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use storage::{Db, DiskStorageProvider};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Settings;
use http::router::build_router;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let settings = Settings::new().context("Failed to load configuration")?;

    // RUST_LOG 优先，否则用配置里的 log.level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db = Db::new(&settings.database.url).await?;
    let storage = Arc::new(DiskStorageProvider::new(&settings.storage.base_path));

    let legacy_config = LegacyConfig {
        base_address: settings.legacy.base_address.clone(),
        timeout: Duration::from_secs(settings.legacy.timeout_secs),
        hydration_concurrency: settings.legacy.hydration_concurrency,
    };
    let (legacy, transport) =
        build_legacy_client(&legacy_config, Arc::new(db.clone()), storage.clone())
            .context("Failed to build legacy API client")?;

    let options = AccountOptions {
        link_token_expiration_minutes: settings.account.link_token_expiration_minutes,
        link_token_mod_post_url: settings.account.link_token_mod_post_url.clone(),
        session_lifetime_days: settings.account.session_lifetime_days,
    };
    let scraper = Arc::new(ModPostScraper::new(
        transport,
        options.link_token_mod_post_url.clone(),
    ));
    let accounts = Arc::new(AccountService::new(
        db.clone(),
        scraper,
        legacy.clone(),
        options,
    ));

    let cancel_token = CancellationToken::new();
    let hydration = if settings.legacy.enabled && settings.legacy.enable_periodic_mod_fetch {
        let every = Duration::from_secs(settings.legacy.hydration_interval_secs.max(1));
        info!(every_secs = every.as_secs(), "Starting periodic mod details fetch");
        Some(tokio::spawn(run_periodic_hydration(
            legacy.clone(),
            every,
            cancel_token.clone(),
        )))
    } else {
        None
    };

    let state = AppState {
        mods: ModService::new(db.clone(), storage),
        db,
        legacy,
        accounts,
        legacy_enabled: settings.legacy.enabled,
        secure_cookies: settings.server.secure_cookies,
    };

    let app = build_router(state, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!(legacy = settings.legacy.enabled, "Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel_token.cancel();
    if let Some(task) = hydration {
        if let Err(e) = task.await {
            warn!(error = %e, "hydration task ended abnormally");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
