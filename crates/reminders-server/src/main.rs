mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use reminders_api::auth::AppStateInner;
use reminders_api::due_scan;
use reminders_api::notifier::{LogNotifier, Notifier, WebhookNotifier};
use reminders_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reminders=debug,reminders_api=debug,reminders_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let config = Config::from_env()?;

    // Init database (migrations run once here)
    let db = Arc::new(Database::open(&config.db_path)?);

    let state = AppStateInner::new(db, config.jwt_secret.clone(), config.token_ttl_days);

    // Background due-scan
    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => {
            info!("Notifications go to webhook {}", url);
            Arc::new(WebhookNotifier::new(url.clone())?)
        }
        None => {
            info!("No webhook configured; notifications are logged only");
            Arc::new(LogNotifier)
        }
    };
    info!(
        "Due-scan every {}s, policy {:?}",
        config.scan_interval_secs, config.dispatch_policy
    );
    tokio::spawn(due_scan::run_due_scan_loop(
        state.store.clone(),
        notifier,
        config.dispatch_policy,
        config.scan_interval_secs,
    ));

    let app = reminders_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address().parse()?;
    info!("Reminders server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("Could not install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
