use habit_tracker::{
    AppConfig, AppState, Tracker,
    app::ROLLOVER_CHECK_INTERVAL,
    clock::SystemClock,
    load_store, persist_store,
    reminders::Notifier,
    router, spawn_rollover_watch,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::{fs, signal};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let store = load_store(&config.data_path).await;
    let mut tracker = Tracker::load(
        store,
        Arc::new(SystemClock),
        config.policy,
        config.timezone.as_deref(),
    );
    persist_store(&config.data_path, tracker.store_mut())
        .await
        .map_err(|err| err.message)?;

    let notifier = Notifier::new(config.reminder_endpoint.clone());
    notifier.dispatch(tracker.reminders(), tracker.zone());

    let state = AppState::new(config.data_path.clone(), tracker, notifier);
    spawn_rollover_watch(state.clone(), ROLLOVER_CHECK_INTERVAL);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(policy = ?config.policy, "listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
