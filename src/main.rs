use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use study_monitor::config::{self, Config};
use study_monitor::source::sth::SthSource;
use study_monitor::state::DashboardState;
use study_monitor::{api, poller};
use tokio::sync::watch;

fn init_tracing(config: &Config) {
    let level = config.log_level().unwrap_or(tracing::Level::INFO);
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    if config.log_level().is_none() {
        tracing::warn!(level = %config.logging.level, "Unknown log level, using info");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config::config_path();
    let config = config::load_from_path(&config_path)?;
    init_tracing(&config);
    tracing::info!(
        app = %config.app.name,
        config_path = %config_path.display(),
        "study-monitor starting"
    );

    let threshold_cm = config.absence_threshold_cm();
    let state = Arc::new(RwLock::new(DashboardState::new(threshold_cm)));

    let source = SthSource::from_config(&config.source)?;
    tracing::info!(
        url = source.url(),
        threshold_cm,
        interval_secs = config.poll_interval().as_secs(),
        "Polling STH for distance samples"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_handle = poller::spawn_poller(
        Arc::new(source),
        Arc::clone(&state),
        config.poll_interval(),
        shutdown_rx,
    );

    let app = api::router(Arc::clone(&state));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(err) = poller_handle.await {
        tracing::warn!(error = %err, "Poller task ended abnormally");
    }
    tracing::info!("study-monitor stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::config;

    #[test]
    fn default_config_is_valid_toml() -> Result<(), Box<dyn std::error::Error>> {
        let _config = config::load_default()?;
        Ok(())
    }
}
