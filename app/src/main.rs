use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use fraglight_core::presence::DiscordPresence;
use fraglight_core::{BridgeError, IngestServer, PresenceSync, ProcessWatcher, settings};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = settings::load();
    info!(addr = %config.listen_addr(), "starting fraglight");

    let client = DiscordPresence::new(&config.discord_app_id)?;
    let running = Arc::new(AtomicBool::new(false));
    let sync = Arc::new(PresenceSync::new(
        client,
        config.clone(),
        Arc::clone(&running),
    ));

    let server = IngestServer::start(&config.listen_addr(), Arc::clone(&sync)).await?;
    let watcher = ProcessWatcher::spawn(
        Arc::clone(&sync),
        running,
        config.process_names.clone(),
        Duration::from_secs(config.poll_interval_secs),
    );

    info!("running; press Ctrl-C to exit");
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed waiting for shutdown signal");
    }

    info!("shutting down");
    watcher.stop().await;
    server.stop().await;
    sync.shutdown();
    Ok(())
}
