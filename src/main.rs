mod status;

pub mod chat;
pub mod commands;
pub mod config;
pub mod discord;
pub mod gateway;
pub mod ingestion;
pub mod milestones;
pub mod persistence;
pub mod publisher;
pub mod render;
pub mod state;
pub mod web;

use {
    chat::ChatClient,
    config::Config,
    discord::DiscordRestClient,
    gateway::GatewayCommand,
    state::{StateMessage, TrackerState},
    std::{sync::Arc, time::Duration},
    tokio::sync::{mpsc, RwLock},
};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    // Initialize logger; default to info unless RUST_LOG overrides
    let mut builder = if config.rust_log.is_some() {
        env_logger::Builder::from_default_env()
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
    };
    builder.init();

    // NOTE: Workaround for rustls issue
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("Can't set crypto provider to aws_lc_rs");

    log::info!("🚀 Starting Moderator Activity Tracker...");
    log::info!("📊 Configuration:");
    log::info!("   Leaderboard channel: {}", config.leaderboard_channel_id);
    log::info!("   Moderator role: {}", config.moderator_role);
    log::info!("   Reward role: {}", config.reward_role);
    log::info!("   Snapshot file: {}", config.data_file_path);
    log::info!("   HTTP port: {}", config.http_port);

    // Restore durable state; a missing or corrupt snapshot starts empty
    let snapshot = persistence::load_snapshot(&config.data_file_path);
    let state = Arc::new(RwLock::new(TrackerState::restore(
        snapshot.points_by_user,
        snapshot.leaderboard_message_id,
    )));

    let client: Arc<dyn ChatClient> = Arc::new(DiscordRestClient::new(config.bot_token.clone())?);

    // Single mutation queue feeding the ingestion task
    let (tx, rx) = mpsc::channel::<StateMessage>(1000);
    let (gateway_tx, gateway_rx) = mpsc::channel::<GatewayCommand>(16);

    // Ingestion task: the sole mutator of tracker state
    let ingestion_config = ingestion::IngestionConfig {
        leaderboard_channel_id: config.leaderboard_channel_id.clone(),
        moderator_role: config.moderator_role.clone(),
        reward_role: config.reward_role.clone(),
        snapshot_path: config.data_file_path.clone(),
    };
    let ingestion_handle = tokio::spawn(ingestion::run_ingestion(
        rx,
        tx.clone(),
        state.clone(),
        client.clone(),
        ingestion_config,
    ));

    // Startup recovery: reconcile the leaderboard message against the
    // restored reference before any activity arrives
    if tx.send(StateMessage::RefreshLeaderboard).await.is_err() {
        log::error!("❌ Ingestion queue closed at startup");
    }

    // Autosave task (ingestion also saves on every mutation)
    let state_for_persistence = state.clone();
    let persistence_config = persistence::PersistenceConfig {
        file_path: config.data_file_path.clone(),
        ..Default::default()
    };
    tokio::spawn(async move {
        persistence::persistence_task(state_for_persistence, persistence_config).await;
    });

    // Presence status refresh (cosmetic)
    tokio::spawn(status::status_task(state.clone(), gateway_tx.clone()));

    // Health check + leaderboard web view
    let web_state = state.clone();
    let http_port = config.http_port;
    tokio::spawn(async move {
        if let Err(e) = web::serve(web_state, http_port).await {
            log::error!("❌ Web server error: {}", e);
        }
    });

    // Gateway feed: delivers message events into the mutation queue
    let gateway_handle = tokio::spawn(gateway::run_gateway(
        config.bot_token.clone(),
        tx.clone(),
        gateway_rx,
    ));

    log::info!("✅ All background tasks running");
    log::info!("🔄 Press CTRL+C to shutdown gracefully");

    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("⚠️  Received CTRL+C, shutting down..."),
        Err(e) => log::error!("❌ Failed to listen for CTRL+C: {}", e),
    }

    // Stop the feed first, then let ingestion drain and flush its final
    // snapshot before the process exits
    gateway_handle.abort();
    let _ = tx.send(StateMessage::Shutdown).await;
    drop(tx);
    let _ = tokio::time::timeout(Duration::from_secs(5), ingestion_handle).await;

    log::info!("✅ Shutdown complete");
    Ok(())
}
