//! Activity ingestion - the single mutation queue
//!
//! Every state change in the process flows through one task: inbound
//! chat messages, celebration expiries, and leaderboard refresh requests
//! arrive on one channel and are processed to completion (including
//! their awaited chat I/O) before the next message is taken. That gives
//! the no-overlap guarantee the publisher relies on without any lock
//! hierarchy.
//!
//! Per qualifying message the pipeline runs, in order:
//! 1. moderator-role gate (collaborator lookup)
//! 2. point increment
//! 3. durable save
//! 4. milestone detection → celebration + reward request
//! 5. leaderboard publish
//!
//! Steps 3-5 are independently fault-tolerant: a failed save or publish
//! is logged and retried by the natural cadence of later events, and a
//! failed reward grant never blocks the publish.

use {
    crate::chat::ChatClient,
    crate::commands,
    crate::milestones,
    crate::persistence::{save_snapshot, Snapshot},
    crate::publisher,
    crate::state::{
        current_timestamp, MessageEvent, StateMessage, TrackerState, CELEBRATION_TTL_SECS,
    },
    std::sync::Arc,
    std::time::Duration,
    tokio::sync::{mpsc, RwLock},
};

/// Ingestion pipeline configuration
#[derive(Clone)]
pub struct IngestionConfig {
    pub leaderboard_channel_id: String,
    pub moderator_role: String,
    pub reward_role: String,
    pub snapshot_path: String,
}

/// Run the ingestion loop until the channel closes or a Shutdown
/// message arrives. Always flushes a final snapshot on the way out.
pub async fn run_ingestion(
    mut rx: mpsc::Receiver<StateMessage>,
    tx: mpsc::Sender<StateMessage>,
    state: Arc<RwLock<TrackerState>>,
    client: Arc<dyn ChatClient>,
    config: IngestionConfig,
) {
    log::info!("Ingestion task started");

    while let Some(message) = rx.recv().await {
        match message {
            StateMessage::Activity(event) => {
                handle_activity(event, &tx, &state, &client, &config).await;
            }
            StateMessage::CelebrationExpired(generation) => {
                // Instance-bound: a stale expiry from a superseded
                // celebration is a no-op
                let cleared = state.write().await.clear_celebration_if(generation);
                if cleared {
                    log::info!("Celebration expired, refreshing leaderboard");
                    publish_logged(&state, &client, &config).await;
                }
            }
            StateMessage::RefreshLeaderboard => {
                publish_logged(&state, &client, &config).await;
            }
            StateMessage::Shutdown => {
                log::info!("Ingestion received shutdown signal");
                break;
            }
        }
    }

    // Final flush before exit
    let snapshot = Snapshot::of(&*state.read().await);
    if let Err(e) = save_snapshot(&snapshot, &config.snapshot_path) {
        log::error!("❌ Failed final snapshot flush: {}", e);
    }

    log::info!("✅ Ingestion task stopped");
}

async fn handle_activity(
    event: MessageEvent,
    tx: &mpsc::Sender<StateMessage>,
    state: &Arc<RwLock<TrackerState>>,
    client: &Arc<dyn ChatClient>,
    config: &IngestionConfig,
) {
    // Ignore bot messages and DMs
    if event.author_is_bot {
        return;
    }
    let Some(guild_id) = event.guild_id.clone() else {
        return;
    };

    // Commands are read-only reporting and never earn points
    if commands::is_command(&event.content) {
        commands::handle_command(&event, state, client.as_ref()).await;
        return;
    }

    // (1) Moderator gate. A failed lookup skips the event; the member
    // can earn the point on their next message.
    let member = match client.fetch_member(&guild_id, &event.author_id).await {
        Ok(member) => member,
        Err(e) => {
            log::warn!("Failed to fetch member {}: {}", event.author_id, e);
            return;
        }
    };
    if !member.has_role(&config.moderator_role) {
        return;
    }

    // (2) Record the point
    let (old_points, new_points) = state.write().await.record_activity(&event.author_id);
    log::debug!(
        "Points for {}: {} -> {}",
        event.author_id,
        old_points,
        new_points
    );

    // (3) Durable save. On failure the in-memory store stays
    // authoritative until the next successful save.
    let snapshot = Snapshot::of(&*state.read().await);
    if let Err(e) = save_snapshot(&snapshot, &config.snapshot_path) {
        log::warn!("Failed to save snapshot: {}", e);
    }

    // (4) Milestones: only the highest crossed threshold celebrates
    let reached = milestones::crossed(old_points, new_points);
    if let Some(&milestone) = reached.last() {
        log::info!(
            "🎉 {} crossed the {} point milestone",
            event.author_id,
            milestone
        );

        let text = milestones::celebration_text(&event.author_id, milestone);
        let now = current_timestamp();
        let generation = state.write().await.raise_celebration(text, now);

        // Fire-once expiry tagged with this celebration's generation;
        // it routes back through this queue rather than mutating
        // directly
        let expiry_tx = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(CELEBRATION_TTL_SECS as u64)).await;
            let _ = expiry_tx
                .send(StateMessage::CelebrationExpired(generation))
                .await;
        });

        if milestone >= milestones::REWARD_THRESHOLD {
            if let Err(e) = client
                .grant_role(&guild_id, &event.author_id, &config.reward_role)
                .await
            {
                log::error!("Could not add milestone role: {}", e);
            }
        }
    }

    // (5) Publish. A failure here never undoes steps 2-3; the next
    // event retries.
    publish_logged(state, client, config).await;
}

async fn publish_logged(
    state: &Arc<RwLock<TrackerState>>,
    client: &Arc<dyn ChatClient>,
    config: &IngestionConfig,
) {
    if let Err(e) = publisher::publish(
        state,
        client.as_ref(),
        &config.leaderboard_channel_id,
        &config.snapshot_path,
    )
    .await
    {
        log::warn!("Failed to update leaderboard: {}", e);
    }
}
