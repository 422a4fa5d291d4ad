//! Leaderboard publisher
//!
//! Reconciles the rendered leaderboard against the single live message in
//! the leaderboard channel. All fetch-or-create recovery lives here, in
//! one state machine over the stored message reference:
//!
//! ```text
//! publish()
//!     ├─ no reference        → send new message, store id, persist
//!     └─ reference stored    → fetch message
//!           ├─ found         → edit in place
//!           └─ not found     → best-effort delete, clear id, send new
//! ```
//!
//! Callers treat every error as transient: log it and let the next
//! activity event or timer retry. `publish` is only ever invoked from
//! the ingestion task, which serializes the fetch/edit/create sequence
//! relative to itself.

use {
    crate::chat::{ChatClient, ChatError, MessagePayload},
    crate::persistence::{save_snapshot, Snapshot},
    crate::render,
    crate::state::{current_timestamp, TrackerState},
    chrono::Utc,
    std::sync::Arc,
    tokio::sync::RwLock,
};

/// Make the live leaderboard message match current state.
pub async fn publish(
    state: &Arc<RwLock<TrackerState>>,
    client: &dyn ChatClient,
    channel_id: &str,
    snapshot_path: &str,
) -> Result<(), ChatError> {
    // Render under the read lock, release before any network call
    let (payload, existing_id) = {
        let state = state.read().await;
        let now = current_timestamp();
        let payload = render::render(state.points(), state.active_celebration(now), Utc::now());
        (payload, state.leaderboard_message_id().map(str::to_string))
    };

    if let Some(id) = existing_id {
        match client.fetch_message(channel_id, &id).await {
            Ok(_) => match client.edit_message(channel_id, &id, &payload).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_not_found() => {
                    // Deleted between fetch and edit; fall through to recreate
                    log::info!("Leaderboard message {} vanished during edit", id);
                }
                Err(e) => return Err(e),
            },
            Err(e) if e.is_not_found() => {
                log::info!("Leaderboard message not found, creating new one...");
            }
            Err(e) => return Err(e),
        }

        // Stale reference: clear the old message best-effort, then drop
        // the id so exactly one create path runs below
        let _ = client.delete_message(channel_id, &id).await;
        state.write().await.set_leaderboard_message_id(None);
    }

    create_leaderboard(state, client, channel_id, snapshot_path, &payload).await
}

/// Create a brand new leaderboard message and persist its id
async fn create_leaderboard(
    state: &Arc<RwLock<TrackerState>>,
    client: &dyn ChatClient,
    channel_id: &str,
    snapshot_path: &str,
    payload: &MessagePayload,
) -> Result<(), ChatError> {
    let sent = client.send_message(channel_id, payload).await?;

    let snapshot = {
        let mut state = state.write().await;
        state.set_leaderboard_message_id(Some(sent.id.clone()));
        Snapshot::of(&state)
    };

    // Reference changed; persist immediately so a restart finds the new id
    if let Err(e) = save_snapshot(&snapshot, snapshot_path) {
        log::warn!("Failed to persist leaderboard reference: {}", e);
    }

    log::info!("📌 Created leaderboard message: {}", sent.id);
    Ok(())
}
