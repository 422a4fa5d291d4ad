//! Presence status refresh
//!
//! Cosmetic: every five minutes pick one of a few summary lines and
//! push it through the gateway as the bot's activity text. The first
//! tick fires immediately so the bot comes up with a status set.

use {
    crate::gateway::GatewayCommand,
    crate::state::TrackerState,
    rand::seq::SliceRandom,
    std::sync::Arc,
    tokio::sync::{mpsc, RwLock},
    tokio::time::{interval, Duration},
};

const REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub async fn status_task(
    state: Arc<RwLock<TrackerState>>,
    gateway_tx: mpsc::Sender<GatewayCommand>,
) {
    let mut timer = interval(REFRESH_INTERVAL);

    loop {
        timer.tick().await;

        let (moderator_count, total_points) = {
            let state = state.read().await;
            (state.moderator_count(), state.total_points())
        };

        let status_messages = [
            format!("Tracking {} moderators", moderator_count),
            format!("{} total points", total_points),
            "Leaderboard updates".to_string(),
        ];
        let status = status_messages
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default();

        if gateway_tx
            .send(GatewayCommand::UpdatePresence(status.clone()))
            .await
            .is_err()
        {
            // Gateway gone; process is shutting down
            break;
        }
        log::debug!("Status refreshed: {}", status);
    }
}
