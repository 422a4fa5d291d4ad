//! Web surface: health check + leaderboard view
//!
//! Read-only mirror of the same state the chat leaderboard renders.
//! Handlers take the shared state and never mutate it.

use {
    crate::render::{self, RankedEntry, LEADERBOARD_TITLE},
    crate::state::{current_timestamp, TrackerState},
    axum::{extract::State, response::Json, routing::get, Router},
    serde::Serialize,
    std::sync::Arc,
    tokio::sync::RwLock,
};

pub type SharedState = Arc<RwLock<TrackerState>>;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub bot: &'static str,
    pub uptime: i64,
}

/// GET /
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let state = state.read().await;
    Json(HealthResponse {
        status: "healthy",
        bot: "Moderator Activity Tracker",
        uptime: state.uptime_secs(),
    })
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub title: &'static str,
    pub entries: Vec<RankedEntry>,
    pub celebration: Option<String>,
}

/// GET /leaderboard
async fn leaderboard(State(state): State<SharedState>) -> Json<LeaderboardResponse> {
    let state = state.read().await;
    let now = current_timestamp();
    Json(LeaderboardResponse {
        title: LEADERBOARD_TITLE,
        entries: render::ranked(state.points()),
        celebration: state.active_celebration(now).map(|c| c.text.clone()),
    })
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/leaderboard", get(leaderboard))
        .with_state(state)
}

/// Serve until the process exits
pub async fn serve(state: SharedState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("🌐 Web server running on port {}", port);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_liveness() {
        let state = Arc::new(RwLock::new(TrackerState::new()));
        let response = health(State(state)).await;
        assert_eq!(response.0.status, "healthy");
        assert_eq!(response.0.bot, "Moderator Activity Tracker");
        assert!(response.0.uptime >= 0);
    }

    #[tokio::test]
    async fn leaderboard_view_mirrors_state() {
        let state = Arc::new(RwLock::new(TrackerState::new()));
        {
            let mut state = state.write().await;
            state.record_activity("a");
            state.record_activity("a");
            state.record_activity("b");
            state.raise_celebration("hit 100".to_string(), current_timestamp());
        }

        let response = leaderboard(State(state)).await;
        assert_eq!(response.0.entries.len(), 2);
        assert_eq!(response.0.entries[0].user_id, "a");
        assert_eq!(response.0.entries[0].points, 2);
        assert_eq!(response.0.celebration.as_deref(), Some("hit 100"));
    }
}
