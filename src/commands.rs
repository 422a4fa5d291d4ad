//! Read-only chat commands: `?ping`, `?uptime`, `?info`
//!
//! Commands never touch the point store. Failures are logged and
//! dropped; there is nothing to retry.

use {
    crate::chat::{ChatClient, ChatError, Embed, EmbedField, MessagePayload},
    crate::state::{MessageEvent, TrackerState},
    chrono::Utc,
    std::sync::Arc,
    tokio::sync::RwLock,
};

pub const COMMAND_PREFIX: char = '?';

pub fn is_command(content: &str) -> bool {
    content.starts_with(COMMAND_PREFIX)
}

/// Dispatch a `?`-prefixed message to its handler
pub async fn handle_command(
    event: &MessageEvent,
    state: &Arc<RwLock<TrackerState>>,
    client: &dyn ChatClient,
) {
    let trimmed = event.content[COMMAND_PREFIX.len_utf8()..].trim();
    let command = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    let result = match command.as_str() {
        "ping" => ping(event, client).await,
        "uptime" => uptime(event, state, client).await,
        "info" => info(event, state, client).await,
        _ => {
            client
                .send_message(
                    &event.channel_id,
                    &MessagePayload::text("Unknown command. Try ?ping, ?uptime, or ?info"),
                )
                .await
                .map(|_| ())
        }
    };

    if let Err(e) = result {
        log::error!("Error processing ?{} command: {}", command, e);
    }
}

async fn ping(event: &MessageEvent, client: &dyn ChatClient) -> Result<(), ChatError> {
    let sent = client
        .send_message(&event.channel_id, &MessagePayload::text("Pinging..."))
        .await?;

    let latency_ms = event.received_at.elapsed().as_millis();
    client
        .edit_message(
            &event.channel_id,
            &sent.id,
            &MessagePayload::text(format!("🏓 Pong! Bot Latency: {latency_ms}ms")),
        )
        .await
}

async fn uptime(
    event: &MessageEvent,
    state: &Arc<RwLock<TrackerState>>,
    client: &dyn ChatClient,
) -> Result<(), ChatError> {
    let (uptime_secs, started_at) = {
        let state = state.read().await;
        (state.uptime_secs(), state.started_at())
    };

    let text = format!(
        "🕒 Bot Uptime: {}\nStarted at: {}",
        format_uptime(uptime_secs),
        started_at.format("%a, %d %b %Y %H:%M:%S GMT")
    );
    client
        .send_message(&event.channel_id, &MessagePayload::text(text))
        .await
        .map(|_| ())
}

async fn info(
    event: &MessageEvent,
    state: &Arc<RwLock<TrackerState>>,
    client: &dyn ChatClient,
) -> Result<(), ChatError> {
    let (moderator_count, total_points) = {
        let state = state.read().await;
        (state.moderator_count(), state.total_points())
    };

    let embed = Embed {
        title: Some("Moderator Activity Tracker Bot".to_string()),
        description: Some(
            "A bot that tracks moderator activity and displays a leaderboard".to_string(),
        ),
        color: Some(0x0099ff),
        fields: vec![
            EmbedField::new("Version", env!("CARGO_PKG_VERSION"), true),
            EmbedField::new("Commands", "?ping, ?uptime, ?info", false),
            EmbedField::new("Total Moderators Tracked", moderator_count.to_string(), true),
            EmbedField::new("Total Points Awarded", total_points.to_string(), true),
        ],
        timestamp: Some(Utc::now().to_rfc3339()),
    };

    client
        .send_message(&event.channel_id, &MessagePayload::embed(embed))
        .await
        .map(|_| ())
}

/// Format seconds of uptime as `Xd Xh Xm Xs`
pub fn format_uptime(total_secs: i64) -> String {
    let secs = total_secs.max(0);
    let days = secs / (3600 * 24);
    let hours = (secs % (3600 * 24)) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{days}d {hours}h {minutes}m {seconds}s")
}
