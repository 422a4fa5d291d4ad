//! Discord gateway feed
//!
//! Minimal gateway client: identify, heartbeat, and MESSAGE_CREATE
//! dispatch into the ingestion queue. This is transport plumbing only -
//! the engine never sees the gateway, just `StateMessage::Activity`
//! values on its channel. Presence updates ride the same connection
//! because Discord only accepts them over the gateway.

use {
    crate::state::{MessageEvent, StateMessage},
    futures_util::{SinkExt, StreamExt},
    serde_json::{json, Value},
    std::time::Instant,
    tokio::sync::mpsc,
    tokio::time::{interval, Duration},
    tokio_tungstenite::{connect_async, tungstenite::Message},
};

const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// GUILDS | GUILD_MESSAGES | MESSAGE_CONTENT
const INTENTS: u64 = (1 << 0) | (1 << 9) | (1 << 15);

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Commands other tasks can push through the live gateway connection
#[derive(Debug, Clone)]
pub enum GatewayCommand {
    UpdatePresence(String),
}

#[derive(Debug, serde::Deserialize)]
struct GatewayPayload {
    op: u8,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
    #[serde(default)]
    d: Value,
}

/// Run the gateway feed until the process shuts down, reconnecting on
/// any session error.
pub async fn run_gateway(
    token: String,
    tx: mpsc::Sender<StateMessage>,
    mut commands: mpsc::Receiver<GatewayCommand>,
) {
    loop {
        log::info!("🔌 Connecting to gateway: {}", GATEWAY_URL);
        match run_session(&token, &tx, &mut commands).await {
            Ok(()) => log::warn!("Gateway session ended, reconnecting..."),
            Err(e) => log::warn!("Gateway session error: {} (reconnecting)", e),
        }

        if tx.is_closed() {
            // Ingestion is gone; the process is shutting down
            break;
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

async fn run_session(
    token: &str,
    tx: &mpsc::Sender<StateMessage>,
    commands: &mut mpsc::Receiver<GatewayCommand>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (ws_stream, _) = connect_async(GATEWAY_URL).await?;
    let (mut write, mut read) = ws_stream.split();

    // First frame must be Hello with our heartbeat interval
    let hello = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => break serde_json::from_str::<GatewayPayload>(&text)?,
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
            None => return Err("gateway closed before hello".into()),
        }
    };
    if hello.op != 10 {
        return Err(format!("expected hello, got op {}", hello.op).into());
    }
    let heartbeat_ms = hello.d["heartbeat_interval"]
        .as_u64()
        .ok_or("hello missing heartbeat_interval")?;

    let identify = json!({
        "op": 2,
        "d": {
            "token": token,
            "intents": INTENTS,
            "properties": { "os": "linux", "browser": "modboard", "device": "modboard" },
        }
    });
    write.send(Message::Text(identify.to_string())).await?;

    let mut heartbeat = interval(Duration::from_millis(heartbeat_ms));
    heartbeat.tick().await; // first tick is immediate; skip it
    let mut last_seq: Option<u64> = None;

    loop {
        tokio::select! {
            frame = read.next() => {
                let Some(frame) = frame else {
                    return Err("gateway connection closed".into());
                };
                match frame? {
                    Message::Text(text) => {
                        let payload: GatewayPayload = serde_json::from_str(&text)?;
                        if payload.s.is_some() {
                            last_seq = payload.s;
                        }
                        match payload.op {
                            // Dispatch
                            0 => match payload.t.as_deref() {
                                Some("READY") => {
                                    let user = payload.d["user"]["username"]
                                        .as_str()
                                        .unwrap_or("unknown");
                                    log::info!("✅ Logged in as {}", user);
                                }
                                Some("MESSAGE_CREATE") => {
                                    if let Some(event) = parse_message_create(&payload.d) {
                                        if tx.send(StateMessage::Activity(event)).await.is_err() {
                                            return Ok(()); // ingestion gone, shutting down
                                        }
                                    }
                                }
                                _ => {}
                            },
                            // Server asked for an immediate heartbeat
                            1 => {
                                let beat = json!({ "op": 1, "d": last_seq });
                                write.send(Message::Text(beat.to_string())).await?;
                            }
                            // Reconnect / invalid session: drop and redial
                            7 | 9 => return Err("gateway requested reconnect".into()),
                            // Heartbeat ACK
                            11 => {}
                            other => log::debug!("Ignoring gateway op {}", other),
                        }
                    }
                    Message::Ping(data) => write.send(Message::Pong(data)).await?,
                    Message::Close(_) => return Err("gateway sent close".into()),
                    _ => {}
                }
            }

            _ = heartbeat.tick() => {
                let beat = json!({ "op": 1, "d": last_seq });
                write.send(Message::Text(beat.to_string())).await?;
            }

            Some(command) = commands.recv() => {
                match command {
                    GatewayCommand::UpdatePresence(text) => {
                        let presence = json!({
                            "op": 3,
                            "d": {
                                "since": null,
                                "activities": [{ "name": text, "type": 3 }],
                                "status": "online",
                                "afk": false,
                            }
                        });
                        write.send(Message::Text(presence.to_string())).await?;
                    }
                }
            }
        }
    }
}

fn parse_message_create(d: &Value) -> Option<MessageEvent> {
    let author = d.get("author")?;
    Some(MessageEvent {
        author_id: author.get("id")?.as_str()?.to_string(),
        author_is_bot: author
            .get("bot")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        guild_id: d
            .get("guild_id")
            .and_then(Value::as_str)
            .map(str::to_string),
        channel_id: d.get("channel_id")?.as_str()?.to_string(),
        content: d
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        received_at: Instant::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_guild_message() {
        let d = serde_json::json!({
            "author": { "id": "111", "bot": false },
            "guild_id": "222",
            "channel_id": "333",
            "content": "hello there",
        });
        let event = parse_message_create(&d).unwrap();
        assert_eq!(event.author_id, "111");
        assert!(!event.author_is_bot);
        assert_eq!(event.guild_id.as_deref(), Some("222"));
        assert_eq!(event.channel_id, "333");
        assert_eq!(event.content, "hello there");
    }

    #[test]
    fn parses_dm_without_guild() {
        let d = serde_json::json!({
            "author": { "id": "111", "bot": true },
            "channel_id": "333",
            "content": "",
        });
        let event = parse_message_create(&d).unwrap();
        assert!(event.author_is_bot);
        assert!(event.guild_id.is_none());
    }

    #[test]
    fn rejects_malformed_dispatch() {
        let d = serde_json::json!({ "channel_id": "333" });
        assert!(parse_message_create(&d).is_none());
    }
}
