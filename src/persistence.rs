use {
    crate::state::TrackerState,
    indexmap::IndexMap,
    serde::{Deserialize, Serialize},
    std::{fs, path::Path, time::Duration},
    tokio::time::interval,
};

/// Persistence configuration
pub struct PersistenceConfig {
    pub file_path: String,
    pub autosave_interval: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            file_path: "moderatorData.json".to_string(),
            autosave_interval: Duration::from_secs(60),
        }
    }
}

/// Durable record: the full point mapping plus the reference to the live
/// leaderboard message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub points_by_user: IndexMap<String, u64>,
    pub leaderboard_message_id: Option<String>,
}

impl Snapshot {
    pub fn of(state: &TrackerState) -> Self {
        Self {
            points_by_user: state.points().clone(),
            leaderboard_message_id: state.leaderboard_message_id().map(str::to_string),
        }
    }
}

/// Save a snapshot to JSON.
///
/// Writes to a sibling temp file and renames over the target so a kill
/// mid-write never leaves a truncated snapshot behind.
pub fn save_snapshot(snapshot: &Snapshot, file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;
    let tmp_path = format!("{file_path}.tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, file_path)?;

    log::debug!(
        "Saved {} moderators to {}",
        snapshot.points_by_user.len(),
        file_path
    );
    Ok(())
}

/// Load the snapshot from JSON.
///
/// A missing or unreadable file yields the empty default: the process
/// must come up with a fresh store rather than refuse to start.
pub fn load_snapshot(file_path: &str) -> Snapshot {
    if !Path::new(file_path).exists() {
        log::info!("No existing snapshot file found: {}", file_path);
        return Snapshot::default();
    }

    let json = match fs::read_to_string(file_path) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("Failed to read snapshot {}: {}", file_path, e);
            return Snapshot::default();
        }
    };

    match serde_json::from_str::<Snapshot>(&json) {
        Ok(snapshot) => {
            log::info!(
                "Loaded {} moderators from {}",
                snapshot.points_by_user.len(),
                file_path
            );
            snapshot
        }
        Err(e) => {
            log::warn!("Corrupt snapshot {}: {} (starting empty)", file_path, e);
            Snapshot::default()
        }
    }
}

/// Background task that periodically saves a state snapshot.
///
/// The ingestion pipeline also saves after every mutation; this timer
/// covers long quiet periods and any save that failed in-line.
pub async fn persistence_task(
    state: std::sync::Arc<tokio::sync::RwLock<TrackerState>>,
    config: PersistenceConfig,
) {
    let mut interval_timer = interval(config.autosave_interval);

    loop {
        interval_timer.tick().await;

        let snapshot = {
            let state = state.read().await;
            Snapshot::of(&state)
        };

        if let Err(e) = save_snapshot(&snapshot, &config.file_path) {
            log::warn!("Failed to save snapshot: {}", e);
        }
    }
}
