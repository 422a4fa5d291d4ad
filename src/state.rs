use {
    chrono::{DateTime, Utc},
    indexmap::IndexMap,
    std::time::{Instant, SystemTime, UNIX_EPOCH},
};

/// One hour, in seconds. Celebrations live this long on the leaderboard.
pub const CELEBRATION_TTL_SECS: i64 = 60 * 60;

/// Inbound chat message event, as delivered by the gateway feed
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub author_id: String,
    pub author_is_bot: bool,
    /// None for direct messages (which never earn points)
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub content: String,
    /// Local receive time, used for command latency measurement
    pub received_at: Instant,
}

/// Message sent through the channel into the single mutation task
#[derive(Debug, Clone)]
pub enum StateMessage {
    /// A chat message arrived; may earn a point or carry a command
    Activity(MessageEvent),
    /// The expiry timer for the celebration with this generation fired
    CelebrationExpired(u64),
    /// Re-run the publisher against current state (startup recovery)
    RefreshLeaderboard,
    Shutdown,
}

/// Active celebration overlay shown atop the leaderboard
#[derive(Debug, Clone)]
pub struct Celebration {
    pub text: String,
    pub expires_at: i64,
    /// Instance tag: an expiry only clears the celebration it was raised for
    pub generation: u64,
}

/// Single owned aggregate for everything the ingestion task mutates:
/// the point store, the celebration overlay, and the reference to the
/// live leaderboard message.
///
/// Points are insertion-ordered: a moderator's slot is created on their
/// first qualifying message and never removed, and equal totals rank in
/// first-activity order when the leaderboard is rendered.
pub struct TrackerState {
    points: IndexMap<String, u64>,
    celebration: Option<Celebration>,
    leaderboard_message_id: Option<String>,
    celebration_seq: u64,
    started_at: DateTime<Utc>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self {
            points: IndexMap::new(),
            celebration: None,
            leaderboard_message_id: None,
            celebration_seq: 0,
            started_at: Utc::now(),
        }
    }

    /// Restore point totals and the leaderboard reference from a snapshot
    pub fn restore(points: IndexMap<String, u64>, leaderboard_message_id: Option<String>) -> Self {
        Self {
            points,
            celebration: None,
            leaderboard_message_id,
            celebration_seq: 0,
            started_at: Utc::now(),
        }
    }

    /// Record one qualifying activity event for a user.
    ///
    /// Increments the user's total by exactly 1, creating the entry at 0
    /// first if absent. Returns (old_total, new_total) so the caller can
    /// run milestone detection on the transition.
    pub fn record_activity(&mut self, user_id: &str) -> (u64, u64) {
        let entry = self.points.entry(user_id.to_string()).or_insert(0);
        let old = *entry;
        *entry += 1;
        (old, *entry)
    }

    pub fn points(&self) -> &IndexMap<String, u64> {
        &self.points
    }

    pub fn moderator_count(&self) -> usize {
        self.points.len()
    }

    pub fn total_points(&self) -> u64 {
        self.points.values().sum()
    }

    /// Raise a celebration, superseding any current one.
    ///
    /// Returns the generation tag the caller should hand to the expiry
    /// timer; an expiry for an older generation is a no-op.
    pub fn raise_celebration(&mut self, text: String, now: i64) -> u64 {
        self.celebration_seq += 1;
        let generation = self.celebration_seq;
        self.celebration = Some(Celebration {
            text,
            expires_at: now + CELEBRATION_TTL_SECS,
            generation,
        });
        generation
    }

    /// Clear the celebration only if it is still the one the given
    /// generation was raised for. Returns true if anything changed.
    pub fn clear_celebration_if(&mut self, generation: u64) -> bool {
        match &self.celebration {
            Some(c) if c.generation == generation => {
                self.celebration = None;
                true
            }
            _ => false,
        }
    }

    /// Celebration if one is live at `now` (lazy expiry check)
    pub fn active_celebration(&self, now: i64) -> Option<&Celebration> {
        self.celebration.as_ref().filter(|c| c.expires_at > now)
    }

    pub fn leaderboard_message_id(&self) -> Option<&str> {
        self.leaderboard_message_id.as_deref()
    }

    pub fn set_leaderboard_message_id(&mut self, id: Option<String>) {
        self.leaderboard_message_id = id;
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to get current Unix timestamp
pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}
