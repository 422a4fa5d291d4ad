//! Leaderboard rendering
//!
//! Pure functions from point store + celebration overlay to a display
//! payload. Nothing here touches the chat channel; the publisher decides
//! what to do with the rendered output, and the web view reuses the same
//! ranking.

use {
    crate::chat::{Embed, EmbedField, MessagePayload},
    crate::state::Celebration,
    chrono::{DateTime, Utc},
    indexmap::IndexMap,
    serde::Serialize,
};

pub const LEADERBOARD_TITLE: &str = "Moderator Activity Leaderboard";
const LEADERBOARD_COLOR: u32 = 0x0099ff;
const LEADERBOARD_DESCRIPTION: &str = "Points are awarded for each message sent in the server";

/// One row of the ranked leaderboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub user_id: String,
    pub points: u64,
}

/// Rank entries by points descending.
///
/// The sort is stable over the insertion-ordered point map, so equal
/// totals keep first-activity order. This is the only tiebreak rule;
/// no secondary key.
pub fn ranked(points: &IndexMap<String, u64>) -> Vec<RankedEntry> {
    let mut entries: Vec<(&String, u64)> = points.iter().map(|(id, &p)| (id, p)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    entries
        .into_iter()
        .enumerate()
        .map(|(i, (user_id, points))| RankedEntry {
            rank: i + 1,
            user_id: user_id.clone(),
            points,
        })
        .collect()
}

/// Build the leaderboard display payload.
///
/// `rendered_at` is passed in rather than sampled so identical inputs
/// produce identical output.
pub fn render(
    points: &IndexMap<String, u64>,
    celebration: Option<&Celebration>,
    rendered_at: DateTime<Utc>,
) -> MessagePayload {
    let mut embed = Embed {
        title: Some(LEADERBOARD_TITLE.to_string()),
        description: Some(LEADERBOARD_DESCRIPTION.to_string()),
        color: Some(LEADERBOARD_COLOR),
        fields: Vec::new(),
        timestamp: Some(rendered_at.to_rfc3339()),
    };

    if let Some(celebration) = celebration {
        embed.fields.push(EmbedField::new(
            "🎉 Milestone Reached! 🎉",
            celebration.text.clone(),
            false,
        ));
    }

    let entries = ranked(points);
    if entries.is_empty() {
        embed.fields.push(EmbedField::new(
            "No activity yet",
            "Moderators will appear here once they start chatting!",
            false,
        ));
    } else {
        let lines: Vec<String> = entries
            .iter()
            .map(|e| format!("{}. <@{}> - {} points", e.rank, e.user_id, e.points))
            .collect();
        embed
            .fields
            .push(EmbedField::new("Top Moderators", lines.join("\n"), false));
    }

    MessagePayload::embed(embed)
}
