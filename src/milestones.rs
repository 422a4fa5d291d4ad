//! Milestone detection and celebration text
//!
//! Pure functions over point transitions. The detector reports every
//! threshold a transition crosses; callers celebrate only the highest
//! one, so a manual multi-point grant fires a single celebration.

/// Point thresholds that trigger a celebration, ascending
pub const MILESTONES: [u64; 8] = [100, 250, 500, 1000, 1500, 2000, 3000, 5000];

/// Crossing a milestone at or above this value also requests the reward
/// role grant
pub const REWARD_THRESHOLD: u64 = 1000;

/// Boundary between the "epic" and "legendary" celebration tiers
const LEGENDARY_THRESHOLD: u64 = 5000;

/// Every milestone crossed by the transition `old -> new`, ascending.
///
/// A threshold `t` is crossed when `old < t <= new`. Increments are
/// normally +1 so at most one threshold fires, but larger jumps return
/// all of them.
pub fn crossed(old: u64, new: u64) -> Vec<u64> {
    MILESTONES
        .iter()
        .copied()
        .filter(|&m| old < m && new >= m)
        .collect()
}

/// Tiered celebration text for a user hitting a milestone.
///
/// `user_id` is embedded as a chat mention so the rendered leaderboard
/// pings the moderator being celebrated.
pub fn celebration_text(user_id: &str, milestone: u64) -> String {
    if milestone >= LEGENDARY_THRESHOLD {
        format!("🎊 **LEGENDARY!** <@{user_id}> has reached **{milestone} points**! 🏆")
    } else if milestone >= REWARD_THRESHOLD {
        format!("🎉 **EPIC!** <@{user_id}> just hit **{milestone} points**! ✨")
    } else {
        format!("🌟 **Congratulations!** <@{user_id}> reached **{milestone} points**!")
    }
}
