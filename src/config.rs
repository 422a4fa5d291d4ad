use std::env;

/// Configuration loaded from environment variables
pub struct Config {
    pub bot_token: String,
    pub leaderboard_channel_id: String,
    pub moderator_role: String,
    pub reward_role: String,
    pub data_file_path: String,
    pub http_port: u16,
    pub rust_log: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// DISCORD_BOT_TOKEN and LEADERBOARD_CHANNEL_ID are required; a
    /// missing value is fatal at startup. Everything else has defaults.
    pub fn from_env() -> Self {
        let bot_token = env::var("DISCORD_BOT_TOKEN")
            .expect("DISCORD_BOT_TOKEN must be set in .env file");

        let leaderboard_channel_id = env::var("LEADERBOARD_CHANNEL_ID")
            .expect("LEADERBOARD_CHANNEL_ID must be set in .env file");

        let moderator_role =
            env::var("MODERATOR_ROLE").unwrap_or_else(|_| "Moderators".to_string());

        let reward_role =
            env::var("REWARD_ROLE").unwrap_or_else(|_| "👑 Mod Of The Month".to_string());

        let data_file_path =
            env::var("DATA_FILE_PATH").unwrap_or_else(|_| "moderatorData.json".to_string());

        let http_port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let rust_log = env::var("RUST_LOG").ok();

        Self {
            bot_token,
            leaderboard_channel_id,
            moderator_role,
            reward_role,
            data_file_path,
            http_port,
            rust_log,
        }
    }
}
