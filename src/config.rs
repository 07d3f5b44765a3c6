pub struct Config {
    pub discord_token: String,
    pub toxicity_api_url: String,
    pub toxicity_threshold: f64,
    pub state_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            discord_token: std::env::var("DISCORD_TOKEN")
                .expect("DISCORD_TOKEN environment variable is required"),
            toxicity_api_url: std::env::var("TOXICITY_API_URL").unwrap_or_else(|_| {
                "https://duchaba-friendly-text-moderation.hf.space".to_string()
            }),
            toxicity_threshold: std::env::var("TOXICITY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.5),
            state_path: std::env::var("TOXGUARD_STATE_PATH")
                .unwrap_or_else(|_| "analyzing_channels.json".to_string()),
        }
    }
}
