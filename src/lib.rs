pub mod commands;
pub mod config;
pub mod events;
pub mod moderation;
pub mod utils;

/// Prefix for text commands (`!analyze`, `!stop`).
pub const COMMAND_PREFIX: &str = "!";

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared data available to every command and event handler.
pub struct Data {
    pub http_client: reqwest::Client,
    pub api_url: String,
    pub threshold: f64,
    pub state: moderation::SharedState,
}
