use std::path::Path;

use poise::serenity_prelude as serenity;
use toxguard::{commands, config, events, moderation, Data};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    let loaded = moderation::registry::load(Path::new(&config.state_path));
    let state = moderation::new_state(config.state_path.clone().into(), loaded);

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let api_url = config.toxicity_api_url.clone();
    let threshold = config.toxicity_threshold;
    let data_state = state.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(toxguard::COMMAND_PREFIX.to_string()),
                case_insensitive_commands: true,
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(events::on_command_error(error)),
            ..Default::default()
        })
        .setup(move |_ctx, _ready, _framework| {
            Box::pin(async move {
                tracing::info!("bot is ready");
                Ok(Data {
                    http_client: reqwest::Client::new(),
                    api_url,
                    threshold,
                    state: data_state,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .expect("failed to build Discord client");

    // SIGINT/SIGTERM drain the registry before the gateway goes down.
    let shard_manager = client.shard_manager.clone();
    let shutdown_state = state.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, cleaning up");
        moderation::registry::shutdown(&shutdown_state).await;
        shard_manager.shutdown_all().await;
    });

    if let Err(e) = client.start().await {
        tracing::error!("client error: {e}");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
