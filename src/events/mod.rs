use poise::serenity_prelude as serenity;

use crate::moderation::registry;
use crate::{Data, Error};

pub async fn handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!("{} has connected to Discord", data_about_bot.user.name);
            let channels = registry::snapshot(&data.state).await;
            if channels.is_empty() {
                tracing::info!("no channels are being analyzed yet");
            } else {
                tracing::info!("currently analyzing channels: {channels:?}");
            }
        }
        serenity::FullEvent::CacheReady { guilds } => {
            log_guild_permissions(ctx, guilds);
        }
        serenity::FullEvent::Message { new_message } => {
            crate::moderation::channel::handle(ctx, new_message, data).await?;
        }
        _ => {}
    }
    Ok(())
}

/// Diagnostic only: surfaces missing permissions in the logs instead of as
/// silent send failures later.
fn log_guild_permissions(ctx: &serenity::Context, guilds: &[serenity::GuildId]) {
    let bot_id = ctx.cache.current_user().id;
    for guild_id in guilds {
        let Some(guild) = guild_id.to_guild_cached(&ctx.cache) else {
            continue;
        };
        let Some(me) = guild.members.get(&bot_id) else {
            continue;
        };
        let perms = guild.member_permissions(me);
        tracing::info!(
            guild = %guild.name,
            send_messages = perms.send_messages(),
            embed_links = perms.embed_links(),
            read_message_history = perms.read_message_history(),
            "guild permissions"
        );
    }
}

/// Command error boundary. Unknown commands are ignored; real command errors
/// are logged and answered with a generic failure notice.
pub async fn on_command_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::UnknownCommand { .. } => {}
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!("error in command {}: {error}", ctx.command().name);
            let notice = crate::utils::embed::error("An error occurred while running the command.");
            let _ = ctx.send(poise::CreateReply::default().embed(notice)).await;
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("error while handling command error: {e}");
            }
        }
    }
}
