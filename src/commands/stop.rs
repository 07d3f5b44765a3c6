use poise::CreateReply;
use serenity::model::id::ChannelId;

use crate::moderation::{gate, registry};
use crate::utils::embed;
use crate::{Context, Error};

async fn stop_impl(ctx: Context<'_>) -> Result<(), Error> {
    let channel = ctx.channel_id();
    tracing::info!(user = %ctx.author().name, %channel, "received !stop");

    let state = &ctx.data().state;
    if gate::try_enter(state, channel).await == gate::Entry::Busy {
        ctx.say("⚠️ Command is already being processed!").await?;
        return Ok(());
    }

    let outcome = run_stop(ctx, channel).await;
    gate::leave(state, channel).await;
    outcome
}

async fn run_stop(ctx: Context<'_>, channel: ChannelId) -> Result<(), Error> {
    match registry::stop(&ctx.data().state, channel).await {
        registry::StopOutcome::NotActive => {
            ctx.say("⚠️ This channel is not being analyzed!").await?;
        }
        registry::StopOutcome::Stopped => {
            ctx.send(CreateReply::default().embed(embed::analysis_stopped()))
                .await?;
        }
    }
    Ok(())
}

/// Stop toxicity analysis in this channel
#[poise::command(prefix_command)]
pub async fn stop(ctx: Context<'_>) -> Result<(), Error> {
    stop_impl(ctx).await
}
