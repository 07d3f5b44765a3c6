use poise::CreateReply;
use serenity::model::id::ChannelId;

use crate::moderation::{gate, registry};
use crate::utils::embed;
use crate::{Context, Error};

async fn analyze_impl(ctx: Context<'_>) -> Result<(), Error> {
    let channel = ctx.channel_id();
    tracing::info!(user = %ctx.author().name, %channel, "received !analyze");

    let state = &ctx.data().state;
    if gate::try_enter(state, channel).await == gate::Entry::Busy {
        ctx.say("⚠️ Command is already being processed!").await?;
        return Ok(());
    }

    // The lock must be released on every exit path, error included.
    let outcome = run_analyze(ctx, channel).await;
    gate::leave(state, channel).await;
    outcome
}

async fn run_analyze(ctx: Context<'_>, channel: ChannelId) -> Result<(), Error> {
    match registry::start(&ctx.data().state, channel).await {
        registry::StartOutcome::AlreadyActive => {
            ctx.say("⚠️ This channel is already being analyzed!").await?;
        }
        registry::StartOutcome::Started => {
            ctx.send(CreateReply::default().embed(embed::analysis_started()))
                .await?;
        }
    }
    Ok(())
}

/// Start toxicity analysis in this channel
#[poise::command(prefix_command)]
pub async fn analyze(ctx: Context<'_>) -> Result<(), Error> {
    analyze_impl(ctx).await
}
