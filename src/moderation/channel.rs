use poise::serenity_prelude as serenity;

use super::{classifier, cooldown, registry, sender};
use crate::{Data, Error};

/// Messages older than this are backlog from a reconnect/resume, not live
/// conversation, and are not classified.
const MAX_MESSAGE_AGE_SECS: i64 = 30;

/// Dispatch one inbound message. Prefix commands are parsed by poise before
/// this runs, so command handling works even in unmonitored channels.
pub async fn handle(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    let bot_id = ctx.cache.current_user().id;
    if msg.author.id == bot_id {
        return Ok(());
    }

    let monitored = registry::is_active(&data.state, msg.channel_id).await;
    let age_secs = serenity::Timestamp::now().unix_timestamp() - msg.timestamp.unix_timestamp();
    if !should_process(monitored, &msg.content, age_secs) {
        return Ok(());
    }

    if cooldown::begin_if_new(&data.state, msg.channel_id, msg.id).await
        == cooldown::Claim::Duplicate
    {
        tracing::debug!(channel = %msg.channel_id, message = %msg.id, "skipping duplicate delivery");
        return Ok(());
    }
    cooldown::sweep_stale(&data.state).await;

    let outcome = scan_message(ctx, msg, data).await;
    cooldown::complete(&data.state, msg.channel_id, msg.id).await;

    // A failed scan must not take down the dispatch loop.
    if let Err(e) = outcome {
        tracing::error!(channel = %msg.channel_id, "message handling failed: {e}");
    }
    Ok(())
}

fn should_process(monitored: bool, content: &str, age_secs: i64) -> bool {
    monitored && !content.starts_with(crate::COMMAND_PREFIX) && age_secs <= MAX_MESSAGE_AGE_SECS
}

async fn scan_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    let result =
        classifier::classify(&data.http_client, &data.api_url, &msg.content, data.threshold).await;

    if !result.is_flagged {
        return Ok(());
    }

    tracing::info!(
        channel = %msg.channel_id,
        author = %msg.author.name,
        category = %result.max_category,
        score = result.overall_score,
        "toxic message flagged"
    );

    let embed = crate::utils::embed::toxicity_alert(&result, &msg.author.name, &msg.link());
    sender::send(
        &ctx.http,
        &data.state,
        msg.channel_id,
        sender::Outbound::Embed(embed),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitored_recent_message_is_processed() {
        assert!(should_process(true, "you are worthless", 3));
    }

    #[test]
    fn test_unmonitored_channel_is_skipped() {
        assert!(!should_process(false, "you are worthless", 3));
    }

    #[test]
    fn test_commands_are_not_classified() {
        assert!(!should_process(true, "!analyze", 0));
    }

    #[test]
    fn test_backlog_message_is_skipped() {
        // Replayed messages after a reconnect arrive with old timestamps
        assert!(!should_process(true, "you are worthless", 31));
        assert!(should_process(true, "you are worthless", 30));
    }
}
