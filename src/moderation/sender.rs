use std::time::{Duration, Instant};

use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::http::{Http, HttpError};
use serenity::model::id::ChannelId;
use serenity::Error as SerenityError;

use super::SharedState;

/// Minimum spacing between sends to the same channel.
const MIN_SEND_INTERVAL: Duration = Duration::from_secs(1);
/// Back-off when Discord rejects a send with 429. Serenity's typed error does
/// not expose the server's retry-after, so the default interval applies.
const RETRY_AFTER: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub enum Outbound {
    Text(String),
    Embed(CreateEmbed),
}

impl Outbound {
    fn to_message(&self) -> CreateMessage {
        match self {
            Outbound::Text(content) => CreateMessage::new().content(content),
            Outbound::Embed(embed) => CreateMessage::new().embed(embed.clone()),
        }
    }
}

/// What to do with a failed send attempt.
#[derive(Debug, PartialEq, Eq)]
enum FailurePolicy {
    RetryAfter(Duration),
    DropMessage,
    Propagate,
}

/// A rate-limit rejection gets exactly one retry after the back-off; any
/// failure of the retry drops the message; other first-attempt errors go back
/// to the caller.
fn after_failure(first_attempt: bool, rate_limited: bool) -> FailurePolicy {
    if !first_attempt {
        FailurePolicy::DropMessage
    } else if rate_limited {
        FailurePolicy::RetryAfter(RETRY_AFTER)
    } else {
        FailurePolicy::Propagate
    }
}

/// Send a message under the per-channel pacing policy. A rate-limit rejection
/// is retried exactly once after the back-off; a second failure drops the
/// message and is logged, so callers complete normally either way.
pub async fn send(
    http: &Http,
    state: &SharedState,
    channel: ChannelId,
    payload: Outbound,
) -> Result<(), SerenityError> {
    if let Some(delay) = required_delay(state, channel).await {
        tokio::time::sleep(delay).await;
    }

    let mut first_attempt = true;
    loop {
        match channel.send_message(http, payload.to_message()).await {
            Ok(_) => {
                record_send(state, channel).await;
                return Ok(());
            }
            Err(e) => match after_failure(first_attempt, is_rate_limited(&e)) {
                FailurePolicy::RetryAfter(delay) => {
                    tracing::warn!(%channel, "rate limited by Discord, retrying once");
                    tokio::time::sleep(delay).await;
                    first_attempt = false;
                }
                FailurePolicy::DropMessage => {
                    tracing::error!(%channel, "send dropped after rate-limit retry: {e}");
                    return Ok(());
                }
                FailurePolicy::Propagate => return Err(e),
            },
        }
    }
}

/// Time still to wait before this channel may be sent to again, if any.
pub async fn required_delay(state: &SharedState, channel: ChannelId) -> Option<Duration> {
    let st = state.read().await;
    let last = st.last_send.get(&channel)?;
    MIN_SEND_INTERVAL.checked_sub(last.elapsed())
}

pub async fn record_send(state: &SharedState, channel: ChannelId) {
    state.write().await.last_send.insert(channel, Instant::now());
}

fn is_rate_limited(err: &SerenityError) -> bool {
    matches!(
        err,
        SerenityError::Http(HttpError::UnsuccessfulRequest(response))
            if is_rate_limit_status(response.status_code.as_u16())
    )
}

fn is_rate_limit_status(status: u16) -> bool {
    status == 429
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_rate_limit_gets_one_retry() {
        assert_eq!(
            after_failure(true, true),
            FailurePolicy::RetryAfter(RETRY_AFTER)
        );
    }

    #[test]
    fn test_retry_failure_drops_message() {
        // Second attempt never retries again, whatever the error was
        assert_eq!(after_failure(false, true), FailurePolicy::DropMessage);
        assert_eq!(after_failure(false, false), FailurePolicy::DropMessage);
    }

    #[test]
    fn test_other_first_failures_go_to_caller() {
        assert_eq!(after_failure(true, false), FailurePolicy::Propagate);
    }

    #[test]
    fn test_only_429_counts_as_rate_limited() {
        assert!(is_rate_limit_status(429));
        assert!(!is_rate_limit_status(403));
        assert!(!is_rate_limit_status(500));
        assert!(!is_rate_limit_status(200));
    }
}
