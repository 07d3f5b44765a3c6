use std::collections::hash_map::Entry;
use std::time::{Duration, Instant};

use serenity::model::id::{ChannelId, MessageId};

use super::{BotState, SharedState};

/// Entries older than this are presumed finished and swept.
const STALE_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, PartialEq, Eq)]
pub enum Claim {
    Fresh,
    Duplicate,
}

/// Claim a message for processing. Returns `Duplicate` without touching the
/// ledger if the message is already in flight, so redelivered gateway events
/// are processed at most once.
pub async fn begin_if_new(state: &SharedState, channel: ChannelId, message: MessageId) -> Claim {
    let mut st = state.write().await;
    match st.message_cooldown.entry((channel, message)) {
        Entry::Occupied(_) => Claim::Duplicate,
        Entry::Vacant(slot) => {
            slot.insert(Instant::now());
            Claim::Fresh
        }
    }
}

/// Release a message's ledger entry. Runs regardless of how processing ended,
/// so a failed classification never leaves a permanent duplicate guard.
pub async fn complete(state: &SharedState, channel: ChannelId, message: MessageId) {
    state.write().await.message_cooldown.remove(&(channel, message));
}

/// Drop entries older than the staleness window. Called on each message
/// arrival rather than on a timer; the map stays small so this is cheap.
pub async fn sweep_stale(state: &SharedState) {
    state
        .write()
        .await
        .message_cooldown
        .retain(|_, started| started.elapsed() < STALE_AFTER);
}

/// Remove every ledger entry for a channel. Caller already holds the write
/// lock (registry `stop` path).
pub(crate) fn purge_channel(st: &mut BotState, channel: ChannelId) {
    st.message_cooldown.retain(|(c, _), _| *c != channel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::new_state;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_begin_complete_cycle() {
        let state = new_state(PathBuf::from("unused.json"), HashSet::new());
        let (c, m) = (ChannelId::new(1), MessageId::new(10));

        assert_eq!(begin_if_new(&state, c, m).await, Claim::Fresh);
        assert_eq!(begin_if_new(&state, c, m).await, Claim::Duplicate);

        complete(&state, c, m).await;
        assert_eq!(begin_if_new(&state, c, m).await, Claim::Fresh);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_stale_entries() {
        let state = new_state(PathBuf::from("unused.json"), HashSet::new());
        let c = ChannelId::new(1);

        {
            let mut st = state.write().await;
            st.message_cooldown
                .insert((c, MessageId::new(10)), Instant::now() - Duration::from_secs(120));
            st.message_cooldown
                .insert((c, MessageId::new(11)), Instant::now());
        }

        sweep_stale(&state).await;

        let st = state.read().await;
        assert!(!st.message_cooldown.contains_key(&(c, MessageId::new(10))));
        assert!(st.message_cooldown.contains_key(&(c, MessageId::new(11))));
    }

    #[tokio::test]
    async fn test_purge_channel_keeps_other_channels() {
        let state = new_state(PathBuf::from("unused.json"), HashSet::new());
        let (c1, c2) = (ChannelId::new(1), ChannelId::new(2));

        begin_if_new(&state, c1, MessageId::new(10)).await;
        begin_if_new(&state, c1, MessageId::new(11)).await;
        begin_if_new(&state, c2, MessageId::new(12)).await;

        {
            let mut st = state.write().await;
            purge_channel(&mut st, c1);
        }

        let st = state.read().await;
        assert_eq!(st.message_cooldown.len(), 1);
        assert!(st.message_cooldown.contains_key(&(c2, MessageId::new(12))));
    }
}
