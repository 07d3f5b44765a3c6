use serenity::model::id::ChannelId;

use super::SharedState;

#[derive(Debug, PartialEq, Eq)]
pub enum Entry {
    Entered,
    Busy,
}

/// Claim the per-channel command lock. `Busy` means another analyze/stop
/// command is still in progress for this channel.
pub async fn try_enter(state: &SharedState, channel: ChannelId) -> Entry {
    if state.write().await.command_locks.insert(channel) {
        Entry::Entered
    } else {
        Entry::Busy
    }
}

/// Release the lock. Must run on every exit path of a guarded command handler
/// or the channel's commands lock out permanently.
pub async fn leave(state: &SharedState, channel: ChannelId) {
    state.write().await.command_locks.remove(&channel);
}
