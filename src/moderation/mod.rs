pub mod channel;
pub mod classifier;
pub mod cooldown;
pub mod gate;
pub mod registry;
pub mod sender;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serenity::model::id::{ChannelId, MessageId};
use tokio::sync::RwLock;

pub type SharedState = Arc<RwLock<BotState>>;

/// All mutable bot state. Owned by one `RwLock`; every check-and-set completes
/// under a single write-lock acquisition with no await inside, so the
/// registry/cooldown/gate operations stay atomic under concurrent event
/// dispatch.
pub struct BotState {
    /// Channels currently being analyzed for toxicity.
    pub analyzing_channels: HashSet<ChannelId>,
    /// Messages in flight or recently completed, keyed by (channel, message).
    pub message_cooldown: HashMap<(ChannelId, MessageId), Instant>,
    /// Last successful outbound send per channel, for rate pacing.
    pub last_send: HashMap<ChannelId, Instant>,
    /// Channels with an analyze/stop command currently in progress.
    pub command_locks: HashSet<ChannelId>,
    /// Where the monitored-channel list is persisted.
    pub state_path: PathBuf,
}

pub fn new_state(state_path: PathBuf, analyzing_channels: HashSet<ChannelId>) -> SharedState {
    Arc::new(RwLock::new(BotState {
        analyzing_channels,
        message_cooldown: HashMap::new(),
        last_send: HashMap::new(),
        command_locks: HashSet::new(),
        state_path,
    }))
}
