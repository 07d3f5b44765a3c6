use std::collections::HashSet;
use std::path::Path;

use serenity::model::id::ChannelId;

use super::{cooldown, BotState, SharedState};

#[derive(Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyActive,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotActive,
}

/// Load the monitored-channel list from disk. A missing file means no channels
/// are monitored yet; the file is created so later saves have somewhere to go.
pub fn load(path: &Path) -> HashSet<ChannelId> {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str::<Vec<u64>>(&text) {
            Ok(ids) => {
                // A hand-edited file may contain 0, which is not a valid
                // snowflake; skip it rather than panic in ChannelId::new.
                let mut channels = HashSet::with_capacity(ids.len());
                for id in ids {
                    if id == 0 {
                        tracing::warn!("skipping invalid channel id 0 in {}", path.display());
                        continue;
                    }
                    channels.insert(ChannelId::new(id));
                }
                tracing::info!(
                    "loaded {} monitored channels from {}",
                    channels.len(),
                    path.display()
                );
                channels
            }
            Err(e) => {
                tracing::error!("failed to parse {}: {e}", path.display());
                HashSet::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("no channel list at {}, creating a new one", path.display());
            if let Err(e) = std::fs::write(path, "[]") {
                tracing::error!("failed to create {}: {e}", path.display());
            }
            HashSet::new()
        }
        Err(e) => {
            tracing::error!("failed to read {}: {e}", path.display());
            HashSet::new()
        }
    }
}

/// Begin analyzing a channel. Persists the updated list on success; an
/// already-monitored channel is left untouched.
pub async fn start(state: &SharedState, channel: ChannelId) -> StartOutcome {
    let mut st = state.write().await;
    if !st.analyzing_channels.insert(channel) {
        return StartOutcome::AlreadyActive;
    }
    tracing::info!(%channel, "starting toxicity analysis");
    persist(&st);
    StartOutcome::Started
}

/// Stop analyzing a channel and drop every cooldown, pacing and lock entry
/// scoped to it, then persist the updated list.
pub async fn stop(state: &SharedState, channel: ChannelId) -> StopOutcome {
    let mut st = state.write().await;
    if !st.analyzing_channels.remove(&channel) {
        return StopOutcome::NotActive;
    }
    tracing::info!(%channel, "stopping toxicity analysis");
    cooldown::purge_channel(&mut st, channel);
    st.last_send.remove(&channel);
    st.command_locks.remove(&channel);
    persist(&st);
    StopOutcome::Stopped
}

pub async fn is_active(state: &SharedState, channel: ChannelId) -> bool {
    state.read().await.analyzing_channels.contains(&channel)
}

pub async fn snapshot(state: &SharedState) -> Vec<ChannelId> {
    state.read().await.analyzing_channels.iter().copied().collect()
}

/// Shutdown drain: clear all per-channel state and persist the empty list.
pub async fn shutdown(state: &SharedState) {
    let mut st = state.write().await;
    st.analyzing_channels.clear();
    st.message_cooldown.clear();
    st.last_send.clear();
    st.command_locks.clear();
    persist(&st);
    tracing::info!("cleared monitoring state");
}

/// Rewrite the whole channel list. Failures are logged and swallowed; the
/// in-memory set stays authoritative for the running process.
fn persist(st: &BotState) {
    let ids: Vec<u64> = st.analyzing_channels.iter().map(|c| c.get()).collect();
    let payload = match serde_json::to_string(&ids) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("failed to encode channel list: {e}");
            return;
        }
    };
    if let Err(e) = std::fs::write(&st.state_path, payload) {
        tracing::error!("failed to save channel list to {}: {e}", st.state_path.display());
    }
}
