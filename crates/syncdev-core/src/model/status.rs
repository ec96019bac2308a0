// ── Sync status ──

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Coarse engine state reported on every status push.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncState {
    #[default]
    Idle,
    Scanning,
    Syncing,
    Error,
    Paused,
}

/// Engine status plus the human-readable action it is performing.
///
/// Always replaced as a whole; there is no way to update `action` without
/// also restating `state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    #[serde(rename = "status")]
    pub state: SyncState,
    #[serde(default)]
    pub action: String,
}

impl SyncStatus {
    pub fn new(state: SyncState, action: impl Into<String>) -> Self {
        Self {
            state,
            action: action.into(),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, SyncState::Scanning | SyncState::Syncing)
    }
}
