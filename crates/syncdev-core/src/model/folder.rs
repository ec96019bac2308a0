// ── Folder pair domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DeviceId, FolderPairId};
use crate::store::Keyed;

/// A local folder bound to a folder on a remote peer.
///
/// Has its own lifecycle: the referenced peer may be offline or missing
/// from the current peer set entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPair {
    pub id: FolderPairId,
    pub peer_id: DeviceId,
    pub local_path: String,
    pub remote_path: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Glob patterns excluded for this pair only (global ones live in `AppConfig`).
    #[serde(default, deserialize_with = "super::wire::null_as_empty")]
    pub exclusions: Vec<String>,
    #[serde(default, deserialize_with = "super::wire::unset_time")]
    pub last_sync_time: Option<DateTime<Utc>>,
}

fn enabled_by_default() -> bool {
    true
}

impl FolderPair {
    /// An enabled pair with no exclusions that has never synced.
    pub fn new(
        id: impl Into<FolderPairId>,
        peer_id: impl Into<DeviceId>,
        local_path: impl Into<String>,
        remote_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            peer_id: peer_id.into(),
            local_path: local_path.into(),
            remote_path: remote_path.into(),
            enabled: true,
            exclusions: Vec::new(),
            last_sync_time: None,
        }
    }
}

impl Keyed for FolderPair {
    type Key = FolderPairId;
    const KIND: &'static str = "folder pair";

    fn key(&self) -> &FolderPairId {
        &self.id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_enabled_defaults_to_true() {
        let json = r#"{
            "id": "fp-1",
            "peerId": "dev-1",
            "localPath": "/home/me/docs",
            "remotePath": "/srv/docs"
        }"#;
        let pair: FolderPair = serde_json::from_str(json).unwrap();
        assert!(pair.enabled);
        assert!(pair.exclusions.is_empty());
        assert_eq!(pair.peer_id.as_str(), "dev-1");
    }
}
