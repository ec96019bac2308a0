// ── Peer domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::ids::DeviceId;
use crate::store::Keyed;

/// Connectivity state of a remote device as reported by discovery.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PeerStatus {
    Online,
    Offline,
    Syncing,
    Pairing,
}

impl PeerStatus {
    pub fn is_reachable(self) -> bool {
        !matches!(self, Self::Offline)
    }
}

/// A remote device this instance knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub id: DeviceId,
    pub name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub version: String,
    pub status: PeerStatus,
    /// Trust flag: set once a pairing handshake has completed.
    #[serde(default)]
    pub paired: bool,
    #[serde(default, deserialize_with = "super::wire::unset_time")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::wire::unset_time")]
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl Peer {
    /// Minimal peer, mostly useful when only an id and name are known
    /// (e.g. an incoming pairing request from an undiscovered device).
    pub fn new(id: impl Into<DeviceId>, name: impl Into<String>, status: PeerStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            host: String::new(),
            port: 0,
            version: String::new(),
            status,
            paired: false,
            last_seen: None,
            last_sync_time: None,
        }
    }

    /// Name to show in the UI, falling back to the device id.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

impl Keyed for Peer {
    type Key = DeviceId;
    const KIND: &'static str = "peer";

    fn key(&self) -> &DeviceId {
        &self.id
    }
}
