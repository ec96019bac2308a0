// ── Domain model ──
//
// Value types held by the state cells. Every type here is what the backend
// reports (or what the UI intends), decoded and checked, never a partial.

pub mod config;
pub mod event;
pub mod folder;
pub mod ids;
pub mod pairing;
pub mod peer;
pub mod progress;
pub mod status;
pub mod ui;
mod wire;

// ── Re-exports ──────────────────────────────────────────────────────

pub use config::{AppConfig, DEFAULT_PORT, DEFAULT_SYNC_INTERVAL_MINS, MAX_SYNC_INTERVAL_MINS};
pub use event::{DEFAULT_EVENT_LOG_CAPACITY, EventLog, SyncEvent, SyncEventKind};
pub use folder::FolderPair;
pub use ids::{DeviceId, FolderPairId};
pub use pairing::{PairingCode, PairingRequest, PairingSession};
pub use peer::{Peer, PeerStatus};
pub use progress::{
    FileProgress, FileStatus, FileTransfer, Progress, ProgressSnapshot, ProgressStatus,
};
pub use status::{SyncState, SyncStatus};
pub use ui::{ModalKind, ModalState, Tab};

use crate::store::KeyedList;

/// All known peers, keyed by device id.
pub type PeerSet = KeyedList<Peer>;

/// All configured folder pairs, keyed by pair id.
pub type FolderPairSet = KeyedList<FolderPair>;
