// ── Backend update sink ──
//
// Decodes pushed backend events and writes each into exactly one cell.
// Anything that fails to decode or validate is dropped, logged and
// counted; the target cell keeps its last good value.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{
    AppConfig, DeviceId, FileTransfer, FolderPair, FolderPairSet, PairingCode, PairingRequest,
    PairingSession, Peer, PeerSet, PeerStatus, Progress, ProgressSnapshot, SyncEvent, SyncStatus,
};
use crate::store::StateStore;

/// Backend event names.
pub mod topic {
    pub const PEERS_CHANGED: &str = "peers:changed";
    pub const FOLDERS_CHANGED: &str = "folders:changed";
    pub const SYNC_STATUS: &str = "sync:status";
    pub const SYNC_PROGRESS: &str = "sync:progress";
    pub const SYNC_START: &str = "sync:start";
    pub const SYNC_END: &str = "sync:end";
    pub const SYNC_FILE_PROGRESS: &str = "sync:file-progress";
    pub const SYNC_EVENT: &str = "sync:event";
    pub const SYNC_EVENTS: &str = "sync:events";
    pub const CONFIG_CHANGED: &str = "config:changed";
    pub const PAIRING_REQUEST: &str = "pairing:request";
    pub const PAIRING_ENDED: &str = "pairing:ended";
}

/// An event as it arrives from the backend: a topic and an untyped payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub topic: String,
    #[serde(default)]
    pub payload: Value,
}

impl RawEvent {
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// A decoded, validated backend event.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    PeersChanged(PeerSet),
    /// `peers:changed` with no list: the peer set changed but must be
    /// fetched. Nothing to write until the full list arrives.
    PeersStale,
    FoldersChanged(FolderPairSet),
    SyncStatus(SyncStatus),
    Progress(Progress),
    SyncStarted,
    SyncEnded,
    FileProgress(FileTransfer),
    EventAppended(SyncEvent),
    EventsReplaced(Vec<SyncEvent>),
    ConfigChanged(AppConfig),
    PairingRequested {
        code: PairingCode,
        from_peer_id: DeviceId,
        from_peer_name: String,
    },
    PairingEnded,
}

impl BackendEvent {
    pub fn decode(raw: RawEvent) -> Result<Self, CoreError> {
        let RawEvent { topic, payload } = raw;
        let t = topic.as_str();

        let event = match t {
            topic::PEERS_CHANGED if payload.is_null() => Self::PeersStale,
            topic::PEERS_CHANGED => {
                let peers: Vec<Peer> = decode_payload(t, payload)?;
                Self::PeersChanged(PeerSet::try_from_vec(peers)?)
            }
            topic::FOLDERS_CHANGED => {
                let pairs: Vec<FolderPair> = decode_payload(t, payload)?;
                Self::FoldersChanged(FolderPairSet::try_from_vec(pairs)?)
            }
            topic::SYNC_STATUS => Self::SyncStatus(decode_payload(t, payload)?),
            topic::SYNC_PROGRESS => {
                let snap: Option<ProgressSnapshot> = decode_payload(t, payload)?;
                if let Some(snap) = &snap {
                    snap.validate().map_err(|e| CoreError::malformed(t, e))?;
                }
                Self::Progress(snap.into())
            }
            topic::SYNC_START => Self::SyncStarted,
            topic::SYNC_END => Self::SyncEnded,
            topic::SYNC_FILE_PROGRESS => Self::FileProgress(decode_payload(t, payload)?),
            topic::SYNC_EVENT => Self::EventAppended(decode_payload(t, payload)?),
            topic::SYNC_EVENTS => Self::EventsReplaced(decode_payload(t, payload)?),
            topic::CONFIG_CHANGED => {
                let config: AppConfig = decode_payload(t, payload)?;
                config.validate().map_err(|e| CoreError::malformed(t, e))?;
                Self::ConfigChanged(config)
            }
            topic::PAIRING_REQUEST => {
                let req: PairingRequest = decode_payload(t, payload)?;
                let code = PairingCode::parse(&req.code).map_err(|e| CoreError::malformed(t, e))?;
                Self::PairingRequested {
                    code,
                    from_peer_id: req.from_peer_id,
                    from_peer_name: req.from_peer_name,
                }
            }
            topic::PAIRING_ENDED => Self::PairingEnded,
            _ => return Err(CoreError::UnknownTopic { topic }),
        };
        Ok(event)
    }

    /// The wire topic this event arrived on.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::PeersChanged(_) | Self::PeersStale => topic::PEERS_CHANGED,
            Self::FoldersChanged(_) => topic::FOLDERS_CHANGED,
            Self::SyncStatus(_) => topic::SYNC_STATUS,
            Self::Progress(_) => topic::SYNC_PROGRESS,
            Self::SyncStarted => topic::SYNC_START,
            Self::SyncEnded => topic::SYNC_END,
            Self::FileProgress(_) => topic::SYNC_FILE_PROGRESS,
            Self::EventAppended(_) => topic::SYNC_EVENT,
            Self::EventsReplaced(_) => topic::SYNC_EVENTS,
            Self::ConfigChanged(_) => topic::CONFIG_CHANGED,
            Self::PairingRequested { .. } => topic::PAIRING_REQUEST,
            Self::PairingEnded => topic::PAIRING_ENDED,
        }
    }
}

fn decode_payload<T: DeserializeOwned>(topic: &str, payload: Value) -> Result<T, CoreError> {
    serde_json::from_value(payload).map_err(|e| CoreError::malformed(topic, e))
}

// ── Sink ─────────────────────────────────────────────────────────

/// Counters for events seen by a sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkStats {
    pub applied: u64,
    pub dropped: u64,
}

/// Writes backend events into a [`StateStore`].
///
/// Feed it from a single task (see [`spawn_update_sink`]) to keep per-cell
/// ordering.
pub struct UpdateSink {
    store: Arc<StateStore>,
    applied: AtomicU64,
    dropped: AtomicU64,
}

impl UpdateSink {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self {
            store,
            applied: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Decode and apply one raw event. On error the event is dropped and
    /// counted; the error is returned for callers that want to report it.
    pub fn ingest(&self, raw: RawEvent) -> Result<(), CoreError> {
        let topic = raw.topic.clone();
        match BackendEvent::decode(raw) {
            Ok(event) => {
                self.apply(event);
                Ok(())
            }
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(topic, error = %e, "dropping backend event");
                Err(e)
            }
        }
    }

    /// Write a decoded event into its cell.
    pub fn apply(&self, event: BackendEvent) {
        let topic = event.topic();
        let s = &self.store;
        let changed = match event {
            BackendEvent::PeersChanged(peers) => s.peers.set_if_changed(peers),
            BackendEvent::PeersStale => false,
            BackendEvent::FoldersChanged(pairs) => s.folder_pairs.set_if_changed(pairs),
            BackendEvent::SyncStatus(status) => s.sync_status.set_if_changed(status),
            BackendEvent::Progress(progress) => s.progress.set_if_changed(progress),
            BackendEvent::SyncStarted => s.file_transfer.set_if_changed(None),
            BackendEvent::SyncEnded => s.progress.set_if_changed(Progress::Absent),
            BackendEvent::FileProgress(transfer) => s.file_transfer.set_if_changed(Some(transfer)),
            BackendEvent::EventAppended(event) => {
                s.events.replace_with(|log| log.appended(event));
                true
            }
            BackendEvent::EventsReplaced(events) => {
                s.events.replace_with(|log| log.replaced(events));
                true
            }
            BackendEvent::ConfigChanged(config) => s.config.set_if_changed(config),
            BackendEvent::PairingRequested {
                code,
                from_peer_id,
                from_peer_name,
            } => {
                let known = s.peers.get().get(&from_peer_id).cloned();
                let peer = known.unwrap_or_else(|| {
                    Arc::new(Peer::new(from_peer_id, from_peer_name, PeerStatus::Pairing))
                });
                s.pairing.set(PairingSession::Active {
                    code,
                    target: Some(peer),
                });
                true
            }
            BackendEvent::PairingEnded => s.pairing.set_if_changed(PairingSession::Idle),
        };

        self.applied.fetch_add(1, Ordering::Relaxed);
        debug!(topic, changed, "applied backend event");
    }

    pub fn stats(&self) -> SinkStats {
        SinkStats {
            applied: self.applied.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

// ── Channel driver ───────────────────────────────────────────────

/// Sending half of a sink channel, held by whatever bridges the backend.
#[derive(Debug, Clone)]
pub struct SinkHandle {
    tx: mpsc::UnboundedSender<RawEvent>,
}

impl SinkHandle {
    pub fn send(&self, event: RawEvent) -> Result<(), CoreError> {
        self.tx.send(event).map_err(|_| CoreError::SinkClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create the channel a sink driver drains. Sends never block the backend.
pub fn sink_channel() -> (SinkHandle, mpsc::UnboundedReceiver<RawEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SinkHandle { tx }, rx)
}

/// Drain `rx` into `sink` on a single task until cancelled or every
/// [`SinkHandle`] is dropped. Resolves to the sink's final counters.
pub fn spawn_update_sink(
    sink: Arc<UpdateSink>,
    rx: mpsc::UnboundedReceiver<RawEvent>,
    cancel: CancellationToken,
) -> JoinHandle<SinkStats> {
    tokio::spawn(sink_task(sink, rx, cancel))
}

async fn sink_task(
    sink: Arc<UpdateSink>,
    mut rx: mpsc::UnboundedReceiver<RawEvent>,
    cancel: CancellationToken,
) -> SinkStats {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = rx.recv() => {
                let Some(event) = event else { break };
                // Failures are already logged and counted by the sink.
                let _ = sink.ingest(event);
            }
        }
    }

    let stats = sink.stats();
    info!(applied = stats.applied, dropped = stats.dropped, "update sink stopped");
    stats
}
