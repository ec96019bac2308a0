// ── Central client state store ──
//
// Single composition point for every primitive cell, the derivation graph
// and the modal coordinator. Views get read-only handles; writes come from
// the update sink or from the intent methods below.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::cell::{Cell, ReadOnly};
use super::derivations::{Derivations, GraphNode};
use crate::error::CoreError;
use crate::modal::ModalCoordinator;
use crate::model::{
    AppConfig, DEFAULT_EVENT_LOG_CAPACITY, DeviceId, EventLog, FileTransfer, FolderPairSet,
    ModalState, PairingCode, PairingSession, PeerSet, Progress, SyncStatus, Tab,
};

/// Client-side settings for a store. Backend configuration is not part of
/// this; it arrives through the update sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of activity log entries kept. Zero is treated as one.
    pub event_log_capacity: usize,
    pub initial_tab: Tab,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
            initial_tab: Tab::default(),
        }
    }
}

/// Reactive store for all client state.
///
/// Each concern lives in its own [`Cell`]; there is no ordering guarantee
/// across cells. Derived values are registered on their upstream cells here,
/// before any handle leaves the store.
pub struct StateStore {
    pub(crate) tab: Cell<Tab>,
    pub(crate) peers: Cell<PeerSet>,
    pub(crate) folder_pairs: Cell<FolderPairSet>,
    pub(crate) sync_status: Cell<SyncStatus>,
    pub(crate) progress: Cell<Progress>,
    pub(crate) file_transfer: Cell<Option<FileTransfer>>,
    pub(crate) events: Cell<EventLog>,
    pub(crate) config: Cell<AppConfig>,
    pub(crate) pairing: Cell<PairingSession>,
    modal: ModalCoordinator,
    derived: Derivations,
}

impl StateStore {
    pub fn new(config: StoreConfig) -> Self {
        let tab = Cell::new("tab", config.initial_tab);
        let peers = Cell::new("peers", PeerSet::new());
        let folder_pairs = Cell::new("folder_pairs", FolderPairSet::new());
        let sync_status = Cell::new("sync_status", SyncStatus::default());
        let progress = Cell::new("progress", Progress::Absent);
        let file_transfer = Cell::new("file_transfer", None);
        let events = Cell::new(
            "events",
            EventLog::with_capacity(config.event_log_capacity),
        );
        let app_config = Cell::new("config", AppConfig::default());
        let pairing = Cell::new("pairing", PairingSession::Idle);

        let derived = Derivations::new(&progress, &peers, &folder_pairs, &pairing);
        debug!(
            event_log_capacity = config.event_log_capacity,
            initial_tab = %config.initial_tab,
            "state store created"
        );

        Self {
            tab,
            peers,
            folder_pairs,
            sync_status,
            progress,
            file_transfer,
            events,
            config: app_config,
            pairing,
            modal: ModalCoordinator::new(),
            derived,
        }
    }

    // ── Read-only handles ────────────────────────────────────────────

    pub fn tab(&self) -> ReadOnly<Tab> {
        self.tab.read_only()
    }

    pub fn peers(&self) -> ReadOnly<PeerSet> {
        self.peers.read_only()
    }

    pub fn folder_pairs(&self) -> ReadOnly<FolderPairSet> {
        self.folder_pairs.read_only()
    }

    pub fn sync_status(&self) -> ReadOnly<SyncStatus> {
        self.sync_status.read_only()
    }

    pub fn progress(&self) -> ReadOnly<Progress> {
        self.progress.read_only()
    }

    /// Older name for [`progress`](Self::progress). Same cell, not a copy.
    #[deprecated(note = "use `progress()`")]
    pub fn transfer_progress(&self) -> ReadOnly<Progress> {
        self.progress()
    }

    /// Last legacy per-file transfer tick, if any was received.
    pub fn file_transfer(&self) -> ReadOnly<Option<FileTransfer>> {
        self.file_transfer.read_only()
    }

    pub fn events(&self) -> ReadOnly<EventLog> {
        self.events.read_only()
    }

    pub fn config(&self) -> ReadOnly<AppConfig> {
        self.config.read_only()
    }

    pub fn pairing(&self) -> ReadOnly<PairingSession> {
        self.pairing.read_only()
    }

    pub fn modal(&self) -> &ModalCoordinator {
        &self.modal
    }

    pub fn derived(&self) -> &Derivations {
        &self.derived
    }

    /// Every derived value with the cells it depends on.
    pub fn dependency_graph(&self) -> Vec<GraphNode> {
        self.derived.graph()
    }

    // ── UI intents ───────────────────────────────────────────────────

    /// Switch the active tab. Returns `false` if it was already active.
    pub fn select_tab(&self, tab: Tab) -> bool {
        self.tab.set_if_changed(tab)
    }

    /// Begin a pairing handshake with `code`, optionally aimed at a known
    /// peer. Code and target are set together or not at all.
    pub fn start_pairing(&self, code: &str, target: Option<&DeviceId>) -> Result<(), CoreError> {
        let code = PairingCode::parse(code)?;
        let target = match target {
            Some(id) => {
                let peers = self.peers.get();
                let peer = peers
                    .get(id)
                    .ok_or_else(|| CoreError::validation("target", format!("unknown peer {id}")))?;
                Some(Arc::clone(peer))
            }
            None => None,
        };

        info!(code = %code, target = ?target.as_ref().map(|p| p.id.as_str()), "pairing started");
        self.pairing.set(PairingSession::Active { code, target });
        Ok(())
    }

    /// End any pairing session. Returns `false` if none was active.
    pub fn clear_pairing(&self) -> bool {
        self.pairing.set_if_changed(PairingSession::Idle)
    }

    /// Accept an edited configuration from the settings form. The config
    /// cell is untouched if the draft fails validation.
    pub fn submit_config(&self, draft: AppConfig) -> Result<(), CoreError> {
        draft.validate_draft()?;
        if self.config.set_if_changed(draft) {
            info!("configuration updated");
        }
        Ok(())
    }

    // ── Snapshot ─────────────────────────────────────────────────────

    /// Point-in-time copy of every primitive cell.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            tab: self.tab.get(),
            peers: self.peers.get(),
            folder_pairs: self.folder_pairs.get(),
            sync_status: self.sync_status.get(),
            progress: self.progress.get(),
            file_transfer: self.file_transfer.get(),
            events: self.events.get(),
            config: self.config.get(),
            pairing: self.pairing.get(),
            modal: self.modal.state().get(),
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

/// Values of every primitive cell at one moment. Cells are read one after
/// another, so a snapshot taken while the sink is running may mix old and
/// new values across cells.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub tab: Arc<Tab>,
    pub peers: Arc<PeerSet>,
    pub folder_pairs: Arc<FolderPairSet>,
    pub sync_status: Arc<SyncStatus>,
    pub progress: Arc<Progress>,
    pub file_transfer: Arc<Option<FileTransfer>>,
    pub events: Arc<EventLog>,
    pub config: Arc<AppConfig>,
    pub pairing: Arc<PairingSession>,
    pub modal: Arc<ModalState>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::progress::tests::snapshot;
    use crate::model::{FolderPair, FolderPairId, Peer, PeerStatus, ProgressStatus};
    use crate::store::Observable;
    use pretty_assertions::assert_eq;

    fn store_with_peers(peers: Vec<Peer>) -> StateStore {
        let store = StateStore::default();
        store.peers.set(PeerSet::try_from_vec(peers).unwrap());
        store
    }

    #[test]
    fn initial_values() {
        let store = StateStore::default();
        assert_eq!(*store.tab().get(), Tab::Peers);
        assert!(store.peers().get().is_empty());
        assert!(store.progress().get().is_absent());
        assert!(store.file_transfer().get().is_none());
        assert_eq!(store.events().get().capacity(), 100);
        assert_eq!(*store.config().get(), AppConfig::default());
        assert!(!store.pairing().get().is_pairing());
        assert!(!store.modal().is_open());
    }

    #[test]
    fn store_config_is_applied() {
        let store = StateStore::new(StoreConfig {
            event_log_capacity: 0,
            initial_tab: Tab::Activity,
        });
        assert_eq!(*store.tab().get(), Tab::Activity);
        assert_eq!(store.events().get().capacity(), 1);
    }

    #[test]
    fn select_tab_skips_redundant_changes() {
        let store = StateStore::default();
        assert!(store.select_tab(Tab::Sync));
        assert!(!store.select_tab(Tab::Sync));
        assert_eq!(*store.tab().get(), Tab::Sync);
    }

    #[test]
    fn derived_progress_follows_progress_cell() {
        let store = StateStore::default();
        let d = store.derived();
        assert_eq!(d.formatted_speed.get().as_str(), "");
        assert!(!*d.is_syncing.get());

        store
            .progress
            .set(Progress::Reported(snapshot(ProgressStatus::Syncing)));
        assert_eq!(d.formatted_speed.get().as_str(), "1.5 KB/s");
        assert_eq!(d.formatted_eta.get().as_str(), "2:05 remaining");
        assert_eq!(d.file_count_progress.get().as_str(), "4 of 10 files");
        assert_eq!(d.formatted_transfer.get().as_str(), "4.0 MB of 10.0 MB");
        assert!(*d.is_syncing.get());
        assert!((*d.overall_percentage.get() - 40.0).abs() < f64::EPSILON);
        assert_eq!(d.active_files.get().len(), 1);

        store.progress.set(Progress::Absent);
        assert_eq!(d.formatted_speed.get().as_str(), "");
        assert_eq!(d.formatted_eta.get().as_str(), "");
        assert_eq!(d.file_count_progress.get().as_str(), "");
        assert!(!*d.is_syncing.get());
        assert!(d.overall_percentage.get().abs() < f64::EPSILON);
        assert!(d.active_files.get().is_empty());
    }

    #[test]
    fn view_subscribed_to_progress_sees_fresh_derivations() {
        let store = StateStore::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (sink, is_syncing) = (Arc::clone(&seen), store.derived().is_syncing.clone());
        let _sub = store.progress().subscribe(move |p: &Progress| {
            sink.lock().unwrap().push((p.is_absent(), *is_syncing.get()));
        });

        store
            .progress
            .set(Progress::Reported(snapshot(ProgressStatus::Syncing)));
        assert_eq!(*seen.lock().unwrap(), vec![(true, false), (false, true)]);
    }

    #[test]
    fn peer_derivations() {
        let mut paired = Peer::new("a", "Desktop", PeerStatus::Online);
        paired.paired = true;
        let store = store_with_peers(vec![
            paired,
            Peer::new("b", "Phone", PeerStatus::Offline),
            Peer::new("c", "Tablet", PeerStatus::Pairing),
        ]);
        let d = store.derived();
        assert_eq!(*d.online_peer_count.get(), 2);
        let ids: Vec<String> = d.paired_peers.get().keys().map(ToString::to_string).collect();
        assert_eq!(ids, ["a"]);
    }

    #[test]
    fn unreachable_folder_pairs_follow_both_cells() {
        let store = store_with_peers(vec![
            Peer::new("a", "Desktop", PeerStatus::Online),
            Peer::new("b", "Phone", PeerStatus::Offline),
        ]);
        let pair = |id: &str, peer: &str| FolderPair::new(id, peer, "/local", "/remote");
        store.folder_pairs.set(
            FolderPairSet::try_from_vec(vec![
                pair("fp-1", "a"),
                pair("fp-2", "b"),
                pair("fp-3", "gone"),
            ])
            .unwrap(),
        );
        let unreachable = &store.derived().unreachable_folder_pairs;
        assert_eq!(
            *unreachable.get(),
            vec![FolderPairId::from("fp-2"), FolderPairId::from("fp-3")]
        );

        store.peers.set(
            PeerSet::try_from_vec(vec![
                Peer::new("a", "Desktop", PeerStatus::Offline),
                Peer::new("b", "Phone", PeerStatus::Online),
            ])
            .unwrap(),
        );
        assert_eq!(
            *unreachable.get(),
            vec![FolderPairId::from("fp-1"), FolderPairId::from("fp-3")]
        );
    }

    #[test]
    fn start_pairing_sets_code_and_target_together() {
        let store = store_with_peers(vec![Peer::new("a", "Desktop", PeerStatus::Online)]);
        store.start_pairing(" ABC-123 ", Some(&"a".into())).unwrap();

        let session = store.pairing().get();
        assert_eq!(session.code().unwrap().as_str(), "ABC-123");
        assert_eq!(session.target().unwrap().name, "Desktop");
        assert!(*store.derived().is_pairing.get());

        assert!(store.clear_pairing());
        assert!(!store.clear_pairing());
        assert!(store.pairing().get().code().is_none());
        assert!(!*store.derived().is_pairing.get());
    }

    #[test]
    fn invalid_pairing_leaves_session_untouched() {
        let store = store_with_peers(vec![]);
        let err = store.start_pairing("   ", None).unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "code"));

        let err = store.start_pairing("ABC", Some(&"ghost".into())).unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "target"));
        assert_eq!(*store.pairing().get(), PairingSession::Idle);
    }

    #[test]
    fn clear_pairing_waits_for_a_pairing_round_on_another_thread() {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let store = Arc::new(StateStore::default());
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let _slow_view = store.pairing().subscribe(move |s: &PairingSession| {
            if s.is_pairing() {
                entered_tx.send(()).unwrap();
                let _ = release_rx.lock().unwrap().recv_timeout(Duration::from_secs(5));
            }
        });

        let backend = Arc::clone(&store);
        let pairing = thread::spawn(move || backend.start_pairing("ABC-123", None).unwrap());
        entered_rx.recv().unwrap();
        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            let _ = release_tx.send(());
        });

        assert!(store.clear_pairing());
        assert!(!store.pairing().get().is_pairing());
        assert!(!*store.derived().is_pairing.get());

        pairing.join().unwrap();
        releaser.join().unwrap();
    }

    #[test]
    fn submit_config_validates_first() {
        let store = StateStore::default();
        let mut draft = AppConfig {
            device_name: "Laptop".into(),
            ..AppConfig::default()
        };
        draft.sync_interval_mins = 61;
        assert!(store.submit_config(draft.clone()).is_err());
        assert_eq!(*store.config().get(), AppConfig::default());

        draft.sync_interval_mins = 15;
        store.submit_config(draft.clone()).unwrap();
        assert_eq!(*store.config().get(), draft);
    }

    #[test]
    #[allow(deprecated)]
    fn transfer_progress_is_the_progress_cell() {
        let store = StateStore::default();
        assert!(store.transfer_progress().same_cell(&store.progress()));
    }

    #[test]
    fn dependency_graph_lists_upstreams() {
        let store = StateStore::default();
        let graph = store.dependency_graph();
        assert_eq!(graph.len(), 11);
        assert_eq!(graph[0].name, "formatted_speed");
        assert_eq!(graph[0].upstream, ["progress"]);

        let unreachable = graph
            .iter()
            .find(|n| n.name == "unreachable_folder_pairs")
            .unwrap();
        assert_eq!(unreachable.upstream, ["peers", "folder_pairs"]);
        let pairing = graph.iter().find(|n| n.name == "is_pairing").unwrap();
        assert_eq!(pairing.upstream, ["pairing"]);
    }

    #[test]
    fn snapshot_serializes_every_cell() {
        let store = StateStore::default();
        let json = serde_json::to_value(store.snapshot()).unwrap();
        for key in [
            "tab", "peers", "folderPairs", "syncStatus", "progress", "fileTransfer", "events",
            "config", "pairing", "modal",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["tab"], "peers");
        assert!(json["progress"].is_null());
    }
}
