// syncdev-core: Reactive client state layer between the SyncDev backend and its views.

pub mod error;
pub mod format;
pub mod modal;
pub mod model;
pub mod sink;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use modal::ModalCoordinator;
pub use sink::{
    BackendEvent, RawEvent, SinkHandle, SinkStats, UpdateSink, sink_channel, spawn_update_sink,
};
pub use store::{
    Cell, Derivations, Derived, GraphNode, Observable, ReadOnly, StateStore, StoreConfig,
    StoreSnapshot, Subscription,
};
pub use stream::{CellStream, EventFilter, PeerFilter};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Entities
    AppConfig, DeviceId, FolderPair, FolderPairId, FolderPairSet, Peer, PeerSet, PeerStatus,
    // Sync activity
    EventLog, FileProgress, FileStatus, FileTransfer, Progress, ProgressSnapshot, ProgressStatus,
    SyncEvent, SyncEventKind, SyncState, SyncStatus,
    // Pairing & presentation
    ModalKind, ModalState, PairingCode, PairingSession, Tab,
};
