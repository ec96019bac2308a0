// ── Filter predicates for cell streams ──
//
// Used by views to narrow peer sets and the activity log without touching
// the cells themselves.

use crate::model::{FolderPairId, Peer, PeerStatus, SyncEvent, SyncEventKind};

/// Filter predicate for peers.
pub enum PeerFilter {
    All,
    ByStatus(PeerStatus),
    Paired,
    /// Any status other than offline.
    Reachable,
    Custom(Box<dyn Fn(&Peer) -> bool + Send + Sync>),
}

impl PeerFilter {
    pub fn matches(&self, peer: &Peer) -> bool {
        match self {
            Self::All => true,
            Self::ByStatus(status) => peer.status == *status,
            Self::Paired => peer.paired,
            Self::Reachable => peer.status.is_reachable(),
            Self::Custom(f) => f(peer),
        }
    }
}

/// Filter predicate for activity log entries.
pub enum EventFilter {
    All,
    ByKind(SyncEventKind),
    /// Errors and conflicts.
    Problems,
    ForFolderPair(FolderPairId),
    Custom(Box<dyn Fn(&SyncEvent) -> bool + Send + Sync>),
}

impl EventFilter {
    pub fn matches(&self, event: &SyncEvent) -> bool {
        match self {
            Self::All => true,
            Self::ByKind(kind) => event.kind == *kind,
            Self::Problems => matches!(event.kind, SyncEventKind::Error | SyncEventKind::Conflict),
            Self::ForFolderPair(id) => event.folder_pair == id.as_str(),
            Self::Custom(f) => f(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::tests::event;

    #[test]
    fn peer_filters() {
        let mut peer = Peer::new("a", "Laptop", PeerStatus::Syncing);
        assert!(PeerFilter::All.matches(&peer));
        assert!(PeerFilter::Reachable.matches(&peer));
        assert!(PeerFilter::ByStatus(PeerStatus::Syncing).matches(&peer));
        assert!(!PeerFilter::Paired.matches(&peer));

        peer.paired = true;
        peer.status = PeerStatus::Offline;
        assert!(PeerFilter::Paired.matches(&peer));
        assert!(!PeerFilter::Reachable.matches(&peer));
        assert!(PeerFilter::Custom(Box::new(|p| p.name == "Laptop")).matches(&peer));
    }

    #[test]
    fn event_filters() {
        let mut e = event(1);
        assert!(!EventFilter::Problems.matches(&e));
        assert!(EventFilter::ForFolderPair("fp-1".into()).matches(&e));
        assert!(!EventFilter::ForFolderPair("fp-2".into()).matches(&e));

        e.kind = SyncEventKind::Conflict;
        assert!(EventFilter::Problems.matches(&e));
        assert!(EventFilter::ByKind(SyncEventKind::Conflict).matches(&e));
    }
}
