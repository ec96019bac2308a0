// ── Derived view state ──
//
// Every value here is a pure function of one or two primitive cells. They
// are built once, before any view can subscribe, so each recomputes ahead
// of view subscribers on the same upstream.

use serde::Serialize;

use super::cell::{Cell, Observable};
use super::derived::Derived;
use crate::format::{format_eta, format_file_count, format_speed, format_transfer};
use crate::model::{
    FileProgress, FolderPairId, FolderPairSet, PairingSession, PeerSet, PeerStatus, Progress,
    ProgressStatus,
};
use crate::stream::PeerFilter;

/// One node of the derivation graph: a derived value and the cells it reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub name: &'static str,
    pub upstream: Vec<&'static str>,
}

/// Read-only values computed from the primitive cells.
pub struct Derivations {
    // ── Progress ─────────────────────────────────────────────────
    pub formatted_speed: Derived<String>,
    pub formatted_eta: Derived<String>,
    pub file_count_progress: Derived<String>,
    pub formatted_transfer: Derived<String>,
    pub is_syncing: Derived<bool>,
    pub overall_percentage: Derived<f64>,
    pub active_files: Derived<Vec<FileProgress>>,

    // ── Peers & folders ──────────────────────────────────────────
    pub paired_peers: Derived<PeerSet>,
    pub online_peer_count: Derived<usize>,
    pub unreachable_folder_pairs: Derived<Vec<FolderPairId>>,

    // ── Pairing ──────────────────────────────────────────────────
    pub is_pairing: Derived<bool>,
}

impl Derivations {
    pub(crate) fn new(
        progress: &Cell<Progress>,
        peers: &Cell<PeerSet>,
        folder_pairs: &Cell<FolderPairSet>,
        pairing: &Cell<PairingSession>,
    ) -> Self {
        Self {
            formatted_speed: Derived::new("formatted_speed", progress, |p: &Progress| {
                p.snapshot()
                    .map(|s| format_speed(s.bytes_per_second))
                    .unwrap_or_default()
            }),
            formatted_eta: Derived::new("formatted_eta", progress, |p: &Progress| {
                p.snapshot()
                    .map(|s| format_eta(s.eta_secs))
                    .unwrap_or_default()
            }),
            file_count_progress: Derived::new("file_count_progress", progress, |p: &Progress| {
                p.snapshot()
                    .map(|s| format_file_count(s.completed_files, s.total_files))
                    .unwrap_or_default()
            }),
            formatted_transfer: Derived::new("formatted_transfer", progress, |p: &Progress| {
                p.snapshot()
                    .map(|s| format_transfer(s.transferred_bytes, s.total_bytes))
                    .unwrap_or_default()
            }),
            is_syncing: Derived::new("is_syncing", progress, |p: &Progress| {
                p.snapshot()
                    .is_some_and(|s| s.status == ProgressStatus::Syncing)
            }),
            overall_percentage: Derived::new("overall_percentage", progress, |p: &Progress| {
                p.snapshot().map_or(0.0, |s| s.percentage)
            }),
            active_files: Derived::new("active_files", progress, |p: &Progress| {
                p.snapshot()
                    .map(|s| s.active_files.clone())
                    .unwrap_or_default()
            }),

            paired_peers: Derived::new("paired_peers", peers, |set: &PeerSet| {
                let filter = PeerFilter::Paired;
                set.filtered(|p| filter.matches(p))
            }),
            online_peer_count: Derived::new("online_peer_count", peers, |set: &PeerSet| {
                let filter = PeerFilter::Reachable;
                set.iter().filter(|p| filter.matches(p)).count()
            }),
            unreachable_folder_pairs: Derived::combine(
                "unreachable_folder_pairs",
                peers,
                folder_pairs,
                |peers: &PeerSet, pairs: &FolderPairSet| {
                    pairs
                        .iter()
                        .filter(|fp| {
                            peers
                                .get(&fp.peer_id)
                                .is_none_or(|p| p.status == PeerStatus::Offline)
                        })
                        .map(|fp| fp.id.clone())
                        .collect()
                },
            ),

            is_pairing: Derived::new("is_pairing", pairing, PairingSession::is_pairing),
        }
    }

    /// Derived values in registration order, each with its upstream cells.
    pub fn graph(&self) -> Vec<GraphNode> {
        fn node<T: PartialEq + Send + Sync + 'static>(d: &Derived<T>) -> GraphNode {
            GraphNode {
                name: d.name(),
                upstream: d.upstream().to_vec(),
            }
        }

        vec![
            node(&self.formatted_speed),
            node(&self.formatted_eta),
            node(&self.file_count_progress),
            node(&self.formatted_transfer),
            node(&self.is_syncing),
            node(&self.overall_percentage),
            node(&self.active_files),
            node(&self.paired_peers),
            node(&self.online_peer_count),
            node(&self.unreachable_folder_pairs),
            node(&self.is_pairing),
        ]
    }
}
