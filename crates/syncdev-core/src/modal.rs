// ── Modal/dialog coordinator ──
//
// Sole writer of the modal cell. Opening replaces whatever is showing;
// closing an already-closed modal is a silent no-op.

use serde_json::Value;
use tracing::debug;

use crate::model::{ModalKind, ModalState};
use crate::store::{Cell, ReadOnly};

pub struct ModalCoordinator {
    state: Cell<ModalState>,
}

impl ModalCoordinator {
    pub(crate) fn new() -> Self {
        Self {
            state: Cell::new("modal", ModalState::Closed),
        }
    }

    /// Show a dialog, replacing any dialog already open. Kind and payload
    /// change together in a single notification.
    pub fn open(&self, kind: ModalKind, payload: Option<Value>) {
        debug!(%kind, has_payload = payload.is_some(), "opening modal");
        self.state.set(ModalState::Open { kind, payload });
    }

    /// Close whatever is open. Returns `false` (and notifies no one) if
    /// nothing was open.
    pub fn close(&self) -> bool {
        let closed = self.state.set_if_changed(ModalState::Closed);
        if closed {
            debug!("modal closed");
        }
        closed
    }

    pub fn is_open(&self) -> bool {
        self.state.get().is_open()
    }

    pub fn state(&self) -> ReadOnly<ModalState> {
        self.state.read_only()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(
        modal: &ModalCoordinator,
    ) -> (Arc<Mutex<Vec<ModalState>>>, crate::store::Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = modal
            .state()
            .subscribe(move |s: &ModalState| sink.lock().unwrap().push(s.clone()));
        (seen, sub)
    }

    #[test]
    fn starts_closed() {
        let modal = ModalCoordinator::new();
        assert!(!modal.is_open());
        assert_eq!(*modal.state().get(), ModalState::Closed);
    }

    #[test]
    fn open_sets_kind_and_payload_in_one_notification() {
        let modal = ModalCoordinator::new();
        let (seen, _sub) = record(&modal);

        modal.open(ModalKind::ConfirmDelete, Some(json!({"id": "fp-1"})));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].kind(), Some(ModalKind::ConfirmDelete));
        assert_eq!(seen[1].payload(), Some(&json!({"id": "fp-1"})));
    }

    #[test]
    fn open_over_open_replaces_both() {
        let modal = ModalCoordinator::new();
        modal.open(ModalKind::ConfirmDelete, Some(json!({"id": "fp-1"})));
        modal.open(ModalKind::Settings, None);

        let state = modal.state().get();
        assert_eq!(state.kind(), Some(ModalKind::Settings));
        assert!(state.payload().is_none());
    }

    #[test]
    fn close_is_idempotent() {
        let modal = ModalCoordinator::new();
        let (seen, _sub) = record(&modal);

        modal.open(ModalKind::Pairing, None);
        assert!(modal.close());
        assert!(!modal.close());
        assert!(!modal.close());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ModalState::Closed,
                ModalState::Open {
                    kind: ModalKind::Pairing,
                    payload: None
                },
                ModalState::Closed,
            ]
        );
    }

    #[test]
    fn closing_clears_payload() {
        let modal = ModalCoordinator::new();
        modal.open(ModalKind::EditFolderPair, Some(json!({"id": "fp-2"})));
        modal.close();
        assert!(modal.state().get().payload().is_none());
    }
}
