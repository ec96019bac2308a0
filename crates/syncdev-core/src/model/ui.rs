// ── Presentation-side state: navigation and dialogs ──

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Top-level navigation tab. Exactly one is current at any time.
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
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tab {
    #[default]
    Peers,
    Folders,
    Sync,
    Activity,
    Settings,
}

/// Which dialog is showing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ModalKind {
    Pairing,
    AddFolderPair,
    EditFolderPair,
    ConfirmDelete,
    ConfirmUnpair,
    SyncPreview,
    Settings,
}

/// Dialog state. The payload only exists while a dialog is open, so a
/// stale payload can never outlive its dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ModalState {
    #[default]
    Closed,
    Open {
        kind: ModalKind,
        /// Opaque data for the dialog (e.g. the id of the item to delete).
        payload: Option<Value>,
    },
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn kind(&self) -> Option<ModalKind> {
        match self {
            Self::Closed => None,
            Self::Open { kind, .. } => Some(*kind),
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Open {
                payload: Some(data), ..
            } => Some(data),
            _ => None,
        }
    }
}
