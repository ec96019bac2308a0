// ── Transfer progress ──
//
// The backend sends complete aggregate snapshots, throttled on its side.
// The client never merges them: each one replaces the previous wholesale.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::CoreError;

/// Lifecycle of an aggregate progress report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProgressStatus {
    Idle,
    Syncing,
    Complete,
}

/// Per-file transfer state inside an aggregate snapshot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileStatus {
    Active,
    Pending,
    Complete,
}

/// Progress of one file currently in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileProgress {
    pub path: String,
    pub size: u64,
    pub transferred: u64,
    pub percentage: f64,
    pub status: FileStatus,
}

/// Raw counters for the sync currently in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub status: ProgressStatus,
    pub total_files: u64,
    pub completed_files: u64,
    #[serde(default)]
    pub total_bytes: u64,
    #[serde(default)]
    pub transferred_bytes: u64,
    pub percentage: f64,
    /// Smoothed speed.
    pub bytes_per_second: f64,
    /// Seconds remaining, `-1` when the backend cannot estimate yet.
    #[serde(rename = "eta")]
    pub eta_secs: i64,
    #[serde(default, deserialize_with = "super::wire::null_as_empty")]
    pub active_files: Vec<FileProgress>,
}

impl ProgressSnapshot {
    /// Check the counters are internally consistent.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.percentage.is_finite() || !(0.0..=100.0).contains(&self.percentage) {
            return Err(CoreError::validation(
                "percentage",
                format!("{} is outside 0-100", self.percentage),
            ));
        }
        if !self.bytes_per_second.is_finite() {
            return Err(CoreError::validation("bytesPerSecond", "must be finite"));
        }
        if self.completed_files > self.total_files {
            return Err(CoreError::validation(
                "completedFiles",
                format!(
                    "{} completed exceeds {} total",
                    self.completed_files, self.total_files
                ),
            ));
        }
        Ok(())
    }
}

/// Contents of the progress cell.
///
/// `Absent` is the "no sync running" state and is deliberately distinct
/// from a snapshot full of zeroes: formatters render it as blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Progress {
    #[default]
    Absent,
    Reported(ProgressSnapshot),
}

impl Progress {
    pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
        match self {
            Self::Absent => None,
            Self::Reported(snap) => Some(snap),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<Option<ProgressSnapshot>> for Progress {
    fn from(snap: Option<ProgressSnapshot>) -> Self {
        snap.map_or(Self::Absent, Self::Reported)
    }
}

/// Legacy per-file progress tick, kept for views that still show a single
/// "current file" line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTransfer {
    pub file_name: String,
    pub total_bytes: u64,
    #[serde(rename = "transferBytes")]
    pub transferred_bytes: u64,
    pub percentage: f64,
    pub bytes_per_second: f64,
}
