// ── Application configuration as reported by the backend ──
//
// This is the *backend's* configuration mirrored into the UI. The client's
// own settings (log capacity, initial tab) live in `StoreConfig`.

use serde::{Deserialize, Serialize};

use super::ids::DeviceId;
use crate::error::CoreError;

pub const DEFAULT_PORT: u16 = 52525;
pub const DEFAULT_SYNC_INTERVAL_MINS: u32 = 5;
/// Upper bound accepted from the settings form.
pub const MAX_SYNC_INTERVAL_MINS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub device_id: DeviceId,
    #[serde(default)]
    pub device_name: String,
    pub port: u16,
    pub sync_interval_mins: u32,
    #[serde(default, deserialize_with = "super::wire::null_as_empty")]
    pub global_exclusions: Vec<String>,
    #[serde(default)]
    pub auto_sync: bool,
    #[serde(default)]
    pub start_on_login: bool,
    #[serde(default)]
    pub show_notifications: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_id: DeviceId::default(),
            device_name: String::new(),
            port: DEFAULT_PORT,
            sync_interval_mins: DEFAULT_SYNC_INTERVAL_MINS,
            global_exclusions: Vec::new(),
            auto_sync: true,
            start_on_login: false,
            show_notifications: true,
        }
    }
}

impl AppConfig {
    /// Structural invariants every stored config satisfies, whichever side
    /// produced it.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.port == 0 {
            return Err(CoreError::validation("port", "must be between 1 and 65535"));
        }
        if self.sync_interval_mins == 0 {
            return Err(CoreError::validation(
                "syncIntervalMins",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Stricter checks applied to edits coming from the settings form
    /// before they are written to the config cell.
    pub fn validate_draft(&self) -> Result<(), CoreError> {
        self.validate()?;
        if self.sync_interval_mins > MAX_SYNC_INTERVAL_MINS {
            return Err(CoreError::validation(
                "syncIntervalMins",
                format!("must be between 1 and {MAX_SYNC_INTERVAL_MINS} minutes"),
            ));
        }
        if self.device_name.trim().is_empty() {
            return Err(CoreError::validation("deviceName", "cannot be empty"));
        }
        if let Some(idx) = self.global_exclusions.iter().position(|p| p.trim().is_empty()) {
            return Err(CoreError::validation(
                "globalExclusions",
                format!("pattern #{} is blank", idx + 1),
            ));
        }
        Ok(())
    }
}
