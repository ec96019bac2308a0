// ── Device pairing handshake ──

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ids::DeviceId;
use super::peer::Peer;
use crate::error::CoreError;

const MAX_CODE_LEN: usize = 32;

/// Short-lived code shown to (or typed by) the user during pairing.
///
/// Never empty: construction goes through [`PairingCode::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PairingCode(String);

impl PairingCode {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(CoreError::validation("code", "pairing code cannot be empty"));
        }
        if code.len() > MAX_CODE_LEN {
            return Err(CoreError::validation(
                "code",
                format!("pairing code is longer than {MAX_CODE_LEN} characters"),
            ));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(CoreError::validation(
                "code",
                "pairing code may only contain letters, digits and dashes",
            ));
        }
        Ok(Self(code.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transient state of an in-progress pairing handshake.
///
/// The code and the active flag live in the same variant so they can only
/// be set or cleared together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PairingSession {
    #[default]
    Idle,
    Active {
        code: PairingCode,
        target: Option<Arc<Peer>>,
    },
}

impl PairingSession {
    pub fn is_pairing(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn code(&self) -> Option<&PairingCode> {
        match self {
            Self::Idle => None,
            Self::Active { code, .. } => Some(code),
        }
    }

    pub fn target(&self) -> Option<&Peer> {
        match self {
            Self::Active {
                target: Some(peer), ..
            } => Some(peer),
            _ => None,
        }
    }
}

/// Pairing request pushed by the backend when a remote device initiates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingRequest {
    pub from_peer_id: DeviceId,
    #[serde(default)]
    pub from_peer_name: String,
    pub code: String,
    #[serde(default)]
    pub timestamp: i64,
}
