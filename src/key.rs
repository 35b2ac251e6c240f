//! Key status reporting.
//!
//! Status names follow the EME `MediaKeyStatus` strings (e.g. `expired`).

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{Error, Result};

/// Usability of a single key within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyStatus {
    Usable,
    Expired,
    Released,
    OutputRestricted,
    OutputDownscaled,
    StatusPending,
    InternalError,
}

impl KeyStatus {
    /// Protocol string for this status.
    pub fn as_str_name(self) -> &'static str {
        match self {
            KeyStatus::Usable => "usable",
            KeyStatus::Expired => "expired",
            KeyStatus::Released => "released",
            KeyStatus::OutputRestricted => "output-restricted",
            KeyStatus::OutputDownscaled => "output-downscaled",
            KeyStatus::StatusPending => "status-pending",
            KeyStatus::InternalError => "internal-error",
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str_name())
    }
}

impl FromStr for KeyStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "usable" => Ok(KeyStatus::Usable),
            "expired" => Ok(KeyStatus::Expired),
            "released" => Ok(KeyStatus::Released),
            "output-restricted" => Ok(KeyStatus::OutputRestricted),
            "output-downscaled" => Ok(KeyStatus::OutputDownscaled),
            "status-pending" => Ok(KeyStatus::StatusPending),
            "internal-error" => Ok(KeyStatus::InternalError),
            other => Err(Error::DecodeError(format!("Unknown key status: {}", other))),
        }
    }
}

/// One entry of a session's key-status map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStatusEntry {
    /// Raw key id as reported by the platform.
    pub key_id: Vec<u8>,
    pub status: KeyStatus,
}

impl KeyStatusEntry {
    pub fn new(key_id: impl Into<Vec<u8>>, status: KeyStatus) -> Self {
        Self {
            key_id: key_id.into(),
            status,
        }
    }

    /// Key id as a UUID. 16-byte ids map directly, anything else is nil.
    pub fn kid(&self) -> Uuid {
        Uuid::from_slice(&self.key_id).unwrap_or_else(|_| Uuid::nil())
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyStatus, KeyStatusEntry};
    use uuid::Uuid;

    #[test]
    fn status_names_roundtrip() {
        for status in [
            KeyStatus::Usable,
            KeyStatus::Expired,
            KeyStatus::Released,
            KeyStatus::OutputRestricted,
            KeyStatus::OutputDownscaled,
            KeyStatus::StatusPending,
            KeyStatus::InternalError,
        ] {
            let parsed: KeyStatus = status.as_str_name().parse().expect("parse status");
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<KeyStatus>().is_err());
    }

    #[test]
    fn kid_from_key_id() {
        let kid = Uuid::new_v4();
        let entry = KeyStatusEntry::new(kid.as_bytes().to_vec(), KeyStatus::Usable);
        assert_eq!(entry.kid(), kid);
        assert_eq!(KeyStatusEntry::new(vec![1, 2], KeyStatus::Usable).kid(), Uuid::nil());
    }
}
