//! Per-surface session bookkeeping.
//!
//! The registry maps init-data fingerprints to the session acquiring keys
//! for them, scoped to the active media source. Fingerprints compare by
//! byte content, so the same init data arriving in different buffers from
//! different code paths is still recognised as a duplicate.
use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::codec::preview;
use crate::session::{SessionId, SessionState};

/// Byte content of initialization data, used for deduplication.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Fingerprint {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Fingerprint {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", preview(&self.0))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&preview(&self.0))
    }
}

/// Registry entry for one fingerprint.
#[derive(Debug, Clone, Copy)]
pub struct SessionEntry {
    pub id: SessionId,
    pub state: SessionState,
}

/// Sessions of the active source, keyed by fingerprint.
///
/// Every source change bumps `epoch`; work started under an older epoch
/// can no longer remove entries.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    active_source: Option<String>,
    epoch: u64,
    sessions: HashMap<Fingerprint, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_session(&self, fingerprint: &Fingerprint) -> bool {
        self.sessions.contains_key(fingerprint)
    }

    /// Register a new idle session. Returns `false` if the fingerprint is
    /// already present, leaving the existing entry untouched.
    pub fn add_session(&mut self, fingerprint: Fingerprint, id: SessionId) -> bool {
        if self.sessions.contains_key(&fingerprint) {
            return false;
        }
        self.sessions.insert(
            fingerprint,
            SessionEntry {
                id,
                state: SessionState::Idle,
            },
        );
        true
    }

    pub fn remove_session(&mut self, fingerprint: &Fingerprint) -> Option<SessionEntry> {
        self.sessions.remove(fingerprint)
    }

    /// Remove an entry on behalf of work started in `epoch`, only if the
    /// source has not changed since and the entry still belongs to `id`.
    pub fn remove_if_current(&mut self, fingerprint: &Fingerprint, id: SessionId, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }
        match self.sessions.get(fingerprint) {
            Some(entry) if entry.id == id => {
                self.sessions.remove(fingerprint);
                true
            }
            _ => false,
        }
    }

    /// Record the latest state of a session, ignoring stale epochs.
    pub fn set_state(&mut self, fingerprint: &Fingerprint, id: SessionId, epoch: u64, state: SessionState) {
        if epoch != self.epoch {
            return;
        }
        if let Some(entry) = self.sessions.get_mut(fingerprint) {
            if entry.id == id {
                entry.state = state;
            }
        }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&SessionEntry> {
        self.sessions.get(fingerprint)
    }

    /// Clear all sessions when `source` differs from the recorded one.
    ///
    /// Returns `true` when a reset happened.
    pub fn reset_for_source(&mut self, source: &str) -> bool {
        if self.active_source.as_deref() == Some(source) {
            return false;
        }
        if let Some(previous) = self.active_source.as_deref() {
            debug!(
                "source changed from {} to {}, dropping {} sessions",
                previous,
                source,
                self.sessions.len()
            );
        }
        self.active_source = Some(source.to_string());
        self.epoch += 1;
        self.sessions.clear();
        true
    }

    pub fn active_source(&self) -> Option<&str> {
        self.active_source.as_deref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// FIFO of work waiting for the key-management object.
///
/// Append-only until drained; once drained it stays empty for good and
/// refuses further pushes.
#[derive(Debug)]
pub struct PendingQueue<T> {
    entries: VecDeque<T>,
    drained: bool,
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            drained: false,
        }
    }
}

impl<T> PendingQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Hands it back if the queue was already drained.
    pub fn push(&mut self, entry: T) -> std::result::Result<(), T> {
        if self.drained {
            return Err(entry);
        }
        self.entries.push_back(entry);
        Ok(())
    }

    /// Take every entry in arrival order and close the queue.
    pub fn drain(&mut self) -> Vec<T> {
        self.drained = true;
        self.entries.drain(..).collect()
    }

    /// Take every entry without closing the queue (failed creation or
    /// source change).
    pub fn take(&mut self) -> Vec<T> {
        self.entries.drain(..).collect()
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
