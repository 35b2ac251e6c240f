//! Session state machine.
//!
//! A session moves forward through the acquisition states and never
//! revisits an earlier one. `Failed` is absorbing and reachable from any
//! non-terminal state; `Expired` is only reachable from `Active`.

use std::fmt;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::registry::Fingerprint;

/// Random identifier of an orchestrated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_simple())
    }
}

/// Protocol state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    AccessNegotiated,
    CertificateReady,
    KeysCreated,
    SessionOpen,
    RequestSent,
    LicenseApplied,
    Active,
    Expired,
    Closed,
    Failed,
}

impl SessionState {
    fn rank(self) -> u8 {
        match self {
            SessionState::Idle => 0,
            SessionState::AccessNegotiated => 1,
            SessionState::CertificateReady => 2,
            SessionState::KeysCreated => 3,
            SessionState::SessionOpen => 4,
            SessionState::RequestSent => 5,
            SessionState::LicenseApplied => 6,
            SessionState::Active => 7,
            SessionState::Expired => 8,
            SessionState::Closed => 9,
            SessionState::Failed => u8::MAX,
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// Acquisition states may be skipped forward (a session opened after
    /// the key-management object exists starts past `KeysCreated`), but
    /// `Active`, `Expired` and `Closed` must be entered from their direct
    /// predecessor.
    pub fn can_advance_to(self, next: SessionState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            SessionState::Failed => true,
            SessionState::Active => self == SessionState::LicenseApplied,
            SessionState::Expired => self == SessionState::Active,
            SessionState::Closed => self == SessionState::Expired,
            _ => next.rank() > self.rank() && self.rank() < SessionState::Active.rank(),
        }
    }
}

/// An orchestrated key session for one init-data fingerprint.
///
/// The native handle lives beside this record in the orchestrator; the
/// session itself only carries identity and protocol state.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub fingerprint: Fingerprint,
    /// Key system the session was opened against, once resolved.
    pub key_system: Option<String>,
    state: SessionState,
}

impl Session {
    /// Create a new idle session for the given fingerprint.
    pub fn new(fingerprint: Fingerprint) -> Self {
        Self {
            id: SessionId::new(),
            fingerprint,
            key_system: None,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to `next`, rejecting backwards or out-of-order transitions.
    pub fn advance(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(Error::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        trace!("session {} {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Move to `Failed`. No-op when already terminal.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = SessionState::Failed;
        }
    }
}
