//! Key-system adapters.
//!
//! One adapter per protocol variant, selected once per playback surface
//! from the hint of the first need-key signal. Every variant exposes the
//! same capability set; the orchestrator never needs to know which one it
//! is driving beyond [`KeySystemAdapter::supports_concurrent_sessions`].
use std::sync::Arc;

use crate::config::{EmeOptions, KeySystemOptions};
use crate::error::{Error, Result};
use crate::key::KeyStatusEntry;
use crate::license::{LicenseExchange, LicenseRequest};
use crate::orchestrator::{InitData, ProtocolHint};
use crate::platform::{
    KeySystemAccess, LegacyKeySession, LegacyMediaKeys, MediaKeySession, MediaKeys, MessageType, Platform,
    SessionEvent, SessionEvents,
};

pub mod ms;
pub mod standard;
pub mod webkit;

pub use ms::MsAdapter;
pub use standard::StandardAdapter;
pub use webkit::WebKitAdapter;

/// Protocol variant of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Standard,
    WebKit,
    Ms,
}

impl AdapterKind {
    /// Variant that handles need-key signals carrying `hint`.
    pub fn for_hint(hint: &ProtocolHint) -> Self {
        match hint {
            ProtocolHint::InitDataType(_) => AdapterKind::Standard,
            ProtocolHint::WebKitNeedKey => AdapterKind::WebKit,
            ProtocolHint::MsNeedKey => AdapterKind::Ms,
        }
    }
}

/// Key system accepted for a surface, with the options it was configured
/// with.
#[derive(Debug, Clone)]
pub struct ResolvedKeySystem {
    pub key_system: String,
    pub options: KeySystemOptions,
    /// Granted access (standard API only).
    pub access: Option<KeySystemAccess>,
}

/// Platform key-management object of a surface.
#[derive(Clone)]
pub enum MediaKeysHandle {
    Standard(Arc<dyn MediaKeys>),
    Legacy(Arc<dyn LegacyMediaKeys>),
}

impl std::fmt::Debug for MediaKeysHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKeysHandle::Standard(_) => f.write_str("MediaKeysHandle::Standard"),
            MediaKeysHandle::Legacy(_) => f.write_str("MediaKeysHandle::Legacy"),
        }
    }
}

/// Platform key session.
pub enum SessionHandle {
    Standard(Box<dyn MediaKeySession>),
    Legacy(Box<dyn LegacyKeySession>),
}

impl SessionHandle {
    /// Hand license bytes to the platform session.
    pub async fn update(&self, license: &[u8]) -> Result<Confirmation> {
        match self {
            SessionHandle::Standard(session) => {
                session.update(license).await?;
                Ok(Confirmation::Applied)
            }
            SessionHandle::Legacy(session) => {
                session.update(license)?;
                Ok(Confirmation::AwaitKeyAdded)
            }
        }
    }

    pub async fn close(&self) -> Result<()> {
        match self {
            SessionHandle::Standard(session) => session.close().await,
            SessionHandle::Legacy(session) => {
                session.close();
                Ok(())
            }
        }
    }
}

/// A freshly created platform session.
pub struct OpenedSession {
    pub handle: SessionHandle,
    pub events: SessionEvents,
    /// Content id the session was created with (WebKit FairPlay).
    pub content_id: Option<String>,
}

/// How the platform reports that a license was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The keys are usable as soon as the update resolves.
    Applied,
    /// Usability is signalled later by a `KeyAdded` event.
    AwaitKeyAdded,
}

/// Platform event routed to the adapter operation that handles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    LicenseRequest {
        message: Vec<u8>,
        destination_url: Option<String>,
    },
    KeysUsable,
    KeyStatuses(Vec<KeyStatusEntry>),
    KeyError {
        code: u16,
        system_code: u32,
    },
    Ignored,
}

/// Closed set of protocol adapters.
#[derive(Clone)]
pub enum KeySystemAdapter {
    Standard(StandardAdapter),
    WebKit(WebKitAdapter),
    Ms(MsAdapter),
}

impl KeySystemAdapter {
    /// Adapter for `kind` if the platform offers its primitives.
    pub fn for_kind(kind: AdapterKind, platform: &Platform) -> Option<Self> {
        match kind {
            AdapterKind::Standard => platform
                .standard
                .clone()
                .map(|p| KeySystemAdapter::Standard(StandardAdapter::new(p))),
            AdapterKind::WebKit => platform
                .webkit
                .clone()
                .map(|p| KeySystemAdapter::WebKit(WebKitAdapter::new(p))),
            AdapterKind::Ms => platform.ms.clone().map(|p| KeySystemAdapter::Ms(MsAdapter::new(p))),
        }
    }

    pub fn kind(&self) -> AdapterKind {
        match self {
            KeySystemAdapter::Standard(_) => AdapterKind::Standard,
            KeySystemAdapter::WebKit(_) => AdapterKind::WebKit,
            KeySystemAdapter::Ms(_) => AdapterKind::Ms,
        }
    }

    /// Pick the key system this adapter will use, or fail with
    /// [`Error::UnsupportedKeySystem`].
    pub async fn is_supported(&self, options: &EmeOptions) -> Result<ResolvedKeySystem> {
        match self {
            KeySystemAdapter::Standard(adapter) => adapter.is_supported(options).await,
            KeySystemAdapter::WebKit(adapter) => adapter.is_supported(options),
            KeySystemAdapter::Ms(adapter) => adapter.is_supported(options),
        }
    }

    /// Fetch the server certificate if the variant uses one.
    pub async fn prepare_certificate(
        &self,
        exchange: &LicenseExchange,
        resolved: &ResolvedKeySystem,
    ) -> Result<Option<Vec<u8>>> {
        match self {
            KeySystemAdapter::Standard(_) => {
                exchange
                    .fetch_certificate(&resolved.key_system, &resolved.options)
                    .await
            }
            KeySystemAdapter::WebKit(adapter) => adapter.prepare_certificate(exchange, resolved).await,
            KeySystemAdapter::Ms(_) => Ok(None),
        }
    }

    /// Create the key-management object and attach it to the surface.
    pub async fn create_media_keys(
        &self,
        resolved: &ResolvedKeySystem,
        certificate: Option<&[u8]>,
    ) -> Result<MediaKeysHandle> {
        let result = match self {
            KeySystemAdapter::Standard(adapter) => adapter.create_media_keys(resolved, certificate).await,
            KeySystemAdapter::WebKit(adapter) => adapter.create_media_keys(resolved),
            KeySystemAdapter::Ms(adapter) => adapter.create_media_keys(resolved),
        };
        result.map_err(|e| match e {
            Error::KeyManagementCreation(_) => e,
            other => Error::KeyManagementCreation(other.to_string()),
        })
    }

    /// Open a platform session for `init_data`.
    pub async fn create_session(
        &self,
        keys: &MediaKeysHandle,
        resolved: &ResolvedKeySystem,
        certificate: Option<&[u8]>,
        init_data: &InitData,
    ) -> Result<OpenedSession> {
        let result = match (self, keys) {
            (KeySystemAdapter::Standard(adapter), MediaKeysHandle::Standard(keys)) => {
                adapter.create_session(keys, init_data).await
            }
            (KeySystemAdapter::WebKit(adapter), MediaKeysHandle::Legacy(keys)) => {
                adapter.create_session(keys, resolved, certificate, init_data)
            }
            (KeySystemAdapter::Ms(adapter), MediaKeysHandle::Legacy(keys)) => adapter.create_session(keys, init_data),
            _ => Err(Error::SessionCreation(
                "key management object does not belong to this adapter".to_string(),
            )),
        };
        result.map_err(|e| match e {
            Error::SessionCreation(_) => e,
            other => Error::SessionCreation(other.to_string()),
        })
    }

    /// Turn a key message into a license request.
    pub fn on_message(
        &self,
        message: Vec<u8>,
        destination_url: Option<String>,
        content_id: Option<String>,
    ) -> LicenseRequest {
        match self {
            KeySystemAdapter::Standard(_) => LicenseRequest::octet_stream(message),
            KeySystemAdapter::WebKit(adapter) => adapter.on_message(message, content_id),
            KeySystemAdapter::Ms(adapter) => adapter.on_message(message, destination_url),
        }
    }

    /// Apply license bytes to a session.
    pub async fn apply_license(&self, session: &SessionHandle, license: &[u8]) -> Result<Confirmation> {
        session.update(license).await.map_err(|e| match e {
            Error::LicenseApplication(_) => e,
            other => Error::LicenseApplication(other.to_string()),
        })
    }

    /// Key statuses carried by `event`, if the variant reports them.
    pub fn on_key_status_change(&self, event: &SessionEvent) -> Option<Vec<KeyStatusEntry>> {
        match (self, event) {
            (KeySystemAdapter::Standard(_), SessionEvent::KeyStatusesChange(entries)) => Some(entries.clone()),
            _ => None,
        }
    }

    /// Route a platform event.
    pub fn classify(&self, event: SessionEvent) -> SessionSignal {
        if let Some(entries) = self.on_key_status_change(&event) {
            return SessionSignal::KeyStatuses(entries);
        }
        let legacy = !matches!(self, KeySystemAdapter::Standard(_));
        match event {
            SessionEvent::Message {
                message_type: MessageType::LicenseRequest,
                message,
                destination_url,
            } => SessionSignal::LicenseRequest {
                message,
                destination_url,
            },
            SessionEvent::Message { message_type, .. } => {
                debug!("ignoring {:?} message", message_type);
                SessionSignal::Ignored
            }
            SessionEvent::KeyAdded if legacy => SessionSignal::KeysUsable,
            SessionEvent::KeyAdded | SessionEvent::KeyStatusesChange(_) => SessionSignal::Ignored,
            SessionEvent::KeyError { code, system_code } => SessionSignal::KeyError { code, system_code },
        }
    }

    /// Whether several sessions may be in flight on one key-management
    /// object.
    pub fn supports_concurrent_sessions(&self) -> bool {
        !matches!(self, KeySystemAdapter::WebKit(_))
    }

    pub async fn close_session(&self, session: &SessionHandle) -> Result<()> {
        session.close().await
    }
}

impl std::fmt::Debug for KeySystemAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeySystemAdapter::{:?}", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{AdapterKind, KeySystemAdapter, SessionSignal};
    use crate::key::{KeyStatus, KeyStatusEntry};
    use crate::orchestrator::ProtocolHint;
    use crate::platform::{MessageType, Platform, SessionEvent};
    use crate::testkit::{FakeLegacyPlatform, FakeStandardPlatform};

    #[test]
    fn hint_selects_variant() {
        assert_eq!(
            AdapterKind::for_hint(&ProtocolHint::InitDataType("cenc".to_string())),
            AdapterKind::Standard
        );
        assert_eq!(AdapterKind::for_hint(&ProtocolHint::WebKitNeedKey), AdapterKind::WebKit);
        assert_eq!(AdapterKind::for_hint(&ProtocolHint::MsNeedKey), AdapterKind::Ms);
    }

    #[test]
    fn missing_primitives_yield_no_adapter() {
        let platform = Platform::standard(Arc::new(FakeStandardPlatform::accepting(&["org.w3.clearkey"])));
        assert!(KeySystemAdapter::for_kind(AdapterKind::Standard, &platform).is_some());
        assert!(KeySystemAdapter::for_kind(AdapterKind::WebKit, &platform).is_none());
        assert!(KeySystemAdapter::for_kind(AdapterKind::Ms, &platform).is_none());
    }

    #[test]
    fn classification_depends_on_variant() {
        let standard = KeySystemAdapter::for_kind(
            AdapterKind::Standard,
            &Platform::standard(Arc::new(FakeStandardPlatform::accepting(&[]))),
        )
        .expect("standard adapter");
        let webkit = KeySystemAdapter::for_kind(
            AdapterKind::WebKit,
            &Platform::webkit(Arc::new(FakeLegacyPlatform::webkit())),
        )
        .expect("webkit adapter");

        let statuses = SessionEvent::KeyStatusesChange(vec![KeyStatusEntry::new(vec![1], KeyStatus::Usable)]);
        assert!(matches!(standard.classify(statuses.clone()), SessionSignal::KeyStatuses(_)));
        assert_eq!(webkit.classify(statuses), SessionSignal::Ignored);

        assert_eq!(standard.classify(SessionEvent::KeyAdded), SessionSignal::Ignored);
        assert_eq!(webkit.classify(SessionEvent::KeyAdded), SessionSignal::KeysUsable);

        let renewal = SessionEvent::Message {
            message_type: MessageType::LicenseRenewal,
            message: vec![1],
            destination_url: None,
        };
        assert_eq!(standard.classify(renewal), SessionSignal::Ignored);
        assert_eq!(
            webkit.classify(SessionEvent::KeyError { code: 3, system_code: 7 }),
            SessionSignal::KeyError { code: 3, system_code: 7 }
        );
        assert!(!webkit.supports_concurrent_sessions());
        assert!(standard.supports_concurrent_sessions());
    }
}
