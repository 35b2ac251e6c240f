//! Platform primitives the adapters drive.
//!
//! Each protocol variant has its own primitive set: the standard
//! key-session API ([`StandardPlatform`], [`MediaKeys`],
//! [`MediaKeySession`]) and the two prefixed legacy APIs
//! ([`WebKitPlatform`], [`MsPlatform`]) which share the
//! [`LegacyMediaKeys`] / [`LegacyKeySession`] shape. Hosts implement these
//! over their CDM; tests use in-memory fakes.
//!
//! Sessions report asynchronous platform events through a
//! [`SessionEvents`] channel returned at creation time.
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::key::KeyStatusEntry;

/// Receiving side of a session's platform events.
pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;

/// Sending side handed to platform implementations.
pub type SessionEventSender = mpsc::UnboundedSender<SessionEvent>;

/// Create a session event channel.
pub fn session_events() -> (SessionEventSender, SessionEvents) {
    mpsc::unbounded_channel()
}

/// Kind of a key message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    LicenseRequest,
    LicenseRenewal,
    LicenseRelease,
    IndividualizationRequest,
}

/// Asynchronous event raised by a platform key session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Key message to forward to a license server.
    Message {
        message_type: MessageType,
        message: Vec<u8>,
        /// Server URL embedded in the message (MS PlayReady).
        destination_url: Option<String>,
    },
    /// Key statuses changed (standard API).
    KeyStatusesChange(Vec<KeyStatusEntry>),
    /// Key added to the session (legacy APIs).
    KeyAdded,
    /// Key error (legacy APIs).
    KeyError { code: u16, system_code: u32 },
}

impl SessionEvent {
    /// License request message without destination URL.
    pub fn license_request(message: impl Into<Vec<u8>>) -> Self {
        SessionEvent::Message {
            message_type: MessageType::LicenseRequest,
            message: message.into(),
            destination_url: None,
        }
    }
}

/// Content type and robustness of one media capability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaCapability {
    pub content_type: String,
    pub robustness: Option<String>,
}

/// Requested (or granted) configuration of a key system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaKeySystemConfiguration {
    pub audio_capabilities: Vec<MediaCapability>,
    pub video_capabilities: Vec<MediaCapability>,
    pub persistent_state: Option<String>,
}

/// Granted access to a key system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySystemAccess {
    pub key_system: String,
    pub configuration: MediaKeySystemConfiguration,
}

/// Standard key-session API of a playback surface.
#[async_trait]
pub trait StandardPlatform: Send + Sync {
    /// Ask whether the key system is available with one of the
    /// configurations. An error means rejection.
    async fn request_key_system_access(
        &self,
        key_system: &str,
        configurations: &[MediaKeySystemConfiguration],
    ) -> Result<KeySystemAccess>;

    /// Create the key-management object for granted access.
    async fn create_media_keys(&self, access: &KeySystemAccess) -> Result<Arc<dyn MediaKeys>>;

    /// Attach the key-management object to the playback surface.
    async fn set_media_keys(&self, media_keys: Arc<dyn MediaKeys>) -> Result<()>;
}

/// Standard key-management object.
#[async_trait]
pub trait MediaKeys: Send + Sync {
    async fn set_server_certificate(&self, certificate: &[u8]) -> Result<()>;

    fn create_session(&self) -> Result<(Box<dyn MediaKeySession>, SessionEvents)>;
}

/// Standard key session.
#[async_trait]
pub trait MediaKeySession: Send + Sync {
    async fn generate_request(&self, init_data_type: &str, init_data: &[u8]) -> Result<()>;

    async fn update(&self, response: &[u8]) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// WebKit-prefixed key API (FairPlay).
pub trait WebKitPlatform: Send + Sync {
    fn is_type_supported(&self, key_system: &str, content_type: &str) -> bool;

    /// Create a key-management object and assign it to the surface.
    fn set_media_keys(&self, key_system: &str) -> Result<Arc<dyn LegacyMediaKeys>>;
}

/// MS-prefixed key API (PlayReady).
pub trait MsPlatform: Send + Sync {
    /// Create a key-management object and assign it to the surface.
    fn set_media_keys(&self, key_system: &str) -> Result<Arc<dyn LegacyMediaKeys>>;
}

/// Legacy key-management object.
pub trait LegacyMediaKeys: Send + Sync {
    fn create_session(
        &self,
        content_type: &str,
        init_data: &[u8],
    ) -> Result<(Box<dyn LegacyKeySession>, SessionEvents)>;
}

/// Legacy key session.
pub trait LegacyKeySession: Send + Sync {
    fn update(&self, key: &[u8]) -> Result<()>;

    fn close(&self);
}

/// The primitives available on one playback surface.
#[derive(Clone, Default)]
pub struct Platform {
    pub standard: Option<Arc<dyn StandardPlatform>>,
    pub webkit: Option<Arc<dyn WebKitPlatform>>,
    pub ms: Option<Arc<dyn MsPlatform>>,
}

impl Platform {
    pub fn standard(platform: Arc<dyn StandardPlatform>) -> Self {
        Self {
            standard: Some(platform),
            ..Default::default()
        }
    }

    pub fn webkit(platform: Arc<dyn WebKitPlatform>) -> Self {
        Self {
            webkit: Some(platform),
            ..Default::default()
        }
    }

    pub fn ms(platform: Arc<dyn MsPlatform>) -> Self {
        Self {
            ms: Some(platform),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("standard", &self.standard.is_some())
            .field("webkit", &self.webkit.is_some())
            .field("ms", &self.ms.is_some())
            .finish()
    }
}
