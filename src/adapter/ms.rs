//! MS-prefixed PlayReady protocol.
//!
//! No negotiation and no certificate: the key-management object is
//! assigned synchronously and the session is created straight from the
//! init data. The license target is the configured URL, falling back to
//! the destination URL carried by the key message.
use std::sync::Arc;

use crate::adapter::{MediaKeysHandle, OpenedSession, ResolvedKeySystem, SessionHandle};
use crate::config::EmeOptions;
use crate::error::{Error, Result};
use crate::license::{LicenseRequest, RequestShape};
use crate::orchestrator::InitData;
use crate::platform::{LegacyMediaKeys, MsPlatform};

/// Key system served by the MS-prefixed API.
pub const MS_KEY_SYSTEM: &str = "com.microsoft.playready";

const PLAYREADY_CONTENT_TYPE: &str = "video/mp4";

#[derive(Clone)]
pub struct MsAdapter {
    platform: Arc<dyn MsPlatform>,
}

impl MsAdapter {
    pub fn new(platform: Arc<dyn MsPlatform>) -> Self {
        Self { platform }
    }

    pub fn is_supported(&self, options: &EmeOptions) -> Result<ResolvedKeySystem> {
        let ks_options = options
            .get(MS_KEY_SYSTEM)
            .ok_or_else(|| Error::UnsupportedKeySystem(vec![MS_KEY_SYSTEM.to_string()]))?;
        Ok(ResolvedKeySystem {
            key_system: MS_KEY_SYSTEM.to_string(),
            options: ks_options.clone(),
            access: None,
        })
    }

    pub fn create_media_keys(&self, resolved: &ResolvedKeySystem) -> Result<MediaKeysHandle> {
        let keys = self.platform.set_media_keys(&resolved.key_system)?;
        Ok(MediaKeysHandle::Legacy(keys))
    }

    pub fn create_session(&self, keys: &Arc<dyn LegacyMediaKeys>, init_data: &InitData) -> Result<OpenedSession> {
        let (session, events) = keys.create_session(PLAYREADY_CONTENT_TYPE, &init_data.bytes)?;
        Ok(OpenedSession {
            handle: SessionHandle::Legacy(session),
            events,
            content_id: None,
        })
    }

    pub fn on_message(&self, message: Vec<u8>, destination_url: Option<String>) -> LicenseRequest {
        LicenseRequest {
            message,
            content_id: None,
            destination_url,
            shape: RequestShape::PlayReadyEnvelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{MsAdapter, MS_KEY_SYSTEM};
    use crate::config::{EmeOptions, KeySystemOptions};
    use crate::error::ErrorKind;
    use crate::license::RequestShape;
    use crate::testkit::FakeLegacyPlatform;

    #[test]
    fn supported_only_when_configured() {
        let adapter = MsAdapter::new(Arc::new(FakeLegacyPlatform::ms()));
        let err = adapter
            .is_supported(&EmeOptions::new().with_key_system("com.widevine.alpha", "u"))
            .expect_err("not configured");
        assert_eq!(err.kind(), ErrorKind::UnsupportedKeySystem);

        let resolved = adapter
            .is_supported(&EmeOptions::new().with_key_system(MS_KEY_SYSTEM, KeySystemOptions::default()))
            .expect("configured");
        assert_eq!(resolved.key_system, MS_KEY_SYSTEM);
        assert!(resolved.access.is_none());
    }

    #[test]
    fn message_keeps_destination_url() {
        let adapter = MsAdapter::new(Arc::new(FakeLegacyPlatform::ms()));
        let request = adapter.on_message(vec![1, 2], Some("https://pr.example/lic".to_string()));
        assert_eq!(request.shape, RequestShape::PlayReadyEnvelope);
        assert_eq!(request.destination_url.as_deref(), Some("https://pr.example/lic"));
    }
}
