//! Standard key-session protocol.
use std::sync::Arc;

use crate::adapter::webkit::WEBKIT_KEY_SYSTEM;
use crate::adapter::{MediaKeysHandle, OpenedSession, ResolvedKeySystem, SessionHandle};
use crate::config::{EmeOptions, KeySystemOptions};
use crate::error::{Error, Result};
use crate::orchestrator::{InitData, ProtocolHint};
use crate::platform::{MediaCapability, MediaKeySystemConfiguration, MediaKeys, StandardPlatform};

/// Init data type used when a signal carries no explicit one.
const DEFAULT_INIT_DATA_TYPE: &str = "cenc";

#[derive(Clone)]
pub struct StandardAdapter {
    platform: Arc<dyn StandardPlatform>,
}

impl StandardAdapter {
    pub fn new(platform: Arc<dyn StandardPlatform>) -> Self {
        Self { platform }
    }

    /// Try every configured key system in order; the first one the
    /// platform grants wins. The WebKit FairPlay identifier belongs to the
    /// legacy API and is never offered here.
    pub async fn is_supported(&self, options: &EmeOptions) -> Result<ResolvedKeySystem> {
        let mut tried = Vec::new();
        for (key_system, ks_options) in options.key_systems.iter() {
            if key_system == WEBKIT_KEY_SYSTEM {
                continue;
            }
            tried.push(key_system.clone());

            let configurations = [configuration_for(ks_options)];
            match self
                .platform
                .request_key_system_access(key_system, &configurations)
                .await
            {
                Ok(access) => {
                    info!("Key system {} accepted", key_system);
                    if !ks_options.has_license_source() {
                        return Err(Error::Configuration(format!(
                            "Key system {} needs a license url or a get_license hook",
                            key_system
                        )));
                    }
                    return Ok(ResolvedKeySystem {
                        key_system: key_system.clone(),
                        options: ks_options.clone(),
                        access: Some(access),
                    });
                }
                Err(e) => {
                    debug!("Key system {} rejected: {}", key_system, e);
                }
            }
        }
        Err(Error::UnsupportedKeySystem(tried))
    }

    pub async fn create_media_keys(
        &self,
        resolved: &ResolvedKeySystem,
        certificate: Option<&[u8]>,
    ) -> Result<MediaKeysHandle> {
        let access = resolved.access.as_ref().ok_or_else(|| {
            Error::KeyManagementCreation(format!("No key system access for {}", resolved.key_system))
        })?;
        let media_keys = self.platform.create_media_keys(access).await?;
        if let Some(certificate) = certificate {
            debug!("Setting {} byte server certificate", certificate.len());
            media_keys.set_server_certificate(certificate).await?;
        }
        self.platform.set_media_keys(media_keys.clone()).await?;
        Ok(MediaKeysHandle::Standard(media_keys))
    }

    pub async fn create_session(&self, keys: &Arc<dyn MediaKeys>, init_data: &InitData) -> Result<OpenedSession> {
        let init_data_type = match &init_data.hint {
            ProtocolHint::InitDataType(t) if !t.is_empty() => t.as_str(),
            _ => DEFAULT_INIT_DATA_TYPE,
        };
        let (session, events) = keys.create_session()?;
        session.generate_request(init_data_type, &init_data.bytes).await?;
        Ok(OpenedSession {
            handle: SessionHandle::Standard(session),
            events,
            content_id: None,
        })
    }
}

/// Requested configuration built from the capability hints.
pub fn configuration_for(options: &KeySystemOptions) -> MediaKeySystemConfiguration {
    let capability = |content_type: &Option<String>, robustness: &Option<String>| {
        content_type.as_ref().map(|content_type| MediaCapability {
            content_type: content_type.clone(),
            robustness: robustness.clone(),
        })
    };

    MediaKeySystemConfiguration {
        audio_capabilities: capability(&options.audio_content_type, &options.audio_robustness)
            .into_iter()
            .collect(),
        video_capabilities: capability(&options.video_content_type, &options.video_robustness)
            .into_iter()
            .collect(),
        persistent_state: options.persistent_state.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{configuration_for, StandardAdapter};
    use crate::config::{EmeOptions, KeySystemOptions};
    use crate::error::ErrorKind;
    use crate::testkit::FakeStandardPlatform;

    #[test]
    fn configuration_carries_hints() {
        let mut options = KeySystemOptions::with_url("u");
        options.video_content_type = Some("video/mp4; codecs=\"avc1.42E01E\"".to_string());
        options.video_robustness = Some("SW_SECURE_CRYPTO".to_string());
        options.persistent_state = Some("optional".to_string());

        let configuration = configuration_for(&options);
        assert!(configuration.audio_capabilities.is_empty());
        assert_eq!(configuration.video_capabilities.len(), 1);
        assert_eq!(
            configuration.video_capabilities[0].robustness.as_deref(),
            Some("SW_SECURE_CRYPTO")
        );
        assert_eq!(configuration.persistent_state.as_deref(), Some("optional"));
    }

    #[tokio::test]
    async fn skips_webkit_identifier() {
        let platform = Arc::new(FakeStandardPlatform::accepting(&["com.apple.fps.1_0", "org.w3.clearkey"]));
        let adapter = StandardAdapter::new(platform.clone());
        let options = EmeOptions::new()
            .with_key_system(
                "com.apple.fps.1_0",
                KeySystemOptions::with_url("u").certificate_uri("c"),
            )
            .with_key_system("org.w3.clearkey", "https://lic.example/ck");

        let resolved = adapter.is_supported(&options).await.expect("clearkey accepted");
        assert_eq!(resolved.key_system, "org.w3.clearkey");
        assert_eq!(platform.access_requests(), vec!["org.w3.clearkey".to_string()]);
    }

    #[tokio::test]
    async fn none_accepted_lists_candidates() {
        let platform = Arc::new(FakeStandardPlatform::accepting(&[]));
        let adapter = StandardAdapter::new(platform);
        let options = EmeOptions::new()
            .with_key_system("com.widevine.alpha", "a")
            .with_key_system("org.w3.clearkey", "b");

        let err = adapter.is_supported(&options).await.expect_err("nothing accepted");
        assert_eq!(err.kind(), ErrorKind::UnsupportedKeySystem);
        assert!(err.to_string().contains("org.w3.clearkey"));
    }
}
