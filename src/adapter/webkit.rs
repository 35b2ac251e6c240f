//! WebKit-prefixed FairPlay protocol.
//!
//! Sessions are created from a composite payload combining the init data,
//! the content id and the server certificate:
//!
//! ```text
//! [init data][u32 LE id byte length][id as UTF-16LE][u32 LE cert length][cert]
//! ```
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};

use crate::adapter::{MediaKeysHandle, OpenedSession, ResolvedKeySystem, SessionHandle};
use crate::codec::{hostname_from_uri, string_to_utf16le, utf16le_to_string};
use crate::config::EmeOptions;
use crate::error::{Error, Result};
use crate::license::{LicenseExchange, LicenseRequest};
use crate::orchestrator::InitData;
use crate::platform::{LegacyMediaKeys, WebKitPlatform};

/// Key system served by the WebKit-prefixed API.
pub const WEBKIT_KEY_SYSTEM: &str = "com.apple.fps.1_0";

/// Content type passed to the legacy session API.
pub const FAIRPLAY_CONTENT_TYPE: &str = "video/mp4";

#[derive(Clone)]
pub struct WebKitAdapter {
    platform: Arc<dyn WebKitPlatform>,
}

impl WebKitAdapter {
    pub fn new(platform: Arc<dyn WebKitPlatform>) -> Self {
        Self { platform }
    }

    pub fn is_supported(&self, options: &EmeOptions) -> Result<ResolvedKeySystem> {
        let unsupported = || Error::UnsupportedKeySystem(vec![WEBKIT_KEY_SYSTEM.to_string()]);
        let ks_options = options.get(WEBKIT_KEY_SYSTEM).ok_or_else(unsupported)?;
        if !self
            .platform
            .is_type_supported(WEBKIT_KEY_SYSTEM, FAIRPLAY_CONTENT_TYPE)
        {
            return Err(unsupported());
        }
        Ok(ResolvedKeySystem {
            key_system: WEBKIT_KEY_SYSTEM.to_string(),
            options: ks_options.clone(),
            access: None,
        })
    }

    /// Fetch the mandatory certificate.
    pub async fn prepare_certificate(
        &self,
        exchange: &LicenseExchange,
        resolved: &ResolvedKeySystem,
    ) -> Result<Option<Vec<u8>>> {
        if !resolved.options.has_certificate_source() {
            return Err(Error::Configuration(format!(
                "Key system {} needs a certificate_uri or a get_certificate hook",
                resolved.key_system
            )));
        }
        match exchange
            .fetch_certificate(&resolved.key_system, &resolved.options)
            .await?
        {
            Some(certificate) if !certificate.is_empty() => Ok(Some(certificate)),
            _ => Err(Error::CertificateFetch(format!(
                "Empty certificate for {}",
                resolved.key_system
            ))),
        }
    }

    pub fn create_media_keys(&self, resolved: &ResolvedKeySystem) -> Result<MediaKeysHandle> {
        let keys = self.platform.set_media_keys(&resolved.key_system)?;
        Ok(MediaKeysHandle::Legacy(keys))
    }

    pub fn create_session(
        &self,
        keys: &Arc<dyn LegacyMediaKeys>,
        resolved: &ResolvedKeySystem,
        certificate: Option<&[u8]>,
        init_data: &InitData,
    ) -> Result<OpenedSession> {
        let certificate = certificate
            .ok_or_else(|| Error::CertificateFetch("No certificate for FairPlay session".to_string()))?;

        let decoded = utf16le_to_string(&init_data.bytes);
        let content_id = match resolved.options.get_content_id.as_ref() {
            Some(hook) => hook(&decoded),
            None => default_content_id(&decoded),
        };
        debug!("FairPlay content id: {}", content_id);

        let payload = concat_init_data_id_and_certificate(&init_data.bytes, &content_id, certificate);
        let (session, events) = keys.create_session(FAIRPLAY_CONTENT_TYPE, &payload)?;
        Ok(OpenedSession {
            handle: SessionHandle::Legacy(session),
            events,
            content_id: Some(content_id),
        })
    }

    pub fn on_message(&self, message: Vec<u8>, content_id: Option<String>) -> LicenseRequest {
        LicenseRequest {
            content_id,
            ..LicenseRequest::octet_stream(message)
        }
    }
}

/// Hostname of the decoded init data (`skd://<id>`), or empty.
pub fn default_content_id(decoded_init_data: &str) -> String {
    hostname_from_uri(decoded_init_data).unwrap_or_else(|| {
        warn!("No content id found in FairPlay init data");
        String::new()
    })
}

/// Build the composite session payload.
pub fn concat_init_data_id_and_certificate(init_data: &[u8], id: &str, certificate: &[u8]) -> Vec<u8> {
    let id = string_to_utf16le(id);
    let mut payload = Vec::with_capacity(init_data.len() + 8 + id.len() + certificate.len());
    payload.extend_from_slice(init_data);

    let mut length = [0u8; 4];
    LittleEndian::write_u32(&mut length, id.len() as u32);
    payload.extend_from_slice(&length);
    payload.extend_from_slice(&id);

    LittleEndian::write_u32(&mut length, certificate.len() as u32);
    payload.extend_from_slice(&length);
    payload.extend_from_slice(certificate);
    payload
}

/// Split a composite payload whose init data is `init_len` bytes long into
/// its init data, content id and certificate.
pub fn split_init_data_id_and_certificate(payload: &[u8], init_len: usize) -> Result<(Vec<u8>, String, Vec<u8>)> {
    let truncated = || Error::DecodeError(format!("Composite payload truncated ({} bytes)", payload.len()));

    let init_data = payload.get(..init_len).ok_or_else(truncated)?;
    let mut offset = init_len;

    let id_len = payload.get(offset..offset + 4).ok_or_else(truncated)?;
    let id_len = LittleEndian::read_u32(id_len) as usize;
    offset += 4;
    let id = payload.get(offset..offset + id_len).ok_or_else(truncated)?;
    offset += id_len;

    let cert_len = payload.get(offset..offset + 4).ok_or_else(truncated)?;
    let cert_len = LittleEndian::read_u32(cert_len) as usize;
    offset += 4;
    let certificate = payload.get(offset..offset + cert_len).ok_or_else(truncated)?;
    offset += cert_len;

    if offset != payload.len() {
        return Err(Error::DecodeError(format!(
            "Composite payload has {} trailing bytes",
            payload.len() - offset
        )));
    }
    Ok((init_data.to_vec(), utf16le_to_string(id), certificate.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::{concat_init_data_id_and_certificate, default_content_id, split_init_data_id_and_certificate};
    use crate::codec::{string_to_utf16le, utf16le_to_string};
    use crate::error::ErrorKind;

    #[test]
    fn layout_matches_documented_format() {
        let payload = concat_init_data_id_and_certificate(&[0xaa, 0xbb], "ab", &[1, 2, 3]);
        assert_eq!(
            payload,
            vec![0xaa, 0xbb, 4, 0, 0, 0, b'a', 0, b'b', 0, 3, 0, 0, 0, 1, 2, 3]
        );
    }

    #[test]
    fn round_trip_for_varied_id_lengths() {
        let init = string_to_utf16le("skd://twelve");
        let cert = vec![0x30, 0x82, 0x01, 0x0a, 0xff];
        for id in ["", "x", "f1e2d3c4-content"] {
            let payload = concat_init_data_id_and_certificate(&init, id, &cert);
            let (init_back, id_back, cert_back) =
                split_init_data_id_and_certificate(&payload, init.len()).expect("split payload");
            assert_eq!(init_back, init);
            assert_eq!(id_back, id);
            assert_eq!(cert_back, cert);
        }
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let payload = concat_init_data_id_and_certificate(&[1], "abc", &[9; 16]);
        let err = split_init_data_id_and_certificate(&payload[..payload.len() - 1], 1)
            .expect_err("truncated");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn content_id_defaults_to_hostname() {
        let init = string_to_utf16le("skd://asset-42?iv=00");
        assert_eq!(default_content_id(&utf16le_to_string(&init)), "asset-42");
        assert_eq!(default_content_id("not a uri"), "");
    }
}
