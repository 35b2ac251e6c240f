//! Certificate and license exchange.
//!
//! Each key system either supplies its own hooks or falls back to the
//! default request shapes built from the configured URLs:
//! - certificates: `GET certificate_uri`
//! - licenses: `POST url` with the raw key message as
//!   `application/octet-stream`
//! - legacy PlayReady: `POST` of the challenge extracted from the key
//!   message envelope, with the envelope's headers, to `url` or the
//!   message's destination URL.
//!
//! Every license attempt emits exactly one `licenserequestattempted` event
//! once the attempt completes and before its result is handed back.
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::{CertificateContext, KeySystemOptions, LicenseContext};
use crate::error::{Error, Result};
use crate::events::{EmeEvent, EventDispatch};
use crate::playready::parse_key_message;
use crate::transport::{Transport, TransportRequest};

/// Content type of default license requests.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// How a license request is shaped when no hook is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// Raw key message as an octet-stream POST.
    OctetStream,
    /// Challenge and headers taken from a PlayReady envelope.
    PlayReadyEnvelope,
}

/// License request prepared by an adapter from a key message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseRequest {
    pub message: Vec<u8>,
    pub content_id: Option<String>,
    pub destination_url: Option<String>,
    pub shape: RequestShape,
}

impl LicenseRequest {
    pub fn octet_stream(message: Vec<u8>) -> Self {
        Self {
            message,
            content_id: None,
            destination_url: None,
            shape: RequestShape::OctetStream,
        }
    }
}

/// Runs certificate and license fetches for the orchestrator.
#[derive(Clone)]
pub struct LicenseExchange {
    transport: Arc<dyn Transport>,
    events: EventDispatch,
}

impl LicenseExchange {
    pub fn new(transport: Arc<dyn Transport>, events: EventDispatch) -> Self {
        Self { transport, events }
    }

    /// Fetch the certificate for a key system.
    ///
    /// Returns `Ok(None)` when neither a hook nor a URI is configured.
    pub async fn fetch_certificate(
        &self,
        key_system: &str,
        options: &KeySystemOptions,
    ) -> Result<Option<Vec<u8>>> {
        let result = if let Some(hook) = options.get_certificate.as_ref() {
            debug!("fetching {} certificate through hook", key_system);
            hook(CertificateContext {
                key_system: key_system.to_string(),
                certificate_uri: options.certificate_uri.clone(),
            })
            .await
        } else if let Some(uri) = options.certificate_uri.as_deref() {
            debug!("fetching {} certificate from {}", key_system, uri);
            default_get_certificate(self.transport.as_ref(), uri, &options.certificate_headers).await
        } else {
            return Ok(None);
        };

        result.map(Some).map_err(|e| match e {
            Error::CertificateFetch(_) => e,
            other => Error::CertificateFetch(other.to_string()),
        })
    }

    /// Exchange a key message for license bytes.
    pub async fn request_license(
        &self,
        key_system: &str,
        options: &KeySystemOptions,
        request: LicenseRequest,
    ) -> Result<Vec<u8>> {
        let result = self.attempt(key_system, options, request).await;
        self.events.emit(EmeEvent::LicenseRequestAttempted {
            key_system: key_system.to_string(),
        });

        match result {
            Ok(license) => {
                debug!("{} license received ({} bytes)", key_system, license.len());
                Ok(license)
            }
            Err(e) => {
                warn!("{} license request failed: {}", key_system, e);
                Err(match e {
                    Error::LicenseRequest(_) => e,
                    other => Error::LicenseRequest(other.to_string()),
                })
            }
        }
    }

    async fn attempt(
        &self,
        key_system: &str,
        options: &KeySystemOptions,
        request: LicenseRequest,
    ) -> Result<Vec<u8>> {
        let hook = match request.shape {
            RequestShape::PlayReadyEnvelope => options.get_key.as_ref().or(options.get_license.as_ref()),
            RequestShape::OctetStream => options.get_license.as_ref(),
        };

        if let Some(hook) = hook {
            return hook(LicenseContext {
                key_system: key_system.to_string(),
                message: request.message,
                content_id: request.content_id,
                destination_url: request.destination_url,
                url: options.url.clone(),
            })
            .await;
        }

        match request.shape {
            RequestShape::OctetStream => {
                let url = options.url.as_deref().ok_or_else(|| {
                    Error::LicenseRequest(format!("No license url configured for {}", key_system))
                })?;
                default_get_license(self.transport.as_ref(), url, &options.license_headers, request.message)
                    .await
            }
            RequestShape::PlayReadyEnvelope => {
                let url = options
                    .url
                    .as_deref()
                    .or(request.destination_url.as_deref())
                    .ok_or_else(|| {
                        Error::LicenseRequest(
                            "No license url configured and no destination url in key message".to_string(),
                        )
                    })?;
                request_playready_license(
                    self.transport.as_ref(),
                    url,
                    &options.license_headers,
                    &request.message,
                )
                .await
            }
        }
    }
}

impl std::fmt::Debug for LicenseExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseExchange").finish_non_exhaustive()
    }
}

/// Default certificate fetch: `GET uri`.
pub async fn default_get_certificate(
    transport: &dyn Transport,
    uri: &str,
    headers: &IndexMap<String, String>,
) -> Result<Vec<u8>> {
    transport
        .request(TransportRequest::get(uri).with_headers(headers))
        .await
}

/// Default license fetch: binary POST of the key message.
pub async fn default_get_license(
    transport: &dyn Transport,
    url: &str,
    headers: &IndexMap<String, String>,
    message: Vec<u8>,
) -> Result<Vec<u8>> {
    let request = TransportRequest::post(url, message)
        .header("Content-type", OCTET_STREAM)
        .with_headers(headers);
    transport.request(request).await
}

/// Legacy PlayReady license fetch from a key-message envelope.
///
/// A malformed envelope still produces a request, with an empty body.
pub async fn request_playready_license(
    transport: &dyn Transport,
    url: &str,
    headers: &IndexMap<String, String>,
    message: &[u8],
) -> Result<Vec<u8>> {
    let envelope = parse_key_message(message);
    if envelope.challenge.is_empty() {
        debug!("PlayReady challenge is empty, sending request anyway");
    }
    let request = TransportRequest::post(url, envelope.challenge)
        .with_headers(&envelope.headers)
        .with_headers(headers);
    transport.request(request).await
}
