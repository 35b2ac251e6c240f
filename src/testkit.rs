//! In-memory platform and transport fakes for unit tests.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::codec::string_to_utf16le;
use crate::error::{Error, Result};
use crate::key::KeyStatusEntry;
use crate::platform::{
    session_events, KeySystemAccess, LegacyKeySession, LegacyMediaKeys, MediaKeySession, MediaKeySystemConfiguration,
    MediaKeys, MessageType, MsPlatform, SessionEvent, SessionEventSender, SessionEvents, StandardPlatform,
    WebKitPlatform,
};
use crate::transport::{Transport, TransportRequest};

/// Destination URL carried by fake PlayReady key messages.
pub(crate) const PLAYREADY_DESTINATION: &str = "https://pr.example/rightsmanager.asmx";

/// Let spawned tasks run to completion on the current-thread runtime.
pub(crate) async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Transport answering from fixed replies and recording every request.
pub(crate) struct FakeTransport {
    default: std::result::Result<Vec<u8>, String>,
    routes: IndexMap<String, Vec<u8>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl FakeTransport {
    pub(crate) fn replying(reply: Vec<u8>) -> Self {
        Self {
            default: Ok(reply),
            routes: IndexMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            default: Err(message.to_string()),
            routes: IndexMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer requests for `uri` with `reply`.
    pub(crate) fn route(mut self, uri: &str, reply: Vec<u8>) -> Self {
        self.routes.insert(uri.to_string(), reply);
        self
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn request(&self, request: TransportRequest) -> Result<Vec<u8>> {
        tokio::task::yield_now().await;
        let routed = self.routes.get(&request.uri).cloned();
        self.requests.lock().push(request);
        match routed {
            Some(reply) => Ok(reply),
            None => self.default.clone().map_err(Error::Transport),
        }
    }
}

#[derive(Default)]
struct StandardState {
    accepted: Vec<String>,
    access_requests: Mutex<Vec<String>>,
    media_keys_created: AtomicUsize,
    fail_create: AtomicBool,
    reject_update: AtomicBool,
    server_certificates: Mutex<Vec<Vec<u8>>>,
    generated: Mutex<Vec<(String, Vec<u8>)>>,
    updates: Mutex<Vec<Vec<u8>>>,
    closed: AtomicUsize,
    early_statuses: Mutex<Option<Vec<KeyStatusEntry>>>,
    senders: Mutex<Vec<SessionEventSender>>,
}

/// Standard key-session API accepting a fixed set of key systems.
///
/// Every generated request answers with a `challenge:<init data>` license
/// request message.
pub(crate) struct FakeStandardPlatform {
    state: Arc<StandardState>,
}

impl FakeStandardPlatform {
    pub(crate) fn accepting(key_systems: &[&str]) -> Self {
        Self {
            state: Arc::new(StandardState {
                accepted: key_systems.iter().map(|k| k.to_string()).collect(),
                ..Default::default()
            }),
        }
    }

    pub(crate) fn set_fail_create(&self, fail: bool) {
        self.state.fail_create.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_reject_update(&self, reject: bool) {
        self.state.reject_update.store(reject, Ordering::SeqCst);
    }

    /// Report `entries` on the next session ahead of its license request.
    pub(crate) fn set_early_statuses(&self, entries: Vec<KeyStatusEntry>) {
        *self.state.early_statuses.lock() = Some(entries);
    }

    pub(crate) fn access_requests(&self) -> Vec<String> {
        self.state.access_requests.lock().clone()
    }

    pub(crate) fn media_keys_created(&self) -> usize {
        self.state.media_keys_created.load(Ordering::SeqCst)
    }

    pub(crate) fn server_certificates(&self) -> Vec<Vec<u8>> {
        self.state.server_certificates.lock().clone()
    }

    /// `(init data type, init data)` of every generated request, in order.
    pub(crate) fn generated(&self) -> Vec<(String, Vec<u8>)> {
        self.state.generated.lock().clone()
    }

    pub(crate) fn updates(&self) -> Vec<Vec<u8>> {
        self.state.updates.lock().clone()
    }

    pub(crate) fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Raise an event on the `index`-th created session.
    pub(crate) fn emit(&self, index: usize, event: SessionEvent) {
        if let Some(sender) = self.state.senders.lock().get(index) {
            let _ = sender.send(event);
        }
    }
}

#[async_trait]
impl StandardPlatform for FakeStandardPlatform {
    async fn request_key_system_access(
        &self,
        key_system: &str,
        configurations: &[MediaKeySystemConfiguration],
    ) -> Result<KeySystemAccess> {
        tokio::task::yield_now().await;
        self.state.access_requests.lock().push(key_system.to_string());
        if !self.state.accepted.iter().any(|k| k == key_system) {
            return Err(Error::Platform(format!("{} is not supported", key_system)));
        }
        Ok(KeySystemAccess {
            key_system: key_system.to_string(),
            configuration: configurations.first().cloned().unwrap_or_default(),
        })
    }

    async fn create_media_keys(&self, _access: &KeySystemAccess) -> Result<Arc<dyn MediaKeys>> {
        tokio::task::yield_now().await;
        if self.state.fail_create.load(Ordering::SeqCst) {
            return Err(Error::Platform("hardware CDM unavailable".to_string()));
        }
        self.state.media_keys_created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeMediaKeys {
            state: self.state.clone(),
        }))
    }

    async fn set_media_keys(&self, _media_keys: Arc<dyn MediaKeys>) -> Result<()> {
        Ok(())
    }
}

struct FakeMediaKeys {
    state: Arc<StandardState>,
}

#[async_trait]
impl MediaKeys for FakeMediaKeys {
    async fn set_server_certificate(&self, certificate: &[u8]) -> Result<()> {
        self.state.server_certificates.lock().push(certificate.to_vec());
        Ok(())
    }

    fn create_session(&self) -> Result<(Box<dyn MediaKeySession>, SessionEvents)> {
        let (tx, rx) = session_events();
        self.state.senders.lock().push(tx.clone());
        Ok((
            Box::new(FakeMediaKeySession {
                state: self.state.clone(),
                events: tx,
            }),
            rx,
        ))
    }
}

struct FakeMediaKeySession {
    state: Arc<StandardState>,
    events: SessionEventSender,
}

#[async_trait]
impl MediaKeySession for FakeMediaKeySession {
    async fn generate_request(&self, init_data_type: &str, init_data: &[u8]) -> Result<()> {
        self.state
            .generated
            .lock()
            .push((init_data_type.to_string(), init_data.to_vec()));
        if let Some(entries) = self.state.early_statuses.lock().take() {
            let _ = self.events.send(SessionEvent::KeyStatusesChange(entries));
        }
        let message = [&b"challenge:"[..], init_data].concat();
        let _ = self.events.send(SessionEvent::license_request(message));
        Ok(())
    }

    async fn update(&self, response: &[u8]) -> Result<()> {
        tokio::task::yield_now().await;
        self.state.updates.lock().push(response.to_vec());
        if self.state.reject_update.load(Ordering::SeqCst) {
            return Err(Error::Platform("license rejected".to_string()));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct LegacyState {
    type_supported: AtomicBool,
    reject_keys: AtomicBool,
    message: Option<SessionEvent>,
    created: Mutex<Vec<(String, Vec<u8>)>>,
    updates: Mutex<Vec<Vec<u8>>>,
    closed: AtomicUsize,
    senders: Mutex<Vec<SessionEventSender>>,
}

/// Legacy prefixed key API, usable as either the WebKit or the MS variant.
///
/// Each created session immediately raises its key message; `update`
/// answers with `KeyAdded`, or with `KeyError` once keys are rejected.
pub(crate) struct FakeLegacyPlatform {
    state: Arc<LegacyState>,
}

impl FakeLegacyPlatform {
    fn with_message(message: SessionEvent) -> Self {
        let state = LegacyState {
            message: Some(message),
            ..Default::default()
        };
        state.type_supported.store(true, Ordering::SeqCst);
        Self { state: Arc::new(state) }
    }

    /// FairPlay flavour: the key message is the SPC `b"spc"`.
    pub(crate) fn webkit() -> Self {
        Self::with_message(SessionEvent::license_request(b"spc".to_vec()))
    }

    /// PlayReady flavour: the key message is an envelope whose challenge
    /// decodes to `b"challenge"`.
    pub(crate) fn ms() -> Self {
        let envelope = concat!(
            "<PlayReadyKeyMessage type=\"LicenseAcquisition\"><LicenseAcquisition Version=\"1\">",
            "<Challenge encoding=\"base64encoded\">Y2hhbGxlbmdl</Challenge>",
            "<HttpHeaders><HttpHeader><name>Content-Type</name><value>text/xml; charset=utf-8</value></HttpHeader>",
            "<HttpHeader><name>SOAPAction</name><value>AcquireLicense</value></HttpHeader></HttpHeaders>",
            "</LicenseAcquisition></PlayReadyKeyMessage>"
        );
        Self::with_message(SessionEvent::Message {
            message_type: MessageType::LicenseRequest,
            message: string_to_utf16le(envelope),
            destination_url: Some(PLAYREADY_DESTINATION.to_string()),
        })
    }

    pub(crate) fn set_type_supported(&self, supported: bool) {
        self.state.type_supported.store(supported, Ordering::SeqCst);
    }

    pub(crate) fn set_reject_keys(&self, reject: bool) {
        self.state.reject_keys.store(reject, Ordering::SeqCst);
    }

    /// `(content type, init payload)` of every created session, in order.
    pub(crate) fn created(&self) -> Vec<(String, Vec<u8>)> {
        self.state.created.lock().clone()
    }

    pub(crate) fn updates(&self) -> Vec<Vec<u8>> {
        self.state.updates.lock().clone()
    }

    pub(crate) fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }
}

impl WebKitPlatform for FakeLegacyPlatform {
    fn is_type_supported(&self, _key_system: &str, _content_type: &str) -> bool {
        self.state.type_supported.load(Ordering::SeqCst)
    }

    fn set_media_keys(&self, _key_system: &str) -> Result<Arc<dyn LegacyMediaKeys>> {
        Ok(Arc::new(FakeLegacyKeys {
            state: self.state.clone(),
        }))
    }
}

impl MsPlatform for FakeLegacyPlatform {
    fn set_media_keys(&self, _key_system: &str) -> Result<Arc<dyn LegacyMediaKeys>> {
        Ok(Arc::new(FakeLegacyKeys {
            state: self.state.clone(),
        }))
    }
}

struct FakeLegacyKeys {
    state: Arc<LegacyState>,
}

impl LegacyMediaKeys for FakeLegacyKeys {
    fn create_session(
        &self,
        content_type: &str,
        init_data: &[u8],
    ) -> Result<(Box<dyn LegacyKeySession>, SessionEvents)> {
        let (tx, rx) = session_events();
        self.state
            .created
            .lock()
            .push((content_type.to_string(), init_data.to_vec()));
        self.state.senders.lock().push(tx.clone());
        if let Some(message) = self.state.message.clone() {
            let _ = tx.send(message);
        }
        Ok((
            Box::new(FakeLegacyKeySession {
                state: self.state.clone(),
                events: tx,
            }),
            rx,
        ))
    }
}

struct FakeLegacyKeySession {
    state: Arc<LegacyState>,
    events: SessionEventSender,
}

impl LegacyKeySession for FakeLegacyKeySession {
    fn update(&self, key: &[u8]) -> Result<()> {
        self.state.updates.lock().push(key.to_vec());
        let event = if self.state.reject_keys.load(Ordering::SeqCst) {
            SessionEvent::KeyError {
                code: 6,
                system_code: 0x8007_0005,
            }
        } else {
            SessionEvent::KeyAdded
        };
        let _ = self.events.send(event);
        Ok(())
    }

    fn close(&self) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}
