//! Session orchestration for one playback surface.
//!
//! The orchestrator receives need-key signals, deduplicates them by init
//! data, creates the surface's key-management object exactly once and
//! drives one platform session per unique init data until its keys are
//! usable. Active sessions are then monitored for key status changes; an
//! expired key closes the whole session.
//!
//! While the key-management object is being created, further signals wait
//! in a FIFO queue. Once it exists the first signal's own session is
//! opened, then the queued ones in arrival order.
//!
//! All surface state sits behind one mutex which is never held across an
//! await, so the check-and-register step of every signal is atomic.
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::adapter::ms::MS_KEY_SYSTEM;
use crate::adapter::{
    AdapterKind, Confirmation, KeySystemAdapter, MediaKeysHandle, OpenedSession, ResolvedKeySystem, SessionHandle,
    SessionSignal,
};
use crate::codec::preview;
use crate::config::EmeOptions;
use crate::error::{Error, Result};
use crate::events::{EmeEvent, EventDispatch, EventSink};
use crate::key::{KeyStatus, KeyStatusEntry};
use crate::license::LicenseExchange;
use crate::platform::{Platform, SessionEvents};
use crate::registry::{Fingerprint, PendingQueue, SessionRegistry};
use crate::session::{Session, SessionId, SessionState};
use crate::transport::Transport;

/// Which protocol raised a need-key signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolHint {
    /// Standard `encrypted` event with its init data type (`cenc`,
    /// `keyids`, `webm`, ...).
    InitDataType(String),
    /// WebKit-prefixed `needkey`.
    WebKitNeedKey,
    /// MS-prefixed `needkey`.
    MsNeedKey,
}

/// Initialization data of a need-key signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitData {
    pub bytes: Vec<u8>,
    pub hint: ProtocolHint,
}

impl InitData {
    pub fn new(init_data_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            hint: ProtocolHint::InitDataType(init_data_type.into()),
        }
    }

    pub fn webkit(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            hint: ProtocolHint::WebKitNeedKey,
        }
    }

    pub fn ms(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            hint: ProtocolHint::MsNeedKey,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from(self.bytes.as_slice())
    }
}

/// A need-key signal raised by the playback surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedKeySignal {
    pub init_data: InitData,
    /// Identifier of the media source currently loaded.
    pub source: String,
}

impl NeedKeySignal {
    pub fn new(init_data: InitData, source: impl Into<String>) -> Self {
        Self {
            init_data,
            source: source.into(),
        }
    }
}

/// Outcome of a need-key signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// A session was driven to usable keys.
    Active(SessionId),
    /// A session for the same init data already exists.
    Duplicate,
    /// The signal carries nothing this surface handles.
    Ignored,
    /// The source changed before the signal could be served.
    Discarded,
}

/// Everything needed to open sessions once the key-management object
/// exists.
struct Ready {
    adapter: KeySystemAdapter,
    resolved: ResolvedKeySystem,
    keys: MediaKeysHandle,
    certificate: Option<Vec<u8>>,
}

enum MediaKeysState {
    Unset,
    Creating(AdapterKind),
    Created(Arc<Ready>),
}

struct PendingEntry {
    session: Session,
    init_data: InitData,
    epoch: u64,
    reply: oneshot::Sender<Result<Acquisition>>,
}

struct SurfaceState {
    registry: SessionRegistry,
    pending: PendingQueue<PendingEntry>,
    media_keys: MediaKeysState,
}

impl SurfaceState {
    /// Reset sessions and drop queued signals when the source changed.
    /// Dropped entries resolve their callers as [`Acquisition::Discarded`].
    fn reset_for_source(&mut self, source: &str) -> bool {
        if !self.registry.reset_for_source(source) {
            return false;
        }
        let discarded = self.pending.take();
        if !discarded.is_empty() {
            debug!("discarding {} queued need-key signals", discarded.len());
        }
        true
    }
}

enum Step {
    Create(KeySystemAdapter, Session),
    Wait(oneshot::Receiver<Result<Acquisition>>),
    Open(Arc<Ready>, Session),
}

/// Where a driven session ended up.
enum Settled {
    Active,
    /// Active, but a key was already reported expired.
    Expired,
    /// The source changed underneath the session.
    Stale,
}

struct Inner {
    platform: Platform,
    options: EmeOptions,
    exchange: LicenseExchange,
    events: EventDispatch,
    surface: Mutex<SurfaceState>,
    /// Serializes sessions of adapters without concurrent session support.
    legacy_gate: Arc<tokio::sync::Mutex<()>>,
}

/// Key acquisition orchestrator for one playback surface.
///
/// Cheap to clone; clones share the same surface state. Requires a tokio
/// runtime: queued sessions and key status monitoring run on spawned
/// tasks.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Create an orchestrator. The configuration is validated first.
    pub fn new(platform: Platform, options: EmeOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        options.validate()?;
        let events = EventDispatch::new();
        let exchange = LicenseExchange::new(transport, events.clone());
        Ok(Self {
            inner: Arc::new(Inner {
                platform,
                options,
                exchange,
                events,
                surface: Mutex::new(SurfaceState {
                    registry: SessionRegistry::new(),
                    pending: PendingQueue::new(),
                    media_keys: MediaKeysState::Unset,
                }),
                legacy_gate: Arc::new(tokio::sync::Mutex::new(())),
            }),
        })
    }

    pub fn events(&self) -> &EventDispatch {
        &self.inner.events
    }

    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.inner.events.subscribe(sink);
    }

    pub fn options(&self) -> &EmeOptions {
        &self.inner.options
    }

    /// Key system resolved for this surface, once the key-management
    /// object exists.
    pub fn key_system(&self) -> Option<String> {
        match &self.inner.surface.lock().media_keys {
            MediaKeysState::Created(ready) => Some(ready.resolved.key_system.clone()),
            _ => None,
        }
    }

    pub fn has_session(&self, init_data: &[u8]) -> bool {
        self.inner
            .surface
            .lock()
            .registry
            .has_session(&Fingerprint::from(init_data))
    }

    pub fn session_state(&self, init_data: &[u8]) -> Option<SessionState> {
        self.inner
            .surface
            .lock()
            .registry
            .get(&Fingerprint::from(init_data))
            .map(|entry| entry.state)
    }

    pub fn session_count(&self) -> usize {
        self.inner.surface.lock().registry.len()
    }

    /// Forget every session when `source` differs from the active one.
    pub fn reset_for_source(&self, source: &str) -> bool {
        self.inner.surface.lock().reset_for_source(source)
    }

    /// Handle a need-key signal.
    ///
    /// Resolves once the signal's session has usable keys, or with the
    /// reason it was not served. Failures carry the error kind of the step
    /// that failed; the session is then forgotten so the same init data
    /// can be retried.
    pub async fn handle_need_key(&self, signal: NeedKeySignal) -> Result<Acquisition> {
        let NeedKeySignal { mut init_data, source } = signal;

        if init_data.hint == ProtocolHint::MsNeedKey {
            if let Some(pssh) = self.inner.options.get(MS_KEY_SYSTEM).and_then(|o| o.pssh.clone()) {
                debug!("using configured PlayReady init data");
                init_data.bytes = pssh;
            }
        }
        if init_data.bytes.is_empty() {
            debug!("ignoring need-key signal without init data");
            return Ok(Acquisition::Ignored);
        }

        let kind = AdapterKind::for_hint(&init_data.hint);
        let fingerprint = init_data.fingerprint();

        let (epoch, step) = {
            let mut surface = self.inner.surface.lock();
            surface.reset_for_source(&source);

            if surface.registry.has_session(&fingerprint) {
                trace!("init data {} already has a session", fingerprint);
                return Ok(Acquisition::Duplicate);
            }
            if kind == AdapterKind::Ms && !surface.registry.is_empty() {
                debug!("PlayReady session already exists for {}", source);
                return Ok(Acquisition::Ignored);
            }
            let selected = match &surface.media_keys {
                MediaKeysState::Unset => None,
                MediaKeysState::Creating(selected) => Some(*selected),
                MediaKeysState::Created(ready) => Some(ready.adapter.kind()),
            };
            if selected.is_some_and(|selected| selected != kind) {
                debug!("ignoring {:?} signal on a {:?} surface", kind, selected);
                return Ok(Acquisition::Ignored);
            }

            let session = Session::new(fingerprint.clone());
            surface.registry.add_session(fingerprint, session.id);
            let epoch = surface.registry.epoch();

            let step = match &surface.media_keys {
                MediaKeysState::Created(ready) => Step::Open(ready.clone(), session),
                MediaKeysState::Creating(_) => {
                    let (reply, rx) = oneshot::channel();
                    let entry = PendingEntry {
                        session,
                        init_data: init_data.clone(),
                        epoch,
                        reply,
                    };
                    match surface.pending.push(entry) {
                        Ok(()) => Step::Wait(rx),
                        Err(entry) => {
                            surface.registry.remove_session(&entry.session.fingerprint);
                            return Err(Error::Other("pending queue already drained".to_string()));
                        }
                    }
                }
                MediaKeysState::Unset => match KeySystemAdapter::for_kind(kind, &self.inner.platform) {
                    Some(adapter) => {
                        surface.media_keys = MediaKeysState::Creating(kind);
                        Step::Create(adapter, session)
                    }
                    None => {
                        surface.registry.remove_session(&session.fingerprint);
                        debug!("platform has no {:?} primitives", kind);
                        return Ok(Acquisition::Ignored);
                    }
                },
            };
            (epoch, step)
        };

        match step {
            Step::Open(ready, session) => self.open_and_drive(ready, session, init_data, epoch).await,
            Step::Wait(rx) => rx.await.unwrap_or(Ok(Acquisition::Discarded)),
            Step::Create(adapter, session) => self.create_then_open(adapter, session, init_data, epoch).await,
        }
    }

    /// Create the key-management object ahead of any need-key signal,
    /// using the standard protocol.
    pub async fn initialize_media_keys(&self) -> Result<String> {
        let adapter = {
            let mut surface = self.inner.surface.lock();
            match &surface.media_keys {
                MediaKeysState::Created(ready) => return Ok(ready.resolved.key_system.clone()),
                MediaKeysState::Creating(_) => {
                    return Err(Error::KeyManagementCreation(
                        "key management object creation already in progress".to_string(),
                    ))
                }
                MediaKeysState::Unset => {}
            }
            let adapter = KeySystemAdapter::for_kind(AdapterKind::Standard, &self.inner.platform).ok_or_else(|| {
                Error::UnsupportedKeySystem(self.inner.options.key_systems.keys().cloned().collect())
            })?;
            surface.media_keys = MediaKeysState::Creating(AdapterKind::Standard);
            adapter
        };

        match self.establish(adapter, None).await {
            Ok(ready) => {
                let key_system = ready.resolved.key_system.clone();
                let (queued, _) = self.publish(&ready);
                self.spawn_drain(ready, queued);
                Ok(key_system)
            }
            Err(e) => {
                self.rollback(&e, None);
                Err(e)
            }
        }
    }

    /// Negotiate access, fetch the certificate and create the
    /// key-management object.
    async fn establish(&self, adapter: KeySystemAdapter, mut session: Option<&mut Session>) -> Result<Arc<Ready>> {
        let resolved = adapter.is_supported(&self.inner.options).await?;
        self.inner.events.emit(EmeEvent::KeySystemAccessComplete {
            key_system: resolved.key_system.clone(),
        });
        if let Some(session) = session.as_deref_mut() {
            session.key_system = Some(resolved.key_system.clone());
            session.advance(SessionState::AccessNegotiated)?;
        }

        let certificate = adapter
            .prepare_certificate(&self.inner.exchange, &resolved)
            .await?;
        if let Some(session) = session.as_deref_mut() {
            session.advance(SessionState::CertificateReady)?;
        }

        let keys = adapter
            .create_media_keys(&resolved, certificate.as_deref())
            .await?;
        if let Some(session) = session.as_deref_mut() {
            session.advance(SessionState::KeysCreated)?;
        }
        info!("Key management object created for {}", resolved.key_system);

        Ok(Arc::new(Ready {
            adapter,
            resolved,
            keys,
            certificate,
        }))
    }

    /// Record the key-management object and close the pending queue.
    fn publish(&self, ready: &Arc<Ready>) -> (Vec<PendingEntry>, u64) {
        let mut surface = self.inner.surface.lock();
        surface.media_keys = MediaKeysState::Created(ready.clone());
        (surface.pending.drain(), surface.registry.epoch())
    }

    /// Undo a failed creation: forget the sessions waiting on it and fail
    /// their callers with the same error kind.
    fn rollback(&self, error: &Error, own: Option<(&Session, u64)>) {
        warn!("Key management object creation failed: {}", error);
        let queued = {
            let mut surface = self.inner.surface.lock();
            surface.media_keys = MediaKeysState::Unset;
            if let Some((session, epoch)) = own {
                surface
                    .registry
                    .remove_if_current(&session.fingerprint, session.id, epoch);
            }
            let queued = surface.pending.take();
            for entry in queued.iter() {
                surface
                    .registry
                    .remove_if_current(&entry.session.fingerprint, entry.session.id, entry.epoch);
            }
            queued
        };
        for entry in queued {
            let _ = entry.reply.send(Err(error.replicate()));
        }
    }

    async fn create_then_open(
        &self,
        adapter: KeySystemAdapter,
        mut session: Session,
        init_data: InitData,
        epoch: u64,
    ) -> Result<Acquisition> {
        let ready = match self.establish(adapter, Some(&mut session)).await {
            Ok(ready) => ready,
            Err(e) => {
                session.fail();
                self.rollback(&e, Some((&session, epoch)));
                return Err(e);
            }
        };

        let (queued, current_epoch) = self.publish(&ready);
        if current_epoch != epoch {
            debug!("source changed while creating key management object");
            self.spawn_drain(ready, queued);
            return Ok(Acquisition::Discarded);
        }

        // The first signal's session opens before any queued one.
        let _gate = self.gate(&ready).await;
        let opened = self.open(&ready, &mut session, &init_data, epoch).await;
        self.spawn_drain(ready.clone(), queued);
        match opened {
            Ok(opened) => self.drive(ready, session, opened, epoch).await,
            Err(e) => {
                self.abandon(&mut session, epoch);
                Err(e)
            }
        }
    }

    async fn gate(&self, ready: &Ready) -> Option<tokio::sync::OwnedMutexGuard<()>> {
        if ready.adapter.supports_concurrent_sessions() {
            None
        } else {
            Some(self.inner.legacy_gate.clone().lock_owned().await)
        }
    }

    async fn open_and_drive(
        &self,
        ready: Arc<Ready>,
        mut session: Session,
        init_data: InitData,
        epoch: u64,
    ) -> Result<Acquisition> {
        let _gate = self.gate(&ready).await;
        match self.open(&ready, &mut session, &init_data, epoch).await {
            Ok(opened) => self.drive(ready, session, opened, epoch).await,
            Err(e) => {
                self.abandon(&mut session, epoch);
                Err(e)
            }
        }
    }

    /// Open queued sessions in arrival order.
    fn spawn_drain(&self, ready: Arc<Ready>, queued: Vec<PendingEntry>) {
        if queued.is_empty() {
            return;
        }
        debug!("opening {} queued sessions", queued.len());
        let this = self.clone();
        tokio::spawn(async move {
            for entry in queued {
                let PendingEntry {
                    mut session,
                    init_data,
                    epoch,
                    reply,
                } = entry;
                if this.current_epoch() != epoch {
                    let _ = reply.send(Ok(Acquisition::Discarded));
                    continue;
                }

                if !ready.adapter.supports_concurrent_sessions() {
                    let result = this.open_and_drive(ready.clone(), session, init_data, epoch).await;
                    let _ = reply.send(result);
                    continue;
                }

                match this.open(&ready, &mut session, &init_data, epoch).await {
                    Ok(opened) => {
                        let driver = this.clone();
                        let ready = ready.clone();
                        tokio::spawn(async move {
                            let result = driver.drive(ready, session, opened, epoch).await;
                            let _ = reply.send(result);
                        });
                    }
                    Err(e) => {
                        this.abandon(&mut session, epoch);
                        let _ = reply.send(Err(e));
                    }
                }
            }
        });
    }

    fn current_epoch(&self) -> u64 {
        self.inner.surface.lock().registry.epoch()
    }

    fn is_stale(&self, epoch: u64) -> bool {
        self.current_epoch() != epoch
    }

    async fn open(
        &self,
        ready: &Ready,
        session: &mut Session,
        init_data: &InitData,
        epoch: u64,
    ) -> Result<OpenedSession> {
        session.key_system = Some(ready.resolved.key_system.clone());
        debug!("opening session {} for {}", session.id, preview(&init_data.bytes));
        let opened = ready
            .adapter
            .create_session(
                &ready.keys,
                &ready.resolved,
                ready.certificate.as_deref(),
                init_data,
            )
            .await?;
        session.advance(SessionState::SessionOpen)?;
        self.record_state(session, epoch);
        self.inner
            .events
            .emit(EmeEvent::KeySessionCreated { session: session.id });
        Ok(opened)
    }

    /// Drive an open session until its keys are usable, then hand it to a
    /// status monitor.
    async fn drive(
        &self,
        ready: Arc<Ready>,
        mut session: Session,
        mut opened: OpenedSession,
        epoch: u64,
    ) -> Result<Acquisition> {
        let id = session.id;
        match self.acquire(&ready, &mut session, &mut opened, epoch).await {
            Ok(Settled::Active) => {
                info!("Session {} active ({})", id, ready.resolved.key_system);
                self.spawn_monitor(ready, session, opened, epoch);
                Ok(Acquisition::Active(id))
            }
            Ok(Settled::Expired) => {
                info!("Session {} active ({})", id, ready.resolved.key_system);
                self.expire(&ready, &mut session, &opened.handle, epoch).await;
                Ok(Acquisition::Active(id))
            }
            Ok(Settled::Stale) => {
                debug!("source changed, dropping session {}", id);
                if let Err(e) = ready.adapter.close_session(&opened.handle).await {
                    warn!("Failed to close session {}: {}", id, e);
                }
                Ok(Acquisition::Discarded)
            }
            Err(e) => {
                warn!("Session {} failed: {}", id, e);
                self.abandon(&mut session, epoch);
                Err(e)
            }
        }
    }

    async fn acquire(
        &self,
        ready: &Ready,
        session: &mut Session,
        opened: &mut OpenedSession,
        epoch: u64,
    ) -> Result<Settled> {
        let mut expired = false;
        while let Some(event) = opened.events.recv().await {
            match ready.adapter.classify(event) {
                SessionSignal::LicenseRequest {
                    message,
                    destination_url,
                } => {
                    if session.state() != SessionState::SessionOpen {
                        debug!("ignoring key message on session {} in {:?}", session.id, session.state());
                        continue;
                    }
                    if self.is_stale(epoch) {
                        return Ok(Settled::Stale);
                    }
                    let request = ready
                        .adapter
                        .on_message(message, destination_url, opened.content_id.clone());
                    session.advance(SessionState::RequestSent)?;
                    self.record_state(session, epoch);

                    let license = self
                        .inner
                        .exchange
                        .request_license(&ready.resolved.key_system, &ready.resolved.options, request)
                        .await?;
                    if self.is_stale(epoch) {
                        return Ok(Settled::Stale);
                    }
                    let confirmation = ready.adapter.apply_license(&opened.handle, &license).await?;
                    if self.is_stale(epoch) {
                        return Ok(Settled::Stale);
                    }
                    session.advance(SessionState::LicenseApplied)?;
                    self.record_state(session, epoch);

                    if confirmation == Confirmation::Applied {
                        return self.activate(session, epoch, expired);
                    }
                }
                SessionSignal::KeysUsable => {
                    if self.is_stale(epoch) {
                        return Ok(Settled::Stale);
                    }
                    if session.state() == SessionState::LicenseApplied {
                        return self.activate(session, epoch, expired);
                    }
                    debug!("ignoring key added on session {} in {:?}", session.id, session.state());
                }
                SessionSignal::KeyStatuses(entries) => {
                    expired |= self.report_statuses(session.id, &entries);
                }
                SessionSignal::Ignored => {}
                SessionSignal::KeyError { code, system_code } => {
                    let message = format!("key error {} (system code {:#x})", code, system_code);
                    return Err(if session.state() == SessionState::LicenseApplied {
                        Error::LicenseApplication(message)
                    } else {
                        Error::SessionCreation(message)
                    });
                }
            }
        }
        Err(Error::SessionCreation(format!(
            "session {} closed before its keys became usable",
            session.id
        )))
    }

    fn activate(&self, session: &mut Session, epoch: u64, expired: bool) -> Result<Settled> {
        session.advance(SessionState::Active)?;
        self.record_state(session, epoch);
        Ok(if expired { Settled::Expired } else { Settled::Active })
    }

    /// Emit status events; returns whether any key expired.
    fn report_statuses(&self, session: SessionId, entries: &[KeyStatusEntry]) -> bool {
        let mut expired = false;
        for entry in entries {
            match entry.status {
                KeyStatus::Expired => expired = true,
                KeyStatus::InternalError => {
                    warn!("Key {} of session {} reports internal-error", entry.kid(), session);
                }
                _ => {}
            }
            self.inner.events.emit(EmeEvent::KeyStatusChange {
                key_id: entry.key_id.clone(),
                status: entry.status,
                session,
            });
        }
        expired
    }

    fn spawn_monitor(&self, ready: Arc<Ready>, mut session: Session, opened: OpenedSession, epoch: u64) {
        let OpenedSession { handle, events, .. } = opened;
        let this = self.clone();
        tokio::spawn(async move {
            this.monitor(ready, &mut session, handle, events, epoch).await;
        });
    }

    async fn monitor(
        &self,
        ready: Arc<Ready>,
        session: &mut Session,
        handle: SessionHandle,
        mut events: SessionEvents,
        epoch: u64,
    ) {
        while let Some(event) = events.recv().await {
            match ready.adapter.classify(event) {
                SessionSignal::KeyStatuses(entries) => {
                    if self.report_statuses(session.id, &entries) {
                        self.expire(&ready, session, &handle, epoch).await;
                        return;
                    }
                }
                SessionSignal::KeyError { code, system_code } => {
                    warn!(
                        "Key error {} (system code {:#x}) on active session {}",
                        code, system_code, session.id
                    );
                }
                _ => {}
            }
        }
        trace!("session {} event stream ended", session.id);
    }

    /// Close a session whose key expired and forget it.
    async fn expire(&self, ready: &Ready, session: &mut Session, handle: &SessionHandle, epoch: u64) {
        info!("Session {} has an expired key, closing", session.id);
        if let Err(e) = session.advance(SessionState::Expired) {
            warn!("{}", e);
        }
        self.record_state(session, epoch);
        if let Err(e) = ready.adapter.close_session(handle).await {
            warn!("Failed to close session {}: {}", session.id, e);
        }
        if let Err(e) = session.advance(SessionState::Closed) {
            warn!("{}", e);
        }
        self.inner
            .surface
            .lock()
            .registry
            .remove_if_current(&session.fingerprint, session.id, epoch);
    }

    /// Mark a session failed and forget it.
    fn abandon(&self, session: &mut Session, epoch: u64) {
        session.fail();
        self.inner
            .surface
            .lock()
            .registry
            .remove_if_current(&session.fingerprint, session.id, epoch);
    }

    fn record_state(&self, session: &Session, epoch: u64) {
        self.inner
            .surface
            .lock()
            .registry
            .set_state(&session.fingerprint, session.id, epoch, session.state());
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("platform", &self.inner.platform)
            .field("key_systems", &self.inner.options.key_systems.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
