//! In-memory stores and a wired-up adapter for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify, RwLock};

use super::{LocalCache, RemoteStore, Subscription, SubscriptionEvent, SyncAdapter};
use crate::config::SyncConfig;
use crate::errors::SyncError;
use crate::models::RosterSnapshot;
use crate::notice::{NoticeReceiver, Notifier};
use crate::session::Session;

#[derive(Default)]
pub struct MemoryRemote {
    document: Mutex<Option<RosterSnapshot>>,
    sender: Mutex<Option<mpsc::Sender<SubscriptionEvent>>>,
    fail_fetch: AtomicBool,
    fail_writes: AtomicBool,
    write_gate: Mutex<Option<Arc<Notify>>>,
    write_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
}

impl MemoryRemote {
    pub fn set_document(&self, snapshot: RosterSnapshot) {
        *self.document.lock().unwrap() = Some(snapshot);
    }

    pub fn document(&self) -> Option<RosterSnapshot> {
        self.document.lock().unwrap().clone()
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Park the next write until the returned gate is notified. The write
    /// only checks `fail_writes` once released.
    pub fn hold_next_write(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.write_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Sender feeding the most recent subscription.
    pub fn sender(&self) -> Option<mpsc::Sender<SubscriptionEvent>> {
        self.sender.lock().unwrap().clone()
    }

    pub async fn push(&self, event: SubscriptionEvent) {
        let sender = self.sender().expect("no active subscription");
        sender.send(event).await.expect("subscription closed");
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch(&self) -> Result<Option<RosterSnapshot>, SyncError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteUnavailable("fetch failed".to_string()));
        }
        Ok(self.document())
    }

    async fn write(&self, snapshot: &RosterSnapshot) -> Result<(), SyncError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.write_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteUnavailable("write failed".to_string()));
        }
        self.set_document(snapshot.clone());
        Ok(())
    }

    async fn subscribe(&self) -> Result<Subscription, SyncError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(8);
        *self.sender.lock().unwrap() = Some(tx);
        Ok(Subscription::new(rx, None))
    }
}

/// Holds raw text so tests can plant malformed entries.
#[derive(Default)]
pub struct MemoryCache {
    raw: Mutex<Option<String>>,
    fail: AtomicBool,
}

impl MemoryCache {
    pub fn set_raw(&self, raw: &str) {
        *self.raw.lock().unwrap() = Some(raw.to_string());
    }

    pub fn snapshot(&self) -> Option<RosterSnapshot> {
        self.raw
            .lock()
            .unwrap()
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LocalCache for MemoryCache {
    async fn read(&self) -> Result<Option<RosterSnapshot>, SyncError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SyncError::LocalUnavailable("disk gone".to_string()));
        }
        match self.raw.lock().unwrap().as_deref() {
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| SyncError::MalformedCache(e.to_string())),
            None => Ok(None),
        }
    }

    async fn write(&self, snapshot: &RosterSnapshot) -> Result<(), SyncError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SyncError::LocalUnavailable("disk gone".to_string()));
        }
        *self.raw.lock().unwrap() = Some(serde_json::to_string(snapshot).unwrap());
        Ok(())
    }
}

pub struct Harness {
    pub adapter: SyncAdapter,
    pub remote: Arc<MemoryRemote>,
    pub cache: Arc<MemoryCache>,
    pub session: Arc<RwLock<Session>>,
    pub notices: NoticeReceiver,
}

impl Harness {
    pub fn new() -> Self {
        let remote = Arc::new(MemoryRemote::default());
        let cache = Arc::new(MemoryCache::default());
        let session = Arc::new(RwLock::new(Session::default()));
        let (notifier, notices) = Notifier::channel();

        let adapter = SyncAdapter::new(
            remote.clone(),
            cache.clone(),
            session.clone(),
            notifier,
            SyncConfig::default(),
        );

        Self {
            adapter,
            remote,
            cache,
            session,
            notices,
        }
    }
}

/// Let spawned subscription tasks process what was pushed.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
