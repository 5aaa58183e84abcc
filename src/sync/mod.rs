//! Persistence adapter.
//!
//! Loads the roster through a remote → cache → example-data fallback chain,
//! saves with a cache fallback plus background retry, and keeps the in-memory
//! roster in step with the remote document through a live subscription.
//!
//! There is no concurrency token on the document: a subscription push that
//! lands between a local edit and its save replaces the unsaved edit, and the
//! last writer to the remote wins.

mod cache;
mod remote;
#[cfg(test)]
pub(crate) mod testing;

pub use cache::*;
pub use remote::*;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::errors::SyncError;
use crate::models::{RosterSnapshot, RosterState};
use crate::notice::Notifier;
use crate::session::{Authenticator, Session};

/// Which tier supplied the state after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The remote document
    Remote,
    /// The remote document did not exist and was created from the example roster
    Created,
    /// The local cache, because the remote failed
    Cache,
    /// The example roster, because both remote and cache failed
    Default,
}

/// Where a save ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Remote,
    /// Cached only; a retry will push it to the remote
    LocalOnly,
    Failed,
}

/// Synchronises the in-memory roster with the remote store and the local cache.
#[derive(Clone)]
pub struct SyncAdapter {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn LocalCache>,
    state: Arc<RwLock<RosterState>>,
    session: Arc<RwLock<Session>>,
    notifier: Notifier,
    config: SyncConfig,
    authenticator: Option<Arc<dyn Authenticator>>,
    /// Bumped by every save that only reached the cache.
    local_generation: Arc<AtomicU64>,
    /// Highest local generation known to be on the remote.
    synced_generation: Arc<AtomicU64>,
    retry_scheduled: Arc<AtomicBool>,
    subscription: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SyncAdapter {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn LocalCache>,
        session: Arc<RwLock<Session>>,
        notifier: Notifier,
        config: SyncConfig,
    ) -> Self {
        Self {
            remote,
            cache,
            state: Arc::new(RwLock::new(RosterState::default())),
            session,
            notifier,
            config,
            authenticator: None,
            local_generation: Arc::new(AtomicU64::new(0)),
            synced_generation: Arc::new(AtomicU64::new(0)),
            retry_scheduled: Arc::new(AtomicBool::new(false)),
            subscription: Arc::new(Mutex::new(None)),
        }
    }

    /// Sign out through `authenticator` when the remote revokes access.
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// A copy of the current roster.
    pub async fn state(&self) -> RosterState {
        self.state.read().await.clone()
    }

    /// Mutate the roster in place. Callers validate inside `f` before touching
    /// anything so a rejected edit leaves the roster as it was.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut RosterState) -> R) -> R {
        let mut state = self.state.write().await;
        f(&mut state)
    }

    pub fn session(&self) -> &Arc<RwLock<Session>> {
        &self.session
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Whether some locally saved roster has not reached the remote yet.
    pub fn is_pending_sync(&self) -> bool {
        self.local_generation.load(Ordering::SeqCst)
            > self.synced_generation.load(Ordering::SeqCst)
    }

    pub async fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // ==================== LOAD ====================

    /// Replace the in-memory roster from exactly one of remote, cache or defaults.
    pub async fn load(&self) -> LoadSource {
        tracing::info!("Loading roster from remote store");

        match self.load_remote().await {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(error = %err, "Remote load failed, falling back to local cache");
                self.load_fallback().await
            }
        }
    }

    async fn load_remote(&self) -> Result<LoadSource, SyncError> {
        let source = match self.remote.fetch().await? {
            Some(snapshot) => {
                tracing::info!("Roster document found");
                self.adopt(snapshot).await;
                LoadSource::Remote
            }
            None => {
                tracing::info!("No roster document yet, creating one from the example roster");
                let seeded = RosterState::seeded();
                let snapshot = seeded.to_snapshot(Utc::now());
                self.remote.write(&snapshot).await?;
                *self.state.write().await = seeded;
                self.mirror(&snapshot).await;
                LoadSource::Created
            }
        };

        if let Err(err) = self.subscribe().await {
            self.handle_subscription_error(&err).await;
        }

        Ok(source)
    }

    async fn load_fallback(&self) -> LoadSource {
        match self.cache.read().await {
            Ok(Some(snapshot)) => {
                tracing::info!("Loading roster from local cache");
                *self.state.write().await = RosterState::from_snapshot(snapshot);
                self.notifier.info("Using local data (last saved version)");
                return LoadSource::Cache;
            }
            Ok(None) => tracing::info!("Local cache is empty"),
            Err(err) => tracing::error!(error = %err, "Failed to load local cache"),
        }

        tracing::info!("Loading example roster");
        *self.state.write().await = RosterState::seeded();
        self.notifier.warning("Could not connect to the server. Using example data.");
        LoadSource::Default
    }

    /// Take a remote snapshot as current state and mirror it to the cache.
    async fn adopt(&self, snapshot: RosterSnapshot) {
        let state = RosterState::from_snapshot(snapshot);
        let mirrored = state.to_snapshot(Utc::now());
        *self.state.write().await = state;
        self.mirror(&mirrored).await;
    }

    async fn mirror(&self, snapshot: &RosterSnapshot) {
        if let Err(err) = self.cache.write(snapshot).await {
            tracing::warn!(error = %err, "Failed to update local cache");
        }
    }

    // ==================== SAVE ====================

    /// Persist the current roster.
    pub async fn save(&self) -> SaveOutcome {
        let snapshot = self.state.read().await.to_snapshot(Utc::now());
        self.persist(snapshot).await
    }

    /// Adopt `snapshot` as the current roster and persist it.
    pub async fn save_snapshot(&self, snapshot: RosterSnapshot) -> SaveOutcome {
        *self.state.write().await = RosterState::from_snapshot(snapshot.clone());
        self.persist(snapshot).await
    }

    async fn persist(&self, snapshot: RosterSnapshot) -> SaveOutcome {
        match self.remote.write(&snapshot).await {
            Ok(()) => {
                tracing::info!("Roster saved to remote store");
                self.mirror(&snapshot).await;
                self.notifier.success("Data saved");
                SaveOutcome::Remote
            }
            Err(err) => {
                tracing::warn!(error = %err, "Remote save failed, saving locally");

                match self.cache.write(&snapshot).await {
                    Ok(()) => {
                        self.notifier.warning(
                            "Data saved locally. It will sync when the connection is restored.",
                        );
                        self.local_generation.fetch_add(1, Ordering::SeqCst);
                        self.schedule_retry();
                        SaveOutcome::LocalOnly
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "Local save failed");
                        self.notifier.error("Failed to save data");
                        SaveOutcome::Failed
                    }
                }
            }
        }
    }

    /// Arm the retry loop unless one is already armed.
    fn schedule_retry(&self) {
        if self.retry_scheduled.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::debug!(delay = ?self.config.retry_delay, "Scheduling pending sync retry");
        let adapter = self.clone();
        tokio::spawn(async move { adapter.retry_loop().await });
    }

    async fn retry_loop(&self) {
        let mut delay = self.config.retry_delay;

        loop {
            tokio::time::sleep(delay).await;

            // Read before the cache so whatever the cache holds is at least this new.
            let generation = self.local_generation.load(Ordering::SeqCst);
            if generation <= self.synced_generation.load(Ordering::SeqCst) {
                break;
            }

            match self.retry_pending_sync().await {
                Ok(()) => {
                    self.synced_generation
                        .fetch_max(generation, Ordering::SeqCst);
                    if self.is_pending_sync() {
                        tracing::info!("Roster saved locally again during sync, retrying");
                        delay = self.config.retry_delay;
                        continue;
                    }
                    tracing::info!("Pending roster changes synced");
                    self.notifier.success("Pending data synced with the server");
                    break;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Pending sync retry failed");
                    delay = self.config.retry_backoff;
                }
            }
        }

        self.retry_scheduled.store(false, Ordering::SeqCst);
        // A save that failed after the last check found the flag still set.
        if self.is_pending_sync() {
            self.schedule_retry();
        }
    }

    async fn retry_pending_sync(&self) -> Result<(), SyncError> {
        let snapshot = match self.cache.read().await {
            Ok(Some(cached)) => {
                let general = self.state.read().await.general_stats.clone();
                cached.with_general_fallback(&general)
            }
            Ok(None) | Err(_) => self.state.read().await.to_snapshot(Utc::now()),
        };
        self.remote.write(&snapshot).await
    }

    // ==================== SUBSCRIPTION ====================

    /// Follow remote changes, replacing any previous subscription.
    pub async fn subscribe(&self) -> Result<(), SyncError> {
        let mut slot = self.subscription.lock().await;
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let mut subscription = self.remote.subscribe().await?;
        let adapter = self.clone();

        *slot = Some(tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                match event {
                    Ok(Some(snapshot)) => {
                        tracing::info!("Realtime roster change received");
                        adapter.adopt(snapshot).await;
                    }
                    Ok(None) => tracing::debug!("Roster document removed remotely"),
                    Err(err) => {
                        adapter.handle_subscription_error(&err).await;
                        break;
                    }
                }
            }
        }));

        Ok(())
    }

    pub async fn unsubscribe(&self) {
        if let Some(handle) = self.subscription.lock().await.take() {
            handle.abort();
        }
    }

    async fn handle_subscription_error(&self, err: &SyncError) {
        tracing::error!(error = %err, "Realtime subscription failed");

        if err.is_denied() {
            self.notifier.error("Permissions were lost. Please sign in again.");
            if let Some(authenticator) = &self.authenticator {
                if let Err(err) = authenticator.logout().await {
                    tracing::warn!(error = %err, "Logout failed");
                }
            }
            self.session.write().await.reset();
        } else {
            self.notifier.warning("Realtime connection error. Using local data.");
        }
    }
}
