//! Remote document store seam and its implementations.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::auth::API_KEY_HEADER;
use crate::errors::{ErrorResponse, SyncError};
use crate::models::{RevisionInfo, RosterSnapshot};

/// One push from a live subscription. `Ok(None)` means the document is gone.
pub type SubscriptionEvent = Result<Option<RosterSnapshot>, SyncError>;

/// Live change feed for the roster document.
///
/// Dropping the subscription stops whatever task produces its events.
pub struct Subscription {
    rx: mpsc::Receiver<SubscriptionEvent>,
    producer: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<SubscriptionEvent>, producer: Option<JoinHandle<()>>) -> Self {
        Self { rx, producer }
    }

    pub async fn next(&mut self) -> Option<SubscriptionEvent> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

/// The single remote roster document.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the document; `None` when it has never been written.
    async fn fetch(&self) -> Result<Option<RosterSnapshot>, SyncError>;

    /// Overwrite the whole document.
    async fn write(&self, snapshot: &RosterSnapshot) -> Result<(), SyncError>;

    /// Start pushing document changes.
    async fn subscribe(&self) -> Result<Subscription, SyncError>;
}

/// Local-only mode: the remote is never reachable, so every load falls back
/// to the cache or the example roster and every save stays pending.
#[derive(Debug, Clone, Default)]
pub struct OfflineRemoteStore;

#[async_trait]
impl RemoteStore for OfflineRemoteStore {
    async fn fetch(&self) -> Result<Option<RosterSnapshot>, SyncError> {
        Err(offline())
    }

    async fn write(&self, _snapshot: &RosterSnapshot) -> Result<(), SyncError> {
        Err(offline())
    }

    async fn subscribe(&self) -> Result<Subscription, SyncError> {
        Err(offline())
    }
}

fn offline() -> SyncError {
    SyncError::RemoteUnavailable("local-only mode".to_string())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    data: T,
    revision_id: i64,
}

const UNKNOWN_REVISION: i64 = -1;

/// Talks to the roster service's `/api/roster` endpoints.
///
/// Clones share the API key and the last revision seen on a response.
#[derive(Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
    api_key: Arc<RwLock<Option<String>>>,
    seen_revision: Arc<AtomicI64>,
    poll_interval: Duration,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: Arc::new(RwLock::new(None)),
            seen_revision: Arc::new(AtomicI64::new(UNKNOWN_REVISION)),
            poll_interval,
        }
    }

    /// Present the admin key on every request.
    pub fn with_api_key(self, api_key: impl Into<String>) -> Self {
        self.set_api_key(Some(api_key.into()));
        self
    }

    /// Replace the key for this store and all of its clones, including a
    /// running subscription.
    pub fn set_api_key(&self, api_key: Option<String>) {
        match self.api_key.write() {
            Ok(mut key) => *key = api_key,
            Err(poisoned) => *poisoned.into_inner() = api_key,
        }
    }

    fn api_key(&self) -> Option<String> {
        match self.api_key.read() {
            Ok(key) => key.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match self.api_key() {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    pub async fn revision(&self) -> Result<RevisionInfo, SyncError> {
        let response = self
            .request(reqwest::Method::GET, "/api/roster/revision")
            .send()
            .await?;
        self.read_data(check_status(response).await?).await
    }

    async fn read_data<T: DeserializeOwned>(&self, response: Response) -> Result<T, SyncError> {
        let envelope: Envelope<T> = response.json().await?;
        self.seen_revision
            .store(envelope.revision_id, Ordering::SeqCst);
        Ok(envelope.data)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch(&self) -> Result<Option<RosterSnapshot>, SyncError> {
        let response = self
            .request(reqwest::Method::GET, "/api/roster")
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.read_data(check_status(response).await?)
            .await
            .map(Some)
    }

    async fn write(&self, snapshot: &RosterSnapshot) -> Result<(), SyncError> {
        let response = self
            .request(reqwest::Method::PUT, "/api/roster")
            .json(snapshot)
            .send()
            .await?;
        self.read_data::<IgnoredAny>(check_status(response).await?)
            .await?;
        Ok(())
    }

    /// Polls the revision and pushes the document whenever it moves past the
    /// last revision this store saw, so a write landing right after a fetch
    /// is still delivered.
    async fn subscribe(&self) -> Result<Subscription, SyncError> {
        let mut last_seen = match self.seen_revision.load(Ordering::SeqCst) {
            UNKNOWN_REVISION => self.revision().await?.revision_id,
            seen => seen,
        };
        let (tx, rx) = mpsc::channel(8);
        let store = self.clone();

        let producer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let event = match store.revision().await {
                    Ok(info) if info.revision_id == last_seen => continue,
                    Ok(info) => {
                        last_seen = info.revision_id;
                        store.fetch().await
                    }
                    Err(err) => Err(err),
                };

                let failed = event.is_err();
                if tx.send(event).await.is_err() || failed {
                    break;
                }
            }
        });

        Ok(Subscription::new(rx, Some(producer)))
    }
}

async fn check_status(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error.message)
        .unwrap_or_else(|_| format!("unexpected status {}", status));

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::RemoteDenied(message),
        StatusCode::BAD_REQUEST => SyncError::Validation(message),
        _ => SyncError::RemoteUnavailable(message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_store_is_always_unavailable() {
        let store = OfflineRemoteStore;
        assert!(matches!(
            store.fetch().await,
            Err(SyncError::RemoteUnavailable(_))
        ));
        assert!(matches!(
            store.write(&RosterSnapshot::default()).await,
            Err(SyncError::RemoteUnavailable(_))
        ));
        assert!(store.subscribe().await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_remote_unavailable() {
        let store = HttpRemoteStore::new("http://127.0.0.1:9", Duration::from_millis(10));
        assert!(matches!(
            store.fetch().await,
            Err(SyncError::RemoteUnavailable(_))
        ));
    }
}
