//! Session provider.
//!
//! Holds the single view of "who is signed in and with what credential" and
//! hands it to every consumer. The provider is an owned value passed to the
//! pages that need it; it only changes while a [`Subscription`] to an
//! identity-change stream is alive.
//!
//! Each identity event is processed in order:
//!
//! 1. a signed-in identity is published as [`SessionState::PendingCredential`],
//! 2. a fresh credential is requested and awaited,
//! 3. the outcome is published as `Ready` or `CredentialFailed` with
//!    `initializing` cleared.
//!
//! A signed-out event skips retrieval and publishes `SignedOut` directly.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::{Credential, Identity};

/// Produces bearer credentials for a signed-in identity
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn fresh_credential(&self, identity: &Identity) -> Result<Credential>;
}

/// Authentication state carried by a [`Snapshot`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    SignedOut,
    /// Identity known, credential retrieval in flight
    PendingCredential { identity: Identity },
    Ready { identity: Identity, credential: Credential },
    /// Identity known but no usable credential; protected calls must not be made
    CredentialFailed { identity: Identity, reason: String },
}

/// Immutable point-in-time view of the session
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    state: SessionState,
    initializing: bool,
}

impl Snapshot {
    fn initial() -> Self {
        Self {
            state: SessionState::SignedOut,
            initializing: true,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::SignedOut => None,
            SessionState::PendingCredential { identity }
            | SessionState::Ready { identity, .. }
            | SessionState::CredentialFailed { identity, .. } => Some(identity),
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match &self.state {
            SessionState::Ready { credential, .. } => Some(credential),
            _ => None,
        }
    }

    /// True until the first identity event has been fully processed
    pub fn initializing(&self) -> bool {
        self.initializing
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity().is_some()
    }

    /// Signed-in identity, or the sign-in prompt as an error
    pub fn require_identity(&self) -> Result<&Identity> {
        self.identity().ok_or_else(|| {
            Error::Validation("Sign in required. Run `apiprobe auth login` first.".to_string())
        })
    }

    /// Credential for a protected call, or a user-facing error
    pub fn require_credential(&self) -> Result<&Credential> {
        self.credential()
            .ok_or_else(|| Error::Validation("Login required.".to_string()))
    }
}

/// Owner of the session snapshot.
///
/// At most one subscription publishes at a time: subscribing again releases
/// the previous subscription's right to publish.
#[derive(Clone)]
pub struct SessionProvider {
    tx: Arc<watch::Sender<Snapshot>>,
    attachment: Arc<Attachment>,
}

/// The subscription currently allowed to publish
struct Attachment {
    current: Mutex<Option<Arc<Mutex<bool>>>>,
    attached: watch::Sender<bool>,
}

impl Attachment {
    /// Forget `live` if it is still the current subscription
    fn detach(&self, live: &Arc<Mutex<bool>>) {
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|c| Arc::ptr_eq(c, live)) {
            *current = None;
            self.attached.send_replace(false);
        }
    }
}

impl Default for SessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::initial());
        let (attached, _rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            attachment: Arc::new(Attachment {
                current: Mutex::new(None),
                attached,
            }),
        }
    }

    /// Current snapshot; never waits on I/O
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every publication
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Wait until the first identity event has been processed.
    ///
    /// Also returns, with the snapshot as it stands, when no subscription is
    /// attached: before [`subscribe`](Self::subscribe) or once the
    /// subscription has been released.
    pub async fn ready(&self) -> Snapshot {
        let mut rx = self.watch();
        let mut attached = self.attachment.attached.subscribe();
        tokio::select! {
            _ = rx.wait_for(|s| !s.initializing()) => {}
            _ = attached.wait_for(|a| !*a) => {}
        }
        self.snapshot()
    }

    /// Start following `events`. Must be called inside a tokio runtime.
    ///
    /// The returned guard owns the subscription: dropping it (or calling
    /// [`Subscription::unsubscribe`]) stops all further publications. A
    /// previous subscription on this provider stops publishing.
    pub fn subscribe<S>(&self, events: S, credentials: Arc<dyn CredentialSource>) -> Subscription
    where
        S: Stream<Item = Option<Identity>> + Send + 'static,
    {
        let live = Arc::new(Mutex::new(true));
        {
            let mut current = self.attachment.current.lock();
            if let Some(previous) = current.replace(live.clone()) {
                *previous.lock() = false;
                debug!("Previous session subscription replaced");
            }
            self.attachment.attached.send_replace(true);
        }
        let publisher = Publisher {
            tx: self.tx.clone(),
            live: live.clone(),
        };
        let task = tokio::spawn(follow(Box::pin(events), credentials, publisher));
        Subscription {
            live,
            attachment: self.attachment.clone(),
            task: Some(task),
        }
    }
}

/// Sends snapshots while the owning subscription is alive
struct Publisher {
    tx: Arc<watch::Sender<Snapshot>>,
    live: Arc<Mutex<bool>>,
}

impl Publisher {
    /// Returns false once the subscription has been released.
    fn publish(&self, snapshot: Snapshot) -> bool {
        let live = self.live.lock();
        if !*live {
            return false;
        }
        self.tx.send_replace(snapshot);
        true
    }

    fn initializing(&self) -> bool {
        self.tx.borrow().initializing
    }
}

async fn follow(
    mut events: std::pin::Pin<Box<dyn Stream<Item = Option<Identity>> + Send>>,
    credentials: Arc<dyn CredentialSource>,
    publisher: Publisher,
) {
    while let Some(event) = events.next().await {
        let state = match event {
            None => {
                info!("No signed-in identity");
                SessionState::SignedOut
            }
            Some(identity) => {
                debug!(uid = %identity.uid, "Identity changed, requesting credential");
                let pending = Snapshot {
                    state: SessionState::PendingCredential {
                        identity: identity.clone(),
                    },
                    initializing: publisher.initializing(),
                };
                if !publisher.publish(pending) {
                    return;
                }

                match credentials.fresh_credential(&identity).await {
                    Ok(credential) => {
                        info!(uid = %identity.uid, "Signed in");
                        SessionState::Ready {
                            identity,
                            credential,
                        }
                    }
                    Err(e) => {
                        warn!(uid = %identity.uid, error = %e, "Credential retrieval failed");
                        SessionState::CredentialFailed {
                            identity,
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        let snapshot = Snapshot {
            state,
            initializing: false,
        };
        if !publisher.publish(snapshot) {
            return;
        }
    }
    debug!("Identity event stream ended");
    if publisher.initializing() {
        let last = Snapshot {
            state: publisher.tx.borrow().state.clone(),
            initializing: false,
        };
        publisher.publish(last);
    }
}

/// Scoped subscription to an identity-change stream
pub struct Subscription {
    live: Arc<Mutex<bool>>,
    attachment: Arc<Attachment>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        *self.live.lock()
    }

    /// Cancel the subscription. Same as dropping the guard.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        // Flip the flag under the lock first so an in-progress publish
        // either finishes before us or never happens.
        *self.live.lock() = false;
        self.attachment.detach(&self.live);
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Session subscription released");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Hands out `tok-<uid>` unless the uid is listed as failing.
    #[derive(Default)]
    struct FakeCredentials {
        tokens: HashMap<String, String>,
        failing: Vec<String>,
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl CredentialSource for FakeCredentials {
        async fn fresh_credential(&self, identity: &Identity) -> Result<Credential> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.failing.contains(&identity.uid) {
                return Err(Error::Identity("network unreachable".into()));
            }
            let token = self
                .tokens
                .get(&identity.uid)
                .cloned()
                .unwrap_or_else(|| format!("tok-{}", identity.uid));
            Ok(Credential::new(token))
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_initial_snapshot_is_initializing() {
        let provider = SessionProvider::new();
        let snap = provider.snapshot();
        assert!(snap.initializing());
        assert!(snap.identity().is_none());
        assert!(snap.credential().is_none());
    }

    #[tokio::test]
    async fn test_identity_with_credential() {
        let provider = SessionProvider::new();
        let creds = Arc::new(FakeCredentials {
            tokens: [("u1".to_string(), "tok-1".to_string())].into_iter().collect(),
            ..Default::default()
        });
        let (tx, rx) = mpsc::unbounded();
        let _sub = provider.subscribe(rx, creds.clone());

        tx.unbounded_send(Some(Identity::new("u1"))).unwrap();
        let snap = provider.ready().await;

        assert_eq!(snap.identity(), Some(&Identity::new("u1")));
        assert_eq!(snap.credential().map(|c| c.as_str()), Some("tok-1"));
        assert!(!snap.initializing());
        assert_eq!(creds.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_null_identity_skips_retrieval() {
        let provider = SessionProvider::new();
        let creds = Arc::new(FakeCredentials::default());
        let (tx, rx) = mpsc::unbounded();
        let _sub = provider.subscribe(rx, creds.clone());

        tx.unbounded_send(None).unwrap();
        let snap = provider.ready().await;

        assert_eq!(snap.state(), &SessionState::SignedOut);
        assert!(snap.credential().is_none());
        assert!(!snap.initializing());
        assert_eq!(creds.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_retrieval_keeps_identity_without_credential() {
        let provider = SessionProvider::new();
        let creds = Arc::new(FakeCredentials {
            failing: vec!["u2".to_string()],
            ..Default::default()
        });
        let (tx, rx) = mpsc::unbounded();
        let _sub = provider.subscribe(rx, creds);

        tx.unbounded_send(Some(Identity::new("u2"))).unwrap();
        let snap = provider.ready().await;

        assert!(snap.credential().is_none());
        assert!(snap.require_credential().is_err());
        match snap.state() {
            SessionState::CredentialFailed { identity, reason } => {
                assert_eq!(identity.uid, "u2");
                assert!(reason.contains("network unreachable"));
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pending_state_never_carries_credential() {
        let gate = Arc::new(Notify::new());
        let provider = SessionProvider::new();
        let creds = Arc::new(FakeCredentials {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let (tx, rx) = mpsc::unbounded();
        let _sub = provider.subscribe(rx, creds);

        let mut watcher = provider.watch();
        tx.unbounded_send(Some(Identity::new("u1"))).unwrap();
        watcher.changed().await.unwrap();
        {
            let snap = watcher.borrow_and_update();
            assert!(matches!(snap.state(), SessionState::PendingCredential { .. }));
            assert!(snap.credential().is_none());
            // First event not finished yet
            assert!(snap.initializing());
        }

        gate.notify_one();
        watcher.changed().await.unwrap();
        let snap = watcher.borrow_and_update().clone();
        assert_eq!(snap.credential().map(|c| c.as_str()), Some("tok-u1"));
        assert!(!snap.initializing());
    }

    #[tokio::test]
    async fn test_sequence_never_mismatches_identity_and_credential() {
        let provider = SessionProvider::new();
        let creds = Arc::new(FakeCredentials {
            failing: vec!["bad".to_string()],
            ..Default::default()
        });
        let (tx, rx) = mpsc::unbounded();
        let _sub = provider.subscribe(rx, creds);

        let mut watcher = provider.watch();
        let events = vec![
            None,
            Some(Identity::new("a")),
            Some(Identity::new("bad")),
            None,
            Some(Identity::new("b")),
        ];
        for event in events {
            tx.unbounded_send(event).unwrap();
        }
        drop(tx);

        let mut seen_initialized = false;
        loop {
            let snap = watcher.borrow_and_update().clone();
            if seen_initialized {
                assert!(!snap.initializing(), "initializing reverted to true");
            }
            seen_initialized |= !snap.initializing();

            match (snap.identity(), snap.credential()) {
                (None, Some(_)) => panic!("credential without identity"),
                (Some(id), Some(cred)) => assert_eq!(cred.as_str(), format!("tok-{}", id.uid)),
                _ => {}
            }
            if snap.identity().map(|i| i.uid.as_str()) == Some("b") && snap.credential().is_some() {
                break;
            }
            watcher.changed().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_no_publication_after_unsubscribe() {
        let provider = SessionProvider::new();
        let creds = Arc::new(FakeCredentials::default());
        let (tx, rx) = mpsc::unbounded();
        let sub = provider.subscribe(rx, creds);

        tx.unbounded_send(Some(Identity::new("u1"))).unwrap();
        let before = provider.ready().await;
        assert!(sub.is_active());
        sub.unsubscribe();

        let mut watcher = provider.watch();
        // Receiver may already be closed after teardown; either way no event is delivered.
        let _ = tx.unbounded_send(None);
        settle().await;

        assert!(!watcher.has_changed().unwrap_or(false));
        assert_eq!(provider.snapshot(), before);
    }

    #[tokio::test]
    async fn test_drop_releases_mid_retrieval() {
        let gate = Arc::new(Notify::new());
        let provider = SessionProvider::new();
        let creds = Arc::new(FakeCredentials {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let (tx, rx) = mpsc::unbounded();
        let sub = provider.subscribe(rx, creds);

        let mut watcher = provider.watch();
        tx.unbounded_send(Some(Identity::new("u1"))).unwrap();
        watcher.changed().await.unwrap();
        watcher.borrow_and_update();

        drop(sub);
        gate.notify_one();
        settle().await;

        assert!(!watcher.has_changed().unwrap_or(false));
        let snap = provider.snapshot();
        assert!(matches!(snap.state(), SessionState::PendingCredential { .. }));
        assert!(snap.initializing());
    }

    #[tokio::test]
    async fn test_empty_stream_finishes_initialization() {
        let provider = SessionProvider::new();
        let creds = Arc::new(FakeCredentials::default());
        let _sub = provider.subscribe(futures::stream::empty::<Option<Identity>>(), creds.clone());

        let snap = tokio::time::timeout(Duration::from_secs(1), provider.ready())
            .await
            .expect("ready() must resolve when the stream ends");
        assert_eq!(snap.state(), &SessionState::SignedOut);
        assert!(!snap.initializing());
        assert_eq!(creds.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ready_resolves_after_release_mid_retrieval() {
        let gate = Arc::new(Notify::new());
        let provider = SessionProvider::new();
        let creds = Arc::new(FakeCredentials {
            gate: Some(gate),
            ..Default::default()
        });
        let (tx, rx) = mpsc::unbounded();
        let sub = provider.subscribe(rx, creds);

        let mut watcher = provider.watch();
        tx.unbounded_send(Some(Identity::new("u1"))).unwrap();
        watcher.changed().await.unwrap();

        let waiting = provider.clone();
        let ready = tokio::spawn(async move { waiting.ready().await });
        settle().await;
        assert!(!ready.is_finished());

        drop(sub);
        let snap = tokio::time::timeout(Duration::from_secs(1), ready)
            .await
            .expect("ready() must resolve once released")
            .unwrap();
        assert!(matches!(snap.state(), SessionState::PendingCredential { .. }));
        assert!(snap.initializing());
    }

    #[tokio::test]
    async fn test_new_subscription_replaces_previous() {
        let provider = SessionProvider::new();
        let creds = Arc::new(FakeCredentials::default());

        let (tx1, rx1) = mpsc::unbounded();
        let first = provider.subscribe(rx1, creds.clone());
        tx1.unbounded_send(Some(Identity::new("u1"))).unwrap();
        assert_eq!(provider.ready().await.identity(), Some(&Identity::new("u1")));

        let (tx2, rx2) = mpsc::unbounded();
        let second = provider.subscribe(rx2, creds);
        assert!(!first.is_active());
        assert!(second.is_active());

        // The replaced subscription no longer publishes
        let _ = tx1.unbounded_send(Some(Identity::new("u9")));
        settle().await;
        assert_eq!(provider.snapshot().identity(), Some(&Identity::new("u1")));

        tx2.unbounded_send(Some(Identity::new("u2"))).unwrap();
        let mut watcher = provider.watch();
        let snap = watcher
            .wait_for(|s| s.credential().is_some() && s.identity().map(|i| i.uid.as_str()) == Some("u2"))
            .await
            .unwrap()
            .clone();
        assert_eq!(snap.credential().map(|c| c.as_str()), Some("tok-u2"));

        // Dropping the replaced guard leaves the current one attached
        drop(first);
        assert!(second.is_active());
        assert_eq!(provider.ready().await.identity(), Some(&Identity::new("u2")));
    }
}
