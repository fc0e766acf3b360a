//! Session store.
//!
//! Owns the client's view of who is signed in and with which role. The
//! store wraps the auth service's identity-change sequence, fetches the role
//! from the `users` collection on every transition, and tells the
//! [`Navigator`] where to go after login and logout.
//!
//! # Lifecycle
//!
//! [`SessionStore::start`] spawns a single listener task. The session starts
//! [`SessionStatus::Pending`] and resolves on the first identity event.
//! [`SessionStore::shutdown`] stops the listener; dropping the last handle
//! does the same.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use artisan_backend::{AuthError, AuthService, Broadcaster, DocumentStore, Identity, Subscription};
use artisan_core::models::{USERS_COLLECTION, UserRecord};
use artisan_core::{Credentials, Email, Role, UserId};

use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::navigation::Navigator;
use crate::routes::{LOGIN_PATH, landing_for};

/// Whether the first identity event has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Pending,
    Resolved,
}

/// Snapshot of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub identity: Option<Identity>,
    /// Only meaningful alongside an identity.
    pub role: Option<Role>,
    pub status: SessionStatus,
}

impl Session {
    /// The state before the auth service has reported anything.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// A resolved session. The role is dropped when there is no identity.
    #[must_use]
    pub fn resolved(identity: Option<Identity>, role: Option<Role>) -> Self {
        let role = identity.as_ref().and(role);
        Self {
            identity,
            role,
            status: SessionStatus::Resolved,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn uid(&self) -> Option<&UserId> {
        self.identity.as_ref().map(|identity| &identity.uid)
    }

    #[must_use]
    pub fn email(&self) -> Option<&Email> {
        self.identity.as_ref().and_then(|identity| identity.email.as_ref())
    }

    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.is_authenticated() && self.role == Some(Role::Seller)
    }
}

struct Inner {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn DocumentStore>,
    navigator: Arc<Navigator>,
    state: watch::Sender<Session>,
    transition: Mutex<()>,
    events: Broadcaster<Session>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    /// Fetch the role for `uid`. Any failure degrades to "no role".
    async fn lookup_role(&self, uid: &UserId) -> Option<Role> {
        match self.store.read_one(USERS_COLLECTION, uid.as_str()).await {
            Ok(Some(document)) => match document.decode::<UserRecord>() {
                Ok(record) => {
                    let role = record.role();
                    if role.is_none() {
                        tracing::info!(uid = %uid, raw = ?record.role, "User document has no known role");
                    }
                    role
                }
                Err(e) => {
                    tracing::warn!(uid = %uid, error = %e, "Unreadable user document");
                    None
                }
            },
            Ok(None) => {
                tracing::info!(uid = %uid, "No user document, role unset");
                None
            }
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "Role lookup failed");
                None
            }
        }
    }

    /// Move the session to `identity` with `role`.
    ///
    /// Events whose identity no longer matches the auth service are stale
    /// (a sign-out happened while the role was being fetched) and are
    /// dropped. Subscribers hear about uid changes and the first resolution
    /// only; a role refresh for the same uid updates the snapshot quietly.
    fn apply(&self, identity: Option<Identity>, role: Option<Role>) -> bool {
        let _guard = self.transition.lock().unwrap_or_else(PoisonError::into_inner);

        let live_uid = self.auth.current_identity().map(|identity| identity.uid);
        if identity.as_ref().map(|identity| &identity.uid) != live_uid.as_ref() {
            tracing::debug!(
                event_uid = ?identity.as_ref().map(|identity| identity.uid.as_str()),
                "Ignoring stale identity event"
            );
            return false;
        }

        let next = Session::resolved(identity, role);
        let previous = self.state.send_replace(next.clone());
        let transitioned =
            previous.status == SessionStatus::Pending || previous.uid() != next.uid();
        if transitioned {
            tracing::debug!(uid = ?next.uid().map(UserId::as_str), role = ?next.role, "Session changed");
            self.events.publish(next);
        }
        transitioned
    }

    fn stop_listener(&self) -> bool {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        handle.is_some_and(|handle| {
            handle.abort();
            true
        })
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

async fn listen(inner: Weak<Inner>, mut changes: Subscription<Option<Identity>>) {
    while let Some(identity) = changes.next().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let role = match &identity {
            Some(identity) => inner.lookup_role(&identity.uid).await,
            None => None,
        };
        inner.apply(identity, role);
    }
}

/// Aborts an [`SessionStore::on_identity_change`] handler when dropped.
#[derive(Debug)]
pub struct ListenerGuard {
    task: JoinHandle<()>,
}

impl ListenerGuard {
    /// Stop invoking the handler.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Shared handle to the session.
///
/// Cheap to clone; every clone sees the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Create the store and start listening for identity changes.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(
        auth: Arc<dyn AuthService>,
        store: Arc<dyn DocumentStore>,
        navigator: Arc<Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(Session::pending());
        let changes = auth.identity_changes();
        let inner = Arc::new(Inner {
            auth,
            store,
            navigator,
            state,
            transition: Mutex::new(()),
            events: Broadcaster::new(),
            listener: Mutex::new(None),
        });

        let handle = tokio::spawn(listen(Arc::downgrade(&inner), changes));
        *inner.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        tracing::debug!("Session store started");

        Self { inner }
    }

    /// Latest session snapshot.
    #[must_use]
    pub fn current_session(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Wait until the first identity event has been processed.
    pub async fn resolved(&self) -> Session {
        let mut rx = self.inner.state.subscribe();
        match rx
            .wait_for(|session| session.status == SessionStatus::Resolved)
            .await
        {
            Ok(session) => session.clone(),
            Err(_) => self.current_session(),
        }
    }

    /// A watch receiver over the session snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Session changes from now on, one per identity transition, in order.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<Session> {
        self.inner.events.subscribe()
    }

    /// Run `handler` for every identity transition until the guard drops.
    pub fn on_identity_change<F>(&self, mut handler: F) -> ListenerGuard
    where
        F: FnMut(&Session) + Send + 'static,
    {
        let mut events = self.subscribe();
        let task = tokio::spawn(async move {
            while let Some(session) = events.next().await {
                handler(&session);
            }
        });
        ListenerGuard { task }
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.inner.navigator
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.inner.auth
    }

    /// Sign in, look up the role and navigate to the role's landing page.
    ///
    /// # Errors
    ///
    /// Returns the auth service's error when sign-in is rejected. A missing
    /// or unreadable role document is not an error.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let identity = self
            .inner
            .auth
            .sign_in(credentials)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Sign-in rejected"))?;

        let role = self.inner.lookup_role(&identity.uid).await;
        self.inner.apply(Some(identity.clone()), role);

        let landing = landing_for(role);
        self.inner.navigator.navigate(landing);

        set_sentry_user(&identity.uid, identity.email.as_ref().map(Email::as_str));
        add_breadcrumb("auth", "Logged in", Some(&[("landing", landing)][..]));
        tracing::info!(uid = %identity.uid, role = ?role, landing, "Logged in");

        Ok(identity)
    }

    /// Sign out, clear the session and navigate to the login page.
    ///
    /// # Errors
    ///
    /// Returns the auth service's error. The session and location are left
    /// untouched in that case.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let uid = self.current_session().uid().cloned();
        if let Err(e) = self.inner.auth.sign_out().await {
            tracing::warn!(error = %e, "Sign-out failed");
            return Err(e);
        }

        self.inner.apply(None, None);
        self.inner.navigator.navigate(LOGIN_PATH);
        clear_sentry_user();
        tracing::info!(uid = ?uid.as_ref().map(UserId::as_str), "Logged out");

        Ok(())
    }

    /// Look the role up again for the current identity.
    ///
    /// Used after registration, when the identity event may have been
    /// handled before the user document existed.
    pub async fn refresh_role(&self) -> Option<Role> {
        let identity = self.inner.auth.current_identity()?;
        let role = self.inner.lookup_role(&identity.uid).await;
        self.inner.apply(Some(identity), role);
        role
    }

    /// Stop listening for identity changes.
    ///
    /// Returns `false` if the listener was already stopped.
    pub fn shutdown(&self) -> bool {
        let stopped = self.inner.stop_listener();
        if stopped {
            tracing::debug!("Session store shut down");
        }
        stopped
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.current_session())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use artisan_backend::memory::MemoryBackend;
    use artisan_backend::Fields;

    use super::*;

    fn user_doc(role: &str) -> Fields {
        serde_json::json!({ "name": "Asha", "email": "asha@example.com", "role": role })
            .as_object()
            .cloned()
            .unwrap()
    }

    async fn started(memory: &MemoryBackend) -> (SessionStore, Subscription<String>) {
        let backend = memory.backend();
        let navigator = Arc::new(Navigator::new());
        let nav_events = navigator.subscribe();
        let store = SessionStore::start(backend.auth, backend.store, navigator);
        store.resolved().await;
        (store, nav_events)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_resolves_to_anonymous() {
        let memory = MemoryBackend::new();
        let (store, _) = started(&memory).await;

        let session = store.current_session();
        assert_eq!(session.status, SessionStatus::Resolved);
        assert!(session.identity.is_none());
        assert!(session.role.is_none());
    }

    #[tokio::test]
    async fn test_seller_login_lands_on_dashboard() {
        let memory = MemoryBackend::new();
        let uid = memory.auth.add_account("maker@example.com", "secret1").unwrap();
        memory.store.insert("users", uid.as_str(), user_doc("seller"));
        let (store, mut nav) = started(&memory).await;

        let credentials = Credentials::new("maker@example.com", "secret1").unwrap();
        let identity = store.login(&credentials).await.unwrap();

        assert_eq!(identity.uid, uid);
        assert_eq!(nav.next().await.as_deref(), Some("/seller/dashboard"));
        assert!(nav.try_next().is_none());
        let session = store.current_session();
        assert_eq!(session.role, Some(Role::Seller));
        assert!(session.is_seller());
    }

    #[tokio::test]
    async fn test_user_login_lands_on_home() {
        let memory = MemoryBackend::new();
        let uid = memory.auth.add_account("asha@example.com", "secret1").unwrap();
        memory.store.insert("users", uid.as_str(), user_doc("user"));
        let (store, mut nav) = started(&memory).await;

        store
            .login(&Credentials::new("asha@example.com", "secret1").unwrap())
            .await
            .unwrap();

        assert_eq!(nav.next().await.as_deref(), Some("/"));
        assert!(nav.try_next().is_none());
        let session = store.current_session();
        assert_eq!(session.role, Some(Role::User));
        assert!(!session.is_seller());
    }

    #[tokio::test]
    async fn test_login_without_user_document_uses_default_landing() {
        let memory = MemoryBackend::new();
        memory.auth.add_account("a@b.com", "pw").unwrap();
        let (store, mut nav) = started(&memory).await;

        store
            .login(&Credentials::new("a@b.com", "pw").unwrap())
            .await
            .unwrap();

        assert_eq!(nav.next().await.as_deref(), Some("/"));
        let session = store.current_session();
        assert!(session.is_authenticated());
        assert_eq!(session.role, None);
    }

    #[tokio::test]
    async fn test_role_lookup_failure_degrades_to_no_role() {
        let memory = MemoryBackend::new();
        let uid = memory.auth.add_account("maker@example.com", "secret1").unwrap();
        memory.store.insert("users", uid.as_str(), user_doc("seller"));
        memory.store.set_fail_reads(true);
        let (store, mut nav) = started(&memory).await;

        store
            .login(&Credentials::new("maker@example.com", "secret1").unwrap())
            .await
            .unwrap();

        assert_eq!(nav.next().await.as_deref(), Some("/"));
        assert_eq!(store.current_session().role, None);
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_session() {
        let memory = MemoryBackend::new();
        memory.auth.add_account("a@b.com", "right-password").unwrap();
        let (store, mut nav) = started(&memory).await;

        let err = store
            .login(&Credentials::new("a@b.com", "wrong-password").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials(_)));
        assert!(store.current_session().identity.is_none());
        assert!(nav.try_next().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_seller_and_goes_to_login() {
        let memory = MemoryBackend::new();
        let uid = memory.auth.add_account("maker@example.com", "secret1").unwrap();
        memory.store.insert("users", uid.as_str(), user_doc("seller"));
        let (store, mut nav) = started(&memory).await;
        store
            .login(&Credentials::new("maker@example.com", "secret1").unwrap())
            .await
            .unwrap();

        store.logout().await.unwrap();

        assert_eq!(nav.next().await.as_deref(), Some("/seller/dashboard"));
        assert_eq!(nav.next().await.as_deref(), Some("/login"));
        let session = store.current_session();
        assert!(session.identity.is_none());
        assert!(session.role.is_none());
    }

    #[tokio::test]
    async fn test_failed_logout_leaves_session_unchanged() {
        let memory = MemoryBackend::new();
        memory.auth.add_account("a@b.com", "secret1").unwrap();
        let (store, mut nav) = started(&memory).await;
        store
            .login(&Credentials::new("a@b.com", "secret1").unwrap())
            .await
            .unwrap();
        assert_eq!(nav.next().await.as_deref(), Some("/"));
        let before = store.current_session();

        memory.auth.set_fail_sign_out(true);
        assert!(store.logout().await.is_err());

        settle().await;
        assert_eq!(store.current_session(), before);
        assert!(nav.try_next().is_none());
    }

    #[tokio::test]
    async fn test_one_event_per_transition() {
        let memory = MemoryBackend::new();
        let uid = memory.auth.add_account("a@b.com", "secret1").unwrap();
        let (store, _) = started(&memory).await;
        let mut events = store.subscribe();

        store
            .login(&Credentials::new("a@b.com", "secret1").unwrap())
            .await
            .unwrap();
        settle().await;
        store.logout().await.unwrap();
        settle().await;

        assert_eq!(events.next().await.unwrap().uid(), Some(&uid));
        assert_eq!(events.next().await.unwrap().uid(), None);
        assert!(events.try_next().is_none());
    }

    #[tokio::test]
    async fn test_external_sign_in_is_picked_up_by_listener() {
        let memory = MemoryBackend::new();
        let uid = memory.auth.add_account("maker@example.com", "secret1").unwrap();
        memory.store.insert("users", uid.as_str(), user_doc("seller"));
        let (store, _) = started(&memory).await;

        memory
            .auth
            .sign_in(&Credentials::new("maker@example.com", "secret1").unwrap())
            .await
            .unwrap();
        settle().await;

        let session = store.current_session();
        assert_eq!(session.uid(), Some(&uid));
        assert_eq!(session.role, Some(Role::Seller));
    }

    #[tokio::test]
    async fn test_stale_identity_is_ignored() {
        let memory = MemoryBackend::new();
        memory.auth.add_account("a@b.com", "secret1").unwrap();
        let (store, _) = started(&memory).await;

        let identity = memory
            .auth
            .sign_in(&Credentials::new("a@b.com", "secret1").unwrap())
            .await
            .unwrap();
        memory.auth.sign_out().await.unwrap();
        settle().await;

        assert!(!store.inner.apply(Some(identity), Some(Role::Seller)));
        assert!(store.current_session().identity.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_happens_once() {
        let memory = MemoryBackend::new();
        memory.auth.add_account("a@b.com", "secret1").unwrap();
        let (store, _) = started(&memory).await;

        assert!(store.shutdown());
        assert!(!store.shutdown());

        memory
            .auth
            .sign_in(&Credentials::new("a@b.com", "secret1").unwrap())
            .await
            .unwrap();
        settle().await;
        assert!(store.current_session().identity.is_none());
    }

    #[tokio::test]
    async fn test_dropped_handler_stops_receiving() {
        let memory = MemoryBackend::new();
        memory.auth.add_account("a@b.com", "secret1").unwrap();
        let (store, _) = started(&memory).await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let guard = store.on_identity_change(move |session| {
            let _ = tx.send(session.is_authenticated());
        });

        store
            .login(&Credentials::new("a@b.com", "secret1").unwrap())
            .await
            .unwrap();
        assert_eq!(rx.recv().await, Some(true));

        guard.cancel();
        store.logout().await.unwrap();
        settle().await;
        assert!(rx.try_recv().is_err());
    }
}
