//! In-process backend for development and tests.
//!
//! Behaves like the managed services closely enough for the application
//! layer: accounts with passwords, collections of JSON documents with live
//! snapshots, and an object store. Failure switches let tests exercise the
//! error paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use artisan_core::{Credentials, Email, EmailError, UserId};

use crate::Backend;
use crate::document::{Document, Fields, Query, Snapshot};
use crate::error::{AuthError, StoreError, UploadError};
use crate::identity::Identity;
use crate::service::{
    AuthService, DocumentStore, ObjectStorage, ProgressSender, TokenSource, TokenVerifier,
    UploadProgress,
};
use crate::subscription::{Broadcaster, Subscription};

const TOKEN_PREFIX: &str = "memory-token:";
const MIN_PASSWORD_LENGTH: usize = 6;

/// In-memory versions of every backend service.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    pub auth: Arc<MemoryAuth>,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryStorage>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Type-erased service bundle sharing this backend's state.
    #[must_use]
    pub fn backend(&self) -> Backend {
        let tokens: Arc<dyn TokenSource> = self.auth.clone();
        Backend {
            auth: self.auth.clone(),
            tokens: Some(tokens),
            store: self.store.clone(),
            storage: self.storage.clone(),
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

struct Account {
    uid: UserId,
    password: SecretString,
    email_verified: bool,
}

/// Password accounts and a single signed-in identity.
pub struct MemoryAuth {
    accounts: Mutex<HashMap<Email, Account>>,
    current: Mutex<Option<Identity>>,
    changes: Broadcaster<Option<Identity>>,
    next_uid: AtomicU64,
    fail_sign_out: AtomicBool,
    verification_requests: Mutex<Vec<UserId>>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            changes: Broadcaster::replaying(None),
            next_uid: AtomicU64::new(1),
            fail_sign_out: AtomicBool::new(false),
            verification_requests: Mutex::new(Vec::new()),
        }
    }
}

impl std::fmt::Debug for MemoryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAuth")
            .field("current", &self.current_identity())
            .finish_non_exhaustive()
    }
}

impl MemoryAuth {
    /// Register an account without signing in.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if `email` is malformed.
    pub fn add_account(&self, email: &str, password: &str) -> Result<UserId, EmailError> {
        let email = Email::parse(email)?;
        let uid = self.allocate_uid();
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                email,
                Account {
                    uid: uid.clone(),
                    password: SecretString::from(password.to_string()),
                    email_verified: false,
                },
            );
        Ok(uid)
    }

    /// Make the next `sign_out` calls fail.
    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Users a verification email was requested for, oldest first.
    pub fn verification_requests(&self) -> Vec<UserId> {
        self.verification_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The bearer token this backend issues for `uid`.
    #[must_use]
    pub fn token_for(uid: &UserId) -> String {
        format!("{TOKEN_PREFIX}{uid}")
    }

    fn allocate_uid(&self) -> UserId {
        let n = self.next_uid.fetch_add(1, Ordering::SeqCst);
        UserId::new(format!("user-{n}"))
    }

    fn set_current(&self, identity: Option<Identity>) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = current.as_ref().map(|i| &i.uid) != identity.as_ref().map(|i| &i.uid);
        (*current).clone_from(&identity);
        if changed {
            self.changes.publish(identity);
        }
    }
}

#[async_trait]
impl AuthService for MemoryAuth {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let identity = {
            let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
            accounts
                .get(&credentials.email)
                .filter(|account| {
                    account.password.expose_secret() == credentials.password.expose_secret()
                })
                .map(|account| Identity {
                    uid: account.uid.clone(),
                    email: Some(credentials.email.clone()),
                    email_verified: account.email_verified,
                })
        }
        .ok_or_else(|| AuthError::InvalidCredentials("INVALID_LOGIN_CREDENTIALS".to_string()))?;

        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        if credentials.password.expose_secret().len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword(format!(
                "Password should be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        let identity = {
            let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
            if accounts.contains_key(&credentials.email) {
                return Err(AuthError::EmailAlreadyInUse);
            }
            let uid = self.allocate_uid();
            accounts.insert(
                credentials.email.clone(),
                Account {
                    uid: uid.clone(),
                    password: credentials.password.clone(),
                    email_verified: false,
                },
            );
            Identity::new(uid, Some(credentials.email.clone()))
        };

        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("network request failed".to_string()));
        }
        self.set_current(None);
        Ok(())
    }

    async fn send_email_verification(&self) -> Result<(), AuthError> {
        let identity = self.current_identity().ok_or(AuthError::NotSignedIn)?;
        self.verification_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(identity.uid);
        Ok(())
    }

    fn identity_changes(&self) -> Subscription<Option<Identity>> {
        self.changes.subscribe()
    }

    fn current_identity(&self) -> Option<Identity> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TokenSource for MemoryAuth {
    async fn id_token(&self) -> Result<Option<SecretString>, AuthError> {
        Ok(self
            .current_identity()
            .map(|identity| SecretString::from(Self::token_for(&identity.uid))))
    }
}

#[async_trait]
impl TokenVerifier for MemoryAuth {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let uid = token
            .strip_prefix(TOKEN_PREFIX)
            .filter(|uid| !uid.is_empty())
            .ok_or(AuthError::InvalidToken)?;
        let known = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .any(|account| account.uid.as_str() == uid);
        if known {
            Ok(UserId::new(uid))
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

// =============================================================================
// Document store
// =============================================================================

#[derive(Default)]
struct StoreInner {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    watchers: HashMap<String, Broadcaster<Snapshot>>,
}

impl StoreInner {
    fn snapshot(&self, collection: &str) -> Snapshot {
        let documents = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Snapshot { documents }
    }

    fn notify(&self, collection: &str) {
        if let Some(watchers) = self.watchers.get(collection) {
            watchers.publish(self.snapshot(collection));
        }
    }
}

/// Collections of JSON documents, ordered by id.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
    next_id: AtomicU64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MemoryStore")
            .field("collections", &inner.collections.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Seed a document, notifying subscribers.
    pub fn insert(&self, collection: &str, id: &str, fields: Fields) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        inner.notify(collection);
    }

    /// Current contents of a collection.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot(collection)
            .documents
    }

    /// Make reads (including `read_one`) fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make writes, adds and deletes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read_one(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn read_query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        self.check_reads()?;
        let snapshot = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot(collection);
        Ok(query.apply(&snapshot.documents))
    }

    async fn write_one(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.check_writes()?;
        self.insert(collection, id, fields);
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.check_writes()?;
        let id = format!("doc-{:06}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.insert(collection, &id, fields);
        Ok(id)
    }

    async fn delete_one(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_writes()?;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            inner.notify(collection);
        }
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Subscription<Snapshot> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let initial = inner.snapshot(collection);
        inner
            .watchers
            .entry(collection.to_string())
            .or_default()
            .subscribe_with(initial)
    }
}

// =============================================================================
// Object storage
// =============================================================================

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Objects keyed by path. Download URLs use the `memory://` scheme.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_uploads: AtomicBool,
}

impl MemoryStorage {
    /// Make uploads fail.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Look up an uploaded object.
    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Paths of every uploaded object, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        progress: Option<ProgressSender>,
    ) -> Result<String, UploadError> {
        let total = bytes.len() as u64;
        let send = |done| {
            if let Some(tx) = &progress {
                let _ = tx.send(UploadProgress {
                    bytes_transferred: done,
                    total_bytes: total,
                });
            }
        };

        send(0);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(UploadError::Unavailable("storage/retry-limit-exceeded".to_string()));
        }
        send(total / 2);
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                path.to_string(),
                StoredObject {
                    bytes,
                    content_type: content_type.to_string(),
                },
            );
        send(total);
        Ok(format!("memory://{path}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Fields::new(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let auth = MemoryAuth::default();
        let uid = auth.add_account("maker@example.com", "secret-pw").unwrap();

        let wrong = Credentials::new("maker@example.com", "nope").unwrap();
        assert!(matches!(
            auth.sign_in(&wrong).await,
            Err(AuthError::InvalidCredentials(_))
        ));

        let right = Credentials::new("Maker@Example.com", "secret-pw").unwrap();
        let identity = auth.sign_in(&right).await.unwrap();
        assert_eq!(identity.uid, uid);
        assert_eq!(auth.current_identity(), Some(identity));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicates_and_weak_passwords() {
        let auth = MemoryAuth::default();
        auth.add_account("taken@example.com", "secret-pw").unwrap();

        let dup = Credentials::new("taken@example.com", "another-pw").unwrap();
        assert!(matches!(
            auth.sign_up(&dup).await,
            Err(AuthError::EmailAlreadyInUse)
        ));

        let weak = Credentials::new("new@example.com", "123").unwrap();
        assert!(matches!(
            auth.sign_up(&weak).await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_identity_changes_once_per_transition() {
        let auth = MemoryAuth::default();
        auth.add_account("a@b.com", "pw1234").unwrap();
        let mut changes = auth.identity_changes();
        assert_eq!(changes.next().await, Some(None));

        let creds = Credentials::new("a@b.com", "pw1234").unwrap();
        auth.sign_in(&creds).await.unwrap();
        // Signing in again as the same user is not a transition.
        auth.sign_in(&creds).await.unwrap();
        auth.sign_out().await.unwrap();

        assert!(matches!(changes.next().await, Some(Some(_))));
        assert_eq!(changes.next().await, Some(None));
        assert!(changes.try_next().is_none());
    }

    #[tokio::test]
    async fn test_tokens_verify_for_known_users() {
        let auth = MemoryAuth::default();
        let uid = auth.add_account("a@b.com", "pw1234").unwrap();
        assert_eq!(
            auth.verify(&MemoryAuth::token_for(&uid)).await.unwrap(),
            uid
        );
        assert!(auth.verify("memory-token:ghost").await.is_err());
        assert!(auth.verify("garbage").await.is_err());
    }

    #[tokio::test]
    async fn test_store_query_and_delete() {
        let store = MemoryStore::default();
        store.insert("products", "p1", fields(json!({ "sellerId": "u1" })));
        store.insert("products", "p2", fields(json!({ "sellerId": "u2" })));

        let mine = store
            .read_query("products", &Query::new().where_eq("sellerId", "u1"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        store.delete_one("products", "p1").await.unwrap();
        assert!(store.read_one("products", "p1").await.unwrap().is_none());
        // Deleting again is not an error.
        store.delete_one("products", "p1").await.unwrap();
    }

    #[tokio::test]
    async fn test_subscription_gets_initial_then_updates() {
        let store = MemoryStore::default();
        store.insert("products", "p1", Fields::new());

        let mut sub = store.subscribe("products");
        assert_eq!(sub.next().await.unwrap().documents.len(), 1);

        let id = store.add("products", Fields::new()).await.unwrap();
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.documents.len(), 2);
        assert!(snapshot.documents.iter().any(|d| d.id == id));
    }

    #[tokio::test]
    async fn test_dropped_subscription_gets_nothing() {
        let store = MemoryStore::default();
        let sub = store.subscribe("products");
        drop(sub);
        store.insert("products", "p1", Fields::new());

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.watchers["products"].subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = MemoryStore::default();
        store.set_fail_writes(true);
        assert!(store.add("products", Fields::new()).await.is_err());
        assert!(store.documents("products").is_empty());
    }

    #[tokio::test]
    async fn test_upload_reports_progress() {
        let storage = MemoryStorage::default();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let url = storage
            .upload("products/a.jpg", vec![0; 10], "image/jpeg", Some(tx))
            .await
            .unwrap();
        assert_eq!(url, "memory://products/a.jpg");

        let mut percents = Vec::new();
        while let Ok(p) = rx.try_recv() {
            percents.push(p.percent());
        }
        assert_eq!(percents, vec![0, 50, 100]);
        assert_eq!(storage.paths(), vec!["products/a.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_upload_stores_nothing() {
        let storage = MemoryStorage::default();
        storage.set_fail_uploads(true);
        assert!(
            storage
                .upload("products/a.jpg", vec![1], "image/jpeg", None)
                .await
                .is_err()
        );
        assert!(storage.object("products/a.jpg").is_none());
    }
}
