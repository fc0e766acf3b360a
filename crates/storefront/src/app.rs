//! Application handle shared by every front-end.

use std::sync::Arc;

use artisan_backend::Backend;

use crate::api::LocalApiClient;
use crate::config::StorefrontConfig;
use crate::gate::{Decision, authorize};
use crate::navigation::Navigator;
use crate::routes::Route;
use crate::session::SessionStore;

/// Error creating the application.
#[derive(Debug, thiserror::Error)]
pub enum AppInitError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result of opening a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub route: Route,
    pub decision: Decision,
}

impl View {
    /// Whether the requested view should be shown.
    #[must_use]
    pub fn renders(&self) -> bool {
        self.decision == Decision::Render
    }
}

/// The running storefront: backend services, session and navigation.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    backend: Backend,
    navigator: Arc<Navigator>,
    session: SessionStore,
    api: LocalApiClient,
}

impl App {
    /// Start the application on top of `backend`.
    ///
    /// Must be called from within a Tokio runtime; the session listener is
    /// spawned immediately.
    #[must_use]
    pub fn start(backend: Backend, api: LocalApiClient) -> Self {
        let navigator = Arc::new(Navigator::new());
        let session = SessionStore::start(
            backend.auth.clone(),
            backend.store.clone(),
            navigator.clone(),
        );

        Self {
            inner: Arc::new(AppInner {
                backend,
                navigator,
                session,
                api,
            }),
        }
    }

    /// Start against the Firebase services and seller API named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, AppInitError> {
        let backend = Backend::firebase(&config.firebase)?;
        let api = LocalApiClient::new(config.local_api_url.clone(), backend.tokens.clone())?;
        Ok(Self::start(backend, api))
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.inner.navigator
    }

    #[must_use]
    pub fn api(&self) -> &LocalApiClient {
        &self.inner.api
    }

    /// Decide what `path` shows for the current session, without navigating.
    ///
    /// Public routes always render. Gated routes go through the role gate
    /// with a fresh session snapshot.
    #[must_use]
    pub fn evaluate(&self, path: &str) -> View {
        let route = Route::parse(path);
        let decision = route.requirement().map_or(Decision::Render, |requirement| {
            authorize(&self.inner.session.current_session(), &requirement)
        });
        View { route, decision }
    }

    /// Navigate to `path`, following a redirect if the gate asks for one.
    pub fn open(&self, path: &str) -> View {
        let view = self.evaluate(path);
        match view.decision.redirect_target() {
            Some(target) => {
                tracing::debug!(path, target, decision = ?view.decision, "Redirecting");
                self.inner.navigator.navigate(target);
            }
            None => self.inner.navigator.navigate(path),
        }
        view
    }

    /// Like [`App::open`], but waits for the session to resolve first so the
    /// answer is never [`Decision::Wait`].
    pub async fn open_resolved(&self, path: &str) -> View {
        self.inner.session.resolved().await;
        self.open(path)
    }

    /// Stop background work.
    pub fn shutdown(&self) {
        self.inner.session.shutdown();
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("backend", &self.inner.backend)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}
