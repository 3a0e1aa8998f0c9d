pub mod route;

pub use route::{Route, SessionState};

use crate::domain::session::{Session, User};
use crate::storage::{CredentialStore, TOKEN_KEY, USER_KEY};
use anyhow::Context;
use std::sync::{Arc, PoisonError, RwLock};

pub type NavigationListener = Arc<dyn Fn(Route) + Send + Sync>;

/// Single authority over whether a usable session exists, and the only place a
/// session is started or ended.
///
/// State is never cached here: every question goes to the [`CredentialStore`], so two
/// gates over the same store always agree.
pub struct SessionGate {
    store: Arc<dyn CredentialStore>,
    listeners: RwLock<Vec<NavigationListener>>,
}

impl SessionGate {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a navigation observer. Observers run synchronously, in registration
    /// order, on every emitted signal.
    pub fn on_navigate<F>(&self, listener: F)
    where
        F: Fn(Route) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    pub async fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "credential store read failed; treating session as absent");
                None
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token().await.is_some()
    }

    pub async fn state(&self) -> SessionState {
        if self.is_authenticated().await {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    /// The stored user record, but only alongside a usable token.
    pub async fn current_user(&self) -> Option<User> {
        self.token().await?;

        let raw = match self.store.get(USER_KEY).await {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(error = %err, "credential store read failed for user record");
                return None;
            }
        };

        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!(error = %err, "stored user record is not valid JSON; ignoring");
                None
            }
        }
    }

    /// Unauthenticated -> Authenticated. Persists token then user, then signals the
    /// dashboard.
    pub async fn establish(&self, session: &Session) -> anyhow::Result<()> {
        anyhow::ensure!(!session.token.trim().is_empty(), "session token must be non-empty");

        let user_json =
            serde_json::to_string(&session.user).context("serialize user record failed")?;

        self.store
            .set(TOKEN_KEY, &session.token)
            .await
            .context("persist auth token failed")?;

        if let Err(err) = self.store.set(USER_KEY, &user_json).await {
            // Do not leave a token behind without its user.
            if let Err(cleanup) = self.store.remove_many(&[TOKEN_KEY]).await {
                tracing::warn!(error = %cleanup, "failed to roll back auth token");
            }
            return Err(err).context("persist user record failed");
        }

        tracing::info!(user_id = %session.user.id, "session established");
        self.emit(Route::Dashboard);
        Ok(())
    }

    /// Authenticated -> Unauthenticated. Idempotent apart from re-emitting the signal.
    pub async fn invalidate(&self) {
        if let Err(err) = self.store.remove_many(&[TOKEN_KEY, USER_KEY]).await {
            tracing::error!(error = %err, "failed to clear credentials during invalidation");
        }
        tracing::info!("session invalidated; redirecting to login");
        self.emit(Route::Login);
    }

    pub async fn logout(&self) {
        tracing::info!("logout requested");
        self.invalidate().await;
    }

    /// Route guard used before showing a screen.
    pub async fn guard(&self, requested: Route) -> Route {
        route::resolve(requested, self.state().await)
    }

    fn emit(&self, target: Route) {
        // Snapshot so a listener may register further listeners without deadlocking.
        let listeners: Vec<NavigationListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for listener in listeners {
            listener(target);
        }
    }
}

impl std::fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self
            .listeners
            .read()
            .map(|l| l.len())
            .unwrap_or_default();
        f.debug_struct("SessionGate")
            .field("listeners", &listeners)
            .finish_non_exhaustive()
    }
}
