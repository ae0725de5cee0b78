//! Per-context authentication accessor
//!
//! Each client context owns exactly one `Auth`. Clones share the same
//! session, while accessors from different contexts never observe each
//! other's sign-ins.

use super::types::{AuthBackend, AuthError, AuthSession, Result, User, UserCredential};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Refresh ID tokens this many seconds before they expire
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Authentication accessor bound to one client context
#[derive(Clone)]
pub struct Auth {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    app_name: String,
    project_id: String,
    backend: Arc<dyn AuthBackend>,
    session: RwLock<Option<AuthSession>>,
    state: watch::Sender<Option<User>>,
}

impl Auth {
    pub(crate) fn new(
        app_name: impl Into<String>,
        project_id: impl Into<String>,
        backend: Arc<dyn AuthBackend>,
    ) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            inner: Arc::new(AuthInner {
                app_name: app_name.into(),
                project_id: project_id.into(),
                backend,
                session: RwLock::new(None),
                state,
            }),
        }
    }

    /// Name of the client context this accessor belongs to
    pub fn app_name(&self) -> &str {
        &self.inner.app_name
    }

    /// Project this accessor authenticates against
    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    /// Currently signed-in user of this context
    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().clone()
    }

    /// Watch sign-in state changes of this context
    ///
    /// The receiver starts with the current state; every sign-in and
    /// sign-out afterwards is published to it.
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.inner.state.subscribe()
    }

    /// Sign in with email and password
    pub async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserCredential> {
        debug!("[{}] Signing in {}", self.inner.app_name, email);
        let session = self.inner.backend.sign_in_with_password(email, password).await?;
        let user = self.set_session(session);
        Ok(UserCredential {
            user,
            is_new_user: false,
        })
    }

    /// Create an account with email and password
    ///
    /// On success the new account becomes the signed-in user of this
    /// context, replacing whoever was signed in before.
    pub async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserCredential> {
        debug!("[{}] Creating account {}", self.inner.app_name, email);
        let session = self.inner.backend.sign_up(email, password).await?;
        let user = self.set_session(session);
        Ok(UserCredential {
            user,
            is_new_user: true,
        })
    }

    /// Sign out the current user of this context
    pub fn sign_out(&self) {
        let previous = self.inner.session.write().take();
        if let Some(session) = previous {
            info!(
                "[{}] Signed out {}",
                self.inner.app_name,
                session.user.email.as_deref().unwrap_or(&session.user.uid)
            );
        }
        self.inner.state.send_replace(None);
    }

    /// ID token of the signed-in user, refreshed when close to expiry
    ///
    /// Returns `Ok(None)` when nobody is signed in.
    pub async fn id_token(&self) -> Result<Option<String>> {
        let (uid, refresh_token) = {
            let session = self.inner.session.read();
            match session.as_ref() {
                None => return Ok(None),
                Some(s) if !s.tokens.expires_within(TOKEN_REFRESH_MARGIN_SECS) => {
                    return Ok(Some(s.tokens.id_token.clone()));
                }
                Some(s) => (s.user.uid.clone(), s.tokens.refresh_token.clone()),
            }
        };

        debug!("[{}] Refreshing ID token for {}", self.inner.app_name, uid);
        let grant = match self.inner.backend.refresh(&refresh_token).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!("[{}] Token refresh failed: {}", self.inner.app_name, e);
                if matches!(e, AuthError::TokenExpired) {
                    self.drop_session_of(&uid);
                }
                return Err(e);
            }
        };

        let mut session = self.inner.session.write();
        let token = match session.as_mut() {
            // The user may have signed out or switched while refreshing
            Some(s) if s.user.uid == uid => {
                s.tokens = grant.clone();
                Some(grant.id_token)
            }
            Some(s) => Some(s.tokens.id_token.clone()),
            None => None,
        };
        Ok(token)
    }

    /// Whether two handles share the same session state
    pub fn ptr_eq(&self, other: &Auth) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Sign out, unless someone else signed in meanwhile
    fn drop_session_of(&self, uid: &str) {
        let still_current = self
            .inner
            .session
            .read()
            .as_ref()
            .map_or(false, |s| s.user.uid == uid);
        if still_current {
            self.sign_out();
        }
    }

    fn set_session(&self, session: AuthSession) -> User {
        let user = session.user.clone();
        *self.inner.session.write() = Some(session);
        info!(
            "[{}] Signed in as {}",
            self.inner.app_name,
            user.email.as_deref().unwrap_or(&user.uid)
        );
        self.inner.state.send_replace(Some(user.clone()));
        user
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("app_name", &self.inner.app_name)
            .field("project_id", &self.inner.project_id)
            .field("current_user", &self.current_user())
            .finish()
    }
}
