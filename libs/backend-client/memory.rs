//! In-process backend
//!
//! One `MemoryProject` stands in for a whole backend project: accounts,
//! issued tokens and documents. Every context created through the same
//! `MemoryConnector` talks to the same project, so an account created on
//! one context can sign in on another.

use crate::app::Connector;
use crate::auth::{AuthBackend, AuthError, AuthSession, TokenGrant, User};
use crate::config::BackendConfig;
use crate::firestore::{Document, DocumentStore, FirestoreError};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

const UID_LEN: usize = 28;
const AUTO_ID_LEN: usize = 20;
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    uid: String,
    email: String,
    password: String,
}

#[derive(Default)]
struct ProjectState {
    /// Keyed by lowercased email
    accounts: HashMap<String, Account>,
    /// ID token -> uid
    id_tokens: HashMap<String, String>,
    /// Refresh token -> uid
    refresh_tokens: HashMap<String, String>,
    collections: BTreeMap<String, BTreeMap<String, Map<String, Value>>>,
    token_counter: u64,
}

impl ProjectState {
    fn issue_tokens(&mut self, uid: &str, ttl_secs: i64) -> TokenGrant {
        self.token_counter += 1;
        let refresh_token = format!("memory-refresh-{}", self.token_counter);
        self.refresh_tokens.insert(refresh_token.clone(), uid.to_string());
        self.issue_id_token(uid, refresh_token, ttl_secs)
    }

    /// New ID token; the refresh token stays valid until revoked
    fn issue_id_token(&mut self, uid: &str, refresh_token: String, ttl_secs: i64) -> TokenGrant {
        self.token_counter += 1;
        let id_token = format!("memory-id-{}", self.token_counter);
        self.id_tokens.insert(id_token.clone(), uid.to_string());

        TokenGrant {
            id_token,
            refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(ttl_secs),
        }
    }

    fn session(&mut self, email_key: &str, ttl_secs: i64) -> Option<AuthSession> {
        let (uid, email) = {
            let account = self.accounts.get(email_key)?;
            (account.uid.clone(), account.email.clone())
        };
        let tokens = self.issue_tokens(&uid, ttl_secs);
        Some(AuthSession {
            user: User {
                uid,
                email: Some(email),
                display_name: None,
            },
            tokens,
        })
    }
}

/// In-process backend project
pub struct MemoryProject {
    state: Mutex<ProjectState>,
    require_auth: bool,
    token_ttl_secs: i64,
}

impl MemoryProject {
    /// Project whose documents are open to unauthenticated callers
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ProjectState::default()),
            require_auth: false,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    /// Project that rejects document access without a valid ID token
    pub fn with_auth_required() -> Self {
        Self {
            state: Mutex::new(ProjectState::default()),
            require_auth: true,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    /// Lifetime of issued ID tokens
    pub fn with_token_ttl(mut self, secs: i64) -> Self {
        self.token_ttl_secs = secs;
        self
    }

    pub fn auth_backend(self: &Arc<Self>) -> Arc<dyn AuthBackend> {
        Arc::clone(self) as Arc<dyn AuthBackend>
    }

    pub fn document_store(self: &Arc<Self>) -> Arc<dyn DocumentStore> {
        Arc::clone(self) as Arc<dyn DocumentStore>
    }

    /// Number of registered accounts
    pub fn account_count(&self) -> usize {
        self.state.lock().accounts.len()
    }

    /// Direct read of a stored document, bypassing access checks
    pub fn document(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        self.state
            .lock()
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Revoke every issued ID token, forcing refreshes
    pub fn revoke_id_tokens(&self) {
        self.state.lock().id_tokens.clear();
    }

    /// Revoke every refresh token, ending all sessions at their next refresh
    pub fn revoke_refresh_tokens(&self) {
        self.state.lock().refresh_tokens.clear();
    }

    fn check_access(&self, token: Option<&str>) -> Result<(), FirestoreError> {
        if !self.require_auth {
            return Ok(());
        }

        let state = self.state.lock();
        match token {
            Some(token) if state.id_tokens.contains_key(token) => Ok(()),
            Some(_) => Err(FirestoreError::Unauthenticated("invalid ID token".to_string())),
            None => Err(FirestoreError::Unauthenticated("request has no ID token".to_string())),
        }
    }
}

impl Default for MemoryProject {
    fn default() -> Self {
        Self::new()
    }
}

fn random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((user, domain)) => !user.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

#[async_trait]
impl AuthBackend for MemoryProject {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if !valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let key = email.to_lowercase();
        let mut state = self.state.lock();
        if state.accounts.contains_key(&key) {
            return Err(AuthError::EmailExists);
        }

        let uid = random_id(UID_LEN);
        debug!("memory: created account {} ({})", email, uid);
        state.accounts.insert(
            key.clone(),
            Account {
                uid,
                email: email.to_string(),
                password: password.to_string(),
            },
        );

        state
            .session(&key, self.token_ttl_secs)
            .ok_or_else(|| AuthError::ApiError("account vanished".to_string()))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if !valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }

        let key = email.to_lowercase();
        let mut state = self.state.lock();
        match state.accounts.get(&key) {
            None => return Err(AuthError::UserNotFound),
            Some(account) if account.password != password => return Err(AuthError::WrongPassword),
            Some(_) => {}
        }

        state
            .session(&key, self.token_ttl_secs)
            .ok_or_else(|| AuthError::ApiError("account vanished".to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        let mut state = self.state.lock();
        let uid = state
            .refresh_tokens
            .get(refresh_token)
            .cloned()
            .ok_or(AuthError::TokenExpired)?;
        Ok(state.issue_id_token(&uid, refresh_token.to_string(), self.token_ttl_secs))
    }
}

#[async_trait]
impl DocumentStore for MemoryProject {
    async fn get(&self, collection: &str, id: &str, token: Option<&str>) -> Result<Option<Document>, FirestoreError> {
        self.check_access(token)?;
        Ok(self.document(collection, id).map(|fields| Document {
            id: id.to_string(),
            fields,
        }))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
        token: Option<&str>,
    ) -> Result<(), FirestoreError> {
        self.check_access(token)?;
        self.state
            .lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields.clone());
        Ok(())
    }

    async fn add(
        &self,
        collection: &str,
        fields: &Map<String, Value>,
        token: Option<&str>,
    ) -> Result<String, FirestoreError> {
        self.check_access(token)?;
        let id = random_id(AUTO_ID_LEN);
        self.state
            .lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields.clone());
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str, token: Option<&str>) -> Result<(), FirestoreError> {
        self.check_access(token)?;
        if let Some(docs) = self.state.lock().collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list(
        &self,
        collection: &str,
        limit: Option<u32>,
        token: Option<&str>,
    ) -> Result<Vec<Document>, FirestoreError> {
        self.check_access(token)?;
        let state = self.state.lock();
        let Some(docs) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let take = limit.map_or(usize::MAX, |l| l as usize);
        Ok(docs
            .iter()
            .take(take)
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }
}

/// Connector routing every context to one in-process project
#[derive(Clone, Default)]
pub struct MemoryConnector {
    project: Arc<MemoryProject>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector over an existing project
    pub fn with_project(project: Arc<MemoryProject>) -> Self {
        Self { project }
    }

    pub fn project(&self) -> &Arc<MemoryProject> {
        &self.project
    }
}

impl Connector for MemoryConnector {
    fn auth_backend(&self, _config: &BackendConfig) -> Arc<dyn AuthBackend> {
        self.project.auth_backend()
    }

    fn document_store(&self, _config: &BackendConfig) -> Arc<dyn DocumentStore> {
        self.project.document_store()
    }
}
