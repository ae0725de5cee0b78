use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Email already in use")]
    EmailExists,

    #[error("Email not registered")]
    UserNotFound,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Invalid email or password")]
    InvalidCredential,

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("Too many attempts, try again later")]
    TooManyRequests,

    #[error("User account disabled")]
    UserDisabled,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Session expired, sign in again")]
    TokenExpired,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Deserialization failed: {0}")]
    DeserializeFailed(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// Map an Identity Toolkit error message (`CODE` or `CODE : detail`)
    pub fn from_api_message(message: &str) -> Self {
        let (code, detail) = match message.split_once(" : ") {
            Some((code, detail)) => (code.trim(), detail.trim()),
            None => (message.trim(), ""),
        };

        match code {
            "EMAIL_EXISTS" => AuthError::EmailExists,
            "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
            "INVALID_PASSWORD" => AuthError::WrongPassword,
            "INVALID_LOGIN_CREDENTIALS" | "MISSING_PASSWORD" => AuthError::InvalidCredential,
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
            "WEAK_PASSWORD" => AuthError::WeakPassword(detail.to_string()),
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyRequests,
            "USER_DISABLED" => AuthError::UserDisabled,
            "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => AuthError::TokenExpired,
            _ if message.starts_with("API key not valid") => AuthError::InvalidApiKey,
            _ => AuthError::ApiError(message.to_string()),
        }
    }

    /// Client error code in `auth/...` form
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::RequestFailed(_) => "auth/network-request-failed",
            AuthError::EmailExists => "auth/email-already-in-use",
            AuthError::UserNotFound => "auth/user-not-found",
            AuthError::WrongPassword => "auth/wrong-password",
            AuthError::InvalidCredential => "auth/invalid-credential",
            AuthError::InvalidEmail => "auth/invalid-email",
            AuthError::WeakPassword(_) => "auth/weak-password",
            AuthError::TooManyRequests => "auth/too-many-requests",
            AuthError::UserDisabled => "auth/user-disabled",
            AuthError::InvalidApiKey => "auth/invalid-api-key",
            AuthError::TokenExpired => "auth/user-token-expired",
            AuthError::ApiError(_) => "auth/internal-error",
            AuthError::DeserializeFailed(_) => "auth/internal-error",
        }
    }
}

/// Signed-in user as seen by one client context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Result of a successful sign-in or sign-up
#[derive(Debug, Clone)]
pub struct UserCredential {
    pub user: User,
    pub is_new_user: bool,
}

/// Short-lived ID token plus the refresh token that renews it
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenGrant {
    /// Whether the ID token is expired or within `margin_secs` of expiring
    pub fn expires_within(&self, margin_secs: i64) -> bool {
        self.expires_at - chrono::Duration::seconds(margin_secs) <= Utc::now()
    }
}

/// A signed-in session: user plus tokens
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub tokens: TokenGrant,
}

/// Account operations of the authentication service
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Create an account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Sign in an existing account
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Exchange a refresh token for a fresh ID token
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;
}
