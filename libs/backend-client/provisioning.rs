//! Admin-side user provisioning
//!
//! Accounts are created on the secondary auth so the administrator stays
//! signed in on the default context. Access records live in the `users`
//! collection, keyed by uid.

use crate::auth::{AuthError, User};
use crate::bootstrap::Backend;
use crate::firestore::FirestoreError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Collection holding one access record per uid
pub const USERS_COLLECTION: &str = "users";

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Firestore(#[from] FirestoreError),
}

pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Access role stored in a user record
///
/// Records written by other tools may carry roles outside the known three;
/// those are kept verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Showroom,
    Client,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Showroom => "showroom",
            Role::Client => "client",
            Role::Other(role) => role,
        }
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        match role.as_str() {
            "admin" => Role::Admin,
            "showroom" => Role::Showroom,
            "client" => Role::Client,
            _ => Role::Other(role),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(role) => role,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "showroom" => Ok(Role::Showroom),
            "client" => Ok(Role::Client),
            other => Err(ProvisionError::Validation(format!("unknown role '{}'", other))),
        }
    }
}

/// Access record stored at `users/{uid}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(skip)]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showroom_id: Option<String>,
}

/// Request to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub showroom_id: Option<String>,
}

impl NewUser {
    fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ProvisionError::Validation(
                "email and password are required".to_string(),
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProvisionError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if let Role::Other(role) = &self.role {
            return Err(ProvisionError::Validation(format!("unknown role '{}'", role)));
        }
        if self.role == Role::Showroom && self.showroom_id.as_deref().map_or(true, str::is_empty) {
            return Err(ProvisionError::Validation(
                "showroom users need an assigned showroom".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a successful provisioning
#[derive(Debug, Clone)]
pub struct ProvisionedUser {
    pub uid: String,
    pub record: UserRecord,
}

/// Access decision for a signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// User has a record (possibly just created as first admin)
    Granted(UserRecord),
    /// Signed in, but not registered in the users collection
    Denied,
}

/// Creates and revokes application users
pub struct UserProvisioner {
    backend: Backend,
}

impl UserProvisioner {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Create an account on the secondary context and store its record
    ///
    /// The secondary context is signed out afterwards, whether or not the
    /// record write succeeds.
    pub async fn provision(&self, request: NewUser) -> Result<ProvisionedUser> {
        request.validate()?;
        let email = request.email.trim().to_string();

        let secondary = self.backend.secondary_auth();
        let credential = secondary
            .create_user_with_email_and_password(&email, &request.password)
            .await?;
        let uid = credential.user.uid;

        let record = UserRecord {
            uid: uid.clone(),
            email: email.clone(),
            role: request.role.clone(),
            created_at: now_iso(),
            showroom_id: match request.role {
                Role::Showroom => request.showroom_id,
                _ => None,
            },
        };

        let written = self
            .backend
            .db()
            .collection(USERS_COLLECTION)
            .doc(&uid)
            .set(&record)
            .await;
        secondary.sign_out();

        if let Err(e) = written {
            warn!("Account {} created but access record failed: {}", email, e);
            return Err(e.into());
        }

        info!("Access created for {} ({})", email, record.role);
        Ok(ProvisionedUser { uid, record })
    }

    /// Remove the access record of `uid`; the account itself remains
    pub async fn revoke(&self, uid: &str) -> Result<()> {
        self.backend
            .db()
            .collection(USERS_COLLECTION)
            .doc(uid)
            .delete()
            .await?;
        info!("Access revoked for {}", uid);
        Ok(())
    }

    /// All access records
    pub async fn list(&self) -> Result<Vec<UserRecord>> {
        let snapshot = self.backend.db().collection(USERS_COLLECTION).get().await?;

        let mut records = Vec::with_capacity(snapshot.len());
        for doc in snapshot {
            match doc.data_as::<UserRecord>() {
                Ok(Some(mut record)) => {
                    record.uid = doc.id().to_string();
                    records.push(record);
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable user record {}: {}", doc.id(), e),
            }
        }
        Ok(records)
    }

    /// Access decision for `user`
    ///
    /// A user without a record is promoted to admin only when the users
    /// collection is still empty.
    pub async fn resolve_access(&self, user: &User) -> Result<Access> {
        let users = self.backend.db().collection(USERS_COLLECTION);
        let doc = users.doc(&user.uid).get().await?;

        if let Some(mut record) = doc.data_as::<UserRecord>()? {
            record.uid = user.uid.clone();
            return Ok(Access::Granted(record));
        }

        if !users.limit(1).get().await?.is_empty() {
            info!("No access record for {}", user.uid);
            return Ok(Access::Denied);
        }

        let record = UserRecord {
            uid: user.uid.clone(),
            email: user
                .email
                .clone()
                .or_else(|| user.display_name.clone())
                .unwrap_or_default(),
            role: Role::Admin,
            created_at: now_iso(),
            showroom_id: None,
        };
        users.doc(&user.uid).set(&record).await?;
        info!("First user {} registered as admin", record.email);
        Ok(Access::Granted(record))
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppRegistry;
    use crate::config::BackendConfig;
    use crate::memory::MemoryConnector;
    use std::sync::Arc;

    fn provisioner() -> (UserProvisioner, Backend) {
        let registry = AppRegistry::with_connector(Arc::new(MemoryConnector::new()));
        let backend = Backend::initialize(&registry, BackendConfig::sample()).unwrap();
        (UserProvisioner::new(backend.clone()), backend)
    }

    fn new_user(email: &str, role: Role, showroom: Option<&str>) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "secret1".to_string(),
            role,
            showroom_id: showroom.map(str::to_string),
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("showroom".parse::<Role>().unwrap(), Role::Showroom);
        assert!("boss".parse::<Role>().is_err());
        assert_eq!(Role::Client.to_string(), "client");
    }

    #[test]
    fn test_request_validation() {
        assert!(new_user("", Role::Client, None).validate().is_err());
        assert!(new_user("a@example.com", Role::Showroom, None).validate().is_err());
        assert!(new_user("a@example.com", Role::Showroom, Some("sr-1")).validate().is_ok());

        let mut short = new_user("a@example.com", Role::Client, None);
        short.password = "12345".to_string();
        assert!(short.validate().is_err());
    }

    #[tokio::test]
    async fn test_provision_keeps_admin_session() {
        let (provisioner, backend) = provisioner();
        backend
            .auth()
            .create_user_with_email_and_password("admin@example.com", "secret1")
            .await
            .unwrap();

        let created = provisioner
            .provision(new_user("sr@example.com", Role::Showroom, Some("sr-1")))
            .await
            .unwrap();

        let admin = backend.auth().current_user().unwrap();
        assert_eq!(admin.email.as_deref(), Some("admin@example.com"));
        assert!(backend.secondary_auth().current_user().is_none());

        let stored = backend
            .db()
            .collection(USERS_COLLECTION)
            .doc(&created.uid)
            .get()
            .await
            .unwrap();
        assert_eq!(stored.get("role"), Some(&serde_json::json!("showroom")));
        assert_eq!(stored.get("showroomId"), Some(&serde_json::json!("sr-1")));
    }

    #[tokio::test]
    async fn test_provision_duplicate_email() {
        let (provisioner, _backend) = provisioner();
        provisioner
            .provision(new_user("a@example.com", Role::Client, None))
            .await
            .unwrap();

        let err = provisioner
            .provision(new_user("a@example.com", Role::Client, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Auth(AuthError::EmailExists)));
    }

    #[tokio::test]
    async fn test_revoke_and_list() {
        let (provisioner, _backend) = provisioner();
        let a = provisioner
            .provision(new_user("a@example.com", Role::Client, None))
            .await
            .unwrap();
        provisioner
            .provision(new_user("b@example.com", Role::Admin, Some("ignored")))
            .await
            .unwrap();

        let records = provisioner.list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.showroom_id.is_none()));

        provisioner.revoke(&a.uid).await.unwrap();
        let records = provisioner.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email, "b@example.com");
    }

    #[tokio::test]
    async fn test_legacy_records_are_readable() {
        let (provisioner, backend) = provisioner();
        provisioner
            .provision(new_user("a@example.com", Role::Client, None))
            .await
            .unwrap();

        let users = backend.db().collection(USERS_COLLECTION);
        users
            .doc("legacy")
            .set(&serde_json::json!({ "email": "old@example.com", "role": "admin" }))
            .await
            .unwrap();
        users
            .doc("auditor")
            .set(&serde_json::json!({ "email": "aud@example.com", "role": "supervisor" }))
            .await
            .unwrap();
        users
            .doc("broken")
            .set(&serde_json::json!({ "email": "x@example.com", "role": 5 }))
            .await
            .unwrap();

        let records = provisioner.list().await.unwrap();
        assert_eq!(records.len(), 3);
        let auditor = records.iter().find(|r| r.uid == "auditor").unwrap();
        assert_eq!(auditor.role, Role::Other("supervisor".to_string()));
        assert_eq!(auditor.role.to_string(), "supervisor");

        let legacy = User {
            uid: "legacy".to_string(),
            email: Some("old@example.com".to_string()),
            display_name: None,
        };
        match provisioner.resolve_access(&legacy).await.unwrap() {
            Access::Granted(record) => {
                assert_eq!(record.role, Role::Admin);
                assert!(record.created_at.is_empty());
            }
            Access::Denied => panic!("legacy admin lost access"),
        }
    }

    #[tokio::test]
    async fn test_unknown_role_round_trips() {
        let (_provisioner, backend) = provisioner();
        let doc = backend.db().collection(USERS_COLLECTION).doc("u1");
        doc.set(&serde_json::json!({ "email": "u@example.com", "role": "supervisor", "createdAt": "x" }))
            .await
            .unwrap();

        let record = doc.get().await.unwrap().data_as::<UserRecord>().unwrap().unwrap();
        doc.set(&record).await.unwrap();
        assert_eq!(doc.get().await.unwrap().get("role"), Some(&serde_json::json!("supervisor")));
        assert!(new_user("n@example.com", record.role, None).validate().is_err());
    }

    #[tokio::test]
    async fn test_first_user_becomes_admin() {
        let (provisioner, backend) = provisioner();
        let first = backend
            .auth()
            .create_user_with_email_and_password("first@example.com", "secret1")
            .await
            .unwrap()
            .user;

        match provisioner.resolve_access(&first).await.unwrap() {
            Access::Granted(record) => {
                assert_eq!(record.role, Role::Admin);
                assert_eq!(record.uid, first.uid);
            }
            Access::Denied => panic!("first user should be admin"),
        }

        let stranger = backend
            .secondary_auth()
            .create_user_with_email_and_password("stranger@example.com", "secret1")
            .await
            .unwrap()
            .user;
        assert_eq!(provisioner.resolve_access(&stranger).await.unwrap(), Access::Denied);

        // Existing record is returned as-is
        match provisioner.resolve_access(&first).await.unwrap() {
            Access::Granted(record) => assert_eq!(record.email, "first@example.com"),
            Access::Denied => panic!("admin lost access"),
        }
    }
}
