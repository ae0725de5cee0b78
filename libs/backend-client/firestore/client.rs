//! Document database accessor
//!
//! `Firestore` is bound to one client context and authorizes every request
//! with the ID token of that context's signed-in user.

use super::types::{DocumentSnapshot, DocumentStore, FirestoreError, QuerySnapshot, Result};
use crate::auth::Auth;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Database accessor bound to one client context
#[derive(Clone)]
pub struct Firestore {
    inner: Arc<FirestoreInner>,
}

struct FirestoreInner {
    project_id: String,
    store: Arc<dyn DocumentStore>,
    auth: Auth,
}

impl Firestore {
    pub(crate) fn new(project_id: impl Into<String>, store: Arc<dyn DocumentStore>, auth: Auth) -> Self {
        Self {
            inner: Arc::new(FirestoreInner {
                project_id: project_id.into(),
                store,
                auth,
            }),
        }
    }

    /// Project this accessor reads and writes
    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    /// Name of the client context this accessor belongs to
    pub fn app_name(&self) -> &str {
        self.inner.auth.app_name()
    }

    /// Reference to a top-level collection
    pub fn collection(&self, id: impl Into<String>) -> CollectionRef {
        CollectionRef {
            db: self.clone(),
            id: id.into(),
        }
    }

    /// Whether two handles are the same accessor
    pub fn ptr_eq(&self, other: &Firestore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    async fn token(&self) -> Result<Option<String>> {
        self.inner
            .auth
            .id_token()
            .await
            .map_err(|e| FirestoreError::Unauthenticated(e.to_string()))
    }

    fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }
}

impl fmt::Debug for Firestore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Firestore")
            .field("project_id", &self.inner.project_id)
            .field("app_name", &self.app_name())
            .finish()
    }
}

/// Reference to a collection
#[derive(Debug, Clone)]
pub struct CollectionRef {
    db: Firestore,
    id: String,
}

impl CollectionRef {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Reference to a document in this collection
    pub fn doc(&self, id: impl Into<String>) -> DocumentRef {
        DocumentRef {
            db: self.db.clone(),
            collection: self.id.clone(),
            id: id.into(),
        }
    }

    /// Create a document with a generated id
    pub async fn add<T: Serialize + ?Sized>(&self, data: &T) -> Result<DocumentRef> {
        validate_id(&self.id)?;
        let fields = to_fields(data)?;
        let token = self.db.token().await?;

        let id = self.db.store().add(&self.id, &fields, token.as_deref()).await?;
        debug!("Added {}/{}", self.id, id);
        Ok(self.doc(id))
    }

    /// Query returning at most `n` documents
    pub fn limit(&self, n: u32) -> Query {
        Query {
            collection: self.clone(),
            limit: Some(n),
        }
    }

    /// Read every document of the collection
    pub async fn get(&self) -> Result<QuerySnapshot> {
        Query {
            collection: self.clone(),
            limit: None,
        }
        .get()
        .await
    }
}

/// Collection read with an optional limit
#[derive(Debug, Clone)]
pub struct Query {
    collection: CollectionRef,
    limit: Option<u32>,
}

impl Query {
    pub async fn get(&self) -> Result<QuerySnapshot> {
        let collection = &self.collection;
        validate_id(&collection.id)?;
        let token = collection.db.token().await?;

        let docs = collection
            .db
            .store()
            .list(&collection.id, self.limit, token.as_deref())
            .await?;
        debug!("Read {} documents from {}", docs.len(), collection.id);

        Ok(QuerySnapshot::new(docs.into_iter().map(DocumentSnapshot::from).collect()))
    }
}

/// Reference to a single document
#[derive(Debug, Clone)]
pub struct DocumentRef {
    db: Firestore,
    collection: String,
    id: String,
}

impl DocumentRef {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `collection/id`
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }

    pub async fn get(&self) -> Result<DocumentSnapshot> {
        self.validate()?;
        let token = self.db.token().await?;

        let doc = self
            .db
            .store()
            .get(&self.collection, &self.id, token.as_deref())
            .await?;
        Ok(DocumentSnapshot::new(self.id.clone(), doc.map(|d| d.fields)))
    }

    /// Create or overwrite the document
    pub async fn set<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        self.validate()?;
        let fields = to_fields(data)?;
        let token = self.db.token().await?;

        self.db
            .store()
            .set(&self.collection, &self.id, &fields, token.as_deref())
            .await?;
        debug!("Wrote {}", self.path());
        Ok(())
    }

    pub async fn delete(&self) -> Result<()> {
        self.validate()?;
        let token = self.db.token().await?;

        self.db
            .store()
            .delete(&self.collection, &self.id, token.as_deref())
            .await?;
        debug!("Deleted {}", self.path());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        validate_id(&self.collection)?;
        validate_id(&self.id)
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains('/') || id == "." || id == ".." {
        return Err(FirestoreError::InvalidPath(format!("'{}' is not a valid id", id)));
    }
    Ok(())
}

fn to_fields<T: Serialize + ?Sized>(data: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(data) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(FirestoreError::NotAnObject(other.to_string())),
        Err(e) => Err(FirestoreError::DeserializeFailed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryProject;
    use serde_json::json;

    fn firestore(project: &Arc<MemoryProject>) -> Firestore {
        let auth = Auth::new("[DEFAULT]", "demo", project.auth_backend());
        Firestore::new("demo", project.document_store(), auth)
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let project = Arc::new(MemoryProject::new());
        let db = firestore(&project);
        let doc = db.collection("data").doc("orders");

        assert!(!doc.get().await.unwrap().exists());

        doc.set(&json!({ "items": [1, 2] })).await.unwrap();
        let snapshot = doc.get().await.unwrap();
        assert!(snapshot.exists());
        assert_eq!(snapshot.get("items"), Some(&json!([1, 2])));

        doc.delete().await.unwrap();
        assert!(!doc.get().await.unwrap().exists());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let project = Arc::new(MemoryProject::new());
        let db = firestore(&project);
        let doc = db.collection("users").doc("u1");

        doc.set(&json!({ "email": "a@example.com", "role": "admin" })).await.unwrap();
        doc.set(&json!({ "email": "a@example.com" })).await.unwrap();

        let snapshot = doc.get().await.unwrap();
        assert!(snapshot.get("role").is_none());
    }

    #[tokio::test]
    async fn test_add_and_limit() {
        let project = Arc::new(MemoryProject::new());
        let db = firestore(&project);
        let users = db.collection("users");

        assert!(users.limit(1).get().await.unwrap().is_empty());

        let first = users.add(&json!({ "n": 1 })).await.unwrap();
        users.add(&json!({ "n": 2 })).await.unwrap();
        assert_eq!(first.id().len(), 20);

        assert_eq!(users.get().await.unwrap().len(), 2);
        assert_eq!(users.limit(1).get().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_non_object_data() {
        let project = Arc::new(MemoryProject::new());
        let db = firestore(&project);

        let err = db.collection("data").doc("x").set(&json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, FirestoreError::NotAnObject(_)));
    }

    #[tokio::test]
    async fn test_rejects_invalid_ids() {
        let project = Arc::new(MemoryProject::new());
        let db = firestore(&project);

        let err = db.collection("users").doc("a/b").get().await.unwrap_err();
        assert!(matches!(err, FirestoreError::InvalidPath(_)));
        let err = db.collection("").get().await.unwrap_err();
        assert!(matches!(err, FirestoreError::InvalidPath(_)));
    }

    #[test]
    fn test_document_path() {
        let project = Arc::new(MemoryProject::new());
        let db = firestore(&project);
        assert_eq!(db.collection("users").doc("u1").path(), "users/u1");
    }
}
