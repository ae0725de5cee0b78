use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FirestoreError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Deserialization failed: {0}")]
    DeserializeFailed(String),

    #[error("Document data must be an object, got {0}")]
    NotAnObject(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
}

pub type Result<T> = std::result::Result<T, FirestoreError>;

/// Stored document: id plus decoded fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

/// Document operations of the database service
///
/// `token` is the caller's ID token, `None` for unauthenticated access.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str, token: Option<&str>) -> Result<Option<Document>>;

    /// Create or overwrite a document
    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
        token: Option<&str>,
    ) -> Result<()>;

    /// Create a document with a generated id, returning the id
    async fn add(&self, collection: &str, fields: &Map<String, Value>, token: Option<&str>) -> Result<String>;

    async fn delete(&self, collection: &str, id: &str, token: Option<&str>) -> Result<()>;

    /// Documents of a collection in id order, at most `limit` when given
    async fn list(&self, collection: &str, limit: Option<u32>, token: Option<&str>) -> Result<Vec<Document>>;
}

/// Result of reading one document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    id: String,
    data: Option<Map<String, Value>>,
}

impl DocumentSnapshot {
    pub(crate) fn new(id: impl Into<String>, data: Option<Map<String, Value>>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    /// Single field of the document
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(field))
    }

    /// Deserialize the document into `T`, `None` if it doesn't exist
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match &self.data {
            None => Ok(None),
            Some(data) => serde_json::from_value(Value::Object(data.clone()))
                .map(Some)
                .map_err(|e| FirestoreError::DeserializeFailed(e.to_string())),
        }
    }
}

impl From<Document> for DocumentSnapshot {
    fn from(doc: Document) -> Self {
        Self::new(doc.id, Some(doc.fields))
    }
}

/// Result of reading a collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySnapshot {
    docs: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub(crate) fn new(docs: Vec<DocumentSnapshot>) -> Self {
        Self { docs }
    }

    pub fn docs(&self) -> &[DocumentSnapshot] {
        &self.docs
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.into_iter()
    }
}
