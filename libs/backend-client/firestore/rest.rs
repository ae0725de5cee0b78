//! Firestore REST backend

use super::codec::{decode_fields, encode_fields};
use super::types::{Document, DocumentStore, FirestoreError, Result};
use crate::config::BackendConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Page size when reading a whole collection
const DEFAULT_PAGE_SIZE: u32 = 300;

/// Bearer token the emulator accepts as an admin caller
const EMULATOR_OWNER_TOKEN: &str = "owner";

/// REST client for the document database
pub struct FirestoreRestClient {
    base_url: String,
    project_id: String,
    emulator: bool,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct RestDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RestDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl FirestoreRestClient {
    /// Create a client for the project described by `config`
    pub fn new(config: &BackendConfig, client: Client) -> Self {
        Self {
            base_url: config.firestore_base_url(),
            project_id: config.project_id.clone(),
            emulator: config.uses_firestore_emulator(),
            client,
        }
    }

    fn collection_url(&self, collection: &str) -> Result<Url> {
        self.documents_url(&[collection])
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<Url> {
        self.documents_url(&[collection, id])
    }

    /// `{base}/projects/{p}/databases/(default)/documents/...`, each segment escaped
    fn documents_url(&self, tail: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FirestoreError::InvalidPath(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| FirestoreError::InvalidPath(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["projects", self.project_id.as_str(), "databases", "(default)", "documents"])
            .extend(tail);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None if self.emulator => request.bearer_auth(EMULATOR_OWNER_TOKEN),
            None => request,
        }
    }

    fn into_document(&self, doc: RestDocument) -> Result<Document> {
        Ok(Document {
            id: document_id(&doc.name).to_string(),
            fields: decode_fields(&doc.fields)?,
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreRestClient {
    async fn get(&self, collection: &str, id: &str, token: Option<&str>) -> Result<Option<Document>> {
        let url = self.document_url(collection, id)?;
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(url), token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let doc: RestDocument = parse_response(response).await?;
        self.into_document(doc).map(Some)
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
        token: Option<&str>,
    ) -> Result<()> {
        let url = self.document_url(collection, id)?;
        debug!("PATCH {}", url);

        // PATCH without an update mask replaces the whole document
        let response = self
            .authorize(self.client.patch(url), token)
            .json(&json!({ "fields": encode_fields(fields) }))
            .send()
            .await?;

        let _: RestDocument = parse_response(response).await?;
        Ok(())
    }

    async fn add(&self, collection: &str, fields: &Map<String, Value>, token: Option<&str>) -> Result<String> {
        let url = self.collection_url(collection)?;
        debug!("POST {}", url);

        let response = self
            .authorize(self.client.post(url), token)
            .json(&json!({ "fields": encode_fields(fields) }))
            .send()
            .await?;

        let doc: RestDocument = parse_response(response).await?;
        Ok(document_id(&doc.name).to_string())
    }

    async fn delete(&self, collection: &str, id: &str, token: Option<&str>) -> Result<()> {
        let url = self.document_url(collection, id)?;
        debug!("DELETE {}", url);

        let response = self.authorize(self.client.delete(url), token).send().await?;
        let _: Value = parse_response(response).await?;
        Ok(())
    }

    async fn list(&self, collection: &str, limit: Option<u32>, token: Option<&str>) -> Result<Vec<Document>> {
        let url = self.collection_url(collection)?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page_size = match limit {
                Some(limit) => limit.saturating_sub(documents.len() as u32),
                None => DEFAULT_PAGE_SIZE,
            };
            if page_size == 0 {
                break;
            }

            let mut params = vec![("pageSize".to_string(), page_size.to_string())];
            if let Some(page) = &page_token {
                params.push(("pageToken".to_string(), page.clone()));
            }

            debug!("GET {} with {} params", url, params.len());
            let response = self
                .authorize(self.client.get(url.clone()).query(&params), token)
                .send()
                .await?;

            let page: ListResponse = parse_response(response).await?;
            for doc in page.documents {
                documents.push(self.into_document(doc)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        if let Some(limit) = limit {
            documents.truncate(limit as usize);
        }
        debug!("Fetched {} documents from {}", documents.len(), collection);
        Ok(documents)
    }
}

/// Last segment of `projects/p/databases/(default)/documents/col/id`
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

async fn parse_response<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(status_error(status, &error_text));
    }

    response
        .json()
        .await
        .map_err(|e| FirestoreError::DeserializeFailed(e.to_string()))
}

fn status_error(status: StatusCode, body: &str) -> FirestoreError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED => FirestoreError::Unauthenticated(message),
        StatusCode::FORBIDDEN => FirestoreError::PermissionDenied(message),
        _ => {
            warn!("Firestore request failed ({}): {}", status, message);
            FirestoreError::ApiError(format!("{}: {}", status, message))
        }
    }
}
