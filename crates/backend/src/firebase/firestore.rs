//! Cloud Firestore over its REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use super::{error_message, value};
use crate::config::FirebaseConfig;
use crate::document::{DOCUMENT_ID, Document, Fields, FilterOp, Query, Snapshot};
use crate::error::StoreError;
use crate::service::{DocumentStore, TokenSource};
use crate::subscription::Subscription;

/// A document as returned by the REST API.
#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl RawDocument {
    fn into_document(self) -> Document {
        let id = self
            .name
            .rsplit_once('/')
            .map_or(self.name.as_str(), |(_, id)| id)
            .to_string();
        Document::new(id, value::decode_fields(&self.fields))
    }
}

/// One element of a `runQuery` response stream.
#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    document: Option<RawDocument>,
}

/// Firestore client for one project database.
#[derive(Clone)]
pub struct Firestore {
    client: reqwest::Client,
    /// `{base}/projects/{project}/databases/(default)/documents`
    documents_url: String,
    /// `projects/{project}/databases/(default)/documents`, used in references.
    documents_path: String,
    api_key: SecretString,
    tokens: Option<Arc<dyn TokenSource>>,
    poll_interval: Duration,
}

impl Firestore {
    /// Create a client. Requests carry a bearer token from `tokens` when a
    /// user is signed in.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        config: &FirebaseConfig,
        tokens: Option<Arc<dyn TokenSource>>,
    ) -> Self {
        let documents_path = config.documents_path();
        Self {
            client,
            documents_url: format!(
                "{}/{documents_path}",
                config.endpoints.firestore.trim_end_matches('/')
            ),
            documents_path,
            api_key: config.api_key.clone(),
            tokens,
            poll_interval: config.poll_interval,
        }
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.query(&[("key", self.api_key.expose_secret())]);
        let Some(tokens) = &self.tokens else {
            return request;
        };
        match tokens.id_token().await {
            Ok(Some(token)) => request.bearer_auth(token.expose_secret()),
            Ok(None) => request,
            Err(e) => {
                warn!(error = %e, "Could not obtain ID token, sending unauthenticated request");
                request
            }
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let response = self.authorize(request).await.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let (message, code) = error_message(&text);
        if status == StatusCode::FORBIDDEN || code.as_deref() == Some("PERMISSION_DENIED") {
            return Err(StoreError::PermissionDenied(message));
        }
        Err(StoreError::Service {
            status: status.as_u16(),
            message,
        })
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.documents_url,
            urlencoding::encode(collection),
            urlencoding::encode(id)
        )
    }

    fn structured_query(&self, collection: &str, query: &Query) -> Value {
        let filters: Vec<Value> = query
            .filters
            .iter()
            .map(|filter| {
                let op = match filter.op {
                    FilterOp::Equal => "EQUAL",
                    FilterOp::NotEqual => "NOT_EQUAL",
                };
                let value = if filter.field == DOCUMENT_ID {
                    let id = filter.value.as_str().unwrap_or_default();
                    json!({ "referenceValue": format!("{}/{collection}/{id}", self.documents_path) })
                } else {
                    value::encode(&filter.value)
                };
                json!({ "fieldFilter": {
                    "field": { "fieldPath": filter.field },
                    "op": op,
                    "value": value,
                } })
            })
            .collect();

        let mut structured = json!({ "from": [ { "collectionId": collection } ] });
        let where_clause = match filters.len() {
            0 => None,
            1 => filters.into_iter().next(),
            _ => Some(json!({ "compositeFilter": { "op": "AND", "filters": filters } })),
        };
        if let Some(clause) = where_clause {
            structured["where"] = clause;
        }
        if let Some(limit) = query.limit {
            structured["limit"] = json!(limit);
        }
        json!({ "structuredQuery": structured })
    }
}

impl std::fmt::Debug for Firestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firestore")
            .field("documents_url", &self.documents_url)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for Firestore {
    #[instrument(skip(self))]
    async fn read_one(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let request = self.client.get(self.document_url(collection, id));
        match self.send(request).await {
            Ok(response) => {
                let raw: RawDocument = response.json().await?;
                Ok(Some(raw.into_document()))
            }
            Err(StoreError::Service { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, query))]
    async fn read_query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let body = self.structured_query(collection, query);
        let request = self
            .client
            .post(format!("{}:runQuery", self.documents_url))
            .json(&body);
        let results: Vec<QueryResult> = self.send(request).await?.json().await?;
        let documents: Vec<Document> = results
            .into_iter()
            .filter_map(|r| r.document.map(RawDocument::into_document))
            .collect();
        debug!(count = documents.len(), "Query returned documents");
        Ok(documents)
    }

    #[instrument(skip(self, fields))]
    async fn write_one(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        // PATCH without an update mask replaces the whole document.
        let body = json!({ "fields": value::encode_fields(&fields) });
        let request = self.client.patch(self.document_url(collection, id)).json(&body);
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, fields))]
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let body = json!({ "fields": value::encode_fields(&fields) });
        let request = self
            .client
            .post(format!(
                "{}/{}",
                self.documents_url,
                urlencoding::encode(collection)
            ))
            .json(&body);
        let raw: RawDocument = self.send(request).await?.json().await?;
        Ok(raw.into_document().id)
    }

    #[instrument(skip(self))]
    async fn delete_one(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let request = self.client.delete(self.document_url(collection, id));
        self.send(request).await?;
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Subscription<Snapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = self.clone();
        let collection = collection.to_string();
        let task = tokio::spawn(async move {
            let query = Query::new();
            let mut last: Option<Snapshot> = None;
            loop {
                match store.read_query(&collection, &query).await {
                    Ok(documents) => {
                        let snapshot = Snapshot { documents };
                        if last.as_ref() != Some(&snapshot) {
                            if tx.send(snapshot.clone()).is_err() {
                                break;
                            }
                            last = Some(snapshot);
                        }
                    }
                    Err(e) => warn!(collection = %collection, error = %e, "Snapshot poll failed"),
                }
                if tx.is_closed() {
                    break;
                }
                tokio::time::sleep(store.poll_interval).await;
            }
        });
        Subscription::with_task(rx, task)
    }
}
