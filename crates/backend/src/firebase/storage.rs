//! Cloud Storage for Firebase over its REST API.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::error_message;
use crate::config::FirebaseConfig;
use crate::error::UploadError;
use crate::service::{ObjectStorage, ProgressSender, TokenSource, UploadProgress};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Storage client for one bucket.
#[derive(Clone)]
pub struct FirebaseStorage {
    client: reqwest::Client,
    /// `{base}/b/{bucket}/o`
    objects_url: String,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl FirebaseStorage {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        config: &FirebaseConfig,
        tokens: Option<Arc<dyn TokenSource>>,
    ) -> Self {
        Self {
            client,
            objects_url: format!(
                "{}/b/{}/o",
                config.endpoints.storage.trim_end_matches('/'),
                config.storage_bucket
            ),
            tokens,
        }
    }

    /// Public URL for an uploaded object and one of its download tokens.
    fn download_url(&self, name: &str, token: &str) -> String {
        format!(
            "{}/{}?alt=media&token={}",
            self.objects_url,
            urlencoding::encode(name),
            urlencoding::encode(token)
        )
    }
}

impl std::fmt::Debug for FirebaseStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseStorage")
            .field("objects_url", &self.objects_url)
            .finish_non_exhaustive()
    }
}

fn report(progress: Option<&ProgressSender>, bytes_transferred: u64, total_bytes: u64) {
    if let Some(tx) = progress {
        let _ = tx.send(UploadProgress {
            bytes_transferred,
            total_bytes,
        });
    }
}

#[async_trait]
impl ObjectStorage for FirebaseStorage {
    #[instrument(skip(self, bytes, progress), fields(size = bytes.len()))]
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        progress: Option<ProgressSender>,
    ) -> Result<String, UploadError> {
        let total = bytes.len() as u64;
        report(progress.as_ref(), 0, total);

        let mut request = self
            .client
            .post(&self.objects_url)
            .query(&[("uploadType", "media"), ("name", path)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(tokens) = &self.tokens {
            match tokens.id_token().await {
                Ok(Some(token)) => {
                    request = request.header(
                        reqwest::header::AUTHORIZATION,
                        format!("Firebase {}", token.expose_secret()),
                    );
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Uploading without an ID token"),
            }
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(UploadError::Service {
                status,
                message: error_message(&text).0,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        let token = uploaded
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|token| !token.is_empty())
            .ok_or(UploadError::MissingDownloadUrl)?;

        report(progress.as_ref(), total, total);
        debug!(name = %uploaded.name, "Upload complete");
        Ok(self.download_url(&uploaded.name, token))
    }
}
