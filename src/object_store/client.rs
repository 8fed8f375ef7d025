use std::time::Duration;

use bytes::Bytes;
use reqwest::{header, Client, StatusCode};
use tracing::{debug, info, warn};

use super::ObjectStoreError;
use crate::name;

/// Raw HTTP operations against Thumbor's read-write host.
///
/// Every method takes an object name and addresses it by its canonical
/// (`/`-prefixed) path, so callers may pass either name convention.
pub struct ThumborClient {
    rw_server: String,
    client: Client,
}

impl ThumborClient {
    pub fn new(rw_server: &str, timeout: Option<Duration>) -> Result<Self, ObjectStoreError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ObjectStoreError::Transport(e.to_string()))?;

        Ok(Self {
            rw_server: rw_server.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn rw_server(&self) -> &str {
        &self.rw_server
    }

    /// Read-write URL of an object.
    pub fn object_url(&self, name: &str) -> String {
        format!("{}{}", self.rw_server, name::canonicalize(name))
    }

    fn upload_url(&self) -> String {
        format!("{}/image", self.rw_server)
    }

    /// Upload an original image. Returns the decoded `Location` Thumbor
    /// assigned, e.g. `/image/<key>/<name>`.
    pub async fn store(&self, name: &str, data: Bytes) -> Result<String, ObjectStoreError> {
        let content_type = mime_guess::from_path(name)
            .first_raw()
            .unwrap_or("image/jpeg");
        let url = self.upload_url();
        debug!(%url, object = name, content_type, "POST");

        let resp = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, content_type)
            .header("Slug", name::encode_slug(name))
            .body(data)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Transport(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::CREATED {
            warn!(%url, status = status.as_u16(), "Thumbor upload rejected");
            return Err(ObjectStoreError::Post {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let location = resp
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(name::decode_location)
            .ok_or_else(|| {
                ObjectStoreError::Transport(format!("Thumbor upload of {name} returned no Location"))
            })?;

        info!(object = name, %location, "stored image on Thumbor");
        Ok(location)
    }

    pub async fn fetch(&self, name: &str) -> Result<Bytes, ObjectStoreError> {
        let url = self.object_url(name);
        debug!(%url, "GET");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Transport(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ObjectStoreError::NotFound(name.to_string()));
        }

        if !resp.status().is_success() {
            let status = resp.status();
            warn!(%url, status = status.as_u16(), "Thumbor fetch failed");
            return Err(ObjectStoreError::Transport(format!(
                "Thumbor fetch of {name} failed ({status})"
            )));
        }

        resp.bytes()
            .await
            .map_err(|e| ObjectStoreError::Transport(e.to_string()))
    }

    pub async fn delete(&self, name: &str) -> Result<(), ObjectStoreError> {
        let url = self.object_url(name);
        debug!(%url, "DELETE");

        let resp = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Transport(e.to_string()))?;

        match resp.status() {
            StatusCode::METHOD_NOT_ALLOWED => {
                Err(ObjectStoreError::MethodNotAllowed(name.to_string()))
            }
            StatusCode::NOT_FOUND => Err(ObjectStoreError::NotFound(name.to_string())),
            StatusCode::NO_CONTENT => Ok(()),
            status => {
                warn!(%url, status = status.as_u16(), "Thumbor delete failed");
                Err(ObjectStoreError::Transport(format!(
                    "Thumbor delete of {name} failed ({status})"
                )))
            }
        }
    }

    /// True iff a GET on the object answers 200. A URL that cannot even be
    /// built counts as missing.
    pub async fn exists(&self, name: &str) -> Result<bool, ObjectStoreError> {
        let url = self.object_url(name);
        debug!(%url, "GET (exists)");

        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status() == StatusCode::OK),
            Err(e) if e.is_builder() => {
                debug!(%url, error = %e, "unparseable Thumbor URL, treating as missing");
                Ok(false)
            }
            Err(e) => Err(ObjectStoreError::Transport(e.to_string())),
        }
    }
}
