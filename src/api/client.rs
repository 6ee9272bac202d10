//! reqwest implementation of [`LibraryService`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{ApiError, LibraryService, PendingResource, UserProfile};
use crate::catalog::{Resource, ResourceId};
use crate::upload::FileBlob;
use crate::user_agent;

const RESOURCES_PATH: &str = "resources";
const USER_PATH: &str = "user";
const REQUEST_PERMISSION_PATH: &str = "request-permission";
const UPLOAD_PATH: &str = "upload";
const PENDING_RESOURCES_PATH: &str = "pending-resources";

/// HTTP client bound to one library service base URL.
///
/// Created once per process and shared; reqwest pools connections internally.
#[derive(Debug, Clone)]
pub struct HttpLibraryService {
    client: Client,
    base_url: Url,
}

impl HttpLibraryService {
    /// Builds a service client for `base_url` with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] when `base_url` is not an absolute
    /// http(s) URL, or [`ApiError::ClientBuild`] if reqwest rejects the
    /// builder configuration.
    pub fn new(
        base_url: &str,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .user_agent(user_agent::default_user_agent())
            .gzip(true)
            .build()
            .map_err(|error| ApiError::ClientBuild {
                reason: error.to_string(),
            })?;
        Ok(Self { client, base_url })
    }

    /// Returns the normalized base URL (always ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|_| ApiError::invalid_url(format!("{}{path}", self.base_url)))
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|error| ApiError::transport(endpoint, error))?;
        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "service responded");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.ok();
        Err(ApiError::http_status(endpoint, status.as_u16(), body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(endpoint, request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|error| ApiError::transport(endpoint, error))?;
        serde_json::from_slice(&bytes).map_err(|error| ApiError::decode(endpoint, error.to_string()))
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Decodes each catalog entry on its own; entries that do not decode are skipped.
fn decode_resources(raw: Vec<Value>) -> Vec<Resource> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<Resource>(value) {
            Ok(resource) => Some(resource),
            Err(error) => {
                warn!(index, error = %error, "Skipping undecodable catalog entry");
                None
            }
        })
        .collect()
}

fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|_| ApiError::invalid_url(raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::invalid_url(raw));
    }
    Ok(url)
}

#[async_trait]
impl LibraryService for HttpLibraryService {
    #[instrument(level = "debug", skip(self))]
    async fn list_resources(&self) -> Result<Vec<Resource>, ApiError> {
        let url = self.endpoint(RESOURCES_PATH)?;
        let raw: Vec<Value> = self.send_json("/resources", self.client.get(url)).await?;
        Ok(decode_resources(raw))
    }

    #[instrument(level = "debug", skip(self, token), fields(id = %id))]
    async fn delete_resource(&self, token: &str, id: &ResourceId) -> Result<(), ApiError> {
        let path = format!("{RESOURCES_PATH}/{}", urlencoding::encode(id.as_str()));
        let url = self.endpoint(&path)?;
        let request = self.client.delete(url).header(AUTHORIZATION, bearer(token));
        self.send("/resources/{id}", request).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, token))]
    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        let url = self.endpoint(USER_PATH)?;
        let request = self.client.get(url).header(AUTHORIZATION, bearer(token));
        self.send_json("/user", request).await
    }

    #[instrument(level = "debug", skip(self, token))]
    async fn request_permission(&self, token: &str) -> Result<(), ApiError> {
        let url = self.endpoint(REQUEST_PERMISSION_PATH)?;
        let request = self
            .client
            .post(url)
            .header(AUTHORIZATION, bearer(token))
            .header(CONTENT_TYPE, "application/json")
            .body("{}");
        self.send("/request-permission", request).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, token, file), fields(file = %file.name, bytes = file.len()))]
    async fn upload_resource(
        &self,
        token: &str,
        file: &FileBlob,
        title: &str,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(UPLOAD_PATH)?;
        let mut part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        if let Some(mime) = file.mime.as_deref() {
            part = part
                .mime_str(mime)
                .map_err(|error| ApiError::transport("/upload", error))?;
        }
        let form = Form::new().part("file", part).text("title", title.to_string());
        let request = self
            .client
            .post(url)
            .header(AUTHORIZATION, bearer(token))
            .multipart(form);
        self.send("/upload", request).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, token))]
    async fn pending_resources(&self, token: &str) -> Result<Vec<PendingResource>, ApiError> {
        let url = self.endpoint(PENDING_RESOURCES_PATH)?;
        let request = self.client.get(url).header(AUTHORIZATION, bearer(token));
        self.send_json("/pending-resources", request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_appends_trailing_slash() {
        let url = normalize_base_url("http://localhost:5000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
        assert_eq!(
            url.join("resources").unwrap().as_str(),
            "http://localhost:5000/api/resources"
        );
    }

    #[test]
    fn test_normalize_base_url_rejects_non_http_scheme() {
        let result = normalize_base_url("ftp://files.example.com");
        assert!(matches!(result, Err(ApiError::InvalidUrl { .. })));
    }

    #[test]
    fn test_normalize_base_url_rejects_garbage() {
        let result = normalize_base_url("not a url");
        assert!(matches!(result, Err(ApiError::InvalidUrl { .. })));
    }

    #[test]
    fn test_decode_resources_skips_entries_without_id() {
        let raw = vec![
            serde_json::json!({"_id": "1", "title": "Kept", "imageUrl": "https://cdn.example.com/k.pdf"}),
            serde_json::json!({"title": "No id"}),
            serde_json::json!("not an object"),
            serde_json::json!({"_id": 3, "title": "Also kept"}),
        ];

        let resources = decode_resources(raw);

        let titles: Vec<&str> = resources.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Kept", "Also kept"]);
    }

    #[test]
    fn test_bearer_header_format() {
        assert_eq!(bearer("abc"), "Bearer abc");
    }

    #[test]
    fn test_new_keeps_base_url() {
        let service = HttpLibraryService::new("http://127.0.0.1:9", 1, 1).unwrap();
        assert_eq!(service.base_url().as_str(), "http://127.0.0.1:9/");
    }
}
