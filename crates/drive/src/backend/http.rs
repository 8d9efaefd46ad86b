//! Drive v3 REST backend.
//!
//! Every request carries `supportsAllDrives=true` so shared drives behave the
//! same as the principal's own drive. Listings also set
//! `includeItemsFromAllDrives=true`.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::Backend;
use crate::auth::{Authenticator, DRIVE_SCOPE, ServiceAccountKey};
use crate::error::{Error, Result};
use crate::types::{CopyRequest, DriveFile, FileList, ListQuery};

/// Drive v3 API base URL.
pub const API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Fields requested for single-file responses (get, copy, update).
const FILE_FIELDS: &str = "id,name,size,parents,mimeType,description";

/// Upper bound on any single request, connection included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Backend that talks to the Drive REST API with a service account.
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Drive API base URL.
    api_base: String,
    auth: Authenticator,
}

impl HttpBackend {
    /// Create a backend for the given key.
    ///
    /// No request is made until the first call; use [`connect`](Self::connect)
    /// to fail fast on bad credentials.
    pub fn new(key: ServiceAccountKey) -> Self {
        Self::with_api_base(key, API_BASE)
    }

    /// Create a backend with a custom API base (for testing).
    pub fn with_api_base(key: ServiceAccountKey, api_base: impl Into<String>) -> Self {
        let agent = build_agent();
        let auth = Authenticator::new(key, DRIVE_SCOPE, agent.clone());
        Self {
            agent,
            api_base: api_base.into(),
            auth,
        }
    }

    /// Create a backend and immediately obtain an access token.
    pub fn connect(key: ServiceAccountKey) -> Result<Self> {
        Self::new(key).authenticated()
    }

    /// Obtain an access token now, so bad credentials fail before any listing.
    pub fn authenticated(self) -> Result<Self> {
        self.auth.token()?;
        log::info!("Authenticated as {}", self.auth.client_email());
        Ok(self)
    }

    /// Get the current API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.api_base)
    }

    fn file_url(&self, id: &str) -> String {
        format!("{}/files/{}", self.api_base, id)
    }

    fn copy_url(&self, id: &str) -> String {
        format!("{}/files/{}/copy", self.api_base, id)
    }

    fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.auth.token()?))
    }
}

/// Agent that hands 4xx/5xx responses back to us so the error body can be
/// classified, instead of collapsing them into a bare status code.
fn build_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(REQUEST_TIMEOUT))
        .build();
    ureq::Agent::new_with_config(config)
}

type HttpResponse = ureq::http::Response<ureq::Body>;

/// Turn an error status into a categorized [`Error`].
fn check(mut response: HttpResponse) -> Result<HttpResponse> {
    let status = response.status().as_u16();
    if status >= 400 {
        let body = response.body_mut().read_to_string().unwrap_or_default();
        return Err(Error::from_status(status, &body));
    }
    Ok(response)
}

fn read_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    let mut response = check(response)?;
    Ok(response.body_mut().read_json()?)
}

impl Backend for HttpBackend {
    fn list(&self, query: &ListQuery, page_token: Option<&str>) -> Result<FileList> {
        let bearer = self.bearer()?;
        let mut request = self
            .agent
            .get(&self.files_url())
            .header("Authorization", bearer.as_str())
            .query("q", &query.q)
            .query("fields", query.fields_param())
            .query("orderBy", &query.order_by)
            .query("pageSize", query.page_size.to_string())
            .query("includeItemsFromAllDrives", "true")
            .query("supportsAllDrives", "true");

        if let Some(token) = page_token {
            request = request.query("pageToken", token);
        }

        log::debug!("files.list q={} page_token={:?}", query.q, page_token);
        read_json(request.call()?)
    }

    fn get(&self, id: &str) -> Result<DriveFile> {
        let bearer = self.bearer()?;
        let response = self
            .agent
            .get(&self.file_url(id))
            .header("Authorization", bearer.as_str())
            .query("fields", FILE_FIELDS)
            .query("supportsAllDrives", "true")
            .call()?;

        read_json(response)
    }

    fn copy(&self, id: &str, template: &CopyRequest) -> Result<DriveFile> {
        let bearer = self.bearer()?;
        let response = self
            .agent
            .post(&self.copy_url(id))
            .header("Authorization", bearer.as_str())
            .query("fields", FILE_FIELDS)
            .query("supportsAllDrives", "true")
            .send_json(template)?;

        read_json(response)
    }

    fn update_parents(&self, id: &str, add: &str, remove: &str) -> Result<DriveFile> {
        let bearer = self.bearer()?;
        let response = self
            .agent
            .patch(&self.file_url(id))
            .header("Authorization", bearer.as_str())
            .query("addParents", add)
            .query("removeParents", remove)
            .query("fields", FILE_FIELDS)
            .query("supportsAllDrives", "true")
            .send_json(serde_json::json!({}))?;

        read_json(response)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let bearer = self.bearer()?;
        let response = self
            .agent
            .delete(&self.file_url(id))
            .header("Authorization", bearer.as_str())
            .query("supportsAllDrives", "true")
            .call()?;

        check(response).map(|_| ())
    }
}
