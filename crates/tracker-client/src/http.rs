//! Blocking reqwest implementation of [`TrackerApi`].
//!
//! No Tokio runtime is required. Every call captures a [`RequestTrace`] before
//! it is sent; credentials never appear in traces.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use tracker_model::{
    AttributeId, DataElementId, EnrollmentPayload, EntityPayload, EntityReference, EventPayload,
    RequestTrace,
};

use crate::api::{ApiResponse, EventQuery, TrackerApi};
use crate::error::ClientError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const REDACTED: &str = "[REDACTED]";
const ENTITY_EVENT_FIELDS: &str = "event,dataValues[dataElement,value]";

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, e.g. `https://tracker.example.org/staging`.
    pub base_url: String,
    /// Optional API version segment (`api/<version>/`).
    pub api_version: Option<String>,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_version: None,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_api_version(mut self, version: Option<String>) -> Self {
        self.api_version = version.filter(|value| !value.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the API root: the base URL with a trailing slash, joined with
    /// `api/` or `api/<version>/`.
    pub fn api_root(&self) -> Result<Url, ClientError> {
        let base = ensure_trailing_slash(&self.base_url);
        let base = Url::parse(&base).map_err(|source| ClientError::InvalidUrl {
            url: self.base_url.clone(),
            source,
        })?;
        let relative = match &self.api_version {
            Some(version) => format!("api/{}/", version.trim().trim_matches('/')),
            None => "api/".to_string(),
        };
        base.join(&relative)
            .map_err(|source| ClientError::InvalidUrl {
                url: relative,
                source,
            })
    }
}

pub fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Tracker API client (blocking).
#[derive(Clone)]
pub struct HttpTrackerClient {
    http: reqwest::blocking::Client,
    api_root: Url,
    credentials: Option<Credentials>,
}

impl HttpTrackerClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("tracker-populate/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            http,
            api_root: config.api_root()?,
            credentials: config.credentials.clone(),
        })
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, ClientError> {
        self.send(Method::GET, path, query, None)
    }

    fn send_json<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
    ) -> Result<ApiResponse, ClientError> {
        let body = serde_json::to_value(payload)?;
        self.send(method, path, &[], Some(body))
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<ApiResponse, ClientError> {
        let mut url = self
            .api_root
            .join(path)
            .map_err(|source| ClientError::InvalidUrl {
                url: path.to_string(),
                source,
            })?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));
        }

        let trace = self.trace(&method, &url, body.as_ref());
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        // Query strings can carry attribute values; keep them out of errors.
        let mut shown = url.clone();
        shown.set_query(None);
        let transport = |source: reqwest::Error| ClientError::Transport {
            method: method.to_string(),
            url: shown.to_string(),
            source: source.without_url(),
        };
        let response = request.send().map_err(transport)?;
        let status = response.status().as_u16();
        let text = response.text().map_err(transport)?;
        let body = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };
        debug!(method = %method, path = url.path(), status, "tracker api call");

        Ok(ApiResponse {
            status,
            body,
            trace,
        })
    }

    fn trace(&self, method: &Method, url: &Url, body: Option<&Value>) -> RequestTrace {
        let mut headers = BTreeMap::new();
        headers.insert("accept".to_string(), "*/*".to_string());
        if body.is_some() {
            headers.insert("content-type".to_string(), "application/json".to_string());
        }
        if self.credentials.is_some() {
            headers.insert("authorization".to_string(), format!("Basic {REDACTED}"));
        }
        let path = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };
        RequestTrace {
            method: method.to_string(),
            path,
            headers,
            body: body.cloned(),
            timestamp: Utc::now(),
        }
    }
}

impl TrackerApi for HttpTrackerClient {
    fn attribute_metadata(&self, id: &AttributeId) -> Result<ApiResponse, ClientError> {
        self.get(&format!("trackedEntityAttributes/{id}"), &[])
    }

    fn data_element_metadata(&self, id: &DataElementId) -> Result<ApiResponse, ClientError> {
        self.get(&format!("dataElements/{id}"), &[])
    }

    fn create_entity(&self, payload: &EntityPayload) -> Result<ApiResponse, ClientError> {
        self.send_json(Method::POST, "trackedEntityInstances", payload)
    }

    fn find_entities(
        &self,
        org_unit: Option<&str>,
        attribute: &AttributeId,
        value: &str,
    ) -> Result<ApiResponse, ClientError> {
        let mut query = Vec::new();
        if let Some(org_unit) = org_unit {
            query.push(("ou", org_unit.to_string()));
        }
        query.push(("filter", format!("{attribute}:EQ:{value}")));
        self.get("trackedEntityInstances", &query)
    }

    fn update_entity(
        &self,
        entity: &EntityReference,
        payload: &EntityPayload,
    ) -> Result<ApiResponse, ClientError> {
        self.send_json(
            Method::PUT,
            &format!("trackedEntityInstances/{entity}"),
            payload,
        )
    }

    fn enroll(&self, payload: &EnrollmentPayload) -> Result<ApiResponse, ClientError> {
        self.send_json(Method::POST, "enrollments", payload)
    }

    fn list_events(&self, query: &EventQuery) -> Result<ApiResponse, ClientError> {
        let mut params = vec![
            ("program", query.program.to_string()),
            ("programStage", query.program_stage.to_string()),
            (
                "trackedEntityInstance",
                query.tracked_entity_instance.to_string(),
            ),
        ];
        if let Some(org_unit) = &query.org_unit {
            params.push(("orgUnit", org_unit.clone()));
        }
        params.push(("startDate", query.start_date.clone()));
        params.push(("pageSize", "1".to_string()));
        params.push(("page", "1".to_string()));
        self.get("events", &params)
    }

    fn list_entity_events(&self, entity: &EntityReference) -> Result<ApiResponse, ClientError> {
        self.get(
            "events",
            &[
                ("trackedEntityInstance", entity.to_string()),
                ("fields", ENTITY_EVENT_FIELDS.to_string()),
                ("paging", "false".to_string()),
            ],
        )
    }

    fn add_event(&self, payload: &EventPayload) -> Result<ApiResponse, ClientError> {
        self.send_json(Method::POST, "events", payload)
    }
}
