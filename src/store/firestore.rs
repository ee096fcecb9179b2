use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use super::credentials::{load_service_account, TokenSource};
use super::TicketStore;
use crate::config::StoreConfig;
use crate::error::StoreError;

const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
const TICKETS_COLLECTION: &str = "tickets";
const STATUS_FIELD: &str = "status";
const UNKNOWN_STATUS: &str = "Unknown";

enum Auth {
    /// Emulators accept unauthenticated requests.
    None,
    ServiceAccount(TokenSource),
}

/// Reads ticket documents over the Firestore REST API.
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    project_id: String,
    auth: Auth,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    fields: HashMap<String, Value>,
}

impl FirestoreStore {
    /// Client without authentication, for emulators and tests.
    pub fn unauthenticated(client: Client, base_url: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
            auth: Auth::None,
        }
    }

    pub fn with_token_source(
        client: Client,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        tokens: TokenSource,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
            auth: Auth::ServiceAccount(tokens),
        }
    }

    /// Build a client from configuration, loading credentials unless an
    /// emulator is configured.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let timeout = Duration::from_millis(config.lookup_timeout_ms);
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        if let Some(host) = &config.emulator_host {
            let project = config.project_id.clone().ok_or_else(|| {
                StoreError::Unconfigured("store.project_id is required with an emulator".into())
            })?;
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| format!("http://{host}/v1"));
            return Ok(Self::unauthenticated(client, base_url, project));
        }

        let account =
            load_service_account(config.credentials_json.as_deref(), &config.credentials_paths)?;
        let project = config
            .project_id
            .clone()
            .unwrap_or_else(|| account.project_id.clone());
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| FIRESTORE_URL.to_string());
        let tokens = TokenSource::new(account, client.clone())?;
        Ok(Self::with_token_source(client, base_url, project, tokens))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn document_url(&self, ticket_id: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StoreError::Unconfigured(format!("invalid store URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Unconfigured(format!("store URL {} cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend([
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                TICKETS_COLLECTION,
                ticket_id,
            ]);
        Ok(url)
    }

    pub async fn get_status(&self, ticket_id: &str) -> Result<Option<String>, StoreError> {
        if !is_document_id(ticket_id) {
            tracing::debug!(ticket_id, "identifier cannot name a document");
            return Ok(None);
        }

        let mut request = self.client.get(self.document_url(ticket_id)?);
        if let Auth::ServiceAccount(tokens) = &self.auth {
            request = request.bearer_auth(tokens.token().await?);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let document = response.json::<Document>().await?;
        let status = document
            .fields
            .get(STATUS_FIELD)
            .and_then(field_text)
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
        Ok(Some(status))
    }
}

impl TicketStore for FirestoreStore {
    async fn lookup(&self, ticket_id: &str) -> Result<Option<String>, StoreError> {
        self.get_status(ticket_id).await
    }
}

/// Whether `id` is usable as a single document id.
fn is_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 1500
        && !id.contains('/')
        && id != "."
        && id != ".."
        && !(id.starts_with("__") && id.ends_with("__"))
}

/// Text of a typed Firestore value (`{"stringValue": "Open"}` and friends).
fn field_text(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    if let Some(text) = object.get("stringValue").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    if let Some(number) = object.get("integerValue") {
        return Some(match number {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    }
    if let Some(other) = object
        .get("doubleValue")
        .or_else(|| object.get("booleanValue"))
    {
        return Some(other.to_string());
    }
    None
}
