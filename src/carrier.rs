//! Carrier REST client used to originate test calls against the webhook.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::TestCallConfig;
use crate::error::CarrierError;

const API_URL: &str = "https://api.twilio.com";

/// Form body for the `Calls.json` resource.
#[derive(Debug, Clone, Serialize)]
pub struct CallRequest {
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "From")]
    pub from: String,
    /// Webhook fetched when the callee answers.
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "Method")]
    pub method: String,
}

impl CallRequest {
    pub fn new(to: impl Into<String>, from: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            url: url.into(),
            method: "POST".to_string(),
        }
    }
}

/// The fields of the created call resource we report back.
#[derive(Debug, Clone, Deserialize)]
pub struct CallCreated {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

pub struct CarrierClient {
    account_sid: String,
    auth_token: String,
    client: Client,
    base_url: String,
}

impl CarrierClient {
    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(
        account_sid: String,
        auth_token: String,
        base_url: String,
    ) -> Result<Self, CarrierError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            account_sid,
            auth_token,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &TestCallConfig) -> Result<Self, CarrierError> {
        if config.account_sid.is_empty() {
            return Err(CarrierError::MissingSetting("test_call.account_sid"));
        }
        if config.auth_token.is_empty() {
            return Err(CarrierError::MissingSetting("test_call.auth_token"));
        }
        let base_url = config
            .api_base_url
            .clone()
            .unwrap_or_else(|| API_URL.to_string());
        Self::with_base_url(config.account_sid.clone(), config.auth_token.clone(), base_url)
    }

    /// Ask the carrier to dial `req.to` and fetch `req.url` once answered.
    pub async fn create_call(&self, req: &CallRequest) -> Result<CallCreated, CarrierError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.base_url, self.account_sid
        );
        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(req)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            return Err(CarrierError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let call = response.json::<CallCreated>().await?;
        tracing::info!(sid = %call.sid, to = %req.to, "carrier accepted test call");
        Ok(call)
    }
}

/// Resolve the call request from configuration plus CLI overrides.
pub fn call_request(
    config: &TestCallConfig,
    to: Option<String>,
    from: Option<String>,
    url: Option<String>,
) -> Result<CallRequest, CarrierError> {
    let pick = |value: Option<String>, fallback: &str, name: &'static str| {
        value
            .filter(|v| !v.is_empty())
            .or_else(|| Some(fallback.to_string()).filter(|v| !v.is_empty()))
            .ok_or(CarrierError::MissingSetting(name))
    };
    Ok(CallRequest::new(
        pick(to, &config.to, "test_call.to")?,
        pick(from, &config.from, "test_call.from")?,
        pick(url, &config.webhook_url, "test_call.webhook_url")?,
    ))
}
