//! Configuration loaded from `ivr.toml` plus environment overrides.
//!
//! Every section falls back to defaults, so a missing file yields a working
//! configuration for local development. Environment variables take precedence
//! over the file; they are read through an injectable lookup so tests never
//! touch the process environment.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "ivr.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IvrConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub test_call: TestCallConfig,
}

/// Where the webhook server listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// How voice markup addresses callbacks, audio, and TTS.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Public base URL the carrier reaches this server at.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Base URL the prompt audio files are hosted under.
    #[serde(default = "default_audio_base_url")]
    pub audio_base_url: String,
    #[serde(default = "default_tts_voice")]
    pub voice: String,
    #[serde(default = "default_tts_language")]
    pub language: String,
}

/// Ticket store connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Overrides the project id from the service account.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Key files tried in order.
    #[serde(default = "default_credentials_paths")]
    pub credentials_paths: Vec<PathBuf>,
    /// Name of the environment variable holding a service-account JSON blob.
    #[serde(default = "default_credentials_env")]
    pub credentials_env: String,
    /// Service-account JSON resolved from `credentials_env` at load time.
    #[serde(skip)]
    pub credentials_json: Option<String>,
    /// `host:port` of a local emulator; disables authentication.
    #[serde(default)]
    pub emulator_host: Option<String>,
    /// Overrides the REST API base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "ivr_brain=debug,info".
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Carrier account used by the `call` subcommand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestCallConfig {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    /// Number to ring.
    #[serde(default)]
    pub to: String,
    /// Carrier-owned caller number.
    #[serde(default)]
    pub from: String,
    /// Webhook the carrier fetches when the call connects.
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5000
}

fn default_public_base_url() -> String {
    "https://digi9-ivr.onrender.com".to_string()
}

fn default_audio_base_url() -> String {
    "https://cdn.jsdelivr.net/gh/kirtivardhan80/digi9-audio-assets@main".to_string()
}

fn default_tts_voice() -> String {
    "Polly.Amy".to_string()
}

fn default_tts_language() -> String {
    "en-GB".to_string()
}

fn default_credentials_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/etc/secrets/firebase-key.json"),
        PathBuf::from("firebase-key.json"),
    ]
}

fn default_credentials_env() -> String {
    "FIREBASE_CREDENTIALS".to_string()
}

fn default_lookup_timeout_ms() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_public_base_url(),
            audio_base_url: default_audio_base_url(),
            voice: default_tts_voice(),
            language: default_tts_language(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            credentials_paths: default_credentials_paths(),
            credentials_env: default_credentials_env(),
            credentials_json: None,
            emulator_host: None,
            base_url: None,
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl IvrConfig {
    /// Load `path` (defaults when it does not exist) and apply process
    /// environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::FileRead(e)),
        }
    }

    /// Apply environment overrides; blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = var("IVR_HOST").and_then(|v| v.parse().ok()) {
            self.server.host = host;
        }
        if let Some(port) = var("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = var("IVR_PUBLIC_BASE_URL") {
            self.voice.public_base_url = url;
        }
        if let Some(url) = var("IVR_AUDIO_BASE_URL") {
            self.voice.audio_base_url = url;
        }
        if let Some(project) = var("FIREBASE_PROJECT_ID") {
            self.store.project_id = Some(project);
        }
        if let Some(host) = var("FIRESTORE_EMULATOR_HOST") {
            self.store.emulator_host = Some(host);
        }
        self.store.credentials_json = var(&self.store.credentials_env);
        if let Some(level) = var("IVR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = var("IVR_LOG_JSON") {
            self.logging.json = json == "true" || json == "1";
        }

        let call = &mut self.test_call;
        for (key, field) in [
            ("TWILIO_ACCOUNT_SID", &mut call.account_sid),
            ("TWILIO_AUTH_TOKEN", &mut call.auth_token),
            ("MY_PHONE_NUMBER", &mut call.to),
            ("TWILIO_PHONE_NUMBER", &mut call.from),
            ("WEBHOOK_URL", &mut call.webhook_url),
        ] {
            if let Some(value) = var(key) {
                *field = value;
            }
        }
    }
}
