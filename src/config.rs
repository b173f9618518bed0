use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::RelayError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 8;

/// Known-good generalist models tried after the requested and listed ones.
pub const DEFAULT_FALLBACK_MODELS: &[&str] = &[
    "gemini-flash-latest",
    "gemini-pro-latest",
    "gemini-2.5-flash",
    "gemini-2.5-pro",
    "gemini-2.0-flash",
    "gemini-2.0-pro-exp",
];

/// Unprefixed variable names kept for existing deployments.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("GEMINI_API_KEY", "api_key"),
    ("GEMINI_MODEL", "default_model"),
    ("PORT", "port"),
];

const ENV_PREFIX: &str = "HERBAL_";

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub default_model: String,
    pub listen_addr: String,
    pub port: u16,
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub dynamic_listing: bool,
    pub fallback_models: Vec<String>,
    pub proxy: Option<Url>,
    pub loglevel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: DEFAULT_MODEL.to_string(),
            listen_addr: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            dynamic_listing: true,
            fallback_models: DEFAULT_FALLBACK_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            proxy: None,
            loglevel: "info".to_string(),
        }
    }
}

impl Config {
    /// Layered sources: built-in defaults, legacy env names, then `HERBAL_*`.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(legacy_env())
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> Result<Self, RelayError> {
        let cfg: Config = Self::figment().extract()?;
        Ok(cfg.normalized())
    }

    /// Blank key and model values count as unset; a zero timeout falls back to the default.
    fn normalized(mut self) -> Self {
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        self.api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if self.default_model.trim().is_empty() {
            self.default_model = DEFAULT_MODEL.to_string();
        }
        self
    }

    pub fn endpoint_url(&self) -> Result<Url, RelayError> {
        Ok(Url::parse(&self.endpoint)?)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.port)
    }
}

fn legacy_env() -> Env {
    Env::raw().filter_map(|key| {
        LEGACY_ENV_KEYS
            .iter()
            .find(|(env, _)| key.as_str().eq_ignore_ascii_case(env))
            .map(|(_, field)| (*field).into())
    })
}
