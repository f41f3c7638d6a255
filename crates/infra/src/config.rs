//! Onboarding configuration.
//!
//! Loaded from a JSON document (path taken from `ONBOARD_CONFIG`) with a few
//! environment overrides on top. Every field has a default so an empty
//! document, or no document at all, yields a usable dev configuration.

use std::env::VarError;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "ONBOARD_CONFIG";
pub const REGISTRATION_SERVICE_URL_VAR: &str = "ONBOARD_REGISTRATION_SERVICE_URL";
pub const AUTOMATIC_APPROVAL_VAR: &str = "ONBOARD_AUTOMATIC_APPROVAL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingConfig {
    /// User tier assigned when no social event overrides it.
    #[serde(default = "default_user_tier")]
    pub default_user_tier: String,

    #[serde(default = "default_workspace_tier")]
    pub default_workspace_tier: String,

    /// Usernames starting with one of these get a `crt-` prefix.
    #[serde(default = "default_forbidden_prefixes")]
    pub forbidden_username_prefixes: Vec<String>,

    /// Usernames ending with one of these get a `-crt` suffix.
    #[serde(default = "default_forbidden_suffixes")]
    pub forbidden_username_suffixes: Vec<String>,

    /// Passed to notification templates as `registrationURL`.
    #[serde(default = "default_registration_service_url")]
    pub registration_service_url: String,

    #[serde(default)]
    pub automatic_approval: bool,

    /// Email domains counted as internal in metrics.
    #[serde(default)]
    pub internal_email_domains: Vec<String>,
}

fn default_user_tier() -> String {
    "deactivate30".to_string()
}

fn default_workspace_tier() -> String {
    "base".to_string()
}

fn default_forbidden_prefixes() -> Vec<String> {
    ["openshift", "kube", "default", "redhat", "sandbox"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_forbidden_suffixes() -> Vec<String> {
    vec!["admin".to_string()]
}

fn default_registration_service_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            default_user_tier: default_user_tier(),
            default_workspace_tier: default_workspace_tier(),
            forbidden_username_prefixes: default_forbidden_prefixes(),
            forbidden_username_suffixes: default_forbidden_suffixes(),
            registration_service_url: default_registration_service_url(),
            automatic_approval: false,
            internal_email_domains: Vec::new(),
        }
    }
}

impl OnboardingConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load using a custom variable reader (tests avoid touching the
    /// process-global environment).
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let config = match reader(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.with_overrides(reader)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    fn with_overrides<F>(mut self, reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        if let Ok(url) = reader(REGISTRATION_SERVICE_URL_VAR) {
            self.registration_service_url = url;
        }
        if let Ok(raw) = reader(AUTOMATIC_APPROVAL_VAR) {
            self.automatic_approval = raw.trim().parse::<bool>().map_err(|e| {
                ConfigError::InvalidValue(AUTOMATIC_APPROVAL_VAR.to_string(), e.to_string())
            })?;
        }
        Ok(self)
    }
}
