use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DriveError, Result};

mod env;

pub use env::Env;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_KEY_PATH_KEYS: &[&str] = &["GOOGLE_APPLICATION_CREDENTIALS"];
pub const DEFAULT_ACCESS_TOKEN_KEYS: &[&str] = &["GDRIVE_ACCESS_TOKEN"];

/// Deadlines handed to the HTTP client.
///
/// `total` covers a whole request including its streamed body, so it stays unset unless
/// configured; long uploads and downloads are bounded only by the connect deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub total: Option<Duration>,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            total: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriveAuth {
    #[serde(alias = "service_account_key")]
    ServiceAccount {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_path: Option<String>,
        #[serde(default)]
        key_path_keys: Vec<String>,
    },
    #[serde(alias = "browser", alias = "installed")]
    InstalledFlow {
        client_secret_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_cache_path: Option<String>,
    },
    #[serde(alias = "access_token", alias = "bearer_env")]
    AccessTokenEnv {
        #[serde(default)]
        keys: Vec<String>,
    },
}

impl Default for DriveAuth {
    fn default() -> Self {
        DriveAuth::ServiceAccount {
            key_path: None,
            key_path_keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DriveConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub http_headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<DriveAuth>,
}

impl DriveConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|err| DriveError::Config(err.to_string()))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|err| {
            DriveError::Config(format!("read {} failed: {err}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn base_url(&self) -> &str {
        non_empty(self.base_url.as_deref()).unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn upload_base_url(&self) -> &str {
        non_empty(self.upload_base_url.as_deref()).unwrap_or(DEFAULT_UPLOAD_BASE_URL)
    }

    pub fn timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            total: self.timeout_secs.map(Duration::from_secs),
            ..HttpTimeouts::default()
        }
    }

    pub fn auth(&self) -> DriveAuth {
        self.auth.clone().unwrap_or_default()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Explicit value first, then `keys` (or `defaults` when `keys` is empty) looked up in `env`.
pub(crate) fn resolve_field(
    env: &Env,
    explicit: Option<&str>,
    keys: &[String],
    defaults: &[&str],
    label: &str,
) -> Result<String> {
    if let Some(value) = non_empty(explicit) {
        return Ok(value.to_string());
    }
    let candidate_keys: Vec<String> = if keys.is_empty() {
        defaults.iter().map(|key| key.to_string()).collect()
    } else {
        keys.to_vec()
    };
    env.first_of(&candidate_keys).ok_or_else(|| {
        DriveError::Config(format!(
            "missing {label} (tried: {})",
            candidate_keys.join(", ")
        ))
    })
}

pub(crate) fn resolve_key_path(
    env: &Env,
    key_path: Option<&str>,
    key_path_keys: &[String],
) -> Result<PathBuf> {
    resolve_field(
        env,
        key_path,
        key_path_keys,
        DEFAULT_KEY_PATH_KEYS,
        "service account key path",
    )
    .map(PathBuf::from)
}
