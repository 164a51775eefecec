use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::error::ExtractError;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const ENDPOINT_KEY: &str = "AZURE_ENDPOINT";
pub const API_KEY_KEY: &str = "AZURE_KEY";
pub const MODEL_ID_KEY: &str = "MODEL_ID";

static MODEL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._~-]{1,63}$").expect("valid model id regex")
});

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(rename = "AZURE_ENDPOINT")]
    pub endpoint: Option<String>,
    #[serde(rename = "AZURE_KEY")]
    pub key: Option<String>,
    #[serde(rename = "MODEL_ID")]
    pub model_id: Option<String>,
}

/// Service endpoint, access key and model, fixed for the life of the process.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    endpoint: Url,
    key: String,
    model_id: String,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("key", &"<redacted>")
            .field("model_id", &self.model_id)
            .finish()
    }
}

impl ServiceConfig {
    pub fn new(endpoint: &str, key: &str, model_id: &str) -> Result<Self, ExtractError> {
        let endpoint = parse_endpoint(endpoint)?;
        let key = required(API_KEY_KEY, Some(key))?;
        let model_id = required(MODEL_ID_KEY, Some(model_id))?;
        validate_model_id(&model_id)?;
        Ok(Self {
            endpoint,
            key,
            model_id,
        })
    }

    /// Loads the JSON config file, then lets environment variables of the same name override it.
    ///
    /// A missing file is fine as long as the environment supplies every value.
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let file = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str::<FileConfig>(&text).map_err(|error| {
                ExtractError::Config(format!("failed to parse '{}': {error}", path.display()))
            })?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using environment only");
            FileConfig::default()
        };

        Self::from_sources(file, |name| std::env::var(name).ok())
    }

    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self, ExtractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |name: &str, from_file: Option<String>| {
            env(name)
                .filter(|value| !value.trim().is_empty())
                .or(from_file)
        };

        let endpoint = pick(ENDPOINT_KEY, file.endpoint);
        let key = pick(API_KEY_KEY, file.key);
        let model_id = pick(MODEL_ID_KEY, file.model_id);

        Self::new(
            &required(ENDPOINT_KEY, endpoint.as_deref())?,
            &required(API_KEY_KEY, key.as_deref())?,
            &required(MODEL_ID_KEY, model_id.as_deref())?,
        )
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn required(name: &str, value: Option<&str>) -> Result<String, ExtractError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ExtractError::Config(format!("{name} is missing or empty")))
}

fn parse_endpoint(raw: &str) -> Result<Url, ExtractError> {
    let raw = required(ENDPOINT_KEY, Some(raw))?;
    let url = Url::parse(&raw)
        .map_err(|error| ExtractError::Config(format!("{ENDPOINT_KEY} is not a URL: {error}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExtractError::Config(format!(
            "{ENDPOINT_KEY} must use http or https, got '{}'",
            url.scheme()
        )));
    }
    Ok(url)
}

fn validate_model_id(model_id: &str) -> Result<(), ExtractError> {
    if MODEL_ID_RE.is_match(model_id) {
        Ok(())
    } else {
        Err(ExtractError::Config(format!(
            "{MODEL_ID_KEY} '{model_id}' is not a valid model identifier"
        )))
    }
}
