use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::artifact_loader::ArtifactPaths;
use crate::web::DEFAULT_MAX_BODY_BYTES;

/// Config file read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "sentiment.toml";
/// Prefix for environment overrides, e.g. `SENTIMENT_PORT=8080`
pub const ENV_PREFIX: &str = "SENTIMENT_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub vectorizer_path: String,
    pub model_path: String,
    #[serde(default)]
    pub vectorizer_sha256: Option<String>,
    #[serde(default)]
    pub model_sha256: Option<String>,
    pub max_body_bytes: usize,
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            vectorizer_path: "artifacts/tfidf_vectorizer.json".to_string(),
            model_path: "artifacts/sentiment_model.json".to_string(),
            vectorizer_sha256: None,
            model_sha256: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_filter: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            vectorizer: self.vectorizer_path.clone(),
            classifier: self.model_path.clone(),
            vectorizer_sha256: self.vectorizer_sha256.clone(),
            classifier_sha256: self.model_sha256.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), figment::Error> {
        if self.port == 0 {
            return Err(figment::Error::from("port must be non-zero"));
        }
        if self.host.trim().is_empty() {
            return Err(figment::Error::from("host must be set"));
        }
        if self.vectorizer_path.trim().is_empty() {
            return Err(figment::Error::from("vectorizer_path must be set"));
        }
        if self.model_path.trim().is_empty() {
            return Err(figment::Error::from("model_path must be set"));
        }
        if self.max_body_bytes == 0 {
            return Err(figment::Error::from("max_body_bytes must be non-zero"));
        }
        for (name, digest) in [
            ("vectorizer_sha256", &self.vectorizer_sha256),
            ("model_sha256", &self.model_sha256),
        ] {
            if let Some(d) = digest {
                let d = d.trim();
                if d.len() != 64 || !d.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(figment::Error::from(format!(
                        "{name} must be 64 hex characters"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Layer defaults, the TOML file and `SENTIMENT_*` environment variables.
pub fn figment(config_file: Option<&Path>) -> Figment {
    let file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    Figment::from(Serialized::defaults(ServiceConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed(ENV_PREFIX))
}

pub fn load_config(config_file: Option<&Path>) -> Result<ServiceConfig, figment::Error> {
    let config: ServiceConfig = figment(config_file).extract()?;
    config.validate()?;
    Ok(config)
}
