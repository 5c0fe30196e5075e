//! Configuration loaded from `config.toml`.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::device::{device_path, DeviceId};
use crate::error::{PlannerError, Result};
use crate::schedule::engine::{LlmEngineConfig, DEFAULT_API_URL, DEFAULT_MODEL};
use crate::store::local::default_db_path;
use crate::store::{LocalTaskStore, RemoteTaskStore, TaskStore};

/// Which task store backs the planner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Local tasks file. Defaults to `DAYWISE_DB` or the data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Remote task API endpoint. Required when `backend = "remote"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub api_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            api_key_env: "OPENAI_API_KEY".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Resolves the API key from the environment. A missing key is allowed;
    /// local OpenAI-compatible servers often need none.
    pub fn to_llm_config(&self) -> LlmEngineConfig {
        let config = LlmEngineConfig::new(self.model.clone()).with_base_url(self.api_url.clone());
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => config.with_api_key(key),
            _ => config,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DayWiseConfig {
    pub store: StoreConfig,
    pub engine: EngineConfig,
}

impl DayWiseConfig {
    /// Returns `<config_dir>/daywise/config.toml`.
    pub fn default_path() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("daywise");
        p.push("config.toml");
        p
    }

    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| PlannerError::Config(e.to_string()))
    }

    /// Loads `path` if given, else the default location. Only an explicit
    /// path is required to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let p = Self::default_path();
                if p.exists() {
                    Self::from_file(&p)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// The local tasks file; also anchors the `device_id` file.
    pub fn db_path(&self) -> PathBuf {
        self.store.path.clone().unwrap_or_else(default_db_path)
    }

    pub fn device_path(&self) -> PathBuf {
        device_path(&self.db_path())
    }

    /// Builds the configured task store.
    ///
    /// With `create_device` the remote store gets a device identifier,
    /// generating one on first use. Without it, only an existing identifier
    /// is loaded, which is enough for listing.
    pub fn open_store(&self, create_device: bool) -> Result<Box<dyn TaskStore>> {
        match self.store.backend {
            StoreBackend::Local => Ok(Box::new(LocalTaskStore::new(self.db_path()))),
            StoreBackend::Remote => {
                let endpoint = self
                    .store
                    .endpoint
                    .clone()
                    .filter(|e| !e.trim().is_empty())
                    .ok_or_else(|| {
                        PlannerError::Config("store.endpoint is required for the remote backend".into())
                    })?;
                let device_path = self.device_path();
                let device = if create_device {
                    Some(DeviceId::load_or_create(&device_path)?)
                } else {
                    DeviceId::load(&device_path)?
                };
                Ok(Box::new(RemoteTaskStore::new(endpoint, device)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_uses_defaults() {
        let cfg: DayWiseConfig = toml::from_str(
            r#"
            [store]
            backend = "remote"
            endpoint = "https://example.test/api.php"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.store.backend, StoreBackend::Remote);
        assert_eq!(cfg.engine.model, DEFAULT_MODEL);
        assert_eq!(cfg.engine.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn remote_without_endpoint_is_a_config_error() {
        let mut cfg = DayWiseConfig::default();
        cfg.store.backend = StoreBackend::Remote;
        assert!(matches!(cfg.open_store(false), Err(PlannerError::Config(_))));
    }

    #[test]
    fn load_from_file_with_store_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let db = dir.path().join("tasks.json");
        std::fs::write(&path, format!("[store]\npath = {:?}\n", db.display().to_string())).unwrap();

        let loaded = DayWiseConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.store.path.as_deref(), Some(db.as_path()));
        assert_eq!(loaded.device_path(), dir.path().join("device_id"));
    }
}
