use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, TodoAppError};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8501;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub data_file: Option<String>,
    pub server: Option<ServerConfig>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| TodoAppError::Config(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| TodoAppError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise starts from an empty config.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn resolve_data_file(&self, override_path: Option<&str>) -> String {
        pick(override_path, self.data_file.as_deref()).unwrap_or_else(default_data_file)
    }

    pub fn resolve_host(&self, override_host: Option<&str>) -> String {
        let configured = self.server.as_ref().and_then(|s| s.host.as_deref());
        pick(override_host, configured).unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    pub fn resolve_port(&self, override_port: Option<u16>) -> u16 {
        override_port
            .or_else(|| self.server.as_ref().and_then(|s| s.port))
            .unwrap_or(DEFAULT_PORT)
    }
}

pub fn default_data_file() -> String {
    "./todos.json".to_string()
}

fn pick(first: Option<&str>, second: Option<&str>) -> Option<String> {
    first
        .into_iter()
        .chain(second)
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
