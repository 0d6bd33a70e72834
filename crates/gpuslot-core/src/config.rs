//! Configuration types for gpuslot

use crate::gpu::Resource;
use crate::{SlotError, SlotResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// API server configuration
    pub api: ApiConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Provisioned GPU pool
    pub resources: Vec<Resource>,
}

impl DaemonConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> SlotResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> SlotResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the resource pool for duplicate ids and blank names
    pub fn validate(&self) -> SlotResult<()> {
        let mut seen = HashSet::new();
        for resource in &self.resources {
            if !seen.insert(resource.id) {
                return Err(SlotError::Config(format!(
                    "Duplicate resource id: {}",
                    resource.id
                )));
            }
            if resource.name.trim().is_empty() {
                return Err(SlotError::Config(format!(
                    "Resource {} has an empty name",
                    resource.id
                )));
            }
        }
        Ok(())
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to bind the HTTP server
    pub address: String,
    /// Port for the HTTP server
    pub port: u16,
    /// Path prefix all routes are mounted under
    pub prefix: String,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8000,
            prefix: "/api".to_string(),
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive
    pub level: String,
    /// Log output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}
