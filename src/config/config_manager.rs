// src/config/config_manager.rs

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BIDDER_NAME: &str = "pubmatic";
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9001/translator?source=prebid-server";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid endpoint url '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("bidder name must not be blank")]
    BlankBidderName,
}

/// 适配器配置：交易所地址 + bidder 名称
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub endpoint: String,
    #[serde(default = "default_bidder_name")]
    pub bidder_name: String,
}

fn default_bidder_name() -> String {
    DEFAULT_BIDDER_NAME.to_string()
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            bidder_name: default_bidder_name(),
        }
    }
}

impl AdapterConfig {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(self.endpoint.trim()).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bidder_name.trim().is_empty() {
            return Err(ConfigError::BlankBidderName);
        }
        self.endpoint_url().map(|_| ())
    }
}

/// 配置加载：JSON 文件 + 命令行覆盖
#[derive(Clone, Debug)]
pub struct ConfigManager {
    pub adapter: AdapterConfig,
}

impl ConfigManager {
    pub fn new(adapter: AdapterConfig) -> Self {
        ConfigManager { adapter }
    }

    /// 从 JSON 文件读取配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let adapter: AdapterConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(ConfigManager::new(adapter))
    }

    /// 文件不存在时使用默认配置；命令行参数优先于文件
    pub fn from_args(
        config_file: &str,
        endpoint: Option<String>,
        bidder_name: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut manager = if Path::new(config_file).exists() {
            ConfigManager::load(config_file)?
        } else {
            ConfigManager::new(AdapterConfig::default())
        };

        if let Some(endpoint) = endpoint {
            manager.adapter.endpoint = endpoint;
        }
        if let Some(bidder_name) = bidder_name {
            manager.adapter.bidder_name = bidder_name;
        }

        manager.adapter.validate()?;
        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.json", name, uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_config_file_with_default_bidder_name() {
        let path = temp_config("pubmatic", r#"{"endpoint": "http://hbopenbid.pubmatic.com/translator"}"#);
        let manager = ConfigManager::load(&path).unwrap();
        assert_eq!(manager.adapter.bidder_name, "pubmatic");
        assert_eq!(manager.adapter.endpoint, "http://hbopenbid.pubmatic.com/translator");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn cli_overrides_file_values() {
        let path = temp_config("pubmatic", r#"{"endpoint": "http://a.example/x", "bidder_name": "pm"}"#);
        let manager = ConfigManager::from_args(
            path.to_str().unwrap(),
            Some("http://b.example/y".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(manager.adapter.endpoint, "http://b.example/y");
        assert_eq!(manager.adapter.bidder_name, "pm");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let manager = ConfigManager::from_args("does/not/exist.json", None, None).unwrap();
        assert_eq!(manager.adapter, AdapterConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let path = temp_config("broken", "{not json");
        assert!(matches!(ConfigManager::load(&path), Err(ConfigError::Parse { .. })));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn invalid_endpoint_fails_validation() {
        let config = AdapterConfig {
            endpoint: "invalid_url".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidEndpoint { .. })));

        let config = AdapterConfig {
            bidder_name: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::BlankBidderName)));
    }
}
