//! Engine configuration: the manager/worker JSON schema from the on-disk
//! layout spec, loaded with `serde_json`.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default root directory for on-disk stores.
pub const DEFAULT_DB_PATH: &str = "db/";

/// Default path to the engine's configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "configs/config.json";

/// `manager` block: address the workers would register with in a
/// distributed deployment. Parsed so configs round-trip; unused by the
/// single-process engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagerConfig {
    #[serde(default = "default_manager_ip")]
    pub ip: String,
    #[serde(default = "default_manager_port")]
    pub port: u16,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            ip: default_manager_ip(),
            port: default_manager_port(),
        }
    }
}

fn default_manager_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_manager_port() -> u16 {
    7070
}

/// Which of the five store kinds are enabled for a worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreFlags {
    #[serde(default = "default_true")]
    pub node: bool,
    #[serde(default = "default_true")]
    pub relationship: bool,
    #[serde(default = "default_true")]
    pub label: bool,
    #[serde(default = "default_true")]
    pub property: bool,
    #[serde(default = "default_true")]
    pub dynamic: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StoreFlags {
    fn default() -> Self {
        Self {
            node: true,
            relationship: true,
            label: true,
            property: true,
            dynamic: true,
        }
    }
}

/// One worker entry: its port, which stores it runs, and (if replication is
/// configured) how many replicas it keeps. The single-process engine reads
/// only `stores` and ignores `replicas` — see `DESIGN.md` on replication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerConfig {
    pub port: u16,
    #[serde(default)]
    pub stores: StoreFlags,
    #[serde(default)]
    pub replicas: u32,
}

/// Top-level engine configuration, loaded from `configs/config.json` by
/// default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub manager: ManagerConfig,
    #[serde(default = "default_workers")]
    pub workers: Vec<WorkerConfig>,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_workers() -> Vec<WorkerConfig> {
    vec![WorkerConfig {
        port: 7071,
        stores: StoreFlags::default(),
        replicas: 0,
    }]
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            manager: ManagerConfig::default(),
            workers: default_workers(),
            db_path: default_db_path(),
        }
    }
}

impl EngineConfig {
    /// Load and parse a config file from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// The conventional config file location, `configs/config.json`.
    pub fn default_config_path() -> String {
        DEFAULT_CONFIG_PATH.to_string()
    }

    /// The first worker's store-enable flags; the single-process engine
    /// only ever drives one worker instance.
    pub fn primary_stores(&self) -> StoreFlags {
        self.workers
            .first()
            .map(|w| w.stores)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = EngineConfig::default();
        assert_eq!(config.db_path, "db/");
        assert_eq!(config.manager.port, 7070);
        assert_eq!(config.workers.len(), 1);
        assert_eq!(config.workers[0].port, 7071);
        assert!(config.primary_stores().node);
    }

    #[test]
    fn parses_full_schema() {
        let json = r#"
        {
          "manager": { "ip": "10.0.0.1", "port": 9000 },
          "workers": [
            { "port": 7071, "stores": { "node": true, "relationship": true,
                                          "label": true, "property": false,
                                          "dynamic": true } }
          ],
          "db_path": "mydb/"
        }
        "#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.manager.ip, "10.0.0.1");
        assert_eq!(config.manager.port, 9000);
        assert_eq!(config.db_path, "mydb/");
        assert!(!config.primary_stores().property);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{ "db_path": "x/", "totally_unknown_field": 42 }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.db_path, "x/");
    }

    #[test]
    fn empty_object_uses_all_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
