/*
 *  Copyright 2026 pgbackup maintainers
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Service-level configuration: a TOML file, overridable by the
//! `PGBACKUP_CONFIG` environment variable for the file path and by a small
//! set of env vars for secrets that should never sit in a config file
//! checked into source control.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_pool_size")]
    pub database_pool_size: usize,

    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default = "default_shutdown_drain_seconds")]
    pub shutdown_drain_seconds: u64,
}

fn default_pool_size() -> usize {
    10
}

fn default_shutdown_drain_seconds() -> u64 {
    30
}

impl Config {
    /// Loads from `path`, or from `$PGBACKUP_CONFIG`, or from
    /// `./pgbackup.toml` in that order. `DATABASE_URL`, if set in the
    /// environment, overrides whatever the file carries — so a database
    /// credential never needs to be written to disk.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => match env::var("PGBACKUP_CONFIG") {
                Ok(p) => PathBuf::from(p),
                Err(_) => PathBuf::from("pgbackup.toml"),
            },
        };

        let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.display().to_string(),
            source,
        })?;

        let mut config: Config = toml::from_str(&content)?;

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Validation("database_url must not be empty".to_string()));
        }
        if self.database_pool_size == 0 {
            return Err(ConfigError::Validation("database_pool_size must be >= 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_database_url() {
        let cfg = Config {
            database_url: "  ".to_string(),
            database_pool_size: 10,
            log_level: None,
            shutdown_drain_seconds: 30,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_pool_size() {
        let cfg = Config {
            database_url: "postgres://localhost/db".to_string(),
            database_pool_size: 0,
            log_level: None,
            shutdown_drain_seconds: 30,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_well_formed_config() {
        let cfg = Config {
            database_url: "postgres://localhost/db".to_string(),
            database_pool_size: 10,
            log_level: Some("info".to_string()),
            shutdown_drain_seconds: 30,
        };
        assert!(cfg.validate().is_ok());
    }
}
