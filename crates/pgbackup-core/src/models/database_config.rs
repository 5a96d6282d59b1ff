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

//! The backup subject: a PostgreSQL database on a schedule with a rotation
//! policy and a storage destination.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::schema::database_configs;

/// Connection coordinates for a PostgreSQL target, shared shape between
/// `DatabaseConfig` and restore overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRef {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationKind {
    Count,
    Days,
}

impl RotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationKind::Count => "count",
            RotationKind::Days => "days",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "count" => Some(RotationKind::Count),
            "days" => Some(RotationKind::Days),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RotationPolicy {
    pub kind: RotationKind,
    pub value: u32,
}

impl RotationPolicy {
    /// `rotation.value >= 1` per spec.md §3 invariants; `days=0` is
    /// explicitly rejected at validation (spec.md §8 boundary behaviors).
    pub fn validate(&self) -> Result<(), String> {
        if self.value == 0 {
            return Err("rotation.value must be >= 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = database_configs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DatabaseConfig {
    pub id: Uuid,
    pub name: String,
    pub host: String,
    pub port: i32,
    pub dbname: String,
    pub db_user: String,
    pub secret: String,
    pub schedule: String,
    pub storage_ref: Uuid,
    pub notification_ref: Option<Uuid>,
    pub rotation_kind: String,
    pub rotation_value: i32,
    pub postgres_version: String,
    pub version_last_checked: Option<DateTime<Utc>>,
    pub enabled: bool,
    pub paused: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DatabaseConfig {
    pub fn target(&self) -> TargetRef {
        TargetRef {
            host: self.host.clone(),
            port: self.port as u16,
            dbname: self.dbname.clone(),
            user: self.db_user.clone(),
            secret: self.secret.clone(),
        }
    }

    pub fn rotation(&self) -> RotationPolicy {
        RotationPolicy {
            kind: RotationKind::parse(&self.rotation_kind).unwrap_or(RotationKind::Count),
            value: self.rotation_value.max(0) as u32,
        }
    }

    /// A config enters the scheduler iff `enabled && !paused` — spec.md §3.
    pub fn is_schedulable(&self) -> bool {
        self.enabled && !self.paused
    }

    /// `postgres_version` is either `"latest"`, empty (autodetect), or a
    /// numeric major.
    pub fn pinned_major(&self) -> Option<u32> {
        self.postgres_version.trim().parse::<u32>().ok()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = database_configs)]
pub struct NewDatabaseConfig {
    pub name: String,
    pub host: String,
    pub port: i32,
    pub dbname: String,
    pub db_user: String,
    pub secret: String,
    pub schedule: String,
    pub storage_ref: Uuid,
    pub notification_ref: Option<Uuid>,
    pub rotation_kind: String,
    pub rotation_value: i32,
    pub postgres_version: String,
    pub enabled: bool,
    pub paused: bool,
    pub owner_id: Uuid,
}

impl NewDatabaseConfig {
    /// Validates the invariants spec.md §3 lists before a config is ever
    /// persisted: `rotation.value >= 1`, the cron expression parses, and
    /// the port is in range. `storage_ref` resolution is checked by the
    /// Repository at creation time (foreign key), not here.
    pub fn validate(&self) -> Result<(), String> {
        if self.rotation_value < 1 {
            return Err("rotation.value must be >= 1".to_string());
        }
        if !(1..=65535).contains(&self.port) {
            return Err(format!("port {} out of range [1, 65535]", self.port));
        }
        croner::Cron::new(&self.schedule)
            .parse()
            .map_err(|e| format!("invalid cron expression {:?}: {e}", self.schedule))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewDatabaseConfig {
        NewDatabaseConfig {
            name: "prod".into(),
            host: "localhost".into(),
            port: 5432,
            dbname: "app".into(),
            db_user: "postgres".into(),
            secret: "hunter2".into(),
            schedule: "0 2 * * *".into(),
            storage_ref: Uuid::new_v4(),
            notification_ref: None,
            rotation_kind: "count".into(),
            rotation_value: 3,
            postgres_version: String::new(),
            enabled: true,
            paused: false,
            owner_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn rejects_zero_rotation_value() {
        let mut cfg = sample();
        cfg.rotation_value = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_port() {
        let mut cfg = sample();
        cfg.port = 70000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unparseable_schedule() {
        let mut cfg = sample();
        cfg.schedule = "not a cron expression".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_valid_config() {
        assert!(sample().validate().is_ok());
    }
}
