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

//! A request to replay a `Backup` onto a PostgreSQL target.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::schema::restore_jobs;
use crate::models::backup::BackupStatus;

/// Optional override of the destination a restore is replayed onto; any
/// field left `None` falls back to the backup's originating `DatabaseConfig`
/// (spec.md §4.3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreTargetOverride {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = restore_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RestoreJob {
    pub id: Uuid,
    pub backup_id: Uuid,
    pub target_host: Option<String>,
    pub target_port: Option<i32>,
    pub target_dbname: Option<String>,
    pub target_user: Option<String>,
    pub target_secret: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RestoreJob {
    pub fn status(&self) -> BackupStatus {
        BackupStatus::parse(&self.status).unwrap_or(BackupStatus::Failed)
    }

    pub fn target_override(&self) -> RestoreTargetOverride {
        RestoreTargetOverride {
            host: self.target_host.clone(),
            port: self.target_port.map(|p| p as u16),
            dbname: self.target_dbname.clone(),
            user: self.target_user.clone(),
            secret: self.target_secret.clone(),
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = restore_jobs)]
pub struct NewRestoreJob {
    pub backup_id: Uuid,
    pub target_host: Option<String>,
    pub target_port: Option<i32>,
    pub target_dbname: Option<String>,
    pub target_user: Option<String>,
    pub target_secret: Option<String>,
    pub status: String,
}

impl NewRestoreJob {
    pub fn pending_for(backup_id: Uuid, target: RestoreTargetOverride) -> Self {
        Self {
            backup_id,
            target_host: target.host,
            target_port: target.port.map(|p| p as i32),
            target_dbname: target.dbname,
            target_user: target.user,
            target_secret: target.secret,
            status: BackupStatus::Pending.as_str().to_string(),
        }
    }
}
