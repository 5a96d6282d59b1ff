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

//! Data access layer: one sub-DAL per entity, each borrowing the shared
//! connection pool through [`DAL`]. Mirrors the Repository interface named
//! in the design document — every read/write the rest of the system needs
//! against Postgres funnels through here.

pub mod backup;
pub mod database_config;
pub mod notification_config;
pub mod restore_job;
pub mod storage_config;

use crate::database::Database;

pub use backup::BackupDAL;
pub use database_config::DatabaseConfigDAL;
pub use notification_config::NotificationConfigDAL;
pub use restore_job::RestoreJobDAL;
pub use storage_config::StorageConfigDAL;

/// Entry point for all persistence. Holds the connection pool and hands out
/// a borrowed sub-DAL per entity, the way the source engine's `DAL` struct
/// hands out `CronScheduleDAL`/`TaskExecutionDAL` borrows.
#[derive(Clone)]
pub struct DAL {
    pub database: Database,
}

impl DAL {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn database_configs(&self) -> DatabaseConfigDAL<'_> {
        DatabaseConfigDAL { dal: self }
    }

    pub fn storage_configs(&self) -> StorageConfigDAL<'_> {
        StorageConfigDAL { dal: self }
    }

    pub fn notification_configs(&self) -> NotificationConfigDAL<'_> {
        NotificationConfigDAL { dal: self }
    }

    pub fn backups(&self) -> BackupDAL<'_> {
        BackupDAL { dal: self }
    }

    pub fn restore_jobs(&self) -> RestoreJobDAL<'_> {
        RestoreJobDAL { dal: self }
    }
}
