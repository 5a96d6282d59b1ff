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

//! Domain models for the backup subsystem.
//!
//! These structs map to the `database_configs`, `storage_configs`,
//! `notification_configs`, `backups`, and `restore_jobs` tables. Each module
//! carries both the `Queryable` record and the `Insertable` "new" struct the
//! Repository uses to create rows.

pub mod backup;
pub mod database_config;
pub mod notification_config;
pub mod restore_job;
pub mod storage_config;

pub use backup::{Backup, BackupStatus, NewBackup};
pub use database_config::{DatabaseConfig, NewDatabaseConfig, RotationPolicy, RotationKind, TargetRef};
pub use notification_config::{NewNotificationConfig, NotificationConfig};
pub use restore_job::{NewRestoreJob, RestoreJob, RestoreTargetOverride};
pub use storage_config::{NewStorageConfig, StorageConfig, StorageProvider};
