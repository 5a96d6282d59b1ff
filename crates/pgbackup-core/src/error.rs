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

//! Error types for the backup execution and scheduling subsystem.
//!
//! Each layer gets its own error enum so callers can match on cause without
//! downcasting; lower layers are wrapped with `#[from]` as they cross a
//! module boundary.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the Repository (Postgres-backed persistence) layer.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("connection pool error: {0}")]
    ConnectionPool(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("referenced record still in use: {0}")]
    Restricted(String),

    #[error("migration error: {0}")]
    Migration(String),
}

/// Errors surfaced while registering or firing cron jobs.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("invalid cron expression {expression:?}: {source}")]
    InvalidSchedule {
        expression: String,
        #[source]
        source: croner::errors::CronError,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors surfaced while executing a backup or restore.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("backup {0} not found")]
    BackupNotFound(Uuid),

    #[error("backup {0} is not in success state, cannot restore")]
    BackupNotRestorable(Uuid),

    #[error("resolve: {0}")]
    Resolve(String),

    #[error("dump: {0}")]
    Dump(String),

    #[error("restore: {0}")]
    Restore(String),

    #[error("upload: {0}")]
    Upload(String),

    #[error("download: {0}")]
    Download(String),

    #[error("deadline exceeded after {0:?}")]
    Deadline(std::time::Duration),

    #[error("panic: {0}")]
    Panic(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors surfaced by an ArtifactStore implementation.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage transport error: {0}")]
    Transport(String),

    #[error("local filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by VersionManager detection.
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("detection timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("psql probe failed: {0}")]
    Probe(String),

    #[error("could not parse a major version from: {0:?}")]
    Unparseable(String),
}

/// Errors surfaced while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
