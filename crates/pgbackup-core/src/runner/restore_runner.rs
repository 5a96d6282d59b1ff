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

//! Materializes a Backup's artifact into a PostgreSQL target.

use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{tail, tempfile_guard::ScopedTempFile, ERROR_MESSAGE_LIMIT, SUBPROCESS_TIMEOUT};
use crate::dal::DAL;
use crate::error::RunnerError;
use crate::models::{BackupStatus, NewRestoreJob, RestoreJob, RestoreTargetOverride, TargetRef};
use crate::notify::Notifier;
use crate::storage::{ArtifactStore, S3ArtifactStore};
use crate::version::{is_compatible, locate_tool, DumpFormat, VersionManager};

/// Resolves the `StorageConfig` of the Backup's owning `DatabaseConfig` at
/// restore time rather than holding a fixed store (spec.md §3).
pub struct RestoreRunner {
    dal: DAL,
    version_manager: Arc<VersionManager>,
}

impl RestoreRunner {
    pub fn new(dal: DAL, version_manager: Arc<VersionManager>) -> Self {
        Self { dal, version_manager }
    }

    /// `Run(backupID, overrides?)` — spec.md §4.3.
    pub async fn run(
        &self,
        backup_id: Uuid,
        overrides: RestoreTargetOverride,
        notifier: &dyn Notifier,
    ) -> Result<RestoreJob, RunnerError> {
        let backup = self
            .dal
            .backups()
            .get(backup_id)
            .await
            .map_err(|_| RunnerError::BackupNotFound(backup_id))?;

        if backup.status() != BackupStatus::Success {
            return Err(RunnerError::BackupNotRestorable(backup_id));
        }

        let cfg = self
            .dal
            .database_configs()
            .get(backup.database_id)
            .await?;
        let storage_cfg = self.dal.storage_configs().get(cfg.storage_ref).await?;

        let target = merge_target(&cfg.target(), &overrides);

        // Resolve the version-matched client binary for the restore target,
        // falling back to PATH resolution on detection failure the same way
        // BackupRunner's phase 4 does (spec.md §4.3/§4.4).
        let target_major = self
            .version_manager
            .detect_major(&target, None, None)
            .await
            .ok();

        if let (Some(source_major), Some(target_major)) = (cfg.pinned_major(), target_major) {
            if !is_compatible(source_major, target_major) {
                warn!(
                    database = %cfg.name,
                    source_major,
                    target_major,
                    "restore: dump major may not be compatible with target server major, proceeding anyway"
                );
            }
        }

        let job = self
            .dal
            .restore_jobs()
            .create(NewRestoreJob::pending_for(backup_id, overrides))
            .await?;
        let job = self.dal.restore_jobs().mark_running(job.id).await?;

        let storage_path = backup
            .storage_path
            .clone()
            .ok_or_else(|| RunnerError::Restore("backup has no storage_path".to_string()))?;

        // Object key suffix wins over any recorded format (spec.md §4.3 edge case).
        let format = DumpFormat::from_object_key(&storage_path)
            .ok_or_else(|| RunnerError::Restore(format!("unrecognized object key suffix: {storage_path}")))?;

        match self
            .execute(&storage_cfg, &storage_path, format, &target, target_major)
            .await
        {
            Ok(()) => {
                let job = self.dal.restore_jobs().mark_success(job.id).await?;
                notifier
                    .send_restore_success(&cfg.name, &target.dbname)
                    .await;
                info!(restore_job = %job.id, backup = %backup_id, "restore succeeded");
                Ok(job)
            }
            Err(reason) => {
                let reason = tail(&reason, ERROR_MESSAGE_LIMIT);
                let job = self
                    .dal
                    .restore_jobs()
                    .mark_failed(job.id, reason.clone())
                    .await?;
                error!(restore_job = %job.id, backup = %backup_id, %reason, "restore failed");
                Ok(job)
            }
        }
    }

    async fn execute(
        &self,
        storage_cfg: &crate::models::StorageConfig,
        storage_path: &str,
        format: DumpFormat,
        target: &TargetRef,
        target_major: Option<u32>,
    ) -> Result<(), String> {
        let temp_file = ScopedTempFile::new("restore", format.file_extension())
            .map_err(|e| format!("download: failed to allocate temp file: {e}"))?;

        let store = S3ArtifactStore::new(storage_cfg).await;
        store
            .get(storage_path, temp_file.path())
            .await
            .map_err(|e| format!("download: {e}"))?;

        match format {
            DumpFormat::Plain => self.run_psql(target, temp_file.path(), target_major).await,
            DumpFormat::Custom => self.run_pg_restore(target, temp_file.path(), target_major).await,
        }
    }

    async fn run_psql(
        &self,
        target: &TargetRef,
        dump_path: &std::path::Path,
        major: Option<u32>,
    ) -> Result<(), String> {
        let psql = locate_tool("psql", major);
        let mut command = Command::new(&psql);
        command
            .arg("--host")
            .arg(&target.host)
            .arg("--port")
            .arg(target.port.to_string())
            .arg("--username")
            .arg(&target.user)
            .arg("--dbname")
            .arg(&target.dbname)
            .arg("--no-password")
            .arg("--file")
            .arg(dump_path)
            .env("PGPASSWORD", &target.secret)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        run_with_deadline(command).await
    }

    async fn run_pg_restore(
        &self,
        target: &TargetRef,
        dump_path: &std::path::Path,
        major: Option<u32>,
    ) -> Result<(), String> {
        let pg_restore = locate_tool("pg_restore", major);
        let mut command = Command::new(&pg_restore);
        command
            .arg("--host")
            .arg(&target.host)
            .arg("--port")
            .arg(target.port.to_string())
            .arg("--username")
            .arg(&target.user)
            .arg("--dbname")
            .arg(&target.dbname)
            .arg("--no-password")
            .arg("--verbose")
            .arg(dump_path)
            .env("PGPASSWORD", &target.secret)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        run_with_deadline(command).await
    }
}

async fn run_with_deadline(mut command: Command) -> Result<(), String> {
    let child = command.spawn().map_err(|e| format!("failed to spawn restore process: {e}"))?;
    let output = timeout(SUBPROCESS_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| format!("deadline exceeded after {SUBPROCESS_TIMEOUT:?}"))?
        .map_err(|e| format!("restore process wait failed: {e}"))?;

    if !output.status.success() {
        return Err(tail(&String::from_utf8_lossy(&output.stderr), ERROR_MESSAGE_LIMIT));
    }
    Ok(())
}

/// Overrides win field-by-field; unspecified fields inherit from the
/// originating `DatabaseConfig` (spec.md §4.3).
fn merge_target(base: &TargetRef, overrides: &RestoreTargetOverride) -> TargetRef {
    TargetRef {
        host: overrides.host.clone().unwrap_or_else(|| base.host.clone()),
        port: overrides.port.unwrap_or(base.port),
        dbname: overrides.dbname.clone().unwrap_or_else(|| base.dbname.clone()),
        user: overrides.user.clone().unwrap_or_else(|| base.user.clone()),
        secret: overrides.secret.clone().unwrap_or_else(|| base.secret.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> TargetRef {
        TargetRef {
            host: "orig-host".into(),
            port: 5432,
            dbname: "orig-db".into(),
            user: "orig-user".into(),
            secret: "orig-secret".into(),
        }
    }

    #[test]
    fn empty_overrides_inherit_everything() {
        let merged = merge_target(&base(), &RestoreTargetOverride::default());
        assert_eq!(merged.host, "orig-host");
        assert_eq!(merged.dbname, "orig-db");
    }

    #[test]
    fn partial_override_only_changes_named_fields() {
        let overrides = RestoreTargetOverride {
            dbname: Some("restored-db".into()),
            ..Default::default()
        };
        let merged = merge_target(&base(), &overrides);
        assert_eq!(merged.dbname, "restored-db");
        assert_eq!(merged.host, "orig-host");
        assert_eq!(merged.user, "orig-user");
    }
}
