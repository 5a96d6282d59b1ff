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

//! Executes exactly one backup end-to-end and finalizes its record.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use chrono::Utc;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{tail, tempfile_guard::ScopedTempFile, SUBPROCESS_TIMEOUT, ERROR_MESSAGE_LIMIT};
use crate::dal::DAL;
use crate::models::{Backup, DatabaseConfig, NewBackup};
use crate::notify::Notifier;
use crate::retention::RetentionEnforcer;
use crate::storage::{ArtifactStore, S3ArtifactStore};
use crate::version::{dump_format_for, locate_tool, DumpFormat, VersionManager};

/// Each `DatabaseConfig` names its own `storage_ref`, so the store used for
/// an upload is resolved per-run (phase 3) rather than fixed at
/// construction — a multi-tenant deployment may have configs pointing at
/// different buckets or even different providers.
pub struct BackupRunner {
    dal: DAL,
    version_manager: Arc<VersionManager>,
}

impl BackupRunner {
    pub fn new(dal: DAL, version_manager: Arc<VersionManager>) -> Self {
        Self { dal, version_manager }
    }

    /// `Run(cfg, backupID?)` — spec.md §4.2. If `backup_id` is given
    /// (manual-trigger path), the already-created `pending` record is
    /// reused; otherwise one is created here.
    ///
    /// Phases 3-10 run inside a spawned task so a panic there is caught by
    /// its `JoinHandle` rather than unwinding into the caller — the record
    /// has already passed phase 2 by that point, so the invariant "every
    /// `Run` that reaches phase 2 terminates in a terminal state, even on
    /// panic" still holds (spec.md §4.2).
    pub async fn run(self: &Arc<Self>, cfg: &DatabaseConfig, backup_id: Option<Uuid>, notifier: Arc<dyn Notifier>) {
        // Phase 1: acquire record.
        let backup = match self.acquire_record(cfg, backup_id).await {
            Ok(b) => b,
            Err(e) => {
                error!(database = %cfg.name, error = %e, "backup: failed to acquire record");
                return;
            }
        };

        // Phase 2: transition to running. Advisory only — not a lock.
        let backup = match self.dal.backups().mark_running(backup.id).await {
            Ok(b) => b,
            Err(e) => {
                error!(backup = %backup.id, error = %e, "backup: failed to mark running");
                return;
            }
        };

        let runner = Arc::clone(self);
        let cfg_for_spawn = cfg.clone();
        let notifier_for_spawn = Arc::clone(&notifier);
        let backup_for_spawn = backup.clone();
        let handle = tokio::spawn(async move {
            runner
                .execute(&cfg_for_spawn, &backup_for_spawn, notifier_for_spawn.as_ref())
                .await
        });

        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => self.fail(&backup, cfg, &reason, notifier.as_ref()).await,
            Err(join_err) if join_err.is_panic() => {
                self.fail(&backup, cfg, &format!("panic: {join_err}"), notifier.as_ref())
                    .await
            }
            Err(join_err) => {
                error!(backup = %backup.id, error = %join_err, "backup: worker task did not complete");
            }
        }
    }

    async fn acquire_record(
        &self,
        cfg: &DatabaseConfig,
        backup_id: Option<Uuid>,
    ) -> Result<Backup, crate::error::RepositoryError> {
        match backup_id {
            Some(id) => self.dal.backups().get(id).await,
            None => self.dal.backups().create(NewBackup::pending_for(cfg.id)).await,
        }
    }

    /// Phases 3-10. Returns `Ok(())` once the record has been finalized as
    /// `success`; returns `Err(reason)` to route through `fail()`.
    async fn execute(
        &self,
        cfg: &DatabaseConfig,
        backup: &Backup,
        notifier: &dyn Notifier,
    ) -> Result<(), String> {
        // Phase 3: resolve collaborators.
        let storage_cfg = self
            .dal
            .storage_configs()
            .get(cfg.storage_ref)
            .await
            .map_err(|e| format!("resolve: {e}"))?;

        // Phase 4: determine version. Non-fatal on failure.
        let target = cfg.target();
        let major = match self
            .version_manager
            .detect_major(&target, cfg.pinned_major(), cfg.version_last_checked)
            .await
        {
            Ok(major) => {
                if let Err(e) = self
                    .dal
                    .database_configs()
                    .update_version(cfg.id, major.to_string(), Utc::now())
                    .await
                {
                    warn!(database = %cfg.name, error = %e, "backup: failed to persist detected version");
                }
                Some(major)
            }
            Err(e) => {
                warn!(database = %cfg.name, error = %e, "backup: version detection failed, falling back to PATH pg_dump");
                None
            }
        };

        // Phase 5: select artifact encoding.
        let (format, compression) = major.map(dump_format_for).unwrap_or((DumpFormat::Plain, 3));
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{}.{}", cfg.name, timestamp, format.file_extension());
        let object_key = format!("{}/{}", cfg.name, filename);

        // Phase 6: dump.
        let pg_dump = locate_tool("pg_dump", major);
        let temp_file = ScopedTempFile::new("dump", format.file_extension())
            .map_err(|e| format!("dump: failed to allocate temp file: {e}"))?;

        self.run_pg_dump(&pg_dump, &target, format, compression, temp_file.path())
            .await
            .map_err(|e| format!("dump: {e}"))?;

        // Phase 7: upload.
        let size_bytes = tokio::fs::metadata(temp_file.path())
            .await
            .map_err(|e| format!("upload: failed to stat temp file: {e}"))?
            .len();

        let mut metadata = HashMap::new();
        metadata.insert("database".to_string(), cfg.name.clone());
        metadata.insert("timestamp".to_string(), timestamp.to_string());
        metadata.insert("backup-by".to_string(), "postgres-backup-service".to_string());
        metadata.insert(
            "postgres-version".to_string(),
            major.map(|m| m.to_string()).unwrap_or_else(|| "unknown".to_string()),
        );
        metadata.insert("dump-format".to_string(), format.as_pg_dump_arg().to_string());

        let store = S3ArtifactStore::new(&storage_cfg).await;
        store
            .put(&object_key, temp_file.path(), metadata)
            .await
            .map_err(|e| format!("upload: {e}"))?;

        // Phase 8: finalize success. Temp file is removed when `temp_file`
        // drops at the end of this function, on every path.
        let backup = self
            .dal
            .backups()
            .mark_success(backup.id, size_bytes as i64, object_key.clone())
            .await
            .map_err(|e| format!("upload: failed to finalize record: {e}"))?;

        // Phase 9: notify.
        let duration = backup
            .completed_at
            .unwrap_or_else(Utc::now)
            .signed_duration_since(backup.started_at);
        notifier
            .send_success(&cfg.name, size_bytes as i64, &humanize_duration(duration))
            .await;

        // Phase 10: kick retention, skipped for paused configs.
        if !cfg.paused {
            let enforcer = RetentionEnforcer::new(self.dal.clone());
            let cfg = cfg.clone();
            tokio::spawn(async move {
                if let Err(e) = enforcer.enforce(&cfg).await {
                    warn!(database = %cfg.name, error = %e, "retention pass failed");
                }
            });
        }

        Ok(())
    }

    async fn run_pg_dump(
        &self,
        pg_dump: &str,
        target: &crate::models::TargetRef,
        format: DumpFormat,
        compression: u32,
        out_path: &std::path::Path,
    ) -> Result<(), String> {
        // pg_dump's stdout is the dump itself and can run into the
        // gigabytes; it is piped straight into the temp file rather than
        // buffered through this process so memory use stays flat regardless
        // of database size.
        let sink = std::fs::File::create(out_path)
            .map_err(|e| format!("failed to open temp file for pg_dump output: {e}"))?;

        let mut command = Command::new(pg_dump);
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
            .arg(format!("--format={}", format.as_pg_dump_arg()))
            .arg("--verbose")
            .env("PGPASSWORD", &target.secret)
            .stdout(Stdio::from(sink))
            .stderr(Stdio::piped());

        if matches!(format, DumpFormat::Custom) {
            command.arg(format!("--compress={compression}"));
        }

        let child = command.spawn().map_err(|e| format!("failed to spawn pg_dump: {e}"))?;

        let output = timeout(SUBPROCESS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| format!("deadline exceeded after {SUBPROCESS_TIMEOUT:?}"))?
            .map_err(|e| format!("pg_dump wait failed: {e}"))?;

        if !output.status.success() {
            return Err(tail(&String::from_utf8_lossy(&output.stderr), ERROR_MESSAGE_LIMIT));
        }

        Ok(())
    }

    /// `fail(reason)` — spec.md §4.2. Sets `status=failed`, emits a failure
    /// notification, never kicks retention.
    async fn fail(&self, backup: &Backup, cfg: &DatabaseConfig, reason: &str, notifier: &dyn Notifier) {
        let reason = tail(reason, ERROR_MESSAGE_LIMIT);
        match self.dal.backups().mark_failed(backup.id, reason.clone()).await {
            Ok(_) => info!(backup = %backup.id, database = %cfg.name, %reason, "backup failed"),
            Err(e) => error!(backup = %backup.id, error = %e, "backup: failed to record failure"),
        }
        notifier.send_failure(&cfg.name, &reason).await;
    }
}

fn humanize_duration(d: chrono::Duration) -> String {
    let total_seconds = d.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanize_duration_formats_subminute() {
        assert_eq!(humanize_duration(chrono::Duration::seconds(42)), "42s");
    }

    #[test]
    fn humanize_duration_formats_minutes() {
        assert_eq!(humanize_duration(chrono::Duration::seconds(125)), "2m5s");
    }

    #[test]
    fn humanize_duration_formats_hours() {
        assert_eq!(humanize_duration(chrono::Duration::seconds(3725)), "1h2m5s");
    }
}
