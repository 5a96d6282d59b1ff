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

//! Startup reconciliation for records stranded by an unclean shutdown.
//!
//! spec.md §9 notes that the source design has no such reconciliation and
//! leaves crash-orphaned `running` Backups stuck forever; it also calls out
//! that a correct reimplementation should add it. This module is that
//! addition (see DESIGN.md for the open-question resolution).

use chrono::Utc;
use tracing::{info, warn};

use crate::dal::DAL;
use crate::error::RepositoryError;
use crate::runner::SUBPROCESS_TIMEOUT;

/// Scans Backups and RestoreJobs left in `pending`/`running` whose
/// `started_at` predates process start by more than the subprocess
/// deadline, and marks them `failed` with reason "orphaned by service
/// restart".
pub async fn reconcile_stranded_records(dal: &DAL) -> Result<usize, RepositoryError> {
    let cutoff = Utc::now() - chrono::Duration::from_std(SUBPROCESS_TIMEOUT).unwrap();
    let mut reconciled = 0;

    for backup in dal.backups().list_stranded().await? {
        if backup.started_at >= cutoff {
            continue;
        }
        match dal
            .backups()
            .mark_failed(backup.id, "orphaned by service restart".to_string())
            .await
        {
            Ok(_) => {
                reconciled += 1;
                info!(backup = %backup.id, "reconciled stranded backup");
            }
            Err(e) => warn!(backup = %backup.id, error = %e, "failed to reconcile stranded backup"),
        }
    }

    for job in dal.restore_jobs().list_stranded().await? {
        if job.started_at >= cutoff {
            continue;
        }
        match dal
            .restore_jobs()
            .mark_failed(job.id, "orphaned by service restart".to_string())
            .await
        {
            Ok(_) => {
                reconciled += 1;
                info!(restore_job = %job.id, "reconciled stranded restore job");
            }
            Err(e) => warn!(restore_job = %job.id, error = %e, "failed to reconcile stranded restore job"),
        }
    }

    Ok(reconciled)
}
