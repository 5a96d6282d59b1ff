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

//! Enforces per-config rotation: deletes surplus successful Backups from
//! storage and the record store.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::dal::DAL;
use crate::error::RepositoryError;
use crate::models::{Backup, DatabaseConfig, RotationKind, RotationPolicy};
use crate::storage::{ArtifactStore, S3ArtifactStore};

/// Resolves its own `StorageConfig` from the `DatabaseConfig` it is given,
/// same as `BackupRunner` — different configs may point at different
/// buckets or providers (spec.md §3).
pub struct RetentionEnforcer {
    dal: DAL,
}

impl RetentionEnforcer {
    pub fn new(dal: DAL) -> Self {
        Self { dal }
    }

    /// `Enforce(cfg)` — spec.md §4.5. Never touches `running` or `failed`
    /// Backups; ordering by `started_at` descending preserves the newest
    /// artifacts.
    pub async fn enforce(&self, cfg: &DatabaseConfig) -> Result<(), RepositoryError> {
        if cfg.paused {
            return Ok(());
        }

        let successes = self
            .dal
            .backups()
            .list_by_database_and_status(cfg.id, crate::models::BackupStatus::Success)
            .await?;

        let victims = compute_deletion_set(&successes, cfg.rotation(), Utc::now());
        if victims.is_empty() {
            return Ok(());
        }

        info!(
            database = %cfg.name,
            count = victims.len(),
            "retention removing surplus backups"
        );

        let storage_cfg = self.dal.storage_configs().get(cfg.storage_ref).await?;
        let store = S3ArtifactStore::new(&storage_cfg).await;

        for victim in victims {
            if let Some(storage_path) = &victim.storage_path {
                if let Err(e) = store.delete(storage_path).await {
                    warn!(backup = %victim.id, error = %e, "retention: failed to delete artifact, continuing");
                }
            }
            if let Err(e) = self.dal.backups().delete(victim.id).await {
                warn!(backup = %victim.id, error = %e, "retention: failed to delete record");
            }
        }

        Ok(())
    }
}

/// Pure policy computation, split out so the boundary behaviors in spec.md
/// §8 are directly testable without a database.
fn compute_deletion_set(
    successes_desc: &[Backup],
    rotation: RotationPolicy,
    now: DateTime<Utc>,
) -> Vec<Backup> {
    match rotation.kind {
        RotationKind::Count => successes_desc
            .iter()
            .skip(rotation.value as usize)
            .cloned()
            .collect(),
        RotationKind::Days => {
            let cutoff = now - chrono::Duration::days(rotation.value as i64);
            successes_desc
                .iter()
                .filter(|b| b.started_at < cutoff)
                .cloned()
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn backup_at(started_at: DateTime<Utc>) -> Backup {
        Backup {
            id: Uuid::new_v4(),
            name: "test".into(),
            database_id: Uuid::new_v4(),
            status: "success".into(),
            size_bytes: Some(100),
            storage_path: Some("db/db_x.dump".into()),
            error_message: None,
            started_at,
            completed_at: Some(started_at),
            created_at: started_at,
        }
    }

    #[test]
    fn count_policy_keeps_only_newest_k() {
        let now = Utc::now();
        let backups = vec![
            backup_at(now),
            backup_at(now - chrono::Duration::days(1)),
            backup_at(now - chrono::Duration::days(2)),
            backup_at(now - chrono::Duration::days(3)),
        ];
        let rotation = RotationPolicy {
            kind: RotationKind::Count,
            value: 2,
        };
        let victims = compute_deletion_set(&backups, rotation, now);
        assert_eq!(victims.len(), 2);
    }

    #[test]
    fn count_one_always_leaves_exactly_one() {
        let now = Utc::now();
        let backups = vec![backup_at(now), backup_at(now - chrono::Duration::days(1))];
        let rotation = RotationPolicy {
            kind: RotationKind::Count,
            value: 1,
        };
        let victims = compute_deletion_set(&backups, rotation, now);
        assert_eq!(backups.len() - victims.len(), 1);
    }

    #[test]
    fn days_policy_deletes_older_than_cutoff() {
        let now = Utc::now();
        let backups = vec![
            backup_at(now - chrono::Duration::days(8)),
            backup_at(now - chrono::Duration::days(6)),
        ];
        let rotation = RotationPolicy {
            kind: RotationKind::Days,
            value: 7,
        };
        let victims = compute_deletion_set(&backups, rotation, now);
        assert_eq!(victims.len(), 1);
        assert!(victims[0].started_at < now - chrono::Duration::days(7));
    }

    #[test]
    fn days_zero_would_delete_everything_but_is_rejected_at_validation() {
        // days=0 is rejected at DatabaseConfig validation time (spec.md §8);
        // this only documents what the pure function would otherwise do.
        let now = Utc::now();
        let backups = vec![backup_at(now - chrono::Duration::seconds(1))];
        let rotation = RotationPolicy {
            kind: RotationKind::Days,
            value: 0,
        };
        let victims = compute_deletion_set(&backups, rotation, now);
        assert_eq!(victims.len(), 1);
    }
}
