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

//! Data access layer for `Backup` records.

use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use super::DAL;
use crate::database::schema::backups;
use crate::error::RepositoryError;
use crate::models::{Backup, BackupStatus, NewBackup};

pub struct BackupDAL<'a> {
    pub dal: &'a DAL,
}

impl<'a> BackupDAL<'a> {
    pub async fn create(&self, new_backup: NewBackup) -> Result<Backup, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| {
            diesel::insert_into(backups::table)
                .values(&new_backup)
                .get_result(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)
    }

    pub async fn get(&self, id: Uuid) -> Result<Backup, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| backups::table.filter(backups::id.eq(id)).first(conn))
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
            .map_err(|e| match e {
                diesel::result::Error::NotFound => RepositoryError::NotFound(id.to_string()),
                other => RepositoryError::Database(other),
            })
    }

    /// Transitions `pending -> running`, stamping `started_at`. Guarded on
    /// the row still being `pending` so a row that has already moved on
    /// (e.g. reconciled by a second worker) is left alone rather than
    /// overwritten — a record is never promoted backwards out of a later
    /// state (spec.md §4.2).
    pub async fn mark_running(&self, id: Uuid) -> Result<Backup, RepositoryError> {
        let conn = self.dal.database.get().await?;
        let updated = conn
            .interact(move |conn| {
                diesel::update(
                    backups::table
                        .filter(backups::id.eq(id))
                        .filter(backups::status.eq(BackupStatus::Pending.as_str())),
                )
                .set((
                    backups::status.eq(BackupStatus::Running.as_str()),
                    backups::started_at.eq(Utc::now()),
                ))
                .get_result(conn)
            })
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?;
        self.finish_guarded_transition(id, updated).await
    }

    /// Transitions `running -> success`. A row no longer `running` (already
    /// `success` or `failed`) is a terminal state and is never overwritten —
    /// spec.md §4.2 and the testable invariant that a record is never
    /// promoted from a terminal state.
    pub async fn mark_success(
        &self,
        id: Uuid,
        size_bytes: i64,
        storage_path: String,
    ) -> Result<Backup, RepositoryError> {
        let conn = self.dal.database.get().await?;
        let updated = conn
            .interact(move |conn| {
                diesel::update(
                    backups::table
                        .filter(backups::id.eq(id))
                        .filter(backups::status.eq(BackupStatus::Running.as_str())),
                )
                .set((
                    backups::status.eq(BackupStatus::Success.as_str()),
                    backups::size_bytes.eq(size_bytes),
                    backups::storage_path.eq(storage_path),
                    backups::completed_at.eq(Utc::now()),
                ))
                .get_result(conn)
            })
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?;
        self.finish_guarded_transition(id, updated).await
    }

    /// Transitions `running -> failed`. Same terminal-state guard as
    /// `mark_success` — a panic in the success path that races a prior
    /// `mark_success` must not demote the row back to `failed`.
    pub async fn mark_failed(&self, id: Uuid, error_message: String) -> Result<Backup, RepositoryError> {
        let conn = self.dal.database.get().await?;
        let updated = conn
            .interact(move |conn| {
                diesel::update(
                    backups::table
                        .filter(backups::id.eq(id))
                        .filter(backups::status.eq(BackupStatus::Running.as_str())),
                )
                .set((
                    backups::status.eq(BackupStatus::Failed.as_str()),
                    backups::error_message.eq(error_message),
                    backups::completed_at.eq(Utc::now()),
                ))
                .get_result(conn)
            })
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?;
        self.finish_guarded_transition(id, updated).await
    }

    /// Resolves the result of a status-guarded `UPDATE`: on a real row the
    /// update proceeded normally; on `NotFound` the guard filter excluded
    /// the row because it had already left the expected state, so this
    /// re-fetches and returns the row as-is rather than treating a no-op as
    /// an error.
    async fn finish_guarded_transition(
        &self,
        id: Uuid,
        updated: Result<Backup, diesel::result::Error>,
    ) -> Result<Backup, RepositoryError> {
        match updated {
            Ok(backup) => Ok(backup),
            Err(diesel::result::Error::NotFound) => self.get(id).await,
            Err(other) => Err(RepositoryError::Database(other)),
        }
    }

    /// All backups for a database, newest first — the ordering
    /// `RetentionEnforcer` relies on (spec.md §4.5).
    pub async fn list_by_database(&self, database_id: Uuid) -> Result<Vec<Backup>, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| {
            backups::table
                .filter(backups::database_id.eq(database_id))
                .order(backups::started_at.desc())
                .load(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)
    }

    pub async fn list_by_database_and_status(
        &self,
        database_id: Uuid,
        status: BackupStatus,
    ) -> Result<Vec<Backup>, RepositoryError> {
        let conn = self.dal.database.get().await?;
        let status = status.as_str();
        conn.interact(move |conn| {
            backups::table
                .filter(backups::database_id.eq(database_id))
                .filter(backups::status.eq(status))
                .order(backups::started_at.desc())
                .load(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)
    }

    /// Backups still `pending` or `running` — used at startup to reconcile
    /// rows stranded by an unclean shutdown (spec.md §9 open question,
    /// resolved in DESIGN.md).
    pub async fn list_stranded(&self) -> Result<Vec<Backup>, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(|conn| {
            backups::table
                .filter(
                    backups::status
                        .eq(BackupStatus::Pending.as_str())
                        .or(backups::status.eq(BackupStatus::Running.as_str())),
                )
                .load(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let conn = self.dal.database.get().await?;
        let rows = conn
            .interact(move |conn| diesel::delete(backups::table.filter(backups::id.eq(id))).execute(conn))
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
            .map_err(RepositoryError::Database)?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
