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

//! Data access layer for `RestoreJob` records.

use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use super::DAL;
use crate::database::schema::restore_jobs;
use crate::error::RepositoryError;
use crate::models::{BackupStatus, NewRestoreJob, RestoreJob};

pub struct RestoreJobDAL<'a> {
    pub dal: &'a DAL,
}

impl<'a> RestoreJobDAL<'a> {
    pub async fn create(&self, new_job: NewRestoreJob) -> Result<RestoreJob, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| {
            diesel::insert_into(restore_jobs::table)
                .values(&new_job)
                .get_result(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)
    }

    pub async fn get(&self, id: Uuid) -> Result<RestoreJob, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| restore_jobs::table.filter(restore_jobs::id.eq(id)).first(conn))
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
            .map_err(|e| match e {
                diesel::result::Error::NotFound => RepositoryError::NotFound(id.to_string()),
                other => RepositoryError::Database(other),
            })
    }

    /// Guarded on the row still being `pending`, mirroring `BackupDAL` —
    /// a record is never promoted backwards out of a later state.
    pub async fn mark_running(&self, id: Uuid) -> Result<RestoreJob, RepositoryError> {
        let conn = self.dal.database.get().await?;
        let updated = conn
            .interact(move |conn| {
                diesel::update(
                    restore_jobs::table
                        .filter(restore_jobs::id.eq(id))
                        .filter(restore_jobs::status.eq(BackupStatus::Pending.as_str())),
                )
                .set((
                    restore_jobs::status.eq(BackupStatus::Running.as_str()),
                    restore_jobs::started_at.eq(Utc::now()),
                ))
                .get_result(conn)
            })
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?;
        self.finish_guarded_transition(id, updated).await
    }

    /// Guarded on the row still being `running` — a terminal row is never
    /// overwritten, even by a second finalization racing in after a panic.
    pub async fn mark_success(&self, id: Uuid) -> Result<RestoreJob, RepositoryError> {
        let conn = self.dal.database.get().await?;
        let updated = conn
            .interact(move |conn| {
                diesel::update(
                    restore_jobs::table
                        .filter(restore_jobs::id.eq(id))
                        .filter(restore_jobs::status.eq(BackupStatus::Running.as_str())),
                )
                .set((
                    restore_jobs::status.eq(BackupStatus::Success.as_str()),
                    restore_jobs::completed_at.eq(Utc::now()),
                ))
                .get_result(conn)
            })
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?;
        self.finish_guarded_transition(id, updated).await
    }

    /// Guarded on the row still being `running`, same terminal-state
    /// protection as `mark_success`.
    pub async fn mark_failed(&self, id: Uuid, error_message: String) -> Result<RestoreJob, RepositoryError> {
        let conn = self.dal.database.get().await?;
        let updated = conn
            .interact(move |conn| {
                diesel::update(
                    restore_jobs::table
                        .filter(restore_jobs::id.eq(id))
                        .filter(restore_jobs::status.eq(BackupStatus::Running.as_str())),
                )
                .set((
                    restore_jobs::status.eq(BackupStatus::Failed.as_str()),
                    restore_jobs::error_message.eq(error_message),
                    restore_jobs::completed_at.eq(Utc::now()),
                ))
                .get_result(conn)
            })
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?;
        self.finish_guarded_transition(id, updated).await
    }

    /// See `BackupDAL::finish_guarded_transition` for the rationale: a
    /// `NotFound` from a status-guarded update means the row had already
    /// left the expected state, not that anything went wrong.
    async fn finish_guarded_transition(
        &self,
        id: Uuid,
        updated: Result<RestoreJob, diesel::result::Error>,
    ) -> Result<RestoreJob, RepositoryError> {
        match updated {
            Ok(job) => Ok(job),
            Err(diesel::result::Error::NotFound) => self.get(id).await,
            Err(other) => Err(RepositoryError::Database(other)),
        }
    }

    pub async fn list_stranded(&self) -> Result<Vec<RestoreJob>, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(|conn| {
            restore_jobs::table
                .filter(
                    restore_jobs::status
                        .eq(BackupStatus::Pending.as_str())
                        .or(restore_jobs::status.eq(BackupStatus::Running.as_str())),
                )
                .load(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)
    }
}
