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

//! Data access layer for `DatabaseConfig` records.

use diesel::prelude::*;
use uuid::Uuid;

use super::DAL;
use crate::database::schema::database_configs;
use crate::error::RepositoryError;
use crate::models::{DatabaseConfig, NewDatabaseConfig};

pub struct DatabaseConfigDAL<'a> {
    pub dal: &'a DAL,
}

impl<'a> DatabaseConfigDAL<'a> {
    pub async fn create(&self, new_config: NewDatabaseConfig) -> Result<DatabaseConfig, RepositoryError> {
        new_config
            .validate()
            .map_err(RepositoryError::Restricted)?;

        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| {
            diesel::insert_into(database_configs::table)
                .values(&new_config)
                .get_result(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)
    }

    pub async fn get(&self, id: Uuid) -> Result<DatabaseConfig, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| {
            database_configs::table
                .filter(database_configs::id.eq(id))
                .first(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(|e| match e {
            diesel::result::Error::NotFound => RepositoryError::NotFound(id.to_string()),
            other => RepositoryError::Database(other),
        })
    }

    /// Every enabled, unpaused config — the set the scheduler loads at
    /// startup and refreshes on each `AddJob`/`UpdateJob`/`RemoveJob` call.
    pub async fn list_schedulable(&self) -> Result<Vec<DatabaseConfig>, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(|conn| {
            database_configs::table
                .filter(database_configs::enabled.eq(true))
                .filter(database_configs::paused.eq(false))
                .load(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)
    }

    pub async fn list(&self) -> Result<Vec<DatabaseConfig>, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(|conn| database_configs::table.load(conn))
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
            .map_err(RepositoryError::Database)
    }

    pub async fn update_version(
        &self,
        id: Uuid,
        version: String,
        checked_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| {
            diesel::update(database_configs::table.filter(database_configs::id.eq(id)))
                .set((
                    database_configs::postgres_version.eq(version),
                    database_configs::version_last_checked.eq(checked_at),
                    database_configs::updated_at.eq(chrono::Utc::now()),
                ))
                .execute(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)?;
        Ok(())
    }

    pub async fn set_paused(&self, id: Uuid, paused: bool) -> Result<(), RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| {
            diesel::update(database_configs::table.filter(database_configs::id.eq(id)))
                .set((
                    database_configs::paused.eq(paused),
                    database_configs::updated_at.eq(chrono::Utc::now()),
                ))
                .execute(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let conn = self.dal.database.get().await?;
        let rows = conn
            .interact(move |conn| {
                diesel::delete(database_configs::table.filter(database_configs::id.eq(id)))
                    .execute(conn)
            })
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
            .map_err(RepositoryError::Database)?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
