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

//! Data access layer for `StorageConfig` records.

use diesel::prelude::*;
use uuid::Uuid;

use super::DAL;
use crate::database::schema::{database_configs, storage_configs};
use crate::error::RepositoryError;
use crate::models::{NewStorageConfig, StorageConfig};

pub struct StorageConfigDAL<'a> {
    pub dal: &'a DAL,
}

impl<'a> StorageConfigDAL<'a> {
    pub async fn create(&self, new_config: NewStorageConfig) -> Result<StorageConfig, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| {
            diesel::insert_into(storage_configs::table)
                .values(&new_config)
                .get_result(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)
    }

    pub async fn get(&self, id: Uuid) -> Result<StorageConfig, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| {
            storage_configs::table
                .filter(storage_configs::id.eq(id))
                .first(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(|e| match e {
            diesel::result::Error::NotFound => RepositoryError::NotFound(id.to_string()),
            other => RepositoryError::Database(other),
        })
    }

    /// Refuses deletion while a `DatabaseConfig` still points at this
    /// storage config — spec.md §3 "referenced records cannot be deleted".
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let conn = self.dal.database.get().await?;
        let in_use = conn
            .interact(move |conn| {
                database_configs::table
                    .filter(database_configs::storage_ref.eq(id))
                    .count()
                    .get_result::<i64>(conn)
            })
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
            .map_err(RepositoryError::Database)?;

        if in_use > 0 {
            return Err(RepositoryError::Restricted(format!(
                "storage config {id} is referenced by {in_use} database config(s)"
            )));
        }

        let rows = conn
            .interact(move |conn| {
                diesel::delete(storage_configs::table.filter(storage_configs::id.eq(id))).execute(conn)
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
