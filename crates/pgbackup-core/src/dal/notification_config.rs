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

//! Data access layer for `NotificationConfig` records.

use diesel::prelude::*;
use uuid::Uuid;

use super::DAL;
use crate::database::schema::notification_configs;
use crate::error::RepositoryError;
use crate::models::{NewNotificationConfig, NotificationConfig};

pub struct NotificationConfigDAL<'a> {
    pub dal: &'a DAL,
}

impl<'a> NotificationConfigDAL<'a> {
    pub async fn create(
        &self,
        new_config: NewNotificationConfig,
    ) -> Result<NotificationConfig, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| {
            diesel::insert_into(notification_configs::table)
                .values(&new_config)
                .get_result(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(RepositoryError::Database)
    }

    pub async fn get(&self, id: Uuid) -> Result<NotificationConfig, RepositoryError> {
        let conn = self.dal.database.get().await?;
        conn.interact(move |conn| {
            notification_configs::table
                .filter(notification_configs::id.eq(id))
                .first(conn)
        })
        .await
        .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
        .map_err(|e| match e {
            diesel::result::Error::NotFound => RepositoryError::NotFound(id.to_string()),
            other => RepositoryError::Database(other),
        })
    }
}
