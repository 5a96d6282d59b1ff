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

//! Object-store binding for a database's backups.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::schema::storage_configs;

/// Which object-store API dialect the endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    S3,
    R2,
}

impl StorageProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageProvider::S3 => "s3",
            StorageProvider::R2 => "r2",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "s3" => Some(StorageProvider::S3),
            "r2" => Some(StorageProvider::R2),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = storage_configs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StorageConfig {
    pub id: Uuid,
    pub provider: String,
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    pub created_at: DateTime<Utc>,
}

impl StorageConfig {
    pub fn provider(&self) -> Option<StorageProvider> {
        StorageProvider::parse(&self.provider)
    }

    /// Path-style addressing is required whenever a custom endpoint is in
    /// play (MinIO, R2) — spec.md §4.6.
    pub fn requires_path_style(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = storage_configs)]
pub struct NewStorageConfig {
    pub provider: String,
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
}
