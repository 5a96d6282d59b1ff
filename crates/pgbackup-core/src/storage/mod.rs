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

//! The ArtifactStore interface: uniform PUT/GET/DELETE/LIST over whatever
//! object-store dialect a `StorageConfig` points at.

pub mod s3;

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageError;

pub use s3::S3ArtifactStore;

/// Uploads are described by a key plus a small set of header-style metadata
/// entries; the concrete encoding of those headers is the implementation's
/// business (object metadata for S3, etc).
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        local_path: &Path,
        metadata: HashMap<String, String>,
    ) -> Result<(), StorageError>;

    async fn get(&self, key: &str, local_path: &Path) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}
