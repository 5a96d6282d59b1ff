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

//! Scoped temp-file acquisition. spec.md §9 calls temp-file lifetime "the
//! single most error-prone area in reimplementation" — every dump/restore
//! path gets one file from [`ScopedTempFile::new`] and the `Drop` impl
//! deletes it on every exit path: success, `fail()`, deadline, or panic.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;

pub struct ScopedTempFile {
    _dir: TempDir,
    path: PathBuf,
}

impl ScopedTempFile {
    /// Creates a private scratch directory and returns a path inside it
    /// named `<prefix>-<uuid>.<extension>`; the directory (and therefore
    /// the file) is removed when this value drops.
    pub fn new(prefix: &str, extension: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("pgbackup-").tempdir()?;
        let path = dir.path().join(format!("{prefix}-{}.{extension}", Uuid::new_v4()));
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_path_is_removed_when_guard_drops() {
        let path = {
            let guard = ScopedTempFile::new("dump", "sql").unwrap();
            std::fs::write(guard.path(), b"select 1;").unwrap();
            assert!(guard.path().exists());
            guard.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
