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

pub mod backup_runner;
pub mod restore_runner;
mod tempfile_guard;

pub use backup_runner::BackupRunner;
pub use restore_runner::RestoreRunner;

use std::time::Duration;

/// Hard subprocess timeout applied to dump and restore invocations —
/// spec.md §4.2/§4.3.
pub(crate) const SUBPROCESS_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// `stderr` captured from a failed subprocess is truncated to this many
/// bytes before it is stored as `error_message` (spec.md §7: "terse ...
/// ≤ ~1 KB, stderr-tail").
pub(crate) const ERROR_MESSAGE_LIMIT: usize = 1024;

pub(crate) fn tail(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        s.trim().to_string()
    } else {
        let start = s.len() - limit;
        // avoid splitting a multi-byte UTF-8 char
        let start = (start..s.len()).find(|&i| s.is_char_boundary(i)).unwrap_or(start);
        s[start..].trim().to_string()
    }
}
