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

//! Detects a target server's PostgreSQL major version, locates
//! version-matched client binaries, and picks the dump encoding policy.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use regex::Regex;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::VersionError;
use crate::models::TargetRef;

const DETECTION_TIMEOUT: Duration = Duration::from_secs(10);
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
pub enum DumpFormat {
    Plain,
    Custom,
}

impl DumpFormat {
    pub fn as_pg_dump_arg(&self) -> &'static str {
        match self {
            DumpFormat::Plain => "plain",
            DumpFormat::Custom => "custom",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            DumpFormat::Plain => "sql",
            DumpFormat::Custom => "dump",
        }
    }

    /// `.sql` restores via `psql`, `.dump` via `pg_restore` — spec.md §4.3
    /// "prefer the format implied by the object key suffix".
    pub fn from_object_key(key: &str) -> Option<Self> {
        if key.ends_with(".sql") {
            Some(DumpFormat::Plain)
        } else if key.ends_with(".dump") {
            Some(DumpFormat::Custom)
        } else {
            None
        }
    }
}

/// `DumpFormat(major) -> (format, compression)` policy table — spec.md §4.4/§6.
pub fn dump_format_for(major: u32) -> (DumpFormat, u32) {
    if major >= 14 {
        (DumpFormat::Custom, 9)
    } else if major == 13 {
        (DumpFormat::Custom, 6)
    } else {
        (DumpFormat::Plain, 3)
    }
}

/// `pg_dump` can emit for same-or-older server within one major.
pub fn is_compatible(dump_major: u32, db_major: u32) -> bool {
    dump_major >= db_major.saturating_sub(1)
}

#[derive(Clone, Copy)]
struct CacheEntry {
    major: u32,
    detected_at: Instant,
}

/// Process-wide, lock-guarded cache keyed by `(host, port)` — spec.md §5.
pub struct VersionManager {
    cache: Mutex<HashMap<(String, u16), CacheEntry>>,
}

impl Default for VersionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionManager {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the major version, querying the server only when the
    /// `(host, port)` cache entry is missing or stale, and `postgres_version`
    /// isn't already a pinned numeric major checked within the last 24h.
    pub async fn detect_major(
        &self,
        target: &TargetRef,
        pinned_major: Option<u32>,
        version_last_checked: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<u32, VersionError> {
        if let (Some(major), Some(checked_at)) = (pinned_major, version_last_checked) {
            let age = chrono::Utc::now().signed_duration_since(checked_at);
            if age.num_seconds() >= 0 && age.to_std().map(|d| d < CACHE_TTL).unwrap_or(false) {
                return Ok(major);
            }
        }

        let key = (target.host.clone(), target.port);
        if let Some(entry) = self.cache.lock().unwrap().get(&key) {
            if entry.detected_at.elapsed() < CACHE_TTL {
                debug!(host = %target.host, port = target.port, "version cache hit");
                return Ok(entry.major);
            }
        }

        let major = self.probe(target).await?;
        self.cache.lock().unwrap().insert(
            key,
            CacheEntry {
                major,
                detected_at: Instant::now(),
            },
        );
        Ok(major)
    }

    async fn probe(&self, target: &TargetRef) -> Result<u32, VersionError> {
        let psql = locate_tool("psql", None);
        let mut command = Command::new(&psql);
        command
            .arg("--host")
            .arg(&target.host)
            .arg("--port")
            .arg(target.port.to_string())
            .arg("--username")
            .arg(&target.user)
            .arg("--dbname")
            .arg(&target.dbname)
            .arg("--no-password")
            .arg("--tuples-only")
            .arg("--no-align")
            .arg("--command")
            .arg("SELECT version();")
            .env("PGPASSWORD", &target.secret);

        let output = timeout(DETECTION_TIMEOUT, command.output())
            .await
            .map_err(|_| VersionError::Timeout(DETECTION_TIMEOUT))?
            .map_err(|e| VersionError::Probe(e.to_string()))?;

        if !output.status.success() {
            return Err(VersionError::Probe(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_major(&stdout)
    }
}

/// Parses the first numeric major from a `version()` response, trying each
/// pattern in order — spec.md §4.4.
fn parse_major(version_string: &str) -> Result<u32, VersionError> {
    const PATTERNS: [&str; 3] = [
        r"PostgreSQL (\d+)\.",
        r"^\s*(\d+)\.",
        r"(\d+)\.",
    ];

    for pattern in PATTERNS {
        let re = Regex::new(pattern).expect("static regex is valid");
        if let Some(captures) = re.captures(version_string) {
            if let Some(m) = captures.get(1) {
                if let Ok(major) = m.as_str().parse::<u32>() {
                    return Ok(major);
                }
            }
        }
    }

    Err(VersionError::Unparseable(version_string.trim().to_string()))
}

/// Probes a fixed, OS-specific search list for a version-matched client
/// binary; falls back to the bare tool name for PATH resolution.
pub fn locate_tool(name: &str, major: Option<u32>) -> String {
    if let Some(major) = major {
        let candidates = search_paths(name, major);
        for candidate in candidates {
            if candidate.is_file() {
                warn_if_unusual(&candidate);
                return candidate.to_string_lossy().into_owned();
            }
        }
    }
    name.to_string()
}

fn warn_if_unusual(_path: &std::path::Path) {}

#[cfg(target_os = "macos")]
fn search_paths(name: &str, major: u32) -> Vec<PathBuf> {
    vec![
        PathBuf::from(format!("/opt/homebrew/opt/postgresql@{major}/bin/{name}")),
        PathBuf::from(format!("/usr/local/opt/postgresql@{major}/bin/{name}")),
        PathBuf::from(format!("/Applications/Postgres.app/Contents/Versions/{major}/bin/{name}")),
    ]
}

#[cfg(not(target_os = "macos"))]
fn search_paths(name: &str, major: u32) -> Vec<PathBuf> {
    vec![
        PathBuf::from(format!("/usr/lib/postgresql/{major}/bin/{name}")),
        PathBuf::from(format!("/usr/pgsql-{major}/bin/{name}")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_postgresql_banner() {
        let major = parse_major("PostgreSQL 15.4 on x86_64-pc-linux-gnu").unwrap();
        assert_eq!(major, 15);
    }

    #[test]
    fn parses_bare_leading_number() {
        let major = parse_major("14.9 some other text").unwrap();
        assert_eq!(major, 14);
    }

    #[test]
    fn falls_back_to_any_number_dot_pattern() {
        let major = parse_major("build 13.2-custom").unwrap();
        assert_eq!(major, 13);
    }

    #[test]
    fn rejects_unparseable_string() {
        assert!(parse_major("no numbers here").is_err());
    }

    #[test]
    fn dump_format_policy_table() {
        assert!(matches!(dump_format_for(15), (DumpFormat::Custom, 9)));
        assert!(matches!(dump_format_for(14), (DumpFormat::Custom, 9)));
        assert!(matches!(dump_format_for(13), (DumpFormat::Custom, 6)));
        assert!(matches!(dump_format_for(12), (DumpFormat::Plain, 3)));
        assert!(matches!(dump_format_for(9), (DumpFormat::Plain, 3)));
    }

    #[test]
    fn compatibility_allows_one_major_behind() {
        assert!(is_compatible(14, 15));
        assert!(is_compatible(15, 15));
        assert!(!is_compatible(13, 15));
    }

    #[test]
    fn format_from_object_key_suffix() {
        assert!(matches!(DumpFormat::from_object_key("db/db_x.sql"), Some(DumpFormat::Plain)));
        assert!(matches!(DumpFormat::from_object_key("db/db_x.dump"), Some(DumpFormat::Custom)));
        assert!(DumpFormat::from_object_key("db/db_x.txt").is_none());
    }
}
