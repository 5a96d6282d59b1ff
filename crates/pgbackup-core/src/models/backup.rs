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

//! A single backup run and its outcome.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::schema::backups;

/// `pending -> running -> (success | failed)`, no other transitions
/// (spec.md §3). The `running` state is advisory only; it is not a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl BackupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupStatus::Pending => "pending",
            BackupStatus::Running => "running",
            BackupStatus::Success => "success",
            BackupStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BackupStatus::Pending),
            "running" => Some(BackupStatus::Running),
            "success" => Some(BackupStatus::Success),
            "failed" => Some(BackupStatus::Failed),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` is one of the transitions the
    /// state machine permits.
    pub fn can_transition_to(&self, next: BackupStatus) -> bool {
        matches!(
            (self, next),
            (BackupStatus::Pending, BackupStatus::Running)
                | (BackupStatus::Running, BackupStatus::Success)
                | (BackupStatus::Running, BackupStatus::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BackupStatus::Success | BackupStatus::Failed)
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = backups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Backup {
    pub id: Uuid,
    pub name: String,
    pub database_id: Uuid,
    pub status: String,
    pub size_bytes: Option<i64>,
    pub storage_path: Option<String>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Backup {
    pub fn status(&self) -> BackupStatus {
        BackupStatus::parse(&self.status).unwrap_or(BackupStatus::Failed)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = backups)]
pub struct NewBackup {
    pub name: String,
    pub database_id: Uuid,
    pub status: String,
}

impl NewBackup {
    pub fn pending_for(database_id: Uuid) -> Self {
        Self {
            name: generate_name(),
            database_id,
            status: BackupStatus::Pending.as_str().to_string(),
        }
    }
}

const ADJECTIVES: &[&str] = &[
    "amber", "brisk", "calm", "dusty", "eager", "faint", "gentle", "hollow", "icy", "jolly",
    "keen", "lively", "mellow", "nimble", "olive", "plain", "quiet", "rustic", "steady", "tidy",
    "umber", "vivid", "wary", "young", "zesty", "ashen", "bold", "crisp", "drab", "earnest",
    "fleet", "golden", "hardy", "inky", "jagged", "kindly", "lofty", "misty", "noble", "opal",
    "patient", "quick", "rosy", "sleepy", "terse", "urgent", "velvet", "weary", "xeric", "yawning",
];

const NOUNS: &[&str] = &[
    "anchor", "badger", "canyon", "delta", "ember", "falcon", "glacier", "harbor", "ibis",
    "jackal", "kestrel", "lantern", "meadow", "needle", "orchard", "pebble", "quarry", "ridge",
    "summit", "thicket", "urchin", "vessel", "willow", "xylem", "yarrow", "basin", "cinder",
    "dune", "estuary", "fjord", "grove", "hollow", "islet", "juniper", "knoll", "lagoon",
    "marsh", "nook", "outcrop", "prairie", "quay", "reef", "shoal", "tundra", "upland",
    "valley", "wharf", "xanadu", "yucca", "zephyr",
];

/// Produces a display-only name like `amber-badger-20260214`: 50 adjectives
/// times 50 nouns times one date tuple, 2,500 combinations per day — no
/// uniqueness guarantee is made or needed, the primary key is `id`
/// (spec.md §3).
pub fn generate_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).unwrap();
    let noun = NOUNS.choose(&mut rng).unwrap();
    let date = Utc::now().format("%Y%m%d");
    format!("{adjective}-{noun}-{date}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_name_has_three_dash_separated_parts() {
        let name = generate_name();
        let parts: Vec<&str> = name.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn pending_to_running_allowed() {
        assert!(BackupStatus::Pending.can_transition_to(BackupStatus::Running));
    }

    #[test]
    fn running_to_success_and_failed_allowed() {
        assert!(BackupStatus::Running.can_transition_to(BackupStatus::Success));
        assert!(BackupStatus::Running.can_transition_to(BackupStatus::Failed));
    }

    #[test]
    fn pending_cannot_skip_to_success() {
        assert!(!BackupStatus::Pending.can_transition_to(BackupStatus::Success));
    }

    #[test]
    fn terminal_states_have_no_outbound_transitions() {
        for next in [
            BackupStatus::Pending,
            BackupStatus::Running,
            BackupStatus::Success,
            BackupStatus::Failed,
        ] {
            assert!(!BackupStatus::Success.can_transition_to(next));
            assert!(!BackupStatus::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            BackupStatus::Pending,
            BackupStatus::Running,
            BackupStatus::Success,
            BackupStatus::Failed,
        ] {
            assert_eq!(BackupStatus::parse(s.as_str()), Some(s));
        }
    }
}
