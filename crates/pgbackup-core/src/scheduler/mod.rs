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

//! Owns the live mapping from `DatabaseConfig` id to a registered cron
//! entry and dispatches [`BackupRunner`] at firing time.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use croner::Cron;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dal::DAL;
use crate::error::SchedulerError;
use crate::models::DatabaseConfig;
use crate::notify::{NullNotifier, WebhookNotifier};
use crate::runner::BackupRunner;

struct RegisteredJob {
    /// The task polling for the next firing. Aborted on `RemoveJob`/`Stop`;
    /// aborting it never touches any already-dispatched `BackupRunner`
    /// task, so in-flight invocations run to completion (spec.md §4.1).
    handle: JoinHandle<()>,
}

pub struct Scheduler {
    dal: DAL,
    runner: Arc<BackupRunner>,
    jobs: Mutex<HashMap<Uuid, RegisteredJob>>,
}

impl Scheduler {
    pub fn new(dal: DAL, runner: Arc<BackupRunner>) -> Self {
        Self {
            dal,
            runner,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// `Start()` — spec.md §4.1. Per-config parse failures are logged and
    /// skipped; only a cron-library misconfiguration fails the call, which
    /// cannot happen here since each config is validated independently.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let configs = self.dal.database_configs().list_schedulable().await?;
        for cfg in configs {
            if let Err(e) = self.add_job(cfg.clone()).await {
                warn!(database = %cfg.name, error = %e, "scheduler: skipping config with invalid schedule");
            }
        }
        Ok(())
    }

    /// `AddJob(cfg)` — idempotent, replaces any existing entry for the
    /// same id.
    pub async fn add_job(&self, cfg: DatabaseConfig) -> Result<(), SchedulerError> {
        let cron = Cron::new(&cfg.schedule)
            .parse()
            .map_err(|source| SchedulerError::InvalidSchedule {
                expression: cfg.schedule.clone(),
                source,
            })?;

        let mut jobs = self.jobs.lock().await;
        if let Some(existing) = jobs.remove(&cfg.id) {
            // The old firing, if any is in flight, still completes under
            // the pre-replacement config — only the poll loop is aborted.
            existing.handle.abort();
        }

        let dal = self.dal.clone();
        let runner = Arc::clone(&self.runner);
        let config_id = cfg.id;
        let handle = tokio::spawn(async move {
            run_poll_loop(dal, runner, cron, config_id).await;
        });

        jobs.insert(cfg.id, RegisteredJob { handle });
        info!(database = %cfg.name, schedule = %cfg.schedule, "scheduler: registered job");
        Ok(())
    }

    /// `UpdateJob(cfg)` — equivalent to `RemoveJob` then `AddJob`; if the
    /// config is now paused or disabled, it is left removed.
    pub async fn update_job(&self, cfg: DatabaseConfig) -> Result<(), SchedulerError> {
        self.remove_job(cfg.id).await;
        if cfg.is_schedulable() {
            self.add_job(cfg).await?;
        }
        Ok(())
    }

    /// `RemoveJob(id)` — no-op if absent.
    pub async fn remove_job(&self, id: Uuid) {
        if let Some(job) = self.jobs.lock().await.remove(&id) {
            job.handle.abort();
        }
    }

    /// `Stop()` — stop firing; in-flight invocations run to completion.
    pub async fn stop(&self) {
        let mut jobs = self.jobs.lock().await;
        for (_, job) in jobs.drain() {
            job.handle.abort();
        }
    }
}

/// Repeatedly sleeps until the next scheduled instant, re-reads the config
/// (so pause/disable/version changes are picked up without a fresh
/// registration), and dispatches an asynchronous, fire-and-forget
/// `BackupRunner.Run`. The scheduler never waits for the run to finish and
/// never serializes across firings of the same config (spec.md §4.1).
async fn run_poll_loop(dal: DAL, runner: Arc<BackupRunner>, cron: Cron, config_id: Uuid) {
    loop {
        let now = Utc::now();
        let next = match cron.find_next_occurrence(&now, false) {
            Ok(next) => next,
            Err(e) => {
                error!(database = %config_id, error = %e, "scheduler: could not compute next occurrence, stopping job");
                return;
            }
        };

        let delay = (next - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(0));
        tokio::time::sleep(delay).await;

        let cfg = match dal.database_configs().get(config_id).await {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(database = %config_id, error = %e, "scheduler: config vanished, stopping job");
                return;
            }
        };

        if !cfg.is_schedulable() {
            // Pause/disable mutations go through UpdateJob which removes
            // this loop; this is a defensive fallback only.
            continue;
        }

        let notifier: Arc<dyn crate::notify::Notifier> = match cfg.notification_ref {
            Some(notification_id) => match dal.notification_configs().get(notification_id).await {
                Ok(n) => Arc::new(WebhookNotifier::new(n.webhook_url)),
                Err(_) => Arc::new(NullNotifier),
            },
            None => Arc::new(NullNotifier),
        };

        let runner = Arc::clone(&runner);
        tokio::spawn(async move {
            runner.run(&cfg, None, notifier).await;
        });
    }
}
